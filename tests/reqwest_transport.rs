//! The default reqwest transport against a local mock HTTP server.
//!
//! Checks what actually goes over the wire: method, path, `sig` query
//! parameter, content type and body.

use mockito::Matcher;
use xmlconvert_client::{sign_bytes, Client, ClientConfig, ConvertError, TransportError};

const SECRET: &str = "s3cr3t";

fn client_for(server: &mockito::ServerGuard) -> Client {
    let config = ClientConfig::builder(format!("{}/api/Fop", server.url()))
        .secret(SECRET)
        .request_timeout_secs(10)
        .build()
        .unwrap();
    Client::new(config).unwrap()
}

#[tokio::test]
async fn posts_signed_octet_stream() {
    let mut server = mockito::Server::new_async().await;
    let sig = sign_bytes(Some(SECRET), b"<a/>");

    let mock = server
        .mock("POST", "/api/Fop")
        .match_query(Matcher::UrlEncoded("sig".into(), sig.clone()))
        .match_header("content-type", "application/octet-stream")
        .match_body(Matcher::Exact("<a/>".into()))
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body("%PDF-1.4 converted")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let mut output = Vec::new();
    let stats = client.convert_bytes(b"<a/>", &mut output).await.unwrap();

    mock.assert_async().await;
    assert_eq!(output, b"%PDF-1.4 converted");
    assert_eq!(stats.signature, sig);
    assert_eq!(stats.status, 200);
}

#[tokio::test]
async fn non_success_surfaces_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/Fop")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("org.apache.fop.apps.FOPException: no page-sequence")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let mut output = Vec::new();
    let err = client.convert_bytes(b"<a/>", &mut output).await.unwrap_err();

    mock.assert_async().await;
    match err {
        ConvertError::RemoteRejection { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("FOPException"), "got: {body}");
        }
        other => panic!("expected RemoteRejection, got {other:?}"),
    }
    assert!(output.is_empty());
}

#[tokio::test]
async fn invalid_input_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .convert_bytes(b"\x00\x01binary", &mut Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::InvalidInput { .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Bind then drop a listener so the port is known to be closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = Client::from_endpoint(format!("http://127.0.0.1:{port}/api/Fop"), Some(SECRET))
        .unwrap();

    let err = client
        .convert_bytes(b"<a/>", &mut Vec::new())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ConvertError::Transport(TransportError::Http(_))),
        "got {err:?}"
    );
}
