//! End-to-end test against a live conversion service.
//!
//! Gated behind `E2E_ENABLED` so it does not run in CI unless explicitly
//! requested. Needs:
//!
//!   E2E_ENABLED=1
//!   XMLCONVERT_ENDPOINT=https://…/api/Fop
//!   XMLCONVERT_SECRET=…
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use xmlconvert_client::{Client, ConvertError};

const HELLO_FO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fo:root xmlns:fo="http://www.w3.org/1999/XSL/Format">
  <fo:layout-master-set>
    <fo:simple-page-master master-name="page" page-height="29.7cm" page-width="21cm" margin="2cm">
      <fo:region-body/>
    </fo:simple-page-master>
  </fo:layout-master-set>
  <fo:page-sequence master-reference="page">
    <fo:flow flow-name="xsl-region-body">
      <fo:block>Hello, world</fo:block>
    </fo:flow>
  </fo:page-sequence>
</fo:root>"#;

/// Skip unless E2E_ENABLED and an endpoint are set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        match std::env::var("XMLCONVERT_ENDPOINT") {
            Ok(endpoint) => endpoint,
            Err(_) => {
                println!("SKIP — XMLCONVERT_ENDPOINT not set");
                return;
            }
        }
    }};
}

#[tokio::test]
async fn test_live_conversion_produces_pdf() {
    let endpoint = e2e_skip_unless_ready!();
    let secret = std::env::var("XMLCONVERT_SECRET").ok();
    let client = Client::from_endpoint(endpoint, secret.as_deref()).unwrap();

    let mut output = Vec::new();
    let stats = client
        .convert_bytes(HELLO_FO.as_bytes(), &mut output)
        .await
        .expect("live conversion should succeed");

    assert!(output.starts_with(b"%PDF"), "output is not a PDF");
    assert_eq!(stats.bytes_written, output.len() as u64);
    println!("✓  {} bytes in {}ms", stats.bytes_written, stats.duration_ms);
}

#[tokio::test]
async fn test_live_wrong_secret_is_rejected() {
    let endpoint = e2e_skip_unless_ready!();
    let client = Client::from_endpoint(endpoint, Some("definitely-not-the-secret")).unwrap();

    let mut output = Vec::new();
    let err = client
        .convert_bytes(HELLO_FO.as_bytes(), &mut output)
        .await
        .unwrap_err();

    assert!(
        matches!(err, ConvertError::RemoteRejection { status: 403, .. }),
        "got {err:?}"
    );
    assert!(output.is_empty());
}
