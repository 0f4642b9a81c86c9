//! Result type of a successful conversion.

use serde::{Deserialize, Serialize};

/// Summary of one successful `convert` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Size of the request body.
    pub bytes_sent: u64,
    /// Bytes copied from the response into the output.
    pub bytes_written: u64,
    /// HTTP status of the response (always 2xx here).
    pub status: u16,
    /// The `sig` value sent with the request.
    pub signature: String,
    /// Wall-clock time for the whole call.
    pub duration_ms: u64,
}
