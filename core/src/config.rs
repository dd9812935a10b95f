//! Transport configuration.

use serde::Deserialize;

/// Upper bound on a buffered response body.
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024;

/// Settings shared by every request a client makes.
///
/// Deserializable so hosts can embed it in their own config files; missing
/// fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Verify the server certificate chain and host name on HTTPS.
    /// Turning this off accepts any certificate.
    pub verify_tls: bool,

    /// Responses larger than this fail with a transport error.
    pub max_response_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            verify_tls: true,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl HttpConfig {
    /// Accept any certificate. Only for talking to hosts with self-signed
    /// certificates you already trust.
    pub fn insecure() -> Self {
        Self {
            verify_tls: false,
            ..Self::default()
        }
    }
}
