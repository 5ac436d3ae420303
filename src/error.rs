use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to one of the Open-Meteo providers.
///
/// An empty geocoding result is not an error; `resolve` reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider answered with HTTP {0}")]
    Status(StatusCode),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("background request died: {0}")]
    Worker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_the_code() {
        let err = TransportError::Status(StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn malformed_error_carries_reason() {
        let err = TransportError::Malformed("hourly series misaligned".into());
        assert_eq!(err.to_string(), "malformed payload: hourly series misaligned");
    }
}
