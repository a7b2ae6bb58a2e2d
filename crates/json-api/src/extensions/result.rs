//! Result helper extensions for HTTP handlers.

use std::fmt::Display;

use salvo::prelude::StatusError;
use tracing::{debug, error};

/// Map any error to an HTTP error.
pub(crate) trait ResultExt<T> {
    /// Reject as a client error, echoing `context` and the cause.
    fn or_400(self, context: &str) -> Result<T, StatusError>;

    /// Reject as a logged internal server error.
    fn or_500(self, context: &str) -> Result<T, StatusError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Display,
{
    fn or_400(self, context: &str) -> Result<T, StatusError> {
        self.map_err(|error| {
            debug!("{context}: {error}");

            StatusError::bad_request().brief(format!("{context}: {error}"))
        })
    }

    fn or_500(self, context: &str) -> Result<T, StatusError> {
        self.map_err(|error| {
            error!("{context}: {error}");

            StatusError::internal_server_error()
        })
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn or_400_carries_context_and_cause() {
        let result: Result<(), &str> = Err("limit must be between 1 and 100");

        let error = result.or_400("invalid catalog query").err();

        assert_eq!(error.as_ref().map(|error| error.code), Some(StatusCode::BAD_REQUEST));
        assert_eq!(
            error.map(|error| error.brief),
            Some("invalid catalog query: limit must be between 1 and 100".to_string())
        );
    }

    #[test]
    fn or_500_hides_cause() {
        let result: Result<(), &str> = Err("connection refused");

        let error = result.or_500("failed to load").err();

        assert_eq!(error.as_ref().map(|error| error.code), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!error.is_some_and(|error| error.brief.contains("connection refused")));
    }
}
