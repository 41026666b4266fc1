/// Error taxonomy for the measurement API
///
/// Three kinds cover the whole surface:
/// - ValidationError (400): malformed or missing input, client-correctable
/// - NoData (404): well-formed query, empty result set; a normal outcome
/// - ServerError (500): anything unexpected (store failure etc.); logged
///   server-side in full, the client only sees a generic message

/// Failure outcome of any API operation.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing input, rejected before any storage access
    Validation(String),
    /// Well-formed query that matched no records
    NoData(String),
    /// Unexpected failure; holds the full detail for server-side logging
    Server(String),
}

impl ApiError {
    /// HTTP status code for this error kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::NoData(_) => 404,
            ApiError::Server(_) => 500,
        }
    }

    /// Error kind as serialized in the uniform `{error, message}` body.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "ValidationError",
            ApiError::NoData(_) => "NoData",
            ApiError::Server(_) => "ServerError",
        }
    }

    /// Message the client is allowed to see. Server errors are masked;
    /// their detail stays in the variant for logging.
    pub fn client_message(&self) -> &str {
        match self {
            ApiError::Validation(msg) | ApiError::NoData(msg) => msg,
            ApiError::Server(_) => "Internal server error",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "ValidationError: {}", msg),
            ApiError::NoData(msg) => write!(f, "NoData: {}", msg),
            ApiError::Server(msg) => write!(f, "ServerError: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<postgres::Error> for ApiError {
    fn from(e: postgres::Error) -> Self {
        ApiError::Server(format!("Database query failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Validation("x".into()).status_code(), 400);
        assert_eq!(ApiError::NoData("x".into()).status_code(), 404);
        assert_eq!(ApiError::Server("x".into()).status_code(), 500);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ApiError::Validation("x".into()).kind(), "ValidationError");
        assert_eq!(ApiError::NoData("x".into()).kind(), "NoData");
        assert_eq!(ApiError::Server("x".into()).kind(), "ServerError");
    }

    #[test]
    fn test_server_detail_is_masked_from_client() {
        let err = ApiError::Server("connection refused at 10.0.0.5:5432".into());
        assert_eq!(err.client_message(), "Internal server error");
        // Full detail remains available for logging
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_client_errors_pass_message_through() {
        let err = ApiError::Validation("Invalid page. Expected integer >= 1.".into());
        assert_eq!(err.client_message(), "Invalid page. Expected integer >= 1.");
    }
}
