//! HTTP middleware (CORS, 404 handler)

use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};

use crate::core::constants::{
    HEADER_PARENT_TRACE_ID, HEADER_SESSION_ID, HEADER_TRACE_ID, HEADER_USER_ID,
};
use axum::response::IntoResponse;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Allowed origins configuration
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Vec<String>,
}

impl AllowedOrigins {
    /// Create allowed origins from host and port configuration
    pub fn new(host: &str, port: u16) -> Self {
        let mut origins = Vec::new();
        let dev_port = port + 1;

        // When binding to all interfaces or localhost, allow both localhost
        // and 127.0.0.1; otherwise use the configured host directly.
        let base_hosts: Vec<&str> = if host == "0.0.0.0" || host == "127.0.0.1" || host == "localhost"
        {
            vec!["localhost", "127.0.0.1"]
        } else {
            vec![host]
        };

        for h in &base_hosts {
            origins.push(format!("http://{}:{}", h, port));
            origins.push(format!("http://{}:{}", h, dev_port));
            origins.push(format!("http://{}", h));
        }

        Self { origins }
    }

    /// Check if an origin is allowed
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    /// Get origins as HeaderValues for CORS
    fn as_header_values(&self) -> Vec<HeaderValue> {
        self.origins.iter().filter_map(|o| o.parse().ok()).collect()
    }
}

/// Create CORS layer
pub fn cors(allowed: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed.as_header_values()))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
            HeaderName::from_static(HEADER_TRACE_ID),
            HeaderName::from_static(HEADER_SESSION_ID),
            HeaderName::from_static(HEADER_PARENT_TRACE_ID),
            HeaderName::from_static(HEADER_USER_ID),
        ])
        .allow_credentials(true)
}

/// Handle 404 Not Found with logging
pub async fn handle_404(req: axum::extract::Request) -> impl IntoResponse {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "[404] route not found");
    StatusCode::NOT_FOUND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localhost_origins() {
        let allowed = AllowedOrigins::new("127.0.0.1", 5931);
        assert!(allowed.is_allowed("http://localhost:5931"));
        assert!(allowed.is_allowed("http://127.0.0.1:5931"));
        // Dev server port is allowed too
        assert!(allowed.is_allowed("http://localhost:5932"));
        assert!(!allowed.is_allowed("http://evil.example.com"));
    }

    #[test]
    fn test_specific_host_origins() {
        let allowed = AllowedOrigins::new("10.0.0.5", 8080);
        assert!(allowed.is_allowed("http://10.0.0.5:8080"));
        assert!(!allowed.is_allowed("http://localhost:8080"));
    }
}
