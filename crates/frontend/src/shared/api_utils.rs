//! API utilities for frontend-backend communication
//!
//! Helpers for constructing API URLs.

/// Get the base URL for API requests on the given backend port
///
/// Constructs the API base URL from the current window location.
///
/// # Returns
/// - API base URL like "http://localhost:3000" or "https://example.com:3000"
/// - Empty string if window is not available
pub fn api_base_for_port(port: u16) -> String {
    let window = match web_sys::window() {
        Some(w) => w,
        None => return String::new(),
    };
    let location = window.location();
    let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
    let hostname = location
        .hostname()
        .unwrap_or_else(|_| "127.0.0.1".to_string());
    format!("{}//{}:{}", protocol, hostname, port)
}

/// Join a base path and an optional sub-path, encoding the sub-path segments
///
/// # Example
/// ```rust
/// use erp_admin_frontend::shared::api_utils::join_path;
/// assert_eq!(join_path("/api/categories", Some("by type")), "/api/categories/by%20type");
/// ```
pub fn join_path(base: &str, suffix: Option<&str>) -> String {
    let base = base.trim_end_matches('/');
    match suffix.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
        Some(suffix) => {
            let encoded: Vec<String> = suffix
                .split('/')
                .map(|segment| urlencoding::encode(segment).into_owned())
                .collect();
            format!("{}/{}", base, encoded.join("/"))
        }
        None => base.to_string(),
    }
}

/// Prefix an absolute path with the base URL unless it already is a full URL
pub fn absolute_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/api/units", None), "/api/units");
        assert_eq!(join_path("/api/units/", Some("")), "/api/units");
        assert_eq!(join_path("/api/categories", Some("/goods/")), "/api/categories/goods");
        assert_eq!(join_path("/api/categories", Some("a b/c")), "/api/categories/a%20b/c");
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(absolute_url("http://h:3000/", "/api/x"), "http://h:3000/api/x");
        assert_eq!(absolute_url("http://h:3000", "https://other/api"), "https://other/api");
    }
}
