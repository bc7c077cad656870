//! HTTP client boundary and allow-list enforcement.
//!
//! The interpreter core never opens sockets. Networking builtins go
//! through the [`HttpClient`] trait supplied by the host, and every URL
//! is checked against the allow-list (glob patterns on the host) first.

use async_trait::async_trait;
use std::collections::HashMap;

/// Network configuration carried in the shell state.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    pub enabled: bool,
    /// Glob patterns matched against the request host, e.g.
    /// `api.example.com` or `*.example.com`.
    pub allow_list: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Host-supplied HTTP transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// Extract the host from an http(s) URL.
pub fn url_host(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Allow-list check: the host must match one of the glob patterns.
/// Non-http(s) URLs never match.
pub fn host_allowed(url: &str, allow_list: &[String]) -> bool {
    let host = match url_host(url) {
        Some(h) => h,
        None => return false,
    };
    allow_list.iter().any(|pattern| {
        glob::Pattern::new(pattern)
            .map(|p| p.matches(host))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction() {
        assert_eq!(url_host("https://api.example.com/v1"), Some("api.example.com"));
        assert_eq!(url_host("http://localhost:8080/x"), Some("localhost"));
        assert_eq!(url_host("https://example.com"), Some("example.com"));
        assert_eq!(url_host("ftp://example.com"), None);
        assert_eq!(url_host("not a url"), None);
    }

    #[test]
    fn exact_host_match() {
        let allow = vec!["api.example.com".to_string()];
        assert!(host_allowed("https://api.example.com/v1/users", &allow));
        assert!(!host_allowed("https://evil.com/", &allow));
    }

    #[test]
    fn wildcard_host_match() {
        let allow = vec!["*.example.com".to_string()];
        assert!(host_allowed("https://api.example.com/", &allow));
        assert!(host_allowed("https://cdn.example.com/asset", &allow));
        assert!(!host_allowed("https://example.org/", &allow));
    }

    #[test]
    fn empty_allow_list_blocks_all() {
        assert!(!host_allowed("https://example.com/", &[]));
    }

    #[test]
    fn scheme_is_required() {
        let allow = vec!["*".to_string()];
        assert!(!host_allowed("file:///etc/passwd", &allow));
        assert!(host_allowed("http://anything.net/", &allow));
    }
}
