//! Share URL construction.

use crate::storage::FileId;

/// Where the scheme and host of share links come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrl {
    /// A configured public URL, used verbatim.
    Fixed(String),
    /// Derived per request from the Host header, with a fallback when the
    /// header is missing or unusable.
    FromRequest {
        /// Base used when no usable Host header is present.
        fallback: String,
    },
}

impl BaseUrl {
    /// Use a configured public URL. Trailing slashes are dropped.
    pub fn fixed(url: &str) -> Self {
        Self::Fixed(url.trim_end_matches('/').to_string())
    }

    /// Derive the base from each request.
    pub fn from_request(fallback: &str) -> Self {
        Self::FromRequest {
            fallback: fallback.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve the base for a request.
    ///
    /// `forwarded_proto` is the `X-Forwarded-Proto` header; only `http` and
    /// `https` are honoured.
    pub fn resolve(&self, host: Option<&str>, forwarded_proto: Option<&str>) -> String {
        match self {
            Self::Fixed(url) => url.clone(),
            Self::FromRequest { fallback } => match host.filter(|h| is_valid_host(h)) {
                Some(host) => {
                    let scheme = match forwarded_proto.map(str::trim) {
                        Some(p) if p.eq_ignore_ascii_case("https") => "https",
                        _ => "http",
                    };
                    format!("{scheme}://{host}")
                }
                None => fallback.clone(),
            },
        }
    }
}

/// Accept host names, IPv4/IPv6 literals and ports; nothing that could
/// change the shape of the URL.
fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 255
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '[' | ']'))
}

/// Share page URL for an upload.
pub fn share_url(base: &str, id: &FileId) -> String {
    format!("{}/share/{id}", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_base() {
        let base = BaseUrl::fixed("https://share.example.com/");
        assert_eq!(
            base.resolve(Some("evil.example.org"), Some("http")),
            "https://share.example.com"
        );
    }

    #[test]
    fn test_base_from_host() {
        let base = BaseUrl::from_request("http://localhost:3000");

        assert_eq!(base.resolve(Some("files.local:8080"), None), "http://files.local:8080");
        assert_eq!(
            base.resolve(Some("files.local"), Some("https")),
            "https://files.local"
        );
        assert_eq!(base.resolve(Some("[::1]:3000"), Some("HTTPS")), "https://[::1]:3000");
        assert_eq!(base.resolve(Some("files.local"), Some("gopher")), "http://files.local");
    }

    #[test]
    fn test_base_fallback() {
        let base = BaseUrl::from_request("http://localhost:3000/");

        assert_eq!(base.resolve(None, None), "http://localhost:3000");
        assert_eq!(base.resolve(Some(""), None), "http://localhost:3000");
        assert_eq!(
            base.resolve(Some("host/path?x=1"), None),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_share_url() {
        let id: FileId = "ab12cd34-5678-40ab-8def-123456789012".parse().unwrap();
        assert_eq!(
            share_url("https://share.example.com/", &id),
            "https://share.example.com/share/ab12cd34-5678-40ab-8def-123456789012"
        );
    }
}
