//! Request context consumed when building pagination URLs

use url::{form_urlencoded, Position, Url};

/// Access to the request currently being served.
///
/// Only pagination needs this; it reads the full URL and rebuilds it with
/// a different `page` or `cursor` parameter.
pub trait RequestContext: Send + Sync {
    /// Full URL of the current request, query string included
    fn full_url(&self) -> String;

    /// Decoded query string parameters in request order
    fn query_params(&self) -> Vec<(String, String)> {
        PageUrl::parse(&self.full_url()).query
    }
}

/// A request context fixed to one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRequest {
    url: String,
}

impl StaticRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl RequestContext for StaticRequest {
    fn full_url(&self) -> String {
        self.url.clone()
    }
}

/// A URL split into its path and query parameters.
///
/// Absolute URLs keep their scheme and host; relative ones stay relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    path: String,
    query: Vec<(String, String)>,
}

impl Default for PageUrl {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            query: Vec::new(),
        }
    }
}

impl PageUrl {
    pub fn parse(raw: &str) -> Self {
        if let Ok(url) = Url::parse(raw) {
            if !url.cannot_be_a_base() {
                return Self::from_url(&url, true);
            }
        }

        match Url::parse("http://localhost").and_then(|base| base.join(raw)) {
            Ok(url) => Self::from_url(&url, false),
            Err(e) => {
                tracing::warn!(url = raw, error = %e, "unparseable request URL, paginating from '/'");
                Self::default()
            }
        }
    }

    /// Build from the current request, falling back to `/` without one
    pub fn from_request(request: Option<&dyn RequestContext>) -> Self {
        match request {
            Some(request) => Self::parse(&request.full_url()),
            None => {
                tracing::warn!("no request context bound, pagination links are relative to '/'");
                Self::default()
            }
        }
    }

    fn from_url(url: &Url, absolute: bool) -> Self {
        let path = if absolute {
            url[..Position::AfterPath].to_string()
        } else {
            url.path().to_string()
        };
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { path, query }
    }

    /// Path without the query string
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Drop every parameter named in `keys`
    pub fn without(mut self, keys: &[&str]) -> Self {
        self.query.retain(|(k, _)| !keys.contains(&k.as_str()));
        self
    }

    /// Render with `key` set to `value`, replacing any previous value
    pub fn with(&self, key: &str, value: &str) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.query.iter().filter(|(k, _)| k != key) {
            serializer.append_pair(k, v);
        }
        serializer.append_pair(key, value);
        format!("{}?{}", self.path, serializer.finish())
    }

    /// Render unchanged
    pub fn render(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_keeps_host() {
        let url = PageUrl::parse("https://example.com/users?sort=name&page=3")
            .without(&["page", "cursor"]);
        assert_eq!(url.path(), "https://example.com/users");
        assert_eq!(url.with("page", "4"), "https://example.com/users?sort=name&page=4");
    }

    #[test]
    fn test_relative_url_stays_relative() {
        let url = PageUrl::parse("/users?cursor=10&q=a+b");
        assert_eq!(url.path(), "/users");
        assert_eq!(url.query(), &[("cursor".to_string(), "10".to_string()), ("q".to_string(), "a b".to_string())]);

        let url = url.without(&["cursor"]);
        assert_eq!(url.with("cursor", "20"), "/users?q=a+b&cursor=20");
        assert_eq!(url.render(), "/users?q=a+b");
    }

    #[test]
    fn test_missing_request_falls_back_to_root() {
        let url = PageUrl::from_request(None);
        assert_eq!(url.with("page", "2"), "/?page=2");
    }

    #[test]
    fn test_static_request_query_params() {
        let request = StaticRequest::new("http://localhost/posts?page=2&tag=rust");
        assert_eq!(
            request.query_params(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("tag".to_string(), "rust".to_string())
            ]
        );
    }
}
