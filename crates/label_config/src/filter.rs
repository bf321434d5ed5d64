use url::Url;

/// A navigation filter: the full URL must start with `url_prefix` and its path must
/// contain `path_contains`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlFilter {
    pub url_prefix: String,
    pub path_contains: String,
}

impl UrlFilter {
    pub fn new(url_prefix: &str, path_contains: &str) -> Self {
        Self {
            url_prefix: url_prefix.to_owned(),
            path_contains: path_contains.to_owned(),
        }
    }

    pub fn matches(&self, url: &Url) -> bool {
        url.as_str().starts_with(&self.url_prefix) && url.path().contains(&self.path_contains)
    }
}
