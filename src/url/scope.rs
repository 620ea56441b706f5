use crate::UrlError;
use url::Url;

/// The scheme + host + port (and optional path prefix) bounding a crawl
///
/// Fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseOrigin {
    scheme: String,
    host: String,
    port: Option<u16>,
    path_prefix: Option<String>,
}

impl BaseOrigin {
    /// Derives the base origin from the seed URL
    ///
    /// # Arguments
    ///
    /// * `seed` - The already-normalized seed URL
    /// * `path_prefix` - Optional path the crawl must stay under (e.g. `/docs`)
    pub fn from_seed(seed: &Url, path_prefix: Option<&str>) -> Result<Self, UrlError> {
        let host = seed.host_str().ok_or(UrlError::MissingDomain)?;

        let path_prefix = path_prefix
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
            .map(|p| {
                if p.starts_with('/') {
                    p.to_string()
                } else {
                    format!("/{}", p)
                }
            });

        Ok(Self {
            scheme: seed.scheme().to_string(),
            host: host.to_lowercase(),
            port: seed.port_or_known_default(),
            path_prefix,
        })
    }

    /// Returns true if `url` is in scope
    ///
    /// With a path prefix, `/docs` matches `/docs` and `/docs/intro` but not
    /// `/docsearch`.
    pub fn contains(&self, url: &Url) -> bool {
        let same_origin = url.scheme() == self.scheme
            && url
                .host_str()
                .map(|h| h.eq_ignore_ascii_case(&self.host))
                .unwrap_or(false)
            && url.port_or_known_default() == self.port;

        if !same_origin {
            return false;
        }

        match &self.path_prefix {
            None => true,
            Some(prefix) => {
                let path = url.path();
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .map(|rest| rest.starts_with('/'))
                        .unwrap_or(false)
            }
        }
    }

}

impl std::fmt::Display for BaseOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            let default = match self.scheme.as_str() {
                "http" => Some(80),
                "https" => Some(443),
                _ => None,
            };
            if Some(port) != default {
                write!(f, ":{}", port)?;
            }
        }
        if let Some(prefix) = &self.path_prefix {
            write!(f, "{}", prefix)?;
        }
        Ok(())
    }
}
