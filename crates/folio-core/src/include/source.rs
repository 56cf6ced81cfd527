// crates/folio-core/src/include/source.rs
// Fragment fetching and the same-origin policy for include sources

use async_trait::async_trait;
use url::Url;

use crate::error::{FetchError, IncludeError};

/// Fetches fragment text. Non-2xx responses are `FetchError::Status`.
#[async_trait(?Send)]
pub trait FragmentSource {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Resolve `src` against the page URL and refuse foreign origins that are
/// not allow-listed.
pub fn resolve_source(base: &str, src: &str, allowed: &[String]) -> Result<Url, IncludeError> {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        return Err(IncludeError::InvalidSource {
            src: src.to_string(),
            reason: "empty".to_string(),
        });
    }

    let base = Url::parse(base).map_err(|e| IncludeError::InvalidSource {
        src: src.to_string(),
        reason: format!("page url: {}", e),
    })?;
    let url = base.join(trimmed).map_err(|e| IncludeError::InvalidSource {
        src: src.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(IncludeError::InvalidSource {
            src: src.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }

    let origin = url.origin();
    if origin == base.origin() {
        return Ok(url);
    }

    let listed = allowed
        .iter()
        .filter_map(|o| Url::parse(o).ok())
        .any(|o| o.origin() == origin);
    if listed {
        Ok(url)
    } else {
        Err(IncludeError::CrossOrigin {
            src: src.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://folio.example.com/work/index.html";

    #[test]
    fn relative_paths_resolve_against_page() {
        let url = resolve_source(BASE, "partials/header.html", &[]).unwrap();
        assert_eq!(url.as_str(), "https://folio.example.com/work/partials/header.html");

        let url = resolve_source(BASE, "/partials/footer.html", &[]).unwrap();
        assert_eq!(url.as_str(), "https://folio.example.com/partials/footer.html");
    }

    #[test]
    fn foreign_origin_is_refused() {
        let err = resolve_source(BASE, "https://evil.example.net/x.html", &[]).unwrap_err();
        assert!(matches!(err, IncludeError::CrossOrigin { .. }));
    }

    #[test]
    fn allow_listed_origin_passes() {
        let allowed = vec!["https://cdn.example.com".to_string()];
        assert!(resolve_source(BASE, "https://cdn.example.com/nav.html", &allowed).is_ok());
    }

    #[test]
    fn script_urls_are_invalid() {
        let err = resolve_source(BASE, "javascript:alert(1)", &[]).unwrap_err();
        assert!(matches!(err, IncludeError::InvalidSource { .. }));
    }

    #[test]
    fn blank_source_is_invalid() {
        assert!(matches!(
            resolve_source(BASE, "  ", &[]),
            Err(IncludeError::InvalidSource { .. })
        ));
    }
}
