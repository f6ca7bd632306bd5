//! Turns a `url` and optional `base_url` into one absolute URL.
//!
//! A URL without a scheme is coerced to `http://`, so `api.example.com/pets`
//! resolves to `http://api.example.com/pets`. Only `http` and `https` with
//! a non-empty host are accepted. An input that is already absolute comes
//! back unchanged.

use url::Url;

use crate::error::RequestError;

pub fn resolve(base_url: Option<&str>, url: &str) -> Result<String, RequestError> {
    match base_url.map(str::trim).filter(|b| !b.is_empty()) {
        Some(base) => {
            let base = coerce_absolute(base.trim_end_matches('/'))?;
            let base = base.trim_end_matches('/');
            let path = url.trim();
            let joined = if path.starts_with('/') {
                format!("{base}{path}")
            } else {
                format!("{base}/{path}")
            };
            coerce_absolute(&joined)
        }
        None => coerce_absolute(url),
    }
}

fn coerce_absolute(raw: &str) -> Result<String, RequestError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RequestError::InputValidation("URL is empty".to_string()));
    }
    if raw.starts_with('/') {
        return Err(RequestError::InputValidation(format!(
            "`{raw}` is a path; a base URL with a hostname is required"
        )));
    }

    let candidate = if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| RequestError::InputValidation(format!("invalid URL `{raw}`: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RequestError::InputValidation(format!(
            "unsupported URL scheme `{}`",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(RequestError::InputValidation(format!(
            "URL `{raw}` has no hostname"
        )));
    }
    Ok(candidate)
}

/// Whether `raw` opens with `scheme://`. A `://` further along, say in a
/// query string, does not count.
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
