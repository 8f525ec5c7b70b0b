//! Trailing slash normalization.
//!
//! # Responsibilities
//! - Strip trailing `?` left over from truncated URLs
//! - Append a missing trailing slash to the path part
//! - Decide whether the appended slash warrants a redirect
//!
//! # Design Decisions
//! - Options come from one comma-separated string (`ifNotFile`, `redirect`,
//!   `redirect[30x]`); unknown items are ignored here, flagged by validation
//! - A redirect is only issued when the exact emitted target stays on the
//!   current site
//! - The normalizer never halts anything itself; it returns a decision

use url::Url;

/// Host used to resolve relative targets when checking for same-site URLs.
const SITE_PROBE: &str = "http://same-site.invalid/";

/// Redirect codes accepted in `redirect[...]`.
const REDIRECT_CODES: [u16; 4] = [301, 302, 303, 307];

const DEFAULT_REDIRECT_CODE: u16 = 301;

/// Parsed `append_missing_slash` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlashOptions {
    /// Leave paths whose last segment looks like `name.ext` alone.
    pub if_not_file: bool,
    /// Redirect with this status instead of appending silently.
    pub redirect: Option<u16>,
}

impl SlashOptions {
    /// Parse the option string; returns the options and unrecognized items.
    pub fn parse(raw: &str) -> (Self, Vec<String>) {
        let mut options = Self::default();
        let mut unknown = Vec::new();

        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if item == "ifNotFile" {
                options.if_not_file = true;
            } else if let Some(code) = parse_redirect(item) {
                options.redirect.get_or_insert(code);
            } else {
                unknown.push(item.to_string());
            }
        }
        (options, unknown)
    }
}

/// `redirect` → 301, `redirect[302]` → 302, anything else → None.
fn parse_redirect(item: &str) -> Option<u16> {
    let rest = item.strip_prefix("redirect")?;
    if rest.is_empty() {
        return Some(DEFAULT_REDIRECT_CODE);
    }
    let code: u16 = rest.strip_prefix('[')?.strip_suffix(']')?.parse().ok()?;
    REDIRECT_CODES.contains(&code).then_some(code)
}

/// A redirect the transport layer should emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub code: u16,
}

/// Result of normalizing one speaking URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub uri: String,
    pub appended_slash: bool,
    pub redirect: Option<Redirect>,
}

/// Applies the trailing slash policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlashNormalizer {
    options: SlashOptions,
}

impl SlashNormalizer {
    pub fn new(options: SlashOptions) -> Self {
        Self { options }
    }

    /// Build from the raw option string, ignoring unknown items.
    pub fn from_config(raw: &str) -> Self {
        Self::new(SlashOptions::parse(raw).0)
    }

    /// Normalize a speaking URI (no leading slash, optional `?query`).
    pub fn normalize(&self, uri: &str) -> Normalized {
        let uri = uri.trim_end_matches('?');
        let (path, query) = match uri.find('?') {
            Some(i) => uri.split_at(i),
            None => (uri, ""),
        };

        let unchanged = || Normalized {
            uri: uri.to_string(),
            appended_slash: false,
            redirect: None,
        };

        if path.is_empty() || path.ends_with('/') {
            return unchanged();
        }
        if self.options.if_not_file && looks_like_file(path) {
            return unchanged();
        }

        let normalized = format!("{path}/{query}");
        let redirect = self.options.redirect.and_then(|code| {
            let target = format!("/{normalized}");
            if is_same_site(&target) {
                Some(Redirect { target, code })
            } else {
                tracing::warn!(target_url = %target, "Refusing slash redirect to a foreign host");
                None
            }
        });

        Normalized {
            uri: normalized,
            appended_slash: true,
            redirect,
        }
    }
}

/// Last segment has the shape `name.ext`.
fn looks_like_file(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < last.len())
}

/// Resolve a site-relative URI against a placeholder origin.
///
/// `None` means the URI cannot be parsed at all.
pub(crate) fn resolve_on_site(candidate: &str) -> Option<Url> {
    Url::parse(SITE_PROBE).ok()?.join(candidate).ok()
}

/// True when `candidate`, resolved against the current site, stays on it.
fn is_same_site(candidate: &str) -> bool {
    let (Some(url), Ok(base)) = (resolve_on_site(candidate), Url::parse(SITE_PROBE)) else {
        return false;
    };
    url.scheme() == base.scheme() && url.host_str() == base.host_str()
}
