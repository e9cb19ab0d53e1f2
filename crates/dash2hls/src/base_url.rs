use url::Url;

use crate::error::{Dash2HlsError, Dash2HlsResult};
use crate::mpd::ManifestNode;

pub(crate) fn is_absolute_url(s: &str) -> bool {
    s.starts_with("http://")
        || s.starts_with("https://")
        || s.starts_with("file://")
        || s.starts_with("ftp://")
}

/// Joins a relative path onto a base, stripping the trailing slash of the base.
pub(crate) fn join_base(base: &str, relative: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), relative)
}

/// The manifest URL with its last path segment, query and fragment removed.
///
/// `https://example.com/vod/manifest.mpd?token=1` => `https://example.com/vod`
pub fn manifest_directory(manifest: &Url) -> String {
    let mut directory = manifest.clone();
    directory.set_query(None);
    directory.set_fragment(None);
    if let Ok(mut segments) = directory.path_segments_mut() {
        segments.pop();
    }
    directory.as_str().trim_end_matches('/').to_string()
}

/// The chain of `BaseURL` scopes that apply to one representation.
///
/// Resolved fresh for every representation, so a `BaseURL` declared on one
/// representation never leaks into its siblings.
#[derive(Debug, Clone)]
pub(crate) struct BaseUrl {
    base: Option<String>,
    /// Whether any `BaseURL` element contributed to `base`.
    declared: bool,
}

impl BaseUrl {
    pub(crate) fn new(manifest: Option<&Url>) -> Self {
        Self {
            base: manifest.map(manifest_directory),
            declared: false,
        }
    }

    /// Applies the first `BaseURL` child of `node`, if any.
    ///
    /// An absolute `BaseURL` replaces the current base, a relative one is joined
    /// onto it. A relative `BaseURL` with nothing to join onto leaves the base
    /// unresolved.
    pub(crate) fn scoped(&self, node: &ManifestNode) -> Self {
        let Some(declared) = node.child("BaseURL").and_then(|b| b.text()) else {
            return self.clone();
        };

        let base = if is_absolute_url(declared) {
            Some(declared.to_string())
        } else {
            self.base.as_deref().map(|base| join_base(base, declared))
        };
        Self {
            base,
            declared: true,
        }
    }

    /// Resolves a media or initialization url against this base.
    pub(crate) fn resolve(&self, target: &str) -> Dash2HlsResult<String> {
        if is_absolute_url(target) {
            return Ok(target.to_string());
        }
        match self.base.as_deref() {
            Some(base) => Ok(join_base(base, target)),
            None => Err(Dash2HlsError::MissingRemoteUrl(target.to_string())),
        }
    }

    /// The url of a single-file representation addressed by `SegmentBase`.
    pub(crate) fn media(&self) -> Dash2HlsResult<String> {
        if !self.declared {
            return Err(Dash2HlsError::content(
                "SegmentBase representation without BaseURL",
            ));
        }
        self.base
            .clone()
            .ok_or_else(|| Dash2HlsError::MissingRemoteUrl("BaseURL".to_string()))
    }
}
