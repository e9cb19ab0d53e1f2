//! # dash2hls
//!
//! Converts an MPEG-DASH manifest into HLS media playlists.
//!
//! ```text
//!  MPD text ──► Manifest ──► ProfileExtractor ──► ProfileSet ──► PlaylistRenderer ──► m3u8
//!                               │        │
//!                     DrmInfo::resolve   timeline::expand_*
//! ```
//!
//! Every `Representation` of the manifest becomes a [`Profile`]. Representations
//! that share an id across periods are merged into one profile whose fragments
//! are the concatenation of every period's fragments.
//!
//! ```no_run
//! # fn run() -> dash2hls::error::Dash2HlsResult<()> {
//! use dash2hls::ProfileSet;
//!
//! let text = std::fs::read_to_string("manifest.mpd")?;
//! let source = "https://example.com/vod/manifest.mpd".parse()?;
//! let profiles = ProfileSet::load(&text, Some(&source))?;
//! let playlist = profiles.build_playlist("0", None)?;
//! # Ok(())
//! # }
//! ```

pub mod drm;
pub mod error;
pub mod key;
pub mod mpd;
pub mod playlist;
pub mod profile;
pub mod range;
pub mod template;

mod base_url;
mod extract;
mod timeline;

#[cfg(feature = "fetch")]
pub mod fetch;

pub use base_url::manifest_directory;
pub use drm::DrmInfo;
pub use error::{Dash2HlsError, Dash2HlsResult};
pub use key::ExplicitKey;
pub use playlist::PlaylistRenderer;
pub use profile::{Fragment, MediaKind, Profile};
pub use range::ByteRange;
pub use url::Url;

use mpd::Manifest;
use serde::Serialize;

/// Every profile extracted from one manifest, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProfileSet {
    profiles: Vec<Profile>,
}

impl ProfileSet {
    /// Parses `text` and extracts its profiles.
    ///
    /// `source` is the url the manifest was fetched from. Relative templates are
    /// resolved against its directory when the manifest declares no `BaseURL`.
    pub fn load(text: &str, source: Option<&Url>) -> Dash2HlsResult<Self> {
        let manifest = Manifest::parse(text)?;
        Self::from_manifest(&manifest, source)
    }

    pub fn from_manifest(manifest: &Manifest, source: Option<&Url>) -> Dash2HlsResult<Self> {
        let profiles = extract::ProfileExtractor::new(manifest, source).extract()?;
        log::debug!("Extracted {} profile(s)", profiles.len());
        Ok(Self { profiles })
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Profile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, profile_id: &str) -> Dash2HlsResult<&Profile> {
        self.profiles
            .iter()
            .find(|profile| profile.id == profile_id)
            .ok_or_else(|| Dash2HlsError::InvalidProfile(profile_id.to_string()))
    }

    /// The video profile with the highest bandwidth, or the first profile when
    /// the manifest has no video.
    pub fn default_profile(&self) -> Option<&Profile> {
        self.profiles
            .iter()
            .filter(|profile| profile.is_video())
            .rev()
            .max_by_key(|profile| profile.bandwidth)
            .or_else(|| self.profiles.first())
    }

    /// Renders the HLS media playlist of `profile_id`.
    pub fn build_playlist(
        &self,
        profile_id: &str,
        key: Option<&ExplicitKey>,
    ) -> Dash2HlsResult<String> {
        let profile = self.get(profile_id)?;
        Ok(PlaylistRenderer::new(profile).with_key(key).render())
    }

    /// The fragment urls of `profile_id`, in playback order.
    pub fn media_urls(&self, profile_id: &str) -> Dash2HlsResult<Vec<String>> {
        Ok(self.get(profile_id)?.media_urls())
    }
}

impl<'a> IntoIterator for &'a ProfileSet {
    type Item = &'a Profile;
    type IntoIter = std::slice::Iter<'a, Profile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

/// Parses and extracts a manifest. See [`ProfileSet::load`].
pub fn load(text: &str, source: Option<&Url>) -> Dash2HlsResult<ProfileSet> {
    ProfileSet::load(text, source)
}

/// Renders the playlist of one profile. See [`ProfileSet::build_playlist`].
pub fn build_playlist(
    profiles: &ProfileSet,
    profile_id: &str,
    key: Option<&ExplicitKey>,
) -> Dash2HlsResult<String> {
    profiles.build_playlist(profile_id, key)
}

/// Lists the fragment urls of one profile. See [`ProfileSet::media_urls`].
pub fn list_media_urls(profiles: &ProfileSet, profile_id: &str) -> Dash2HlsResult<Vec<String>> {
    profiles.media_urls(profile_id)
}
