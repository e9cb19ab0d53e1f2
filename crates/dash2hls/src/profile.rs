use serde::Serialize;

use crate::{drm::DrmInfo, range::ByteRange};

/// One HLS segment entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    /// `0-` unless the fragment is addressed by `SegmentBase`.
    pub range: ByteRange,
    /// Duration in seconds, formatted with exactly 3 decimals.
    pub extinf: String,
    /// Fully resolved url.
    pub media: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaKind {
    #[serde(rename_all = "camelCase")]
    Video {
        width: u64,
        height: u64,
        /// Frames per second, rounded to 3 decimals.
        frame_rate: f64,
        sar: String,
    },
    #[serde(rename_all = "camelCase")]
    Audio { audio_sampling_rate: Option<String> },
}

/// One playable rendition, built from a DASH `Representation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub mime_type: String,
    pub codecs: Option<String>,
    /// Bits per second.
    pub bandwidth: u64,
    pub start_with_sap: bool,
    #[serde(flatten)]
    pub kind: MediaKind,
    pub drm: DrmInfo,
    pub fragments: Vec<Fragment>,
}

impl Profile {
    pub fn is_video(&self) -> bool {
        matches!(self.kind, MediaKind::Video { .. })
    }

    pub fn is_audio(&self) -> bool {
        matches!(self.kind, MediaKind::Audio { .. })
    }

    /// `WIDTHxHEIGHT` for video, the sampling rate for audio.
    pub fn quality(&self) -> String {
        match &self.kind {
            MediaKind::Video { width, height, .. } => format!("{width}x{height}"),
            MediaKind::Audio {
                audio_sampling_rate,
            } => audio_sampling_rate.clone().unwrap_or_default(),
        }
    }

    pub fn media_urls(&self) -> Vec<String> {
        self.fragments.iter().map(|f| f.media.clone()).collect()
    }

    /// Folds the fragments of a later period into this profile.
    pub(crate) fn merge(&mut self, fragments: Vec<Fragment>, drm: DrmInfo) {
        self.fragments.extend(fragments);
        if self.drm.is_empty() {
            self.drm = drm;
        }
    }
}
