use std::collections::HashMap;

use crate::{drm::WIDEVINE_KEY_FORMAT, key::ExplicitKey, profile::Profile};

const ZERO_IV: &str = "0x00000000000000000000000000000000";

/// Renders a profile as an HLS VOD media playlist.
pub struct PlaylistRenderer<'a> {
    profile: &'a Profile,
    key: Option<&'a ExplicitKey>,
}

impl<'a> PlaylistRenderer<'a> {
    pub fn new(profile: &'a Profile) -> Self {
        Self { profile, key: None }
    }

    /// Encrypt the playlist with a clear key instead of the manifest's license url.
    pub fn with_key(mut self, key: Option<&'a ExplicitKey>) -> Self {
        self.key = key;
        self
    }

    pub fn media_sequence(&self) -> u64 {
        if self.profile.fragments.len() == 1 {
            0
        } else {
            1
        }
    }

    /// The most frequent fragment duration, rounded down.
    ///
    /// Using the mode instead of the maximum keeps a single long entry, such as
    /// the initialization segment, from inflating the advertised duration.
    pub fn target_duration(&self) -> u64 {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, fragment) in self.profile.fragments.iter().enumerate() {
            counts.entry(fragment.extinf.as_str()).or_insert((0, position)).0 += 1;
        }

        counts
            .into_iter()
            .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                // ties go to the value seen first
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            })
            .and_then(|(extinf, _)| extinf.parse::<f64>().ok())
            .map(|duration| duration.floor() as u64)
            .unwrap_or_default()
    }

    fn key_tag(&self) -> Option<String> {
        if let Some(key) = self.key {
            return Some(format!(
                r#"#EXT-X-KEY:METHOD=SAMPLE-AES-CTR,URI="{}",KEYID=0x{},IV={ZERO_IV},KEYFORMATVERSIONS="1",KEYFORMAT="{WIDEVINE_KEY_FORMAT}""#,
                key.data_uri(),
                key.kid_hex(),
            ));
        }

        self.profile
            .drm
            .license
            .as_deref()
            .map(|license| format!(r#"#EXT-X-KEY:METHOD=SAMPLE-AES,URI="{license}""#))
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            "#EXTM3U".to_string(),
            "#EXT-X-VERSION:6".to_string(),
            format!("#EXT-X-MEDIA-SEQUENCE:{}", self.media_sequence()),
            format!("#EXT-X-TARGETDURATION:{}", self.target_duration()),
            "#EXT-X-PLAYLIST-TYPE:VOD".to_string(),
            "#EXT-X-ALLOW-CACHE:YES".to_string(),
        ];
        if let Some(key) = self.key_tag() {
            lines.push(key);
        }
        for fragment in &self.profile.fragments {
            lines.push(format!("#EXTINF:{},", fragment.extinf));
            lines.push(fragment.media.clone());
        }
        lines.push("#EXT-X-ENDLIST".to_string());
        lines.join("\n")
    }
}
