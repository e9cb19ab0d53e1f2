use serde::Serialize;

use crate::mpd::ManifestNode;

pub const WIDEVINE_SYSTEM_ID: &str = "edef8ba9-79d6-4ace-a3c8-27dcd51d21ed";
pub const PLAYREADY_SYSTEM_ID: &str = "9a04f079-9840-4286-ab92-e65be0885f95";

/// `KEYFORMAT` advertised for Widevine keys in HLS.
pub const WIDEVINE_KEY_FORMAT: &str = "urn:uuid:edef8ba9-79d6-4ace-a3c8-27dcd51d21ed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrmKey {
    Kid,
    Widevine,
    PlayReady,
    License,
}

impl DrmKey {
    fn is_protection_data(self) -> bool {
        matches!(self, Self::Widevine | Self::PlayReady)
    }
}

/// Encryption metadata gathered from `ContentProtection` elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrmInfo {
    /// `cenc:default_KID`, lower-cased.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Widevine `cenc:pssh`, base64.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widevine: Option<String>,
    /// PlayReady object (`mspr:pro`) or PlayReady pssh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playready: Option<String>,
    /// License acquisition url (`ms:laurl`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl DrmInfo {
    /// Collects the DRM metadata of every `ContentProtection` child of `node`.
    ///
    /// A key already found in an earlier element is never overwritten.
    pub fn resolve(node: &ManifestNode) -> Self {
        let mut drm = Self::default();
        for protection in node.children("ContentProtection") {
            drm.fill_from(Self::from_protection(protection));
        }
        drm
    }

    /// Reads a single `ContentProtection` element.
    ///
    /// The element name decides the key first. When the scheme uuid names
    /// Widevine or PlayReady, protection data found under a different element
    /// name is filed under the scheme's key instead, and only where the element
    /// itself did not already provide one.
    fn from_protection(protection: &ManifestNode) -> Self {
        let scheme = protection.attr("schemeIdUri").and_then(scheme_key);

        let mut drm = Self::default();
        let mut overrides = Vec::new();
        for (key, value) in protection_values(protection) {
            match scheme {
                Some(scheme) if key.is_protection_data() && key != scheme => {
                    overrides.push((scheme, value))
                }
                _ => drm.fill(key, value),
            }
        }
        for (key, value) in overrides {
            drm.fill(key, value);
        }
        drm
    }

    pub fn is_empty(&self) -> bool {
        self.kid.is_none()
            && self.widevine.is_none()
            && self.playready.is_none()
            && self.license.is_none()
    }

    pub fn get(&self, key: DrmKey) -> Option<&str> {
        match key {
            DrmKey::Kid => self.kid.as_deref(),
            DrmKey::Widevine => self.widevine.as_deref(),
            DrmKey::PlayReady => self.playready.as_deref(),
            DrmKey::License => self.license.as_deref(),
        }
    }

    fn slot(&mut self, key: DrmKey) -> &mut Option<String> {
        match key {
            DrmKey::Kid => &mut self.kid,
            DrmKey::Widevine => &mut self.widevine,
            DrmKey::PlayReady => &mut self.playready,
            DrmKey::License => &mut self.license,
        }
    }

    fn fill(&mut self, key: DrmKey, value: String) {
        self.slot(key).get_or_insert(value);
    }

    fn fill_from(&mut self, other: DrmInfo) {
        for key in [DrmKey::Kid, DrmKey::Widevine, DrmKey::PlayReady, DrmKey::License] {
            if let Some(value) = other.get(key) {
                self.fill(key, value.to_string());
            }
        }
    }
}

fn protection_values(protection: &ManifestNode) -> Vec<(DrmKey, String)> {
    let mut values = Vec::new();
    if let Some(kid) = protection.attr("cenc:default_KID") {
        values.push((DrmKey::Kid, kid.trim().to_lowercase()));
    }
    if let Some(pssh) = protection.child("cenc:pssh").and_then(|p| p.text()) {
        values.push((DrmKey::Widevine, pssh.to_string()));
    }
    if let Some(pro) = protection.child("mspr:pro").and_then(|p| p.text()) {
        values.push((DrmKey::PlayReady, pro.to_string()));
    }
    if let Some(laurl) = protection.child("ms:laurl") {
        if let Some(license) = laurl.text().or_else(|| laurl.attr("licenseUrl")) {
            values.push((DrmKey::License, license.to_string()));
        }
    }
    values
}

/// Lower-cased hex digits of a uuid, without the `urn:uuid:` prefix or dashes.
fn normalize_uuid(uuid: &str) -> String {
    let uuid = uuid.trim().to_ascii_lowercase();
    let uuid = uuid.strip_prefix("urn:uuid:").unwrap_or(&uuid);
    uuid.chars().filter(|c| c.is_ascii_hexdigit()).collect()
}

fn scheme_key(scheme_id_uri: &str) -> Option<DrmKey> {
    let scheme = normalize_uuid(scheme_id_uri);
    if scheme == normalize_uuid(WIDEVINE_SYSTEM_ID) {
        Some(DrmKey::Widevine)
    } else if scheme == normalize_uuid(PLAYREADY_SYSTEM_ID) {
        Some(DrmKey::PlayReady)
    } else {
        None
    }
}
