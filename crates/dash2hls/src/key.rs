use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{Dash2HlsError, Dash2HlsResult};

/// A clear key supplied by the user, `<kid>:<key>` in hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitKey {
    kid: String,
    key: Vec<u8>,
}

impl ExplicitKey {
    pub fn new(kid: &str, key: &str) -> Dash2HlsResult<Self> {
        let kid = kid.trim();
        let key = key.trim();
        if !is_valid_hex(kid) {
            return Err(Dash2HlsError::InvalidKey(format!("invalid key id: {kid}")));
        }
        if !is_valid_hex(key) {
            return Err(Dash2HlsError::InvalidKey(format!("invalid key: {key}")));
        }

        Ok(Self {
            kid: kid.to_ascii_lowercase(),
            key: hex::decode(key)?,
        })
    }

    /// Key id in upper-case hex, as HLS `KEYID` expects it.
    pub fn kid_hex(&self) -> String {
        self.kid.to_ascii_uppercase()
    }

    /// `data:` uri carrying the raw key bytes.
    pub fn data_uri(&self) -> String {
        format!("data:text/plain;base64,{}", STANDARD.encode(&self.key))
    }
}

impl FromStr for ExplicitKey {
    type Err = Dash2HlsError;

    /// Parses `<kid>:<key>`. Several pairs may be given as `<kid>:<key>;<kid>:<key>`,
    /// only the first one is kept.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pair = s
            .split(';')
            .map(str::trim)
            .find(|pair| !pair.is_empty())
            .ok_or_else(|| Dash2HlsError::InvalidKey(s.to_string()))?;
        if pair.len() != s.trim().len() {
            log::debug!("Multiple keys provided, using the first one.");
        }

        let (kid, key) = pair
            .split_once(':')
            .ok_or_else(|| Dash2HlsError::InvalidKey(s.to_string()))?;
        Self::new(kid, key)
    }
}

fn is_valid_hex(s: &str) -> bool {
    !s.is_empty() && s.len() % 2 == 0 && s.chars().all(|c| c.is_ascii_hexdigit())
}
