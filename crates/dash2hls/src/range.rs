use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};

use crate::error::{Dash2HlsError, Dash2HlsResult};

/// An inclusive byte range, `start-end`, or `start-` when open ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    /// The whole resource, `0-`.
    pub const FULL: ByteRange = ByteRange {
        start: 0,
        end: None,
    };

    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// The byte range shall be expressed and formatted as a byte-range-spec as defined in
    /// IETF RFC 7233:2014, subclause 2.1. It is restricted to a single expression identifying
    /// a contiguous range of bytes.
    pub fn parse<S>(s: S) -> Dash2HlsResult<Self>
    where
        S: AsRef<str>,
    {
        let s = s.as_ref();
        let invalid = || Dash2HlsError::content(format!("Invalid byte range: {s}"));

        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        let start = start.trim().parse::<u64>().map_err(|_| invalid())?;
        let end = match end.trim() {
            "" => None,
            end => Some(end.parse::<u64>().map_err(|_| invalid())?),
        };
        if end.is_some_and(|end| end < start) {
            return Err(invalid());
        }

        Ok(Self { start, end })
    }

    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }
}

impl Display for ByteRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

impl Serialize for ByteRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
