//! # Manifest tree
//!
//! The MPD is parsed into a generic element tree rather than typed structs: the
//! extractor only needs attribute and child lookups, and real-world manifests
//! routinely omit, repeat or namespace elements in ways a strict schema rejects.

mod node;

pub use node::ManifestNode;

use crate::error::{Dash2HlsError, Dash2HlsResult};

/// A parsed `MPD` document.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    root: ManifestNode,
}

impl Manifest {
    pub fn parse(input: &str) -> Dash2HlsResult<Self> {
        let root = ManifestNode::parse(input)?;
        if !root.is("MPD") {
            return Err(Dash2HlsError::content(format!(
                "root element is <{}>, expected <MPD>",
                root.name()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &ManifestNode {
        &self.root
    }

    pub fn periods(&self) -> Vec<&ManifestNode> {
        self.root.children("Period")
    }

    /// `MPD@mediaPresentationDuration` in seconds.
    pub fn presentation_duration(&self) -> Option<f64> {
        self.root
            .attr("mediaPresentationDuration")
            .and_then(parse_duration)
    }
}

/// Parses an ISO-8601 duration such as `PT1H2M3.5S` into seconds.
pub(crate) fn parse_duration(value: &str) -> Option<f64> {
    let duration = iso8601_duration::Duration::parse(value).ok()?;
    duration.to_std().map(|d| d.as_secs_f64())
}
