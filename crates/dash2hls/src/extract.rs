use std::{collections::HashMap, str::FromStr};

use url::Url;

use crate::{
    base_url::BaseUrl,
    drm::DrmInfo,
    error::{Dash2HlsError, Dash2HlsResult},
    mpd::{parse_duration, Manifest, ManifestNode},
    profile::{MediaKind, Profile},
    timeline::{expand_segment_base, expand_template, SegmentContext, TemplateScope},
};

/// Attribute lookup on a representation, falling back to its adaptation set.
#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    representation: &'a ManifestNode,
    adaptation: &'a ManifestNode,
}

impl<'a> Scope<'a> {
    fn attr(&self, name: &str) -> Option<&'a str> {
        self.representation
            .attr(name)
            .or_else(|| self.adaptation.attr(name))
    }

    fn parse<T>(&self, name: &str) -> Dash2HlsResult<Option<T>>
    where
        T: FromStr,
    {
        self.attr(name)
            .map(|value| {
                value.trim().parse().map_err(|_| {
                    Dash2HlsError::content(format!("invalid Representation@{name}: {value:?}"))
                })
            })
            .transpose()
    }

    fn required<T>(&self, name: &str) -> Dash2HlsResult<T>
    where
        T: FromStr,
    {
        self.parse(name)?.ok_or_else(|| {
            Dash2HlsError::content(format!("Representation@{name} is required"))
        })
    }
}

/// Walks `MPD/Period/AdaptationSet/Representation` and builds one profile per
/// representation id.
pub(crate) struct ProfileExtractor<'a> {
    manifest: &'a Manifest,
    source: Option<&'a Url>,
    profiles: Vec<Profile>,
    index: HashMap<String, usize>,
}

impl<'a> ProfileExtractor<'a> {
    pub fn new(manifest: &'a Manifest, source: Option<&'a Url>) -> Self {
        Self {
            manifest,
            source,
            profiles: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn extract(mut self) -> Dash2HlsResult<Vec<Profile>> {
        let root = self.manifest.root();
        if root
            .descendants(&["Period", "AdaptationSet", "Representation"])
            .is_empty()
        {
            return Err(Dash2HlsError::content(
                "missing MPD/Period/AdaptationSet/Representation",
            ));
        }

        let base = BaseUrl::new(self.source).scoped(root);
        let presentation_duration = self.manifest.presentation_duration();

        for (period_index, period) in self.manifest.periods().into_iter().enumerate() {
            let base = base.scoped(period);
            let duration = period
                .attr("duration")
                .and_then(parse_duration)
                .or(presentation_duration);
            log::debug!("Extracting period #{period_index}");

            for adaptation in period.children("AdaptationSet") {
                let base = base.scoped(adaptation);
                for representation in adaptation.children("Representation") {
                    let scope = Scope {
                        representation,
                        adaptation,
                    };
                    let base = base.scoped(representation);
                    self.extract_representation(scope, &base, duration)?;
                }
            }
        }

        Ok(self.profiles)
    }

    fn extract_representation(
        &mut self,
        scope: Scope,
        base: &BaseUrl,
        presentation_duration: Option<f64>,
    ) -> Dash2HlsResult<()> {
        let Scope {
            representation,
            adaptation,
        } = scope;

        let id = representation
            .attr("id")
            .ok_or_else(|| Dash2HlsError::content("Representation@id is required"))?
            .to_string();
        let codecs = scope.attr("codecs").map(str::to_string);
        let mime_type = match scope.attr("mimeType") {
            Some(mime_type) => mime_type.to_string(),
            None if codecs.as_deref().is_some_and(|c| c.contains("avc")) => {
                "video/mp4".to_string()
            }
            None => "audio/m4a".to_string(),
        };
        if !mime_type.contains("video") && !mime_type.contains("audio") {
            log::warn!("Skipping representation {id} with unsupported type {mime_type}");
            return Ok(());
        }

        let bandwidth: u64 = scope.required("bandwidth")?;
        let start_with_sap = scope.attr("startWithSAP").unwrap_or("1").trim() != "0";

        let audio_sampling_rate = scope.attr("audioSamplingRate");
        let kind = if mime_type.contains("audio") || audio_sampling_rate.is_some() {
            MediaKind::Audio {
                audio_sampling_rate: audio_sampling_rate.map(str::to_string),
            }
        } else {
            let frame_rate = representation
                .attr("frameRate")
                .or_else(|| adaptation.attr("frameRate"))
                .or_else(|| adaptation.attr("maxFrameRate"))
                .unwrap_or("1/1");
            MediaKind::Video {
                width: scope.required("width")?,
                height: scope.required("height")?,
                frame_rate: parse_frame_rate(frame_rate)?,
                sar: scope.attr("sar").unwrap_or("1:1").to_string(),
            }
        };

        let representation_template = representation.child("SegmentTemplate");
        let adaptation_template = adaptation.child("SegmentTemplate");
        // ContentProtection follows the scope the SegmentTemplate was found in
        let drm = match representation_template {
            Some(_) => resolve_drm(representation, adaptation),
            None => resolve_drm(adaptation, representation),
        };

        let existing = self.index.get(&id).copied();
        let context = SegmentContext {
            id: &id,
            bandwidth,
            base,
            initialization: existing.is_none(),
            presentation_duration,
        };
        let fragments =
            match TemplateScope::new(representation_template, adaptation_template) {
                Some(template) => expand_template(&template, &context)?,
                None => expand_segment_base(
                    representation
                        .child("SegmentBase")
                        .or_else(|| adaptation.child("SegmentBase")),
                    &context,
                )?,
            };

        if let Some(position) = existing {
            log::debug!(
                "Merging {} fragment(s) into profile {id}",
                fragments.len()
            );
            self.profiles[position].merge(fragments, drm);
            return Ok(());
        }

        log::debug!(
            "Profile {id}: {mime_type}, {bandwidth}bps, {} fragment(s)",
            fragments.len()
        );
        self.index.insert(id.clone(), self.profiles.len());
        self.profiles.push(Profile {
            id,
            mime_type,
            codecs,
            bandwidth,
            start_with_sap,
            kind,
            drm,
            fragments,
        });
        Ok(())
    }
}

/// DRM of `primary`, or of `secondary` when `primary` declares none.
fn resolve_drm(primary: &ManifestNode, secondary: &ManifestNode) -> DrmInfo {
    let drm = DrmInfo::resolve(primary);
    if drm.is_empty() {
        DrmInfo::resolve(secondary)
    } else {
        drm
    }
}

/// Parses `num/den` or a bare number into frames per second, rounded to 3 decimals.
fn parse_frame_rate(frame_rate: &str) -> Dash2HlsResult<f64> {
    let invalid = || Dash2HlsError::content(format!("invalid frame rate: {frame_rate:?}"));
    let (numerator, denominator) = frame_rate.trim().split_once('/').unwrap_or((frame_rate, "1"));
    let numerator: f64 = numerator.trim().parse().map_err(|_| invalid())?;
    let denominator: f64 = denominator.trim().parse().map_err(|_| invalid())?;
    if denominator == 0.0 {
        return Err(invalid());
    }
    Ok((numerator / denominator * 1000.0).round() / 1000.0)
}
