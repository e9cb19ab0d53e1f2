//! Expands a representation's segment description into fragments.
//!
//! Two addressing schemes are supported:
//!
//! * `SegmentTemplate`, either with a `SegmentTimeline` or with a fixed `@duration`;
//! * `SegmentBase`, a single byte-range addressed file.

use std::str::FromStr;

use crate::{
    base_url::BaseUrl,
    error::{Dash2HlsError, Dash2HlsResult},
    mpd::ManifestNode,
    profile::Fragment,
    range::ByteRange,
    template::UrlTemplate,
};

/// What the expander needs to know about the representation being expanded.
pub(crate) struct SegmentContext<'a> {
    pub id: &'a str,
    pub bandwidth: u64,
    pub base: &'a BaseUrl,
    /// Whether the initialization segment should be emitted. It is only emitted
    /// the first time fragments are built for a profile id.
    pub initialization: bool,
    /// Period or presentation duration, in seconds.
    pub presentation_duration: Option<f64>,
}

/// `SegmentTemplate` attributes, looked up on the representation's template first
/// and on the adaptation set's template second.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TemplateScope<'a> {
    inner: Option<&'a ManifestNode>,
    outer: Option<&'a ManifestNode>,
}

impl<'a> TemplateScope<'a> {
    pub fn new(inner: Option<&'a ManifestNode>, outer: Option<&'a ManifestNode>) -> Option<Self> {
        (inner.is_some() || outer.is_some()).then_some(Self { inner, outer })
    }

    fn nodes(&self) -> impl Iterator<Item = &'a ManifestNode> {
        self.inner.into_iter().chain(self.outer)
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.nodes().find_map(|node| node.attr(name))
    }

    fn timeline(&self) -> Option<&'a ManifestNode> {
        self.nodes().find_map(|node| node.child("SegmentTimeline"))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TimelineEntry {
    t: Option<u64>,
    d: u64,
    r: i64,
}

#[derive(Debug, Clone)]
struct SegmentTemplate {
    start_number: u64,
    timescale: u64,
    media: String,
    initialization: Option<String>,
    timeline: Option<Vec<TimelineEntry>>,
    duration: Option<u64>,
}

fn parse_attr<T>(node_name: &str, name: &str, value: &str) -> Dash2HlsResult<T>
where
    T: FromStr,
{
    value.trim().parse().map_err(|_| {
        Dash2HlsError::content(format!("invalid {node_name}@{name}: {value:?}"))
    })
}

impl SegmentTemplate {
    fn from_scope(scope: &TemplateScope) -> Dash2HlsResult<Self> {
        let optional = |name: &str| -> Dash2HlsResult<Option<u64>> {
            scope
                .attr(name)
                .map(|value| parse_attr("SegmentTemplate", name, value))
                .transpose()
        };

        let start_number = optional("startNumber")?.unwrap_or(1);
        let timescale = optional("timescale")?
            .ok_or_else(|| Dash2HlsError::content("SegmentTemplate@timescale is required"))?;
        if timescale == 0 {
            return Err(Dash2HlsError::content("SegmentTemplate@timescale must be positive"));
        }
        let media = scope
            .attr("media")
            .ok_or_else(|| Dash2HlsError::content("SegmentTemplate@media is required"))?
            .to_string();
        let initialization = scope.attr("initialization").map(str::to_string);
        let duration = optional("duration")?;

        let timeline = match scope.timeline() {
            Some(timeline) => Some(
                timeline
                    .children("S")
                    .into_iter()
                    .map(TimelineEntry::from_node)
                    .collect::<Dash2HlsResult<Vec<_>>>()?,
            ),
            None => None,
        };

        Ok(Self {
            start_number,
            timescale,
            media,
            initialization,
            timeline,
            duration,
        })
    }

    fn extinf(&self, duration: u64) -> String {
        format_extinf(duration as f64 / self.timescale as f64)
    }
}

impl TimelineEntry {
    fn from_node(node: &ManifestNode) -> Dash2HlsResult<Self> {
        let d = node
            .attr("d")
            .ok_or_else(|| Dash2HlsError::content("SegmentTimeline/S@d is required"))?;
        Ok(Self {
            t: node.attr("t").map(|t| parse_attr("S", "t", t)).transpose()?,
            d: parse_attr("S", "d", d)?,
            r: node
                .attr("r")
                .map(|r| parse_attr("S", "r", r))
                .transpose()?
                .unwrap_or(0),
        })
    }

    /// How many fragments this entry stands for.
    ///
    /// A negative repeat count lasts until the next entry's start time, or until
    /// the end of the period for the last entry.
    fn count(
        &self,
        next: Option<&TimelineEntry>,
        timescale: u64,
        presentation_duration: Option<f64>,
    ) -> Dash2HlsResult<u64> {
        if self.r >= 0 {
            return Ok(self.r as u64 + 1);
        }
        if self.d == 0 {
            return Err(Dash2HlsError::content("SegmentTimeline/S@d must be positive"));
        }

        let start = self.t.unwrap_or(0);
        let end = match next.and_then(|next| next.t) {
            Some(end) => end,
            None => {
                let duration = presentation_duration.ok_or_else(|| {
                    Dash2HlsError::content("S@r=-1 on the last entry requires a period duration")
                })?;
                (duration * timescale as f64).round() as u64
            }
        };
        Ok(end.saturating_sub(start).div_ceil(self.d))
    }
}

pub(crate) fn format_extinf(seconds: f64) -> String {
    format!("{seconds:.3}")
}

/// Expands a `SegmentTemplate` into fragments.
pub(crate) fn expand_template(
    scope: &TemplateScope,
    context: &SegmentContext,
) -> Dash2HlsResult<Vec<Fragment>> {
    let template = SegmentTemplate::from_scope(scope)?;
    let mut url_template = UrlTemplate::new(context.id, context.bandwidth);
    let mut fragments = Vec::new();

    if context.initialization {
        if let Some(initialization) = template.initialization.as_deref() {
            // The initialization entry advertises timescale / 1000 as its duration.
            fragments.push(Fragment {
                range: ByteRange::FULL,
                extinf: format_extinf(template.timescale as f64 / 1000.0),
                media: context.base.resolve(&url_template.resolve(initialization))?,
            });
        }
    }

    match (&template.timeline, template.duration) {
        (Some(timeline), _) => {
            let mut emitted = 0;
            for (position, entry) in timeline.iter().enumerate() {
                let count = entry.count(
                    timeline.get(position + 1),
                    template.timescale,
                    context.presentation_duration,
                )?;
                // $Time$ is the end of the entry's first segment, shared by every repeat
                let time = entry.t.unwrap_or(0) + entry.d;
                let extinf = template.extinf(entry.d);
                log::trace!(
                    "Timeline entry #{position} of {}: {count} fragment(s) of {extinf}s",
                    context.id
                );

                for _ in 0..count {
                    let number = template.start_number + emitted;
                    emitted += 1;
                    let media = url_template.with_segment(number, time).resolve(&template.media);
                    fragments.push(Fragment {
                        range: ByteRange::FULL,
                        extinf: extinf.clone(),
                        media: context.base.resolve(&media)?,
                    });
                }
            }
        }
        (None, Some(duration)) if duration > 0 => {
            let total = context.presentation_duration.ok_or_else(|| {
                Dash2HlsError::content("SegmentTemplate@duration requires a period duration")
            })?;
            let count = (total * template.timescale as f64 / duration as f64).ceil() as u64;
            let extinf = template.extinf(duration);
            for index in 0..count {
                let media = url_template
                    .with_segment(template.start_number + index, index * duration)
                    .resolve(&template.media);
                fragments.push(Fragment {
                    range: ByteRange::FULL,
                    extinf: extinf.clone(),
                    media: context.base.resolve(&media)?,
                });
            }
        }
        _ => {
            return Err(Dash2HlsError::content(format!(
                "SegmentTemplate of representation {} has neither SegmentTimeline nor @duration",
                context.id
            )))
        }
    }

    Ok(fragments)
}

/// Expands a `SegmentBase` into its single fragment.
///
/// When an `Initialization@range` is present its start becomes the start of the
/// exposed range, while the duration is still taken from `@indexRange`.
pub(crate) fn expand_segment_base(
    segment_base: Option<&ManifestNode>,
    context: &SegmentContext,
) -> Dash2HlsResult<Vec<Fragment>> {
    let index_range = segment_base
        .and_then(|segment_base| segment_base.attr("indexRange"))
        .ok_or_else(|| {
            Dash2HlsError::content(format!(
                "representation {} has neither SegmentTemplate nor SegmentBase@indexRange",
                context.id
            ))
        })?;
    let index_range = ByteRange::parse(index_range)?;
    let end = index_range
        .end
        .ok_or_else(|| Dash2HlsError::content("SegmentBase@indexRange must be closed"))?;

    let mut range = index_range;
    if let Some(initialization) = segment_base
        .and_then(|segment_base| segment_base.child("Initialization"))
        .and_then(|initialization| initialization.attr("range"))
    {
        let start = ByteRange::parse(initialization)?.start;
        if start > end {
            return Err(Dash2HlsError::content(format!(
                "Initialization@range {initialization} starts after SegmentBase@indexRange end {end}"
            )));
        }
        range.start = start;
    }

    Ok(vec![Fragment {
        range,
        extinf: format_extinf((end - index_range.start) as f64 / 1000.0),
        media: context.base.media()?,
    }])
}
