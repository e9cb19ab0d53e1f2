// References:
// 1. https://github.com/clitic/vsd/blob/30ca1985e4a467ea3304b11c08d3176deaafd22a/vsd/src/dash/template.rs
// 2. https://github.com/emarsden/dash-mpd-rs/blob/6ebdfb4759adbda8233b5b3520804e23ff86e7de/src/fetch.rs#L435-L466

use regex::{Captures, Regex, Replacer};
use std::{collections::HashMap, sync::LazyLock};

// From https://dashif.org/docs/DASH-IF-IOP-v4.3.pdf:
// "For the avoidance of doubt, only %0[width]d is permitted and no other identifiers."
//
// Example template: "$RepresentationID$/$Number%06d$.m4s"
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:(RepresentationID|Number|Time|Bandwidth)(?:%0(\d+)d)?)?\$")
        .expect("template regex is valid")
});

/// Widths above this are left untouched, like an unknown placeholder.
const MAX_WIDTH: usize = 32;

/// Values substituted into `SegmentTemplate@media` and `@initialization`.
#[derive(Debug, Clone, Default)]
pub struct UrlTemplate {
    args: HashMap<&'static str, String>,
}

impl UrlTemplate {
    pub const REPRESENTATION_ID: &'static str = "RepresentationID";
    pub const NUMBER: &'static str = "Number";
    pub const TIME: &'static str = "Time";
    pub const BANDWIDTH: &'static str = "Bandwidth";

    pub fn new(representation_id: &str, bandwidth: u64) -> Self {
        let mut template = Self {
            args: HashMap::with_capacity(4),
        };
        template.insert(Self::REPRESENTATION_ID, representation_id.to_string());
        template.insert(Self::BANDWIDTH, bandwidth.to_string());
        template
    }

    pub fn insert(&mut self, key: &'static str, value: String) {
        self.args.insert(key, value);
    }

    pub fn with_segment(&mut self, number: u64, time: u64) -> &mut Self {
        self.insert(Self::NUMBER, number.to_string());
        self.insert(Self::TIME, time.to_string());
        self
    }

    pub fn resolve(&self, template: &str) -> String {
        TEMPLATE_REGEX
            .replace_all(template, TemplateReplacer(&self.args))
            .into_owned()
    }
}

struct TemplateReplacer<'a>(&'a HashMap<&'static str, String>);

impl Replacer for TemplateReplacer<'_> {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut String) {
        // `$$` is an escaped dollar sign
        let Some(key) = caps.get(1) else {
            dst.push('$');
            return;
        };
        let Some(value) = self.0.get(key.as_str()) else {
            dst.push_str(&caps[0]);
            return;
        };

        match caps.get(2).map(|m| m.as_str().parse::<usize>()) {
            Some(Ok(width)) if width <= MAX_WIDTH => {
                dst.push_str(&format!("{value:0>width$}"))
            }
            Some(_) => dst.push_str(&caps[0]),
            None => dst.push_str(value),
        }
    }
}
