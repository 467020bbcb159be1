//! Human-readable summaries of matched elements
//!
//! A summary is a list of segments joined by [`SEPARATOR`]:
//! - `Text: "..."` for visible text, truncated
//! - tag specific segments from the describer table (`img`, `a`, form controls, `button`, `video`)
//! - `<tag> element` when nothing else applies

use crate::{config::HighlighterConfig,
            dom::ElementNode};
use std::{collections::HashMap, fmt};

pub const SEPARATOR: &str = " | ";

const ELLIPSIS: &str = "...";

/// Length caps applied while describing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescribeLimits {
    pub max_text: usize,
    pub max_url: usize,
    pub max_poster: usize,
}

impl Default for DescribeLimits {
    fn default() -> Self {
        Self {
            max_text: 60,
            max_url: 40,
            max_poster: 30,
        }
    }
}

impl From<&HighlighterConfig> for DescribeLimits {
    fn from(config: &HighlighterConfig) -> Self {
        Self {
            max_text: config.max_context_length,
            max_url: config.max_url_length,
            max_poster: config.max_poster_length,
        }
    }
}

/// Appends tag specific segments for one element
pub type SegmentFn = Box<dyn Fn(&ElementNode, &DescribeLimits, &mut Vec<String>) + Send + Sync>;

/// Tag name → segment function table
pub struct ContextDescriber {
    describers: HashMap<String, SegmentFn>,
    limits: DescribeLimits,
}

impl fmt::Debug for ContextDescriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.describers.keys().collect();
        tags.sort();
        f.debug_struct("ContextDescriber")
            .field("tags", &tags)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Default for ContextDescriber {
    fn default() -> Self {
        Self::with_defaults(DescribeLimits::default())
    }
}

impl ContextDescriber {
    /// An empty table: only text and the tag fallback are produced
    pub fn new(limits: DescribeLimits) -> Self {
        Self {
            describers: HashMap::new(),
            limits,
        }
    }

    /// Table with the built-in describers registered
    pub fn with_defaults(limits: DescribeLimits) -> Self {
        let mut describer = Self::new(limits);
        describer.register("img", describe_image);
        describer.register("a", describe_link);
        for tag in ["input", "textarea", "select"] {
            describer.register(tag, describe_form_control);
        }
        describer.register("button", describe_button);
        describer.register("video", describe_video);
        describer
    }

    /// Register (or replace) the describer for a tag
    pub fn register<F>(&mut self, tag: &str, describe: F)
    where
        F: Fn(&ElementNode, &DescribeLimits, &mut Vec<String>) + Send + Sync + 'static,
    {
        self.describers.insert(tag.to_ascii_lowercase(), Box::new(describe));
    }

    pub fn limits(&self) -> &DescribeLimits {
        &self.limits
    }

    /// Summary of an element, empty for `None`
    pub fn describe(&self, element: Option<&ElementNode>) -> String {
        let Some(element) = element else {
            return String::new();
        };

        let mut segments = Vec::new();

        if let Some(text) = element.trimmed_text() {
            segments.push(format!("Text: \"{}\"", truncate(text, self.limits.max_text)));
        }

        if let Some(describe) = self.describers.get(&element.tag_name.to_ascii_lowercase()) {
            describe(element, &self.limits, &mut segments);
        }

        if segments.is_empty() {
            segments.push(format!("<{}> element", element.tag_name.to_ascii_lowercase()));
        }

        segments.join(SEPARATOR)
    }
}

/// Truncate to `max` characters in total, ending in an ellipsis when shortened
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    format!("{}{}", take_chars(text, keep), ELLIPSIS)
}

/// First `max` characters
fn take_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Last non-empty `/` separated segment of a URL-like string
pub fn extract_filename(url: &str) -> String {
    url.split('/')
        .rev()
        .find(|segment| !segment.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

fn filename_or_prefix(url: &str, max: usize) -> String {
    let filename = extract_filename(url);
    if filename.is_empty() {
        take_chars(url, max).to_string()
    } else {
        filename
    }
}

fn describe_image(element: &ElementNode, limits: &DescribeLimits, segments: &mut Vec<String>) {
    if let Some(alt) = element.non_empty_attribute("alt") {
        segments.push(format!("Alt: {}", alt));
    }
    if let Some(src) = element.non_empty_attribute("src") {
        segments.push(format!("Image: {}", filename_or_prefix(src, limits.max_url)));
    }
}

fn describe_link(element: &ElementNode, limits: &DescribeLimits, segments: &mut Vec<String>) {
    if let Some(href) = element.non_empty_attribute("href") {
        let shown = take_chars(href, limits.max_url);
        let suffix = if shown.len() < href.len() { ELLIPSIS } else { "" };
        segments.push(format!("Link: {}{}", shown, suffix));
    }
}

fn describe_form_control(element: &ElementNode, _limits: &DescribeLimits, segments: &mut Vec<String>) {
    let kind = element.non_empty_attribute("type").unwrap_or("text");
    segments.push(format!("Type: {}", kind));
    if let Some(placeholder) = element.non_empty_attribute("placeholder") {
        segments.push(format!("Placeholder: {}", placeholder));
    }
}

fn describe_button(element: &ElementNode, _limits: &DescribeLimits, segments: &mut Vec<String>) {
    if let Some(kind) = element.non_empty_attribute("type") {
        segments.push(format!("Button type: {}", kind));
    }
}

fn describe_video(element: &ElementNode, limits: &DescribeLimits, segments: &mut Vec<String>) {
    if let Some(src) = element.non_empty_attribute("src") {
        segments.push(format!("Video: {}", filename_or_prefix(src, limits.max_url)));
    }
    if let Some(poster) = element.non_empty_attribute("poster") {
        segments.push(format!("Poster: {}", filename_or_prefix(poster, limits.max_poster)));
    }
}
