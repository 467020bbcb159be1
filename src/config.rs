use crate::{dom::InlineStyle,
            error::Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Tunables for the highlighter; every field has a default
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HighlighterConfig {
    /// Quiet period before a mutation burst triggers a rescan
    pub debounce_ms: u64,

    /// Delay before observation resumes after the panel was rewritten
    pub observer_reconnect_ms: u64,

    /// Tops closer than this many pixels count as the same row
    pub position_threshold: f64,

    pub max_context_length: usize,
    pub max_url_length: usize,
    pub max_poster_length: usize,

    /// Style of the individually selected group
    pub selected_style: InlineStyle,

    /// Style of every match while highlight-all is on
    pub all_style: InlineStyle,

    /// Attribute names used without the `data-` prefix
    pub bare_attributes: Vec<String>,

    /// Tooltip distance from the pointer, in pixels
    pub tooltip_offset: f64,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            observer_reconnect_ms: 50,
            position_threshold: 5.0,
            max_context_length: 60,
            max_url_length: 40,
            max_poster_length: 30,
            selected_style: InlineStyle::new("3px solid #f59e0b", "#fef3c7"),
            all_style: InlineStyle::new("2px solid #2563eb", "#dbeafe"),
            bare_attributes: vec!["alt".to_string(), "aria-label".to_string()],
            tooltip_offset: 15.0,
        }
    }
}

impl HighlighterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.observer_reconnect_ms)
    }

    /// Builder method: set the debounce window
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Builder method: set the reconnect delay
    pub fn observer_reconnect_ms(mut self, ms: u64) -> Self {
        self.observer_reconnect_ms = ms;
        self
    }
}
