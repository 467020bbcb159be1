use crate::{highlight::HighlightState,
            matching::ScanResult,
            settings::AttributeName};

/// Everything one enabled session owns; dropped on disable
#[derive(Debug, Clone)]
pub struct ScannerSession {
    pub(super) attribute: AttributeName,
    pub(super) result: ScanResult,
    pub(super) highlights: HighlightState,
}

impl ScannerSession {
    pub fn new(attribute: AttributeName, highlights: HighlightState) -> Self {
        Self {
            attribute,
            result: ScanResult::default(),
            highlights,
        }
    }

    pub fn attribute(&self) -> &AttributeName {
        &self.attribute
    }

    /// Groups of the latest completed scan
    pub fn result(&self) -> &ScanResult {
        &self.result
    }

    pub fn highlights(&self) -> &HighlightState {
        &self.highlights
    }
}
