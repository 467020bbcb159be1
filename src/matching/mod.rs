//! Pure building blocks of a scan
//!
//! Nothing here writes to a document:
//! - groups: grouping matches by attribute value
//! - position: reading-order sort of groups
//! - context: human-readable element summaries
//! - change_filter: telling panel-only mutation batches apart

pub mod change_filter;
pub mod context;
pub mod groups;
pub mod position;

pub use change_filter::{is_panel_only_change, is_panel_only_change_in};
pub use context::{ContextDescriber, DescribeLimits};
pub use groups::{GroupMap, MatchGroup, ScanResult, EMPTY_VALUE};
pub use position::sort_by_position;
