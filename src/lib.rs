//! # attribute-highlighter
//!
//! A live page overlay that finds every element carrying a configurable
//! attribute (`data-testid`, `data-qa`, `aria-label`, ...), groups them by
//! value, highlights them, and lists them in a floating panel that stays in
//! sync while the page mutates.
//!
//! ## Features
//!
//! - **Live scanning**: mutation observation with debounced rescans and no
//!   feedback from the overlay's own writes
//! - **Grouping and ordering**: groups by attribute value, sorted in reading order
//! - **Highlighting**: select one group or highlight all, with the page's own
//!   inline styles restored afterwards
//! - **Panel**: searchable list with element summaries and a hover tooltip
//! - **Hosts**: an in-memory [`Document`] and a live Chrome tab ([`PageDom`])
//!
//! ## Usage
//!
//! ```rust,no_run
//! use attribute_highlighter::{BrowserSession, HighlighterConfig, LaunchOptions, Scanner, Settings};
//! use std::time::Instant;
//!
//! # fn main() -> attribute_highlighter::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://example.com")?;
//!
//! let mut scanner = Scanner::new(session.attach_overlay()?, HighlighterConfig::default());
//! scanner.apply_settings(Settings::tracking("testid"), Instant::now())?;
//!
//! if let Some(result) = scanner.result() {
//!     for group in result.groups() {
//!         println!("{} ({})", group.value, group.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Without a browser, the same scanner runs against an in-memory document:
//!
//! ```rust
//! use attribute_highlighter::{Document, ElementNode, HighlighterConfig, Scanner, Settings};
//! use std::time::Instant;
//!
//! let page = Document::from_tree(ElementNode::new("body").with_children(vec![
//!     ElementNode::new("button").with_attribute("data-testid", "save"),
//! ]));
//! let mut scanner = Scanner::new(page, HighlighterConfig::default());
//! scanner.apply_settings(Settings::tracking("testid"), Instant::now()).unwrap();
//!
//! assert_eq!(scanner.result().unwrap().groups()[0].value, "save");
//! ```
//!
//! ## Module Overview
//!
//! - [`scanner`]: state machine, scan algorithm and timers
//! - [`matching`]: grouping, position sort, element summaries, change filter
//! - [`highlight`]: style snapshots and highlight layers
//! - [`panel`]: in-page panel and tooltip
//! - [`dom`]: the [`Dom`] abstraction and the in-memory document
//! - [`browser`]: Chrome session and the CDP-backed document
//! - [`settings`] / [`config`]: user settings and tunables
//! - [`error`]: error types and result alias

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod highlight;
pub mod matching;
pub mod panel;
pub mod scanner;
pub mod settings;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions, PageDom};
pub use config::HighlighterConfig;
pub use dom::{BoundingBox, Document, Dom, ElementNode, NodeId};
pub use error::{HighlightError, Result};
pub use highlight::{HighlightState, SelectOutcome};
pub use matching::{ContextDescriber, MatchGroup, ScanResult};
pub use panel::{Panel, PanelAction};
pub use scanner::{Scanner, ScannerState};
pub use settings::{Settings, SettingsChange, SettingsFile, SettingsWatcher};
