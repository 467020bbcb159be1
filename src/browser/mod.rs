//! Live Chrome host
//!
//! [`BrowserSession`] launches or connects to Chrome; [`PageDom`] drives one
//! tab through an injected script and implements [`Dom`](crate::dom::Dom)
//! for it.

pub mod config;
pub mod page;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use page::PageDom;
pub use session::BrowserSession;
