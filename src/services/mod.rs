//! Service layer for the ladder watcher.
//!
//! This module contains the page sources:
//! - Source contract and construction (`LadderSource`, `build_source`)
//! - HTTP and saved-file sources (`HttpLadderSource`, `FileLadderSource`)
//! - Table extraction shared by both (`TableScraper`)

mod html;
mod source;

pub use html::{FileLadderSource, HttpLadderSource, TableScraper};
pub use source::{LadderSource, build_source};
