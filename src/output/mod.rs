//! Output module for saved pages and crawl results
//!
//! This module handles:
//! - Saving fetched pages as HTML, Markdown, PDF and PNG
//! - Building deterministic file names
//! - The crawl report and its printed summary
//! - Writing the discovered URL list as JSON

mod filename;
mod links;
mod markdown;
mod persist;
mod report;

pub use filename::safe_filename;
pub use links::write_links_file;
pub use markdown::html_to_markdown;
pub use persist::{ContentPersister, PersistError};
pub use report::{format_summary, print_summary, CrawlReport, FailureRecord};
