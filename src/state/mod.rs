//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: Tracks the state of individual URLs (pending, in flight, fetched, etc.)
//! - `Partition`: The frontier partition (Pending / In-flight / Done) a state belongs to

mod page_state;

pub use page_state::{PageState, Partition};
