//! Data models for jobhub.

mod job;
mod listing;

pub use job::{JobRecord, DEFAULT_FIELD_VALUE};
pub use listing::{resolve_link, ListingItem};
