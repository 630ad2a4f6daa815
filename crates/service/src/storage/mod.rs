//! Storage layer: the file-backed listing table.

pub mod listing_store;

pub use listing_store::{ListingPage, ListingStore, PAGE_SIZE};
