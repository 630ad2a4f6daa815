pub mod errors;
pub mod listing;
pub mod sanitize;
pub mod storage;
