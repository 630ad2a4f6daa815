use std::sync::Arc;

use service::storage::ListingStore;

/// Shared request-handler state. Built once at startup from resolved
/// configuration and never mutated afterwards.
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<ListingStore>,
    pub table_name: Arc<str>,
}
