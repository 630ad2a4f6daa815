use std::{collections::BTreeMap, ops::Bound, path::PathBuf, sync::Arc};

use serde::Serialize;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ServiceError;
use crate::listing::{Listing, ListingInput, ListingPatch};

/// Maximum number of records one scan page may carry.
pub const PAGE_SIZE: usize = 10;

/// One page of a key-ordered scan. `next_cursor` is set when a further page
/// may exist; pass it back as the exclusive-start key.
#[derive(Clone, Debug, Serialize)]
pub struct ListingPage {
    pub items: Vec<Listing>,
    pub next_cursor: Option<String>,
}

/// File-backed listing table.
///
/// Persists a `BTreeMap<PropertyID, Listing>` as one JSON file. The ordered
/// map keeps the scan cursor stable. Every write operation is conditional
/// on key existence; the write lock makes the check-and-set atomic, which
/// is the only concurrency-correctness mechanism the service relies on.
#[derive(Clone)]
pub struct ListingStore {
    inner: Arc<RwLock<BTreeMap<String, Listing>>>,
    file_path: PathBuf,
}

impl ListingStore {
    /// Initialize the table from a path. Creates the file with an empty map
    /// if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }
        let map: BTreeMap<String, Listing> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Storage(format!("corrupt table file: {e}")))?,
            Err(_) => {
                let empty: BTreeMap<String, Listing> = BTreeMap::new();
                fs::write(
                    &file_path,
                    serde_json::to_vec(&empty).map_err(|e| ServiceError::Storage(e.to_string()))?,
                )
                .await
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
                empty
            }
        };
        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    async fn save(&self) -> Result<(), ServiceError> {
        let map = self.inner.read().await;
        let data = serde_json::to_vec(&*map).map_err(|e| ServiceError::Storage(e.to_string()))?;
        fs::write(&self.file_path, data)
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Validate, sanitize, and insert a new listing. Fails with `Conflict`
    /// if the id already exists; the stored record is left untouched.
    pub async fn create(&self, input: ListingInput) -> Result<Listing, ServiceError> {
        let listing = input.validate()?;
        {
            let mut map = self.inner.write().await;
            if map.contains_key(&listing.property_id) {
                return Err(ServiceError::conflict("property"));
            }
            map.insert(listing.property_id.clone(), listing.clone());
        }
        self.save().await?;
        debug!(property_id = %listing.property_id, "listing inserted");
        Ok(listing)
    }

    /// Fetch one listing by id.
    pub async fn fetch(&self, id: &str) -> Option<Listing> {
        let map = self.inner.read().await;
        map.get(id).cloned()
    }

    /// Apply a partial patch to an existing listing. Fails with `NotFound`
    /// if the id is absent; a patch that fails validation leaves the stored
    /// record unchanged.
    pub async fn update(&self, id: &str, patch: ListingPatch) -> Result<Listing, ServiceError> {
        let updated = {
            let mut map = self.inner.write().await;
            let current = map.get(id).ok_or_else(|| ServiceError::not_found("property"))?;
            let mut candidate = current.clone();
            patch.apply_to(&mut candidate)?;
            map.insert(id.to_string(), candidate.clone());
            candidate
        };
        self.save().await?;
        Ok(updated)
    }

    /// Remove an existing listing. Fails with `NotFound` if the id is absent.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        {
            let mut map = self.inner.write().await;
            if map.remove(id).is_none() {
                return Err(ServiceError::not_found("property"));
            }
        }
        self.save().await?;
        Ok(())
    }

    /// Key-ordered scan of at most [`PAGE_SIZE`] records, starting after the
    /// optional cursor (exclusive).
    pub async fn scan(&self, after: Option<&str>) -> ListingPage {
        let map = self.inner.read().await;
        let lower = match after {
            Some(cursor) => Bound::Excluded(cursor.to_string()),
            None => Bound::Unbounded,
        };
        let items: Vec<Listing> = map
            .range((lower, Bound::Unbounded))
            .take(PAGE_SIZE)
            .map(|(_, v)| v.clone())
            .collect();
        let next_cursor = if items.len() == PAGE_SIZE {
            items.last().map(|l| l.property_id.clone())
        } else {
            None
        };
        ListingPage { items, next_cursor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn input(id: &str) -> ListingInput {
        serde_json::from_value(json!({
            "PropertyID": id,
            "Title": format!("Listing {id}"),
            "Description": "d",
            "PropertyType": "Sale",
            "Price": 100,
            "PropertyLocation": "X"
        }))
        .expect("input")
    }

    fn tmp_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("listings_{}.json", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn create_fetch_roundtrip_and_persistence() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ListingStore::new(&tmp).await?;

        store.create(input("p1")).await?;
        let got = store.fetch("p1").await.expect("present");
        assert_eq!(got.title, "Listing p1");

        // reading twice returns identical content
        let again = store.fetch("p1").await.expect("present");
        assert_eq!(got, again);

        // reload from disk
        let store2 = ListingStore::new(&tmp).await?;
        assert!(store2.fetch("p1").await.is_some());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_create_fails_and_preserves_original() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ListingStore::new(&tmp).await?;

        store.create(input("p1")).await?;
        let mut dup = input("p1");
        dup.title = json!("Replacement");
        let err = store.create(dup).await.expect_err("must conflict");
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.fetch("p1").await.expect("present").title, "Listing p1");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_require_existence() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ListingStore::new(&tmp).await?;

        let patch: ListingPatch =
            serde_json::from_value(json!({ "Title": "t" })).expect("patch");
        let err = store.update("ghost", patch).await.expect_err("must fail");
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = store.delete("ghost").await.expect_err("must fail");
        assert!(matches!(err, ServiceError::NotFound(_)));

        // neither produced a record as a side effect
        assert!(store.fetch("ghost").await.is_none());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_patch_leaves_record_unchanged() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ListingStore::new(&tmp).await?;
        store.create(input("p1")).await?;

        let patch: ListingPatch =
            serde_json::from_value(json!({ "Title": "New", "Price": -1 })).expect("patch");
        assert!(store.update("p1", patch).await.is_err());
        let got = store.fetch("p1").await.expect("present");
        assert_eq!(got.title, "Listing p1");
        assert_eq!(got.price, 100.0);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_then_fetch_is_none() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ListingStore::new(&tmp).await?;
        store.create(input("p1")).await?;
        store.delete("p1").await?;
        assert!(store.fetch("p1").await.is_none());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn scan_is_bounded_and_cursor_reaches_the_rest() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ListingStore::new(&tmp).await?;
        for i in 0..12 {
            store.create(input(&format!("p{:02}", i))).await?;
        }

        let first = store.scan(None).await;
        assert_eq!(first.items.len(), PAGE_SIZE);
        let cursor = first.next_cursor.clone().expect("cursor for full page");
        assert_eq!(cursor, "p09");

        let second = store.scan(Some(&cursor)).await;
        assert_eq!(second.items.len(), 2);
        assert!(second.next_cursor.is_none());

        // no overlap between pages
        assert!(second.items.iter().all(|l| l.property_id > cursor));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn scan_of_empty_store_is_empty() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = ListingStore::new(&tmp).await?;
        let page = store.scan(None).await;
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
