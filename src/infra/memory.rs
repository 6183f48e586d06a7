//! In-memory content repository.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::trace;

use crate::application::repos::{ContentStore, RepoError};
use crate::cache::{rw_read, rw_write};
use crate::domain::content::{ContentRecord, ContentRef, ContentTypeDefinition};

const SOURCE: &str = "infra::memory";

#[derive(Default)]
struct State {
    records: BTreeMap<ContentRef, ContentRecord>,
    types: Vec<ContentTypeDefinition>,
}

/// `ContentStore` holding everything in process memory. References are
/// handed out in increasing order, so "oldest first" is reference order.
pub struct MemoryContentStore {
    state: RwLock<State>,
    next_id: AtomicU64,
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register or replace a content type definition.
    pub fn register_content_type(&self, definition: ContentTypeDefinition) {
        let mut state = rw_write(&self.state, SOURCE, "register_content_type");
        match state.types.iter_mut().find(|d| d.id == definition.id) {
            Some(existing) => *existing = definition,
            None => state.types.push(definition),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.state, SOURCE, "len").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate(&self) -> Result<ContentRef, RepoError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        ContentRef::new(id).ok_or_else(|| RepoError::from_persistence("reference space exhausted"))
    }
}

fn descendants(records: &BTreeMap<ContentRef, ContentRecord>, root: ContentRef) -> Vec<ContentRef> {
    let mut found = Vec::new();
    let mut pending = vec![root];
    while let Some(parent) = pending.pop() {
        for (reference, record) in records {
            if record.parent == Some(parent) {
                found.push(*reference);
                pending.push(*reference);
            }
        }
    }
    found
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn try_get(&self, reference: ContentRef) -> Result<Option<ContentRecord>, RepoError> {
        Ok(rw_read(&self.state, SOURCE, "try_get")
            .records
            .get(&reference)
            .cloned())
    }

    async fn get_children(&self, folder: ContentRef) -> Result<Vec<ContentRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "get_children");
        if !state.records.contains_key(&folder) {
            return Err(RepoError::NotFound(folder));
        }
        Ok(state
            .records
            .values()
            .filter(|record| record.parent == Some(folder))
            .cloned()
            .collect())
    }

    async fn save(&self, mut record: ContentRecord) -> Result<ContentRef, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "save");
        if let Some(parent) = record.parent
            && !state.records.contains_key(&parent)
        {
            return Err(RepoError::invalid_input(format!(
                "parent `{parent}` does not exist"
            )));
        }

        let reference = match record.reference {
            Some(reference) => reference,
            None => self.allocate()?,
        };
        record.reference = Some(reference);
        trace!(reference = %reference, name = record.name.as_str(), "Saved content");
        state.records.insert(reference, record);
        Ok(reference)
    }

    async fn delete_children(&self, folder: ContentRef) -> Result<(), RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "delete_children");
        for reference in descendants(&state.records, folder) {
            state.records.remove(&reference);
        }
        Ok(())
    }

    async fn delete(&self, reference: ContentRef) -> Result<(), RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "delete");
        for child in descendants(&state.records, reference) {
            state.records.remove(&child);
        }
        state.records.remove(&reference);
        Ok(())
    }

    async fn list_content_types(&self) -> Result<Vec<ContentTypeDefinition>, RepoError> {
        Ok(rw_read(&self.state, SOURCE, "list_content_types")
            .types
            .clone())
    }

    async fn list_instances(&self, content_type: &str) -> Result<Vec<ContentRef>, RepoError> {
        Ok(rw_read(&self.state, SOURCE, "list_instances")
            .records
            .iter()
            .filter(|(_, record)| record.content_type.as_deref() == Some(content_type))
            .map(|(reference, _)| *reference)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::ContentKind;

    #[tokio::test]
    async fn save_assigns_increasing_references() {
        let store = MemoryContentStore::new();
        let first = store
            .save(ContentRecord::draft(ContentKind::Folder, None).with_name("a"))
            .await
            .expect("first");
        let second = store
            .save(ContentRecord::draft(ContentKind::Folder, None).with_name("b"))
            .await
            .expect("second");

        assert!(first < second);
        let loaded = store.try_get(first).await.expect("lookup").expect("record");
        assert_eq!(loaded.reference, Some(first));
    }

    #[tokio::test]
    async fn save_rejects_unknown_parent() {
        let store = MemoryContentStore::new();
        let orphan = ContentRecord::draft(
            ContentKind::Media,
            ContentRef::new(99),
        );
        assert!(matches!(
            store.save(orphan).await,
            Err(RepoError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn delete_children_is_recursive_and_keeps_folder() {
        let store = MemoryContentStore::new();
        let root = store
            .save(ContentRecord::draft(ContentKind::Folder, None))
            .await
            .expect("root");
        let nested = store
            .save(ContentRecord::draft(ContentKind::Folder, Some(root)))
            .await
            .expect("nested");
        store
            .save(ContentRecord::draft(ContentKind::Media, Some(nested)))
            .await
            .expect("leaf");

        store.delete_children(root).await.expect("delete children");

        assert_eq!(store.len(), 1);
        assert!(store.get_children(root).await.expect("children").is_empty());

        store.delete(root).await.expect("delete root");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn children_of_missing_folder_is_an_error() {
        let store = MemoryContentStore::new();
        let missing = ContentRef::new(5).expect("non-zero reference");
        assert!(matches!(
            store.get_children(missing).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn register_content_type_replaces_by_id() {
        let store = MemoryContentStore::new();
        let mut definition = ContentTypeDefinition {
            id: "StartPage".to_string(),
            contains_settings: false,
            fields: Vec::new(),
        };
        store.register_content_type(definition.clone());
        definition.contains_settings = true;
        store.register_content_type(definition);

        let types = store.list_content_types().await.expect("types");
        assert_eq!(types.len(), 1);
        assert!(types[0].contains_settings);
    }
}
