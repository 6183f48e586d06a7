//! Dependency registry between cached values and the entities they derive from.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::keys::{CacheKey, EntityKey};
use super::lock::rw_write;

const SOURCE: &str = "cache::registry";

#[derive(Default)]
struct Mappings {
    entity_to_keys: HashMap<EntityKey, HashSet<CacheKey>>,
    key_to_entities: HashMap<CacheKey, HashSet<EntityKey>>,
}

/// Bidirectional `entity <-> cache key` map.
///
/// Both directions live behind one lock so they never disagree.
#[derive(Default)]
pub struct CacheRegistry {
    mappings: RwLock<Mappings>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `cache_key` must be dropped when any of `entities` changes.
    /// Replaces earlier dependencies of the same key.
    pub fn register(&self, cache_key: CacheKey, entities: HashSet<EntityKey>) {
        let mut guard = rw_write(&self.mappings, SOURCE, "register");
        let mappings = &mut *guard;
        detach(mappings, &cache_key);

        for entity in &entities {
            mappings
                .entity_to_keys
                .entry(entity.clone())
                .or_default()
                .insert(cache_key.clone());
        }
        mappings.key_to_entities.insert(cache_key, entities);
    }

    /// Forget a cache key and every dependency it registered.
    pub fn unregister(&self, cache_key: &CacheKey) {
        let mut guard = rw_write(&self.mappings, SOURCE, "unregister");
        detach(&mut guard, cache_key);
    }

    /// Forget every key depending on `entity` and return them.
    pub fn unregister_entity(&self, entity: &EntityKey) -> HashSet<CacheKey> {
        let mut guard = rw_write(&self.mappings, SOURCE, "unregister_entity");
        let affected = guard.entity_to_keys.get(entity).cloned().unwrap_or_default();
        for cache_key in &affected {
            detach(&mut guard, cache_key);
        }
        affected
    }
}

fn detach(mappings: &mut Mappings, cache_key: &CacheKey) {
    let Some(entities) = mappings.key_to_entities.remove(cache_key) else {
        return;
    };
    for entity in entities {
        if let Some(keys) = mappings.entity_to_keys.get_mut(&entity) {
            keys.remove(cache_key);
            if keys.is_empty() {
                mappings.entity_to_keys.remove(&entity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::ContentRef;

    fn page(id: u64) -> EntityKey {
        EntityKey::Content(ContentRef::new(id).expect("non-zero reference"))
    }

    #[test]
    fn unregister_entity_finds_registered_key() {
        let registry = CacheRegistry::new();
        registry.register(CacheKey::FAVICON_SETTINGS, HashSet::from([page(1)]));

        assert!(registry.unregister_entity(&page(2)).is_empty());
        assert_eq!(
            registry.unregister_entity(&page(1)),
            HashSet::from([CacheKey::FAVICON_SETTINGS])
        );
        assert!(registry.unregister_entity(&page(1)).is_empty());
    }

    #[test]
    fn reregistering_replaces_dependencies() {
        let registry = CacheRegistry::new();
        registry.register(CacheKey::FAVICON_SETTINGS, HashSet::from([page(1)]));
        registry.register(CacheKey::FAVICON_SETTINGS, HashSet::from([page(2)]));

        assert!(registry.unregister_entity(&page(1)).is_empty());
        assert_eq!(
            registry.unregister_entity(&page(2)),
            HashSet::from([CacheKey::FAVICON_SETTINGS])
        );
    }

    #[test]
    fn unregister_entity_returns_affected_keys() {
        let registry = CacheRegistry::new();
        let manifest = CacheKey::new("Manifest");
        registry.register(CacheKey::FAVICON_SETTINGS, HashSet::from([page(1)]));
        registry.register(manifest.clone(), HashSet::from([page(1), page(2)]));

        let affected = registry.unregister_entity(&page(1));

        assert_eq!(affected.len(), 2);
        assert!(affected.contains(&manifest));
        // The manifest's other dependency went with it.
        assert!(registry.unregister_entity(&page(2)).is_empty());
    }

    #[test]
    fn unregister_removes_mappings() {
        let registry = CacheRegistry::new();
        registry.register(CacheKey::FAVICON_SETTINGS, HashSet::from([page(1)]));
        registry.unregister(&CacheKey::FAVICON_SETTINGS);

        assert!(registry.unregister_entity(&page(1)).is_empty());
    }
}
