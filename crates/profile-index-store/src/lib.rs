//! In-memory profile store with id, category and tag indices.
//!
//! All three indices live behind one lock. Mutations hold the write guard for the
//! whole update, so the tag index and the per-profile tag sets never disagree while
//! another caller can observe them.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use profile_index_core::{Category, Profile, ProfileId};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum StoreError {
    #[error("duplicate profile id: {0}")]
    DuplicateId(ProfileId),
    #[error("index drift: {0}")]
    IndexDrift(String),
}

#[derive(Debug, Default)]
struct Indices {
    users: BTreeMap<ProfileId, Profile>,
    by_category: BTreeMap<Category, BTreeSet<ProfileId>>,
    by_tag: BTreeMap<String, BTreeSet<ProfileId>>,
}

#[derive(Debug, Default)]
pub struct ProfileStore {
    inner: RwLock<Indices>,
}

impl ProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a classified profile and index its categories and tags.
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateId`] when a profile with the same id exists;
    /// the store is left unchanged.
    pub fn add_user(&self, profile: Profile) -> Result<(), StoreError> {
        let mut guard = self.inner.write();
        let indices = &mut *guard;
        if indices.users.contains_key(profile.id()) {
            return Err(StoreError::DuplicateId(profile.id().clone()));
        }

        for category in profile.categories() {
            indices.by_category.entry(*category).or_default().insert(profile.id().clone());
        }
        for tag in profile.tags() {
            indices.by_tag.entry(tag.clone()).or_default().insert(profile.id().clone());
        }
        indices.users.insert(profile.id().clone(), profile);
        Ok(())
    }

    #[must_use]
    pub fn get_user(&self, id: &str) -> Option<Profile> {
        self.inner.read().users.get(id).cloned()
    }

    #[must_use]
    pub fn contains_user(&self, id: &str) -> bool {
        self.inner.read().users.contains_key(id)
    }

    /// Ids classified under `category`; empty for unknown category names.
    #[must_use]
    pub fn get_users_by_category(&self, category: &str) -> BTreeSet<ProfileId> {
        let Some(category) = Category::parse(category) else {
            return BTreeSet::new();
        };
        self.inner.read().by_category.get(&category).cloned().unwrap_or_default()
    }

    /// Ids carrying `tag`; empty for unknown tags.
    #[must_use]
    pub fn get_users_by_tag(&self, tag: &str) -> BTreeSet<ProfileId> {
        self.inner.read().by_tag.get(tag).cloned().unwrap_or_default()
    }

    /// Returns `false` only when `id` is unknown. Adding a tag twice is a successful no-op.
    pub fn add_tag_to_user(&self, id: &str, tag: &str) -> bool {
        let mut guard = self.inner.write();
        let indices = &mut *guard;
        let Some(profile) = indices.users.get_mut(id) else {
            return false;
        };

        if profile.add_tag(tag) {
            indices.by_tag.entry(tag.to_string()).or_default().insert(profile.id().clone());
            tracing::debug!(profile_id = %profile.id(), tag, "tag added");
        }
        true
    }

    /// Returns `false` when `id` is unknown or the profile does not carry `tag`.
    pub fn remove_tag_from_user(&self, id: &str, tag: &str) -> bool {
        let mut guard = self.inner.write();
        let indices = &mut *guard;
        let Some(profile) = indices.users.get_mut(id) else {
            return false;
        };
        if !profile.remove_tag(tag) {
            return false;
        }

        if let Some(ids) = indices.by_tag.get_mut(tag) {
            ids.remove(id);
            if ids.is_empty() {
                indices.by_tag.remove(tag);
            }
        }
        tracing::debug!(profile_id = %profile.id(), tag, "tag removed");
        true
    }

    #[must_use]
    pub fn get_user_count(&self) -> usize {
        self.inner.read().users.len()
    }

    #[must_use]
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        self.inner.read().by_category.iter().map(|(category, ids)| (*category, ids.len())).collect()
    }

    #[must_use]
    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        self.inner.read().by_tag.iter().map(|(tag, ids)| (tag.clone(), ids.len())).collect()
    }

    /// Check that the category and tag indices are exact inverses of profile state.
    ///
    /// # Errors
    /// Returns [`StoreError::IndexDrift`] describing the first mismatch found.
    pub fn verify_indices(&self) -> Result<(), StoreError> {
        let indices = self.inner.read();

        let mut expected_categories: BTreeMap<Category, BTreeSet<ProfileId>> = BTreeMap::new();
        let mut expected_tags: BTreeMap<String, BTreeSet<ProfileId>> = BTreeMap::new();
        for (id, profile) in &indices.users {
            if id != profile.id() {
                return Err(StoreError::IndexDrift(format!(
                    "profile {} stored under id {id}",
                    profile.id()
                )));
            }
            for category in profile.categories() {
                expected_categories.entry(*category).or_default().insert(id.clone());
            }
            for tag in profile.tags() {
                expected_tags.entry(tag.clone()).or_default().insert(id.clone());
            }
        }

        if expected_categories != indices.by_category {
            return Err(StoreError::IndexDrift(
                "category index does not mirror profile categories".to_string(),
            ));
        }
        if let Some((tag, _)) = indices.by_tag.iter().find(|(_, ids)| ids.is_empty()) {
            return Err(StoreError::IndexDrift(format!("tag `{tag}` has an empty id set")));
        }
        if expected_tags != indices.by_tag {
            return Err(StoreError::IndexDrift("tag index does not mirror profile tags".to_string()));
        }
        Ok(())
    }
}
