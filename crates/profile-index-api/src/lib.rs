use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use profile_index_core::{
    Category, ClassificationReport, ClassifierSet, Profile, ProfileId, RULESET_VERSION,
};
use profile_index_store::ProfileStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

mod parser;

pub use parser::{ParseError, ParsedDocument, ProfileParser};

pub const API_CONTRACT_VERSION: &str = "api.v1";
pub const PROFILE_EXTENSION: &str = "md";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadReport {
    pub data_dir: String,
    pub loaded: usize,
    pub skipped: Vec<SkippedDocument>,
    pub category_counts: BTreeMap<String, usize>,
    pub ruleset_version: String,
    pub snapshot_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub loaded_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Category,
    Tag,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FindResult {
    pub key: String,
    pub matched: MatchSource,
    pub user_ids: BTreeSet<ProfileId>,
    pub total_users: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineStats {
    pub total_users: usize,
    pub categories: BTreeMap<String, usize>,
    pub tags: BTreeMap<String, usize>,
}

/// Share of `total` represented by `matched`, in percent; `0.0` for an empty store.
#[must_use]
pub fn match_percentage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let matched = u32::try_from(matched).map_or(f64::from(u32::MAX), f64::from);
    let total = u32::try_from(total).map_or(f64::from(u32::MAX), f64::from);
    matched * 100.0 / total
}

/// Load-then-query orchestrator over the parser, the classifier set and the store.
#[derive(Debug)]
pub struct QueryEngine {
    store: ProfileStore,
    classifiers: ClassifierSet,
    parser: ProfileParser,
}

impl QueryEngine {
    /// Engine with the standard classifier set and an empty store.
    ///
    /// # Errors
    /// Returns an error when a built-in classifier or parser rule fails to compile.
    pub fn new() -> Result<Self> {
        Self::with_classifiers(ClassifierSet::standard()?)
    }

    /// # Errors
    /// Returns an error when the parser rules fail to compile.
    pub fn with_classifiers(classifiers: ClassifierSet) -> Result<Self> {
        Ok(Self { store: ProfileStore::new(), classifiers, parser: ProfileParser::new()? })
    }

    /// Parse, classify and index every `*.md` file in `dir`, in path order.
    ///
    /// Documents that fail are skipped and listed in the report; they never abort
    /// the load.
    ///
    /// # Errors
    /// Returns an error when `dir` is not a readable directory.
    pub fn load_directory(&self, dir: &Path) -> Result<LoadReport> {
        if !dir.is_dir() {
            return Err(anyhow!("invalid data directory: {}", dir.display()));
        }

        let mut paths = Vec::new();
        let mut skipped = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("failed to read data directory {}", dir.display()))?
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let is_profile = path.is_file()
                        && path.extension().is_some_and(|extension| extension == PROFILE_EXTENSION);
                    if is_profile {
                        paths.push(path);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    skipped.push(SkippedDocument {
                        path: dir.display().to_string(),
                        reason: format!("unreadable directory entry: {err}"),
                    });
                }
            }
        }
        paths.sort();

        let mut digests = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.load_file(path) {
                Ok(digest) => digests.push(digest),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %format!("{err:#}"), "skipping profile");
                    skipped.push(SkippedDocument {
                        path: path.display().to_string(),
                        reason: format!("{err:#}"),
                    });
                }
            }
        }

        let report = LoadReport {
            data_dir: dir.display().to_string(),
            loaded: digests.len(),
            skipped,
            category_counts: self.category_counts(),
            ruleset_version: RULESET_VERSION.to_string(),
            snapshot_id: compute_snapshot_id(&mut digests),
            loaded_at: OffsetDateTime::now_utc(),
        };
        tracing::info!(
            data_dir = %report.data_dir,
            loaded = report.loaded,
            skipped = report.skipped.len(),
            snapshot_id = %report.snapshot_id,
            "profiles loaded"
        );
        Ok(report)
    }

    fn load_file(&self, path: &Path) -> Result<String> {
        let document = self.parser.parse_file(path)?;
        let digest = content_digest(&document);
        self.ingest(document)?;
        Ok(digest)
    }

    /// Classify one parsed document and insert it into the store.
    ///
    /// # Errors
    /// Returns an error when a profile with the same id is already loaded.
    pub fn ingest(&self, document: ParsedDocument) -> Result<ClassificationReport> {
        let mut profile =
            Profile::new(document.id, document.version_marker, document.raw_content);
        let report = self.classifiers.classify(&mut profile)?;
        tracing::debug!(
            profile_id = %profile.id(),
            categories = ?report.categories,
            "profile classified"
        );
        self.store.add_user(profile)?;
        Ok(report)
    }

    /// Category lookup, falling back to the tag index when no profile carries
    /// `key` as a category.
    #[must_use]
    pub fn find(&self, key: &str) -> FindResult {
        let total_users = self.store.get_user_count();
        let by_category = self.store.get_users_by_category(key);
        if !by_category.is_empty() {
            return FindResult {
                key: key.to_string(),
                matched: MatchSource::Category,
                user_ids: by_category,
                total_users,
            };
        }

        let by_tag = self.store.get_users_by_tag(key);
        let matched = if by_tag.is_empty() { MatchSource::None } else { MatchSource::Tag };
        FindResult { key: key.to_string(), matched, user_ids: by_tag, total_users }
    }

    #[must_use]
    pub fn find_by_category(&self, category: &str) -> BTreeSet<ProfileId> {
        self.store.get_users_by_category(category)
    }

    #[must_use]
    pub fn find_by_tag(&self, tag: &str) -> BTreeSet<ProfileId> {
        self.store.get_users_by_tag(tag)
    }

    /// Raw profile text for `id`.
    #[must_use]
    pub fn get_profile(&self, id: &str) -> Option<String> {
        self.store.get_user(id).map(|profile| profile.raw_content().to_string())
    }

    #[must_use]
    pub fn get_user(&self, id: &str) -> Option<Profile> {
        self.store.get_user(id)
    }

    pub fn add_tag(&self, id: &str, tag: &str) -> bool {
        self.store.add_tag_to_user(id, tag)
    }

    pub fn remove_tag(&self, id: &str, tag: &str) -> bool {
        self.store.remove_tag_from_user(id, tag)
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.store.get_user_count()
    }

    /// Re-run the classifiers over a stored profile to show why it carries its
    /// categories. Classification is pure, so the result matches the load-time run.
    #[must_use]
    pub fn explain(&self, id: &str) -> Option<ClassificationReport> {
        self.store.get_user(id).map(|profile| self.classifiers.evaluate(profile.raw_content()))
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_users: self.store.get_user_count(),
            categories: self.category_counts(),
            tags: self.store.tag_counts(),
        }
    }

    fn category_counts(&self) -> BTreeMap<String, usize> {
        let counts = self.store.category_counts();
        self.classifiers
            .categories()
            .into_iter()
            .map(|category: Category| {
                (category.as_str().to_string(), counts.get(&category).copied().unwrap_or(0))
            })
            .collect()
    }
}

fn content_digest(document: &ParsedDocument) -> String {
    let digest = Sha256::digest(document.raw_content.as_bytes());
    format!("{}:sha256:{digest:x}", document.id)
}

fn compute_snapshot_id(digests: &mut [String]) -> String {
    digests.sort_unstable();
    let mut hasher = Sha256::new();
    hasher.update(RULESET_VERSION.as_bytes());
    for value in digests.iter() {
        hasher.update(value.as_bytes());
    }
    let digest_hex = format!("{:x}", hasher.finalize());
    format!("snap_{}", &digest_hex[..16])
}
