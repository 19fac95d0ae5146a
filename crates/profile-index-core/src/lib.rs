use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

mod classifier;

pub use classifier::{
    extract_metric, metric_pattern, ActivityLimit, ClassificationInput, Classifier, ClassifierSet,
    EvidenceGroup, EvidenceTrigger, LowActivityCondition, LowActivityRule, Tier, WeightedRule,
    RULESET_VERSION,
};

/// Version marker used when a document carries no provenance line.
pub const UNKNOWN_VERSION_MARKER: &str = "unknown";

const MAX_LABEL_CHARS: usize = 128;

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum KernelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("rule error: {0}")]
    Rule(String),
    #[error("profile already classified: {0}")]
    AlreadyClassified(ProfileId),
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProfileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for ProfileId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProfileId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fraudsters,
    Businesses,
    NewUsers,
    RealEstateAgents,
}

impl Category {
    pub const ALL: [Self; 4] =
        [Self::Fraudsters, Self::Businesses, Self::NewUsers, Self::RealEstateAgents];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fraudsters => "fraudsters",
            Self::Businesses => "businesses",
            Self::NewUsers => "new_users",
            Self::RealEstateAgents => "real_estate_agents",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fraudsters" => Some(Self::Fraudsters),
            "businesses" => Some(Self::Businesses),
            "new_users" => Some(Self::NewUsers),
            "real_estate_agents" => Some(Self::RealEstateAgents),
            _ => None,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's activity record plus the labels derived from it.
///
/// Identity and content are fixed at construction. Categories are written once by
/// [`ClassifierSet::classify`]; tags change only through the owning store.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Profile {
    id: ProfileId,
    version_marker: String,
    raw_content: String,
    categories: BTreeSet<Category>,
    tags: BTreeSet<String>,
    #[serde(skip)]
    classified: bool,
}

impl Profile {
    #[must_use]
    pub fn new(id: ProfileId, version_marker: impl Into<String>, raw_content: impl Into<String>) -> Self {
        Self {
            id,
            version_marker: version_marker.into(),
            raw_content: raw_content.into(),
            categories: BTreeSet::new(),
            tags: BTreeSet::new(),
            classified: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    #[must_use]
    pub fn version_marker(&self) -> &str {
        &self.version_marker
    }

    #[must_use]
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    #[must_use]
    pub fn categories(&self) -> &BTreeSet<Category> {
        &self.categories
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    #[must_use]
    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    #[must_use]
    pub fn is_classified(&self) -> bool {
        self.classified
    }

    /// Returns `true` when the tag was not present before.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Returns `true` when the tag was present and has been removed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    fn seal_categories(&mut self, categories: BTreeSet<Category>) {
        self.categories = categories;
        self.classified = true;
    }
}

/// Check a caller-supplied tag before it reaches the store.
///
/// # Errors
/// Returns [`KernelError::Validation`] when the label is empty, contains whitespace,
/// or exceeds the maximum label length.
pub fn validate_label(label: &str) -> Result<(), KernelError> {
    if label.is_empty() {
        return Err(KernelError::Validation("label MUST be non-empty".to_string()));
    }

    if label.chars().any(char::is_whitespace) {
        return Err(KernelError::Validation("label MUST NOT contain whitespace".to_string()));
    }

    if label.chars().count() > MAX_LABEL_CHARS {
        return Err(KernelError::Validation(format!(
            "label MUST be at most {MAX_LABEL_CHARS} characters"
        )));
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    pub category: Category,
    pub matched: bool,
    /// Accumulated evidence score; absent for low-activity rules.
    pub score: Option<u32>,
    pub threshold: Option<u32>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationReport {
    pub ruleset_version: String,
    pub categories: BTreeSet<Category>,
    pub verdicts: Vec<Verdict>,
}

impl ClassificationReport {
    #[must_use]
    pub fn verdict(&self, category: Category) -> Option<&Verdict> {
        self.verdicts.iter().find(|verdict| verdict.category == category)
    }
}
