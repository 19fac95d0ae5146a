//! Rule-based classifiers and the fixed set that assigns categories at load time.
//!
//! Every category except `new_users` is decided by a weighted evidence score: each
//! evidence group adds its weight once when triggered (tiered groups add the weight of
//! the highest tier reached) and the verdict is `score >= threshold`. `new_users` is
//! the inverse case: a table of low-activity conditions where any satisfied condition
//! is a match.

use std::collections::{BTreeMap, BTreeSet};

use regex_lite::Regex;

use crate::{Category, ClassificationReport, KernelError, Profile, Verdict};

pub const RULESET_VERSION: &str = "profile-rules.v1";

#[derive(Debug, Clone, Copy)]
pub struct ClassificationInput<'a> {
    pub raw_content: &'a str,
    /// Categories assigned by classifiers that ran earlier in the set.
    pub categories: &'a BTreeSet<Category>,
}

/// One weight step of a tiered group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub at_least: u64,
    pub weight: u32,
}

impl Tier {
    #[must_use]
    pub const fn new(at_least: u64, weight: u32) -> Self {
        Self { at_least, weight }
    }
}

fn highest_tier(tiers: &[Tier], value: u64) -> Option<u32> {
    tiers.iter().filter(|tier| value >= tier.at_least).map(|tier| tier.weight).max()
}

fn compile(pattern: &str) -> Result<Regex, KernelError> {
    Regex::new(&format!("(?s){pattern}"))
        .map_err(|err| KernelError::Rule(format!("invalid pattern `{pattern}`: {err}")))
}

/// Build the extraction pattern for a `label: <n>` metric.
///
/// Accepts an optional closing quote after the label, as in `"supply_total_posts": 4`.
///
/// # Errors
/// Returns [`KernelError::Rule`] when the label yields an invalid pattern.
pub fn metric_pattern(label: &str) -> Result<Regex, KernelError> {
    if label.trim().is_empty() {
        return Err(KernelError::Rule("metric label MUST be non-empty".to_string()));
    }
    compile(&format!(r#"{}["']?:\s*([0-9]+)"#, regex_lite::escape(label)))
}

/// First occurrence of the metric, or 0 when it is missing or does not fit in `u64`.
#[must_use]
pub fn extract_metric(content: &str, pattern: &Regex) -> u64 {
    pattern
        .captures(content)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
pub enum EvidenceTrigger {
    /// Fires once on the first literal found.
    AnyLiteral { literals: Vec<String>, weight: u32 },
    /// Fires once on the first pattern that matches.
    AnyPattern { patterns: Vec<Regex>, weight: u32 },
    /// Counts matching patterns and scores the highest tier reached.
    PatternCount { patterns: Vec<Regex>, tiers: Vec<Tier> },
    /// Scores the highest tier reached by an extracted metric.
    Metric { label: String, pattern: Regex, tiers: Vec<Tier> },
    /// Fires when an earlier classifier assigned the category.
    HasCategory { category: Category, weight: u32 },
}

#[derive(Debug, Clone)]
pub struct EvidenceGroup {
    pub name: String,
    pub trigger: EvidenceTrigger,
}

impl EvidenceGroup {
    #[must_use]
    pub fn literals(name: &str, literals: &[&str], weight: u32) -> Self {
        Self {
            name: name.to_string(),
            trigger: EvidenceTrigger::AnyLiteral {
                literals: literals.iter().map(ToString::to_string).collect(),
                weight,
            },
        }
    }

    /// # Errors
    /// Returns [`KernelError::Rule`] when a pattern does not compile.
    pub fn patterns(name: &str, patterns: &[&str], weight: u32) -> Result<Self, KernelError> {
        Ok(Self {
            name: name.to_string(),
            trigger: EvidenceTrigger::AnyPattern {
                patterns: patterns.iter().map(|pattern| compile(pattern)).collect::<Result<_, _>>()?,
                weight,
            },
        })
    }

    /// # Errors
    /// Returns [`KernelError::Rule`] when a pattern does not compile or no tier is given.
    pub fn pattern_count(name: &str, patterns: &[&str], tiers: &[Tier]) -> Result<Self, KernelError> {
        if tiers.is_empty() {
            return Err(KernelError::Rule(format!("group `{name}` MUST define at least one tier")));
        }
        Ok(Self {
            name: name.to_string(),
            trigger: EvidenceTrigger::PatternCount {
                patterns: patterns.iter().map(|pattern| compile(pattern)).collect::<Result<_, _>>()?,
                tiers: tiers.to_vec(),
            },
        })
    }

    /// # Errors
    /// Returns [`KernelError::Rule`] when the label is invalid or no tier is given.
    pub fn metric(name: &str, label: &str, tiers: &[Tier]) -> Result<Self, KernelError> {
        if tiers.is_empty() {
            return Err(KernelError::Rule(format!("group `{name}` MUST define at least one tier")));
        }
        Ok(Self {
            name: name.to_string(),
            trigger: EvidenceTrigger::Metric {
                label: label.to_string(),
                pattern: metric_pattern(label)?,
                tiers: tiers.to_vec(),
            },
        })
    }

    #[must_use]
    pub fn category(name: &str, category: Category, weight: u32) -> Self {
        Self { name: name.to_string(), trigger: EvidenceTrigger::HasCategory { category, weight } }
    }

    /// Weight contributed by this group and a short description of what fired.
    fn score(&self, input: &ClassificationInput<'_>) -> Option<(u32, String)> {
        match &self.trigger {
            EvidenceTrigger::AnyLiteral { literals, weight } => literals
                .iter()
                .find(|literal| input.raw_content.contains(literal.as_str()))
                .map(|literal| (*weight, format!("literal `{literal}`"))),
            EvidenceTrigger::AnyPattern { patterns, weight } => patterns
                .iter()
                .find(|pattern| pattern.is_match(input.raw_content))
                .map(|pattern| (*weight, format!("pattern `{}`", pattern.as_str()))),
            EvidenceTrigger::PatternCount { patterns, tiers } => {
                let matched =
                    patterns.iter().filter(|pattern| pattern.is_match(input.raw_content)).count();
                let matched = u64::try_from(matched).unwrap_or(u64::MAX);
                highest_tier(tiers, matched)
                    .map(|weight| (weight, format!("{matched} of {} patterns", patterns.len())))
            }
            EvidenceTrigger::Metric { label, pattern, tiers } => {
                let value = extract_metric(input.raw_content, pattern);
                highest_tier(tiers, value).map(|weight| (weight, format!("{label}={value}")))
            }
            EvidenceTrigger::HasCategory { category, weight } => input
                .categories
                .contains(category)
                .then(|| (*weight, format!("already classified as {category}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeightedRule {
    pub category: Category,
    /// Categories that must already be assigned; otherwise the verdict is negative.
    pub requires: Vec<Category>,
    pub groups: Vec<EvidenceGroup>,
    pub threshold: u32,
}

impl WeightedRule {
    #[must_use]
    pub fn evaluate(&self, input: &ClassificationInput<'_>) -> Verdict {
        if let Some(missing) =
            self.requires.iter().find(|required| !input.categories.contains(*required))
        {
            return Verdict {
                category: self.category,
                matched: false,
                score: Some(0),
                threshold: Some(self.threshold),
                reasons: vec![format!("requires category {missing}")],
            };
        }

        let mut score = 0_u32;
        let mut reasons = Vec::new();
        for group in &self.groups {
            if let Some((weight, detail)) = group.score(input) {
                score = score.saturating_add(weight);
                reasons.push(format!("{} +{weight}: {detail}", group.name));
            }
        }

        Verdict {
            category: self.category,
            matched: score >= self.threshold,
            score: Some(score),
            threshold: Some(self.threshold),
            reasons,
        }
    }
}

/// `sum(metrics) <= max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLimit {
    pub metrics: Vec<String>,
    pub max: u64,
}

impl ActivityLimit {
    #[must_use]
    pub fn new(metrics: &[&str], max: u64) -> Self {
        Self { metrics: metrics.iter().map(ToString::to_string).collect(), max }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowActivityCondition {
    pub name: String,
    pub limits: Vec<ActivityLimit>,
}

impl LowActivityCondition {
    #[must_use]
    pub fn new(name: &str, limits: Vec<ActivityLimit>) -> Self {
        Self { name: name.to_string(), limits }
    }
}

#[derive(Debug, Clone)]
pub struct LowActivityRule {
    pub category: Category,
    metrics: BTreeMap<String, Regex>,
    conditions: Vec<LowActivityCondition>,
}

impl LowActivityRule {
    /// # Errors
    /// Returns [`KernelError::Rule`] when a condition is empty or references a metric
    /// that is not declared.
    pub fn new(
        category: Category,
        metrics: &[&str],
        conditions: Vec<LowActivityCondition>,
    ) -> Result<Self, KernelError> {
        let metrics = metrics
            .iter()
            .map(|label| Ok((label.to_string(), metric_pattern(label)?)))
            .collect::<Result<BTreeMap<_, _>, KernelError>>()?;

        if conditions.is_empty() {
            return Err(KernelError::Rule("low-activity rule MUST define a condition".to_string()));
        }
        for condition in &conditions {
            if condition.limits.is_empty() {
                return Err(KernelError::Rule(format!(
                    "condition `{}` MUST define at least one limit",
                    condition.name
                )));
            }
            for label in condition.limits.iter().flat_map(|limit| &limit.metrics) {
                if !metrics.contains_key(label) {
                    return Err(KernelError::Rule(format!(
                        "condition `{}` references undeclared metric `{label}`",
                        condition.name
                    )));
                }
            }
        }

        Ok(Self { category, metrics, conditions })
    }

    #[must_use]
    pub fn evaluate(&self, input: &ClassificationInput<'_>) -> Verdict {
        let values = self
            .metrics
            .iter()
            .map(|(label, pattern)| (label.as_str(), extract_metric(input.raw_content, pattern)))
            .collect::<BTreeMap<_, _>>();
        let sum = |labels: &[String]| {
            labels
                .iter()
                .map(|label| values.get(label.as_str()).copied().unwrap_or(0))
                .fold(0_u64, u64::saturating_add)
        };

        let reasons = self
            .conditions
            .iter()
            .filter(|condition| condition.limits.iter().all(|limit| sum(&limit.metrics) <= limit.max))
            .map(|condition| format!("low-activity condition `{}` satisfied", condition.name))
            .collect::<Vec<_>>();

        Verdict {
            category: self.category,
            matched: !reasons.is_empty(),
            score: None,
            threshold: None,
            reasons,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Classifier {
    Weighted(WeightedRule),
    LowActivity(LowActivityRule),
}

impl Classifier {
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Weighted(rule) => rule.category,
            Self::LowActivity(rule) => rule.category,
        }
    }

    #[must_use]
    pub fn requires(&self) -> &[Category] {
        match self {
            Self::Weighted(rule) => &rule.requires,
            Self::LowActivity(_) => &[],
        }
    }

    #[must_use]
    pub fn evaluate(&self, input: &ClassificationInput<'_>) -> Verdict {
        match self {
            Self::Weighted(rule) => rule.evaluate(input),
            Self::LowActivity(rule) => rule.evaluate(input),
        }
    }
}

/// Ordered classifiers; a classifier only sees categories assigned before it.
#[derive(Debug, Clone)]
pub struct ClassifierSet {
    classifiers: Vec<Classifier>,
}

impl ClassifierSet {
    /// # Errors
    /// Returns [`KernelError::Rule`] when two classifiers share a category or a
    /// classifier requires a category that no earlier classifier assigns.
    pub fn new(classifiers: Vec<Classifier>) -> Result<Self, KernelError> {
        let mut seen = BTreeSet::new();
        for classifier in &classifiers {
            for required in classifier.requires() {
                if !seen.contains(required) {
                    return Err(KernelError::Rule(format!(
                        "{} requires {required}, which MUST be classified earlier",
                        classifier.category()
                    )));
                }
            }
            if !seen.insert(classifier.category()) {
                return Err(KernelError::Rule(format!(
                    "category {} is assigned by more than one classifier",
                    classifier.category()
                )));
            }
        }
        Ok(Self { classifiers })
    }

    /// The production rule set, in evaluation order: fraudsters, businesses,
    /// new users, real estate agents (which requires businesses).
    ///
    /// # Errors
    /// Returns [`KernelError::Rule`] when a built-in rule fails to compile.
    pub fn standard() -> Result<Self, KernelError> {
        Self::new(vec![
            Classifier::Weighted(fraud_rule()?),
            Classifier::Weighted(business_rule()?),
            Classifier::LowActivity(new_user_rule()?),
            Classifier::Weighted(real_estate_rule()?),
        ])
    }

    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.classifiers.iter().map(Classifier::category).collect()
    }

    /// Run every classifier over the content without touching any profile.
    #[must_use]
    pub fn evaluate(&self, raw_content: &str) -> ClassificationReport {
        let mut categories = BTreeSet::new();
        let mut verdicts = Vec::with_capacity(self.classifiers.len());
        for classifier in &self.classifiers {
            let verdict = classifier
                .evaluate(&ClassificationInput { raw_content, categories: &categories });
            if verdict.matched {
                categories.insert(verdict.category);
            }
            verdicts.push(verdict);
        }

        ClassificationReport { ruleset_version: RULESET_VERSION.to_string(), categories, verdicts }
    }

    /// Assign categories to a freshly parsed profile.
    ///
    /// # Errors
    /// Returns [`KernelError::AlreadyClassified`] when the profile already went
    /// through classification; its categories are left untouched.
    pub fn classify(&self, profile: &mut Profile) -> Result<ClassificationReport, KernelError> {
        if profile.is_classified() {
            return Err(KernelError::AlreadyClassified(profile.id().clone()));
        }
        let report = self.evaluate(profile.raw_content());
        profile.seal_categories(report.categories.clone());
        Ok(report)
    }
}

const POSTS: &str = "supply_total_posts";
const PUBLISHED_POSTS: &str = "supply_published_posts";
const SEARCHES: &str = "demand_searches_made";
const POSTS_VIEWED: &str = "demand_posts_viewed";
const POSTS_CONTACTED: &str = "demand_posts_contacted";
const CHATS: &str = "supply_total_chats";
const CALLS: &str = "supply_total_calls";

fn fraud_rule() -> Result<WeightedRule, KernelError> {
    Ok(WeightedRule {
        category: Category::Fraudsters,
        requires: Vec::new(),
        groups: vec![
            // Word-bounded so metric keys such as `fraud_reports` do not count as mentions.
            EvidenceGroup::patterns(
                "fraud_keyword",
                &["کلاهبردار", "کلاهبرداری", "فریب", r"\bfraud\b", r"\bscam\b"],
                3,
            )?,
            EvidenceGroup::pattern_count(
                "deposit_no_show",
                &[
                    "بیعانه.*(نیامد|نیومد|حاضر نشد|خبری نشد)",
                    "بیعانه.*(گرفت|دریافت)",
                    "payment taken.*no show",
                    "deposit.*(never showed|no show)",
                ],
                &[Tier::new(1, 3), Tier::new(2, 4)],
            )?,
            EvidenceGroup::patterns("reliable_report", &["گزارش.*معتبر", "ReliableReport"], 2)?,
            EvidenceGroup::literals("suspicion_marker", &["مشکوک", "طعمه"], 1),
            EvidenceGroup::metric("fraud_reports", "fraud_reports", &[Tier::new(1, 2), Tier::new(3, 3)])?,
        ],
        threshold: 5,
    })
}

fn business_rule() -> Result<WeightedRule, KernelError> {
    Ok(WeightedRule {
        category: Category::Businesses,
        requires: Vec::new(),
        groups: vec![
            EvidenceGroup::literals(
                "business_keyword",
                &["کسب\u{200c}وکار", "تجاری", "فروشگاه", "واسطه", "دلال"],
                3,
            ),
            EvidenceGroup::patterns(
                "business_type_field",
                &[r#"business_type["']?:\s*["']?business"#],
                4,
            )?,
            EvidenceGroup::pattern_count(
                "commercial_activity",
                &["آگهی.*تجاری", "فعالیت.*تجاری", "(wholesale|retail) (seller|store)"],
                &[Tier::new(1, 2), Tier::new(2, 3)],
            )?,
            EvidenceGroup::metric(
                "listing_volume",
                POSTS,
                &[Tier::new(10, 1), Tier::new(20, 2), Tier::new(50, 3)],
            )?,
        ],
        threshold: 4,
    })
}

// Conditions overlap on purpose; any one of them is enough.
fn new_user_rule() -> Result<LowActivityRule, KernelError> {
    LowActivityRule::new(
        Category::NewUsers,
        &[POSTS, PUBLISHED_POSTS, SEARCHES, POSTS_VIEWED, POSTS_CONTACTED, CHATS, CALLS],
        vec![
            LowActivityCondition::new(
                "idle",
                vec![
                    ActivityLimit::new(&[POSTS, SEARCHES, POSTS_VIEWED], 0),
                    ActivityLimit::new(&[POSTS_CONTACTED, CHATS, CALLS], 0),
                ],
            ),
            LowActivityCondition::new(
                "no_listing_activity",
                vec![
                    ActivityLimit::new(&[POSTS], 0),
                    ActivityLimit::new(&[PUBLISHED_POSTS], 0),
                    ActivityLimit::new(&[SEARCHES], 0),
                    ActivityLimit::new(&[POSTS_VIEWED], 0),
                ],
            ),
            LowActivityCondition::new(
                "no_posts_no_searches",
                vec![ActivityLimit::new(&[POSTS], 0), ActivityLimit::new(&[SEARCHES], 0)],
            ),
        ],
    )
}

fn real_estate_rule() -> Result<WeightedRule, KernelError> {
    Ok(WeightedRule {
        category: Category::RealEstateAgents,
        requires: vec![Category::Businesses],
        groups: vec![
            EvidenceGroup::literals(
                "real_estate_keyword",
                &["املاک", "مشاور املاک", "آژانس املاک", "مسکن"],
                3,
            ),
            EvidenceGroup::pattern_count(
                "property_listing",
                &["آپارتمان.*فروش", r"\breal.estate\b", "(رهن|اجاره).*(آپارتمان|واحد)"],
                &[Tier::new(1, 2), Tier::new(2, 3)],
            )?,
            EvidenceGroup::metric(
                "real_estate_posts",
                "real_estate_posts",
                &[Tier::new(1, 1), Tier::new(5, 2)],
            )?,
            EvidenceGroup::category("business_profile", Category::Businesses, 1),
        ],
        threshold: 4,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(raw_content: &'a str, categories: &'a BTreeSet<Category>) -> ClassificationInput<'a> {
        ClassificationInput { raw_content, categories }
    }

    fn ok<T>(result: Result<T, KernelError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("rule should build: {err}"),
        }
    }

    #[test]
    fn metric_extraction_accepts_quoted_labels_and_defaults_to_zero() {
        let pattern = ok(metric_pattern("supply_total_posts"));
        assert_eq!(extract_metric("supply_total_posts: 12", &pattern), 12);
        assert_eq!(extract_metric("\"supply_total_posts\": 7,", &pattern), 7);
        assert_eq!(extract_metric("supply_total_posts:3", &pattern), 3);
        assert_eq!(extract_metric("supply_total_posts: none", &pattern), 0);
        assert_eq!(extract_metric("nothing here", &pattern), 0);
        assert_eq!(extract_metric("supply_total_posts: 99999999999999999999999", &pattern), 0);
    }

    #[test]
    fn metric_extraction_uses_first_occurrence() {
        let pattern = ok(metric_pattern("demand_searches_made"));
        assert_eq!(extract_metric("demand_searches_made: 4\ndemand_searches_made: 9", &pattern), 4);
    }

    #[test]
    fn literal_group_counts_once_even_with_many_hits() {
        let rule = WeightedRule {
            category: Category::Fraudsters,
            requires: Vec::new(),
            groups: vec![EvidenceGroup::literals("kw", &["scam", "fraud"], 3)],
            threshold: 5,
        };
        let categories = BTreeSet::new();
        let verdict = rule.evaluate(&input("scam scam fraud scam", &categories));
        assert_eq!(verdict.score, Some(3));
        assert!(!verdict.matched);
        assert_eq!(verdict.reasons, vec!["kw +3: literal `scam`".to_string()]);
    }

    #[test]
    fn pattern_count_group_scores_highest_tier() {
        let group = ok(EvidenceGroup::pattern_count(
            "listing",
            &["a.*b", "c.*d", "e.*f"],
            &[Tier::new(1, 2), Tier::new(2, 3)],
        ));
        let categories = BTreeSet::new();
        assert_eq!(group.score(&input("xx", &categories)), None);
        assert_eq!(group.score(&input("a\nb", &categories)).map(|(w, _)| w), Some(2));
        assert_eq!(group.score(&input("a b c d e f", &categories)).map(|(w, _)| w), Some(3));
    }

    #[test]
    fn patterns_span_line_breaks() {
        let group = ok(EvidenceGroup::patterns("span", &["start.*end"], 1));
        let categories = BTreeSet::new();
        assert!(group.score(&input("start\n\nmiddle\nend", &categories)).is_some());
    }

    #[test]
    fn category_group_reads_earlier_verdicts() {
        let group = EvidenceGroup::category("is_business", Category::Businesses, 2);
        let empty = BTreeSet::new();
        let business = BTreeSet::from([Category::Businesses]);
        assert_eq!(group.score(&input("", &empty)), None);
        assert_eq!(group.score(&input("", &business)).map(|(w, _)| w), Some(2));
    }

    #[test]
    fn low_activity_rule_matches_any_condition() {
        let rule = ok(LowActivityRule::new(
            Category::NewUsers,
            &["posts", "views"],
            vec![
                LowActivityCondition::new("no_posts", vec![ActivityLimit::new(&["posts"], 0)]),
                LowActivityCondition::new("few_views", vec![ActivityLimit::new(&["views"], 5)]),
            ],
        ));
        let categories = BTreeSet::new();

        let both = rule.evaluate(&input("posts: 0\nviews: 2", &categories));
        assert!(both.matched);
        assert_eq!(both.reasons.len(), 2);

        let one = rule.evaluate(&input("posts: 4\nviews: 5", &categories));
        assert!(one.matched);
        assert_eq!(one.reasons, vec!["low-activity condition `few_views` satisfied".to_string()]);

        let none = rule.evaluate(&input("posts: 4\nviews: 6", &categories));
        assert!(!none.matched);
        assert!(none.reasons.is_empty());
    }

    #[test]
    fn low_activity_rule_rejects_undeclared_metrics() {
        let result = LowActivityRule::new(
            Category::NewUsers,
            &["posts"],
            vec![LowActivityCondition::new("bad", vec![ActivityLimit::new(&["views"], 0)])],
        );
        assert!(matches!(result, Err(KernelError::Rule(_))));

        let empty = LowActivityRule::new(
            Category::NewUsers,
            &["posts"],
            vec![LowActivityCondition::new("vacuous", Vec::new())],
        );
        assert!(matches!(empty, Err(KernelError::Rule(_))));
    }

    #[test]
    fn set_rejects_prerequisite_declared_out_of_order() {
        let estate = ok(real_estate_rule());
        let business = ok(business_rule());
        let result = ClassifierSet::new(vec![
            Classifier::Weighted(estate),
            Classifier::Weighted(business),
        ]);
        assert!(matches!(result, Err(KernelError::Rule(_))));
    }

    #[test]
    fn set_rejects_duplicate_categories() {
        let result = ClassifierSet::new(vec![
            Classifier::Weighted(ok(fraud_rule())),
            Classifier::Weighted(ok(fraud_rule())),
        ]);
        assert!(matches!(result, Err(KernelError::Rule(_))));
    }

    #[test]
    fn standard_order_is_fixed() {
        let set = ok(ClassifierSet::standard());
        assert_eq!(
            set.categories(),
            vec![
                Category::Fraudsters,
                Category::Businesses,
                Category::NewUsers,
                Category::RealEstateAgents,
            ]
        );
    }

    #[test]
    fn business_keyword_alone_needs_supporting_evidence() {
        let set = ok(ClassifierSet::standard());
        let keyword_only = set.evaluate("supply_total_posts: 2\ndemand_searches_made: 1\nفروشگاه");
        assert!(!keyword_only.categories.contains(&Category::Businesses));

        let with_volume =
            set.evaluate("supply_total_posts: 25\ndemand_searches_made: 1\nفروشگاه لوازم خانگی");
        assert!(with_volume.categories.contains(&Category::Businesses));
    }
}
