//! Registry-to-series reconciliation.
//!
//! The registry names a unit "Edwin I. Hatch Nuclear Plant, Unit 1" while the
//! status feed calls it "Hatch 1". Each registry entry is run through an
//! ordered list of [`MatchStrategy`] tiers; the first tier that produces a
//! key wins and later tiers are never consulted.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::metrics::PerformanceMetrics;
use crate::names::{normalize, plant_base_name, trailing_unit_number};
use crate::registry::RegistryEntry;

/// Curated registry-name to series-key overrides.
pub type AliasTable = BTreeMap<String, String>;

/// Hand-maintained aliases for names no automatic tier resolves correctly.
pub fn builtin_aliases() -> AliasTable {
    [
        ("Callaway Plant", "Callaway 1"),
        ("Cooper Nuclear Station", "Cooper 1"),
        ("Davis-Besse Nuclear Power Station, Unit 1", "Davis-Besse"),
        ("Donald C. Cook Nuclear Plant, Unit 1", "D.C. Cook 1"),
        ("Donald C. Cook Nuclear Plant, Unit 2", "D.C. Cook 2"),
        ("James A. FitzPatrick Nuclear Power Plant", "Fitzpatrick 1"),
        ("R.E. Ginna Nuclear Power Plant", "Ginna 1"),
        ("St. Lucie Plant, Unit 1", "St. Lucie 1"),
        ("St. Lucie Plant, Unit 2", "St. Lucie 2"),
        ("Shearon Harris Nuclear Power Plant, Unit 1", "Harris 1"),
        ("Edwin I. Hatch Nuclear Plant, Unit 1", "Hatch 1"),
        ("Edwin I. Hatch Nuclear Plant, Unit 2", "Hatch 2"),
        ("Joseph M. Farley Nuclear Plant, Unit 1", "Farley 1"),
        ("Joseph M. Farley Nuclear Plant, Unit 2", "Farley 2"),
        ("H.B. Robinson Steam Electric Plant, Unit 2", "Robinson 2"),
        ("H. B. Robinson Steam Electric Plant, Unit 2", "Robinson 2"),
        ("V.C. Summer Nuclear Station, Unit 1", "Summer 1"),
        ("Virgil C. Summer Nuclear Station, Unit 1", "Summer 1"),
        ("Palisades Nuclear Plant", "Palisades 1"),
    ]
    .into_iter()
    .map(|(name, key)| (name.to_string(), key.to_string()))
    .collect()
}

/// Which tier produced a match, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Alias,
    Exact,
    Normalized,
    Heuristic,
}

/// Series keys prepared once for every lookup strategy.
///
/// Keys are held in lexicographic order so any scan over them is
/// reproducible from run to run.
pub struct CandidateIndex<'m> {
    keys: Vec<&'m str>,
    normalized: HashMap<String, &'m str>,
    bases: Vec<Candidate<'m>>,
}

struct Candidate<'m> {
    key: &'m str,
    base: String,
    unit: Option<&'m str>,
}

impl<'m> CandidateIndex<'m> {
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'m str>,
    {
        let mut keys: Vec<&'m str> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();

        let mut normalized = HashMap::with_capacity(keys.len());
        for key in &keys {
            normalized.entry(normalize(key)).or_insert(*key);
        }

        let bases = keys
            .iter()
            .map(|&key| Candidate {
                key,
                base: plant_base_name(key).to_lowercase(),
                unit: trailing_unit_number(key),
            })
            .collect();

        Self {
            keys,
            normalized,
            bases,
        }
    }

    /// The stored key equal to `key`, if present.
    pub fn get(&self, key: &str) -> Option<&'m str> {
        self.keys
            .binary_search_by(|probe| (*probe).cmp(key))
            .ok()
            .map(|idx| self.keys[idx])
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One way of resolving a registry name to a series key.
pub trait MatchStrategy: Send + Sync {
    fn tier(&self) -> MatchTier;

    /// Returns the matching series key, if this strategy finds one.
    fn find<'m>(&self, name: &str, index: &CandidateIndex<'m>) -> Option<&'m str>;
}

/// Curated alias lookup; only counts when the aliased key is in the feed.
pub struct AliasTier {
    aliases: AliasTable,
}

impl AliasTier {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }
}

impl MatchStrategy for AliasTier {
    fn tier(&self) -> MatchTier {
        MatchTier::Alias
    }

    fn find<'m>(&self, name: &str, index: &CandidateIndex<'m>) -> Option<&'m str> {
        self.aliases.get(name).and_then(|key| index.get(key))
    }
}

pub struct ExactTier;

impl MatchStrategy for ExactTier {
    fn tier(&self) -> MatchTier {
        MatchTier::Exact
    }

    fn find<'m>(&self, name: &str, index: &CandidateIndex<'m>) -> Option<&'m str> {
        index.get(name)
    }
}

/// Equality after [`normalize`] on both sides.
///
/// When several keys normalize alike, the lexicographically first one is
/// used.
pub struct NormalizedTier;

impl MatchStrategy for NormalizedTier {
    fn tier(&self) -> MatchTier {
        MatchTier::Normalized
    }

    fn find<'m>(&self, name: &str, index: &CandidateIndex<'m>) -> Option<&'m str> {
        index.normalized.get(&normalize(name)).copied()
    }
}

/// Partial plant-name match with agreeing unit numbers.
///
/// A candidate matches when the lowercase base names contain one another,
/// or when any word of the registry base longer than `min_token_len`
/// characters occurs inside the candidate base. Trailing unit numbers must
/// be equal or both absent. Candidates are tried in key order and the first
/// hit wins.
pub struct HeuristicTier {
    min_token_len: usize,
}

impl HeuristicTier {
    pub fn new(min_token_len: usize) -> Self {
        Self { min_token_len }
    }
}

impl Default for HeuristicTier {
    fn default() -> Self {
        Self::new(4)
    }
}

impl MatchStrategy for HeuristicTier {
    fn tier(&self) -> MatchTier {
        MatchTier::Heuristic
    }

    fn find<'m>(&self, name: &str, index: &CandidateIndex<'m>) -> Option<&'m str> {
        let base = plant_base_name(name).to_lowercase();
        let unit = trailing_unit_number(name);
        let tokens: Vec<&str> = base
            .split_whitespace()
            .filter(|word| word.chars().count() > self.min_token_len)
            .collect();

        index
            .bases
            .iter()
            .find(|c| {
                c.unit == unit
                    && (c.base.contains(base.as_str())
                        || base.contains(c.base.as_str())
                        || tokens.iter().any(|t| c.base.contains(*t)))
            })
            .map(|c| c.key)
    }
}

/// A resolved series key and the tier that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'m> {
    pub key: &'m str,
    pub tier: MatchTier,
}

/// A registry entry paired with the metrics it was matched to.
///
/// Serializes as the registry fields plus `performance` (object or null).
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledEntry<'a> {
    #[serde(flatten)]
    pub entry: &'a RegistryEntry,
    pub performance: Option<&'a PerformanceMetrics>,
    #[serde(skip)]
    pub matched: Option<Match<'a>>,
}

/// Match counters for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub matched: usize,
    pub unmatched: usize,
    pub unmatched_names: Vec<String>,
    pub by_tier: BTreeMap<MatchTier, usize>,
}

#[derive(Debug, Clone)]
pub struct Reconciliation<'a> {
    pub entries: Vec<ReconciledEntry<'a>>,
    pub report: MatchReport,
}

/// Runs registry names through the match tiers in priority order.
pub struct Reconciler {
    tiers: Vec<Box<dyn MatchStrategy>>,
}

impl Reconciler {
    /// The standard tier order: alias, exact, normalized, heuristic.
    pub fn new(aliases: AliasTable) -> Self {
        Self::with_tiers(vec![
            Box::new(AliasTier::new(aliases)),
            Box::new(ExactTier),
            Box::new(NormalizedTier),
            Box::new(HeuristicTier::default()),
        ])
    }

    pub fn with_tiers(tiers: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { tiers }
    }

    /// First tier match for `name`, if any.
    pub fn match_name<'m>(&self, name: &str, index: &CandidateIndex<'m>) -> Option<Match<'m>> {
        self.tiers.iter().find_map(|strategy| {
            strategy.find(name, index).map(|key| Match {
                key,
                tier: strategy.tier(),
            })
        })
    }

    /// Pairs every registry entry with at most one metrics record.
    ///
    /// Entries without a match get `performance: None` and are counted in
    /// the report; a miss is never an error.
    pub fn reconcile<'a>(
        &self,
        registry: &'a [RegistryEntry],
        metrics: &'a BTreeMap<String, PerformanceMetrics>,
    ) -> Reconciliation<'a> {
        let index = CandidateIndex::new(metrics.keys().map(String::as_str));
        let mut report = MatchReport::default();
        let mut entries = Vec::with_capacity(registry.len());

        for entry in registry {
            let matched = self.match_name(&entry.name, &index);
            let performance = matched.and_then(|m| metrics.get(m.key));
            match matched {
                Some(m) => {
                    debug!(name = %entry.name, key = m.key, tier = ?m.tier, "matched");
                    report.matched += 1;
                    *report.by_tier.entry(m.tier).or_default() += 1;
                }
                None => {
                    warn!(name = %entry.name, "no performance data");
                    report.unmatched += 1;
                    report.unmatched_names.push(entry.name.clone());
                }
            }
            entries.push(ReconciledEntry {
                entry,
                performance,
                matched,
            });
        }

        info!(
            matched = report.matched,
            unmatched = report.unmatched,
            "reconciled registry against series"
        );
        Reconciliation { entries, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index<'m>(keys: &[&'m str]) -> CandidateIndex<'m> {
        CandidateIndex::new(keys.iter().copied())
    }

    fn standard() -> Reconciler {
        Reconciler::new(builtin_aliases())
    }

    #[test]
    fn alias_beats_heuristic() {
        let idx = index(&["Cook Nuclear 1", "Cook Nuclear", "D.C. Cook 1"]);
        let m = standard().match_name("Donald C. Cook Nuclear Plant, Unit 1", &idx);
        assert_eq!(
            m,
            Some(Match {
                key: "D.C. Cook 1",
                tier: MatchTier::Alias
            })
        );
        // Without the alias the heuristic tier would have taken a different key.
        let heuristic = HeuristicTier::default().find("Donald C. Cook Nuclear Plant, Unit 1", &idx);
        assert_eq!(heuristic, Some("Cook Nuclear 1"));
    }

    #[test]
    fn alias_requires_key_in_feed() {
        let idx = index(&["Callaway"]);
        let m = standard().match_name("Callaway Plant", &idx);
        assert_eq!(m.map(|m| m.tier), Some(MatchTier::Normalized));
        assert_eq!(m.map(|m| m.key), Some("Callaway"));
    }

    #[test]
    fn exact_before_normalized() {
        let idx = index(&["Byron 1", "byron 1"]);
        let m = standard().match_name("byron 1", &idx);
        assert_eq!(m.map(|m| (m.key, m.tier)), Some(("byron 1", MatchTier::Exact)));
    }

    #[test]
    fn normalized_match() {
        let idx = index(&["Nine Mile Point 1", "Nine Mile Point 2"]);
        let m = standard().match_name("Nine Mile Point Unit Two", &idx);
        assert_eq!(m.map(|m| (m.key, m.tier)), Some(("Nine Mile Point 2", MatchTier::Normalized)));
    }

    #[test]
    fn facility_suffix_defeats_normalized_tier() {
        // The suffix strip also removes ", Unit 2", so only the heuristic tier
        // can tell the two Salem units apart.
        let idx = index(&["Salem 1", "Salem 2"]);
        assert_eq!(NormalizedTier.find("Salem Nuclear Generating Station, Unit 2", &idx), None);
        let m = standard().match_name("Salem Nuclear Generating Station, Unit 2", &idx);
        assert_eq!(m.map(|m| (m.key, m.tier)), Some(("Salem 2", MatchTier::Heuristic)));
    }

    #[test]
    fn normalized_collision_prefers_first_key() {
        let idx = index(&["Watts Bar 1", "WATTS BAR 1"]);
        let m = NormalizedTier.find("Watts Bar Unit 1", &idx);
        assert_eq!(m, Some("WATTS BAR 1"));
    }

    #[test]
    fn heuristic_requires_matching_unit_numbers() {
        let idx = index(&["Browns Ferry 1", "Browns Ferry 2", "Browns Ferry 3"]);
        let tier = HeuristicTier::default();
        assert_eq!(tier.find("Browns Ferry Nuclear Plant, Unit 3", &idx), Some("Browns Ferry 3"));
        assert_eq!(tier.find("Browns Ferry Nuclear Plant", &idx), None);
    }

    #[test]
    fn heuristic_token_overlap() {
        let idx = index(&["Limerick 1", "Peach Bottom 2"]);
        let tier = HeuristicTier::default();
        assert_eq!(tier.find("Limerick Generating Station, Unit 1", &idx), Some("Limerick 1"));
        assert_eq!(tier.find("Bottom Peach Co 2", &idx), Some("Peach Bottom 2"));
        // Short tokens alone are not enough.
        assert_eq!(tier.find("Peac Bott 2", &idx), None);
    }

    #[test]
    fn heuristic_scan_is_lexicographic() {
        // Insertion order must not matter.
        let a = index(&["Zion Creek 1", "Creek 1"]);
        let b = index(&["Creek 1", "Zion Creek 1"]);
        let tier = HeuristicTier::default();
        let name = "Clinton Creek Power Station, Unit 1";
        assert_eq!(tier.find(name, &a), Some("Creek 1"));
        assert_eq!(tier.find(name, &b), Some("Creek 1"));
    }

    #[test]
    fn reconcile_counts_misses() {
        let mut metrics = BTreeMap::new();
        let anchor = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let perf = crate::metrics::compute_unit(
            &crate::metrics::ObservationSeries::new(
                "Hatch 1",
                vec![crate::metrics::Observation::new("Hatch 1", anchor, Some(99.0))],
            ),
            anchor,
            &crate::metrics::MetricsSettings::default(),
        );
        metrics.insert("Hatch 1".to_string(), perf);

        let registry = vec![
            RegistryEntry::named("Edwin I. Hatch Nuclear Plant, Unit 1"),
            RegistryEntry::named("Nowhere Station"),
        ];
        let result = standard().reconcile(&registry, &metrics);
        assert_eq!(result.report.matched, 1);
        assert_eq!(result.report.unmatched, 1);
        assert_eq!(result.report.unmatched_names, vec!["Nowhere Station".to_string()]);
        assert_eq!(result.report.by_tier.get(&MatchTier::Alias), Some(&1));
        assert!(result.entries[0].performance.is_some());
        assert!(result.entries[1].performance.is_none());

        let json = serde_json::to_value(&result.entries[1]).ok();
        let perf = json.as_ref().and_then(|v| v.get("performance"));
        assert_eq!(perf, Some(&serde_json::Value::Null));
        assert_eq!(
            json.as_ref().and_then(|v| v.get("name")).and_then(|v| v.as_str()),
            Some("Nowhere Station")
        );
    }
}
