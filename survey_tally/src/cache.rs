use log::debug;

use std::collections::HashMap;

use crate::config::*;
use crate::dataset::ProcessedDataset;

/// A digest of the content of a filter. Equal filters have equal digests.
pub fn filters_digest(filters: &FilterSpec) -> String {
    sha256::digest(filters.canonical_text())
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
struct CacheKey {
    version: u64,
    filters_digest: String,
    variable: String,
}

/// Memoizes the statistics of a dataset.
///
/// Entries are keyed by the version of the dataset, the content of the
/// filters and the variable name. Replacing the dataset bumps the version
/// and drops every entry.
///
/// ```
/// use survey_tally::cache::StatsCache;
/// use survey_tally::{parse_matrix, FilterSpec};
///
/// let m: Vec<Vec<String>> = vec![
///     vec!["P1".into(), "weight".into()],
///     vec!["Sim".into(), "1".into()],
/// ];
/// let mut cache = StatsCache::new(parse_matrix(&m));
/// let f = FilterSpec::new();
/// let first = cache.variable_stats("P1", &f);
/// assert_eq!(cache.variable_stats("P1", &f), first);
/// assert_eq!(cache.hits(), 1);
/// ```
#[derive(Debug)]
pub struct StatsCache {
    dataset: ProcessedDataset,
    version: u64,
    entries: HashMap<CacheKey, Option<VariableStats>>,
    hits: u64,
}

impl StatsCache {
    pub fn new(dataset: ProcessedDataset) -> StatsCache {
        StatsCache {
            dataset,
            version: 1,
            entries: HashMap::new(),
            hits: 0,
        }
    }

    pub fn dataset(&self) -> &ProcessedDataset {
        &self.dataset
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of lookups answered from memory.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Swaps in a new dataset and forgets every result of the previous one.
    pub fn replace_dataset(&mut self, dataset: ProcessedDataset) {
        debug!(
            "StatsCache: replacing dataset version {}, dropping {} entries",
            self.version,
            self.entries.len()
        );
        self.dataset = dataset;
        self.version += 1;
        self.entries.clear();
    }

    /// See [`ProcessedDataset::variable_stats`].
    pub fn variable_stats(&mut self, variable: &str, filters: &FilterSpec) -> Option<VariableStats> {
        let key = CacheKey {
            version: self.version,
            filters_digest: filters_digest(filters),
            variable: variable.to_string(),
        };
        if let Some(res) = self.entries.get(&key) {
            self.hits += 1;
            return res.clone();
        }
        let res = self.dataset.variable_stats(variable, filters);
        self.entries.insert(key, res.clone());
        res
    }

    /// See [`crate::aggregate_variables`]. Every sibling variable goes through
    /// the cache.
    pub fn aggregate_variables<S: AsRef<str>>(
        &mut self,
        variables: &[S],
        filters: &FilterSpec,
    ) -> AggregatedStats {
        crate::aggregate_variables(variables, filters, |v, f| self.variable_stats(v, f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_matrix;

    fn matrix(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn cache() -> StatsCache {
        let m = matrix(&[
            &["P1", "P2", "SEXO", "weight"],
            &["Sim", "Sim", "F", "1"],
            &["Não", "-1", "M", "1"],
        ]);
        StatsCache::new(parse_matrix(&m))
    }

    #[test]
    fn digests_depend_on_content_only() {
        let mut a = FilterSpec::new();
        a.add_value("SEXO", "F");
        a.add_value("REGIAO", "Sul");
        let b = FilterSpec::new()
            .with("REGIAO", ["Sul"])
            .with("SEXO", ["F"]);
        assert_eq!(filters_digest(&a), filters_digest(&b));
        let c = FilterSpec::new().with("SEXO", ["M"]);
        assert_ne!(filters_digest(&a), filters_digest(&c));
    }

    #[test]
    fn repeated_lookups_hit() {
        let mut c = cache();
        let f = FilterSpec::new().with("SEXO", ["F"]);
        let s1 = c.variable_stats("P1", &f);
        let s2 = c.variable_stats("P1", &f.clone());
        assert_eq!(s1, s2);
        assert_eq!(c.hits(), 1);
        assert_eq!(c.len(), 1);
        let _ = c.variable_stats("P1", &FilterSpec::new());
        assert_eq!(c.len(), 2);
        // Missing variables are remembered too.
        assert_eq!(c.variable_stats("P9", &f), None);
        assert_eq!(c.variable_stats("P9", &f), None);
        assert_eq!(c.hits(), 2);
    }

    #[test]
    fn replacing_the_dataset_invalidates() {
        let mut c = cache();
        let f = FilterSpec::new();
        assert_eq!(c.variable_stats("P1", &f).unwrap().total_count, 2);
        let m = matrix(&[&["P1", "weight"], &["Sim", "1"], &["Sim", "1"], &["Não", "1"]]);
        c.replace_dataset(parse_matrix(&m));
        assert!(c.is_empty());
        assert_eq!(c.version(), 2);
        assert_eq!(c.variable_stats("P1", &f).unwrap().total_count, 3);
        assert_eq!(c.hits(), 0);
    }

    #[test]
    fn aggregation_goes_through_the_cache() {
        let mut c = cache();
        let f = FilterSpec::new();
        let agg = c.aggregate_variables(&["P1", "P2"], &f);
        assert_eq!(agg.universe, 2);
        assert_eq!(agg.response("Sim").unwrap().count, 2);
        assert!((agg.response("Sim").unwrap().percentage - 100.0).abs() < 1e-9);
        assert_eq!(c.len(), 2);
        c.aggregate_variables(&["P1", "P2"], &f);
        assert_eq!(c.hits(), 2);
    }
}
