use log::{debug, info};

use std::collections::BTreeSet;

use crate::config::*;
use crate::dataset::ProcessedDataset;

// Cells that are not offered as filter values.
const NOT_A_VALUE: [&str; 3] = ["", "#NULL!", "-1"];

/// The first alias of a configured demographic that is a column of the dataset.
pub fn resolve_alias<'a>(dataset: &ProcessedDataset, spec: &'a DemographicSpec) -> Option<&'a str> {
    spec.aliases
        .iter()
        .find(|a| dataset.has_column(a))
        .map(|a| a.as_str())
}

/// Lists the demographic variables available for filtering, with the values
/// observed in the dataset.
///
/// For every configured demographic, the first alias found among the headers is used
/// (aliases are tried in the configured order). A demographic without any
/// matching column, or without any usable value, is left out.
pub fn build_catalog(
    dataset: &ProcessedDataset,
    specs: &[DemographicSpec],
) -> Vec<DemographicVariable> {
    let mut res: Vec<DemographicVariable> = Vec::new();
    for spec in specs.iter() {
        let key = match resolve_alias(dataset, spec) {
            Some(k) => k,
            None => {
                debug!(
                    "build_catalog: {:?}: none of {:?} in the dataset",
                    spec.label, spec.aliases
                );
                continue;
            }
        };
        let values: BTreeSet<&str> = dataset
            .rows
            .iter()
            .filter_map(|r| r.get(key))
            .map(|v| v.trim())
            .filter(|v| !NOT_A_VALUE.contains(v))
            .collect();
        if values.is_empty() {
            debug!("build_catalog: {:?}: no value in column {:?}", spec.label, key);
            continue;
        }
        res.push(DemographicVariable {
            key: key.to_string(),
            label: spec.label.clone(),
            values: values.into_iter().map(|v| v.to_string()).collect(),
        });
    }
    info!(
        "build_catalog: {} demographic variables out of {} configured",
        res.len(),
        specs.len()
    );
    res
}
