mod config;
pub mod builder;
pub mod cache;
pub mod dataset;
pub mod demographics;
pub mod manual;
pub mod responses;
pub mod waves;
pub mod weights;

use log::{debug, info, warn};

use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};

pub use crate::config::*;
pub use crate::dataset::{parse_matrix, ProcessedDataset, Row};

use crate::dataset::key_space;
use crate::responses::{normalize_response, NormalizedResponse};
use crate::weights::{resolve_weight_column, row_weight};

// **** Private structures ****

// Running totals of one response, in order of first appearance.
#[derive(PartialEq, Debug, Clone)]
struct ResponseAcc {
    response: String,
    count: u64,
    weight_sum: f64,
}

#[derive(Debug, Default)]
struct Tally {
    order: HashMap<String, usize>,
    accs: Vec<ResponseAcc>,
}

impl Tally {
    fn add(&mut self, response: &str, count: u64, weight: f64) {
        let idx = match self.order.get(response) {
            Some(idx) => *idx,
            None => {
                self.order.insert(response.to_string(), self.accs.len());
                self.accs.push(ResponseAcc {
                    response: response.to_string(),
                    count: 0,
                    weight_sum: 0.0,
                });
                self.accs.len() - 1
            }
        };
        let acc = &mut self.accs[idx];
        acc.count += count;
        acc.weight_sum += weight;
    }

    // Largest weights first. Equal weights keep their order of appearance.
    fn into_stats(self, denominator: f64) -> Vec<ResponseStat> {
        let mut res: Vec<ResponseStat> = self
            .accs
            .into_iter()
            .map(|acc| ResponseStat {
                percentage: percentage(acc.weight_sum, denominator),
                response: acc.response,
                count: acc.count,
                weight_sum: acc.weight_sum,
            })
            .collect();
        res.sort_by(|a, b| b.weight_sum.total_cmp(&a.weight_sum));
        res
    }
}

fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

/// Checks that a row has an accepted value for every column of the filter.
/// A row without a value for a filtered column is rejected.
pub fn row_matches(row: &Row, filters: &FilterSpec) -> bool {
    filters
        .iter()
        .all(|(column, accepted)| row.get(column).map_or(false, |v| accepted.contains(v)))
}

/// Computes the weighted distribution of the answers to one variable.
///
/// Arguments:
/// * `variable` the column holding the answers
/// * `filters` only the rows accepted by these filters are counted
/// * `rows` the respondents
///
/// Returns `None` if no row has the column `variable`. Rows whose answer is
/// missing are left out of all the totals. The weight column is looked up
/// among the columns of the filtered rows (see [`weights::resolve_weight_column`]);
/// without one, all the weights and percentages are 0.
///
/// ```
/// use survey_tally::{compute_variable_stats, FilterSpec, Row};
///
/// let rows = vec![
///     Row::from_pairs(&[("Q", "Sim"), ("weight", "1,0")]),
///     Row::from_pairs(&[("Q", "Não"), ("weight", "1,0")]),
/// ];
/// let stats = compute_variable_stats("Q", &FilterSpec::new(), &rows).unwrap();
/// assert_eq!(stats.total_count, 2);
/// assert_eq!(stats.response("Sim").unwrap().percentage, 50.0);
/// ```
pub fn compute_variable_stats<R: Borrow<Row>>(
    variable: &str,
    filters: &FilterSpec,
    rows: &[R],
) -> Option<VariableStats> {
    if !key_space(rows).contains(&variable) {
        warn!(
            "compute_variable_stats: variable {:?} not found in {} rows",
            variable,
            rows.len()
        );
        return None;
    }

    let filtered: Vec<&Row> = rows
        .iter()
        .map(|r| <R as Borrow<Row>>::borrow(r))
        .filter(|r| row_matches(r, filters))
        .collect();
    debug!(
        "compute_variable_stats: {:?}: {} of {} rows pass the filters {:?}",
        variable,
        filtered.len(),
        rows.len(),
        filters
    );

    let weight_column = resolve_weight_column(key_space(&filtered));

    let mut tally = Tally::default();
    let mut total_weight: f64 = 0.0;
    let mut total_count: u64 = 0;
    for row in filtered.iter() {
        let response = match normalize_response(row.get(variable)) {
            NormalizedResponse::Answer(s) => s,
            NormalizedResponse::Excluded => continue,
        };
        let weight = row_weight(row, weight_column.as_deref());
        tally.add(&response, 1, weight);
        total_count += 1;
        total_weight += weight;
    }

    let data = tally.into_stats(total_weight);
    info!(
        "compute_variable_stats: {:?}: {} responses, {} distinct, total weight {}",
        variable,
        total_count,
        data.len(),
        total_weight
    );
    Some(VariableStats {
        data,
        total_weight,
        total_count,
        total_responses: total_count,
    })
}

/// Combines the sibling variables of a multi-mention question.
///
/// Arguments:
/// * `variables` the sibling columns. The first one defines the respondent
/// universe: all the siblings are assumed to be asked to the same people.
/// * `filters` passed to every lookup
/// * `lookup` computes the statistics of one variable, typically
/// [`compute_variable_stats`] or a [`cache::StatsCache`]
///
/// The same response given under several variables is merged into one entry.
/// Percentages are relative to the universe, not to the sum of the weights,
/// so their total may exceed 100. Variables that cannot be found are skipped.
pub fn aggregate_variables<S, F>(
    variables: &[S],
    filters: &FilterSpec,
    mut lookup: F,
) -> AggregatedStats
where
    S: AsRef<str>,
    F: FnMut(&str, &FilterSpec) -> Option<VariableStats>,
{
    let mut tally = Tally::default();
    let mut universe: Option<u64> = None;
    for var in variables.iter() {
        let var = var.as_ref();
        let stats = lookup(var, filters);
        if universe.is_none() {
            // Only the first variable counts, even when it is missing.
            universe = Some(stats.as_ref().map_or(0, |s| s.total_count));
        }
        match stats {
            Some(s) => {
                for rs in s.data.iter() {
                    tally.add(&rs.response, rs.count, rs.weight_sum);
                }
            }
            None => {
                warn!("aggregate_variables: skipping missing variable {:?}", var);
            }
        }
    }

    let universe = universe.unwrap_or(0);
    let total_weight: f64 = tally.accs.iter().map(|acc| acc.weight_sum).sum();
    let total_count: u64 = tally.accs.iter().map(|acc| acc.count).sum();
    debug!(
        "aggregate_variables: {} variables, universe {}, total weight {}",
        variables.len(),
        universe,
        total_weight
    );
    AggregatedStats {
        data: tally.into_stats(universe as f64),
        universe,
        total_weight,
        total_count,
    }
}

/// The margin of error of a proportion at 95% confidence, in percentage
/// points, for the worst case p = 0.5.
///
/// This assumes a simple random sample: the design effect of the weights is
/// not taken into account.
pub fn margin_of_error(sample_size: u64) -> f64 {
    if sample_size == 0 {
        return 0.0;
    }
    1.96 * (0.25 / sample_size as f64).sqrt() * 100.0
}

/// The filters of every group of a breakdown on `column`.
///
/// `values` are catalog values, which are trimmed. The filter of a value
/// accepts every cell of `rows` that trims to it, so that `"Sul "` is
/// counted with `"Sul"`. It replaces what `filters` may already say about
/// `column`.
pub fn breakdown_filters<R: Borrow<Row>>(
    filters: &FilterSpec,
    column: &str,
    values: &[String],
    rows: &[R],
) -> Vec<(String, FilterSpec)> {
    values
        .iter()
        .map(|v| {
            let mut accepted: BTreeSet<String> = rows
                .iter()
                .filter_map(|r| <R as Borrow<Row>>::borrow(r).get(column))
                .filter(|cell| cell.trim() == v.as_str())
                .map(|cell| cell.to_string())
                .collect();
            accepted.insert(v.clone());
            let mut f = filters.clone();
            f.insert(column, accepted);
            (v.clone(), f)
        })
        .collect()
}

/// Computes one variable for each value of a demographic column.
///
/// See [`breakdown_filters`] for the rows of each group. Values for which
/// the variable is missing are skipped.
pub fn breakdown_by<R: Borrow<Row>>(
    variable: &str,
    filters: &FilterSpec,
    column: &str,
    values: &[String],
    rows: &[R],
) -> Vec<(String, VariableStats)> {
    let mut res: Vec<(String, VariableStats)> = Vec::new();
    for (v, f) in breakdown_filters(filters, column, values, rows) {
        if let Some(stats) = compute_variable_stats(variable, &f, rows) {
            res.push((v, stats));
        }
    }
    debug!(
        "breakdown_by: {:?} by {:?}: {} groups",
        variable,
        column,
        res.len()
    );
    res
}

impl ProcessedDataset {
    /// Same as [`compute_variable_stats`], but checks the variable against the
    /// header of the dataset.
    pub fn variable_stats(&self, variable: &str, filters: &FilterSpec) -> Option<VariableStats> {
        if !self.has_column(variable) {
            warn!("variable_stats: unknown variable {:?}", variable);
            return None;
        }
        compute_variable_stats(variable, filters, &self.rows)
            .or_else(|| Some(VariableStats::EMPTY))
    }

    pub fn aggregate_variables<S: AsRef<str>>(
        &self,
        variables: &[S],
        filters: &FilterSpec,
    ) -> AggregatedStats {
        aggregate_variables(variables, filters, |v, f| self.variable_stats(v, f))
    }
}
