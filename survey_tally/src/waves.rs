use log::debug;

use std::collections::{BTreeSet, HashMap};

use crate::config::*;
use crate::dataset::Row;
use crate::{aggregate_variables, compute_variable_stats, margin_of_error};

/// Translates a column name of the current wave into the name used by the
/// previous wave. Columns that were not renamed are returned unchanged.
pub fn previous_column<'a>(column: &'a str, column_map: &'a HashMap<String, String>) -> &'a str {
    column_map.get(column).map(|s| s.as_str()).unwrap_or(column)
}

/// Checks a cell against the accepted values of a filter: an exact match,
/// or failing that, a match ignoring case and surrounding spaces.
pub fn value_matches(value: Option<&str>, accepted: &BTreeSet<String>) -> bool {
    let value = match value {
        Some(v) => v,
        None => return false,
    };
    if accepted.contains(value) {
        return true;
    }
    let norm = value.trim().to_lowercase();
    accepted.iter().any(|a| a.trim().to_lowercase() == norm)
}

// `column_map` is only given for the rows of the previous wave.
fn passes(row: &Row, filters: &FilterSpec, column_map: Option<&HashMap<String, String>>) -> bool {
    filters.iter().all(|(column, accepted)| {
        let column = match column_map {
            Some(m) => previous_column(column, m),
            None => column.as_str(),
        };
        value_matches(row.get(column), accepted)
    })
}

/// Applies one filter to the rows of two waves.
///
/// The filter is written with the column names of the current wave
/// (`wave2_rows`). For the previous wave (`wave1_rows`), every column is
/// first translated through `column_map`. Neither input is modified.
pub fn filter_waves<'a>(
    filters: &FilterSpec,
    wave1_rows: &'a [Row],
    wave2_rows: &'a [Row],
    column_map: &HashMap<String, String>,
) -> WaveFilterResult<'a> {
    let wave1: Vec<&Row> = wave1_rows
        .iter()
        .filter(|r| passes(r, filters, Some(column_map)))
        .collect();
    let wave2: Vec<&Row> = wave2_rows
        .iter()
        .filter(|r| passes(r, filters, None))
        .collect();
    debug!(
        "filter_waves: previous wave {}/{} rows, current wave {}/{} rows",
        wave1.len(),
        wave1_rows.len(),
        wave2.len(),
        wave2_rows.len()
    );
    WaveFilterResult {
        wave1_rows: wave1,
        wave2_rows: wave2,
    }
}

// The responses and the sample size of a question on already filtered rows.
fn tally_question<S: AsRef<str>>(variables: &[S], rows: &[&Row]) -> (Vec<ResponseStat>, u64) {
    let no_filter = FilterSpec::new();
    match variables {
        [single] => compute_variable_stats(single.as_ref(), &no_filter, rows)
            .map(|s| (s.data, s.total_count))
            .unwrap_or((Vec::new(), 0)),
        _ => {
            let agg = aggregate_variables(variables, &no_filter, |v, f| {
                compute_variable_stats(v, f, rows)
            });
            (agg.data, agg.universe)
        }
    }
}

/// Tallies a question on two waves under the same filter.
///
/// `variables` are the columns of the question in the current wave: one
/// column for a simple question, several for a multi-mention question. They
/// are translated through `column_map` for the previous wave, like the
/// filter columns. A response that only appears in one wave is reported at 0
/// in the other one.
pub fn compare_waves<S: AsRef<str>>(
    variables: &[S],
    filters: &FilterSpec,
    wave1_rows: &[Row],
    wave2_rows: &[Row],
    column_map: &HashMap<String, String>,
) -> WaveComparison {
    let filtered = filter_waves(filters, wave1_rows, wave2_rows, column_map);
    let previous_vars: Vec<&str> = variables
        .iter()
        .map(|v| previous_column(v.as_ref(), column_map))
        .collect();

    let (previous, previous_sample) = tally_question(&previous_vars, &filtered.wave1_rows);
    let (current, current_sample) = tally_question(variables, &filtered.wave2_rows);

    let previous_pct: HashMap<&str, f64> = previous
        .iter()
        .map(|rs| (rs.response.as_str(), rs.percentage))
        .collect();
    let mut responses: Vec<ResponseComparison> = current
        .iter()
        .map(|rs| {
            let prev = previous_pct.get(rs.response.as_str()).cloned().unwrap_or(0.0);
            ResponseComparison {
                response: rs.response.clone(),
                previous: prev,
                current: rs.percentage,
                difference: rs.percentage - prev,
            }
        })
        .collect();
    for rs in previous.iter() {
        if !current.iter().any(|c| c.response == rs.response) {
            responses.push(ResponseComparison {
                response: rs.response.clone(),
                previous: rs.percentage,
                current: 0.0,
                difference: -rs.percentage,
            });
        }
    }

    WaveComparison {
        responses,
        previous_sample,
        current_sample,
        previous_margin: margin_of_error(previous_sample),
        current_margin: margin_of_error(current_sample),
    }
}
