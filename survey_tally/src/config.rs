// ********* Input data structures ***********

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::Display;

use crate::dataset::Row;

/// The rows of a raw spreadsheet payload: the first row holds the column
/// headers, every following row holds the answers of one respondent.
pub type RawMatrix = Vec<Vec<String>>;

/// The demographic filters selected by the user.
///
/// Each entry maps a column name to the set of values that are accepted for
/// this column. A column that is absent from the filter is not constrained.
/// The sets are never empty: inserting an empty set removes the column.
///
/// Filters are values: two filters with the same content compare (and hash)
/// equal, regardless of how they were built.
#[derive(Eq, PartialEq, Debug, Clone, Default, Hash)]
pub struct FilterSpec {
    columns: BTreeMap<String, BTreeSet<String>>,
}

impl FilterSpec {
    pub fn new() -> FilterSpec {
        FilterSpec {
            columns: BTreeMap::new(),
        }
    }

    /// Adds a constraint on a column, replacing any previous one.
    ///
    /// ```
    /// use survey_tally::FilterSpec;
    ///
    /// let filters = FilterSpec::new()
    ///     .with("REGIAO", ["Sul", "Sudeste"])
    ///     .with("SEXO", ["Feminino"]);
    /// assert_eq!(filters.len(), 2);
    /// ```
    pub fn with<I, S>(mut self, column: &str, values: I) -> FilterSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(column, values.into_iter().map(|s| s.into()).collect());
        self
    }

    pub fn insert(&mut self, column: &str, values: BTreeSet<String>) {
        if values.is_empty() {
            self.columns.remove(column);
        } else {
            self.columns.insert(column.to_string(), values);
        }
    }

    /// Accepts one more value for the given column.
    pub fn add_value(&mut self, column: &str, value: &str) {
        self.columns
            .entry(column.to_string())
            .or_default()
            .insert(value.to_string());
    }

    pub fn get(&self, column: &str) -> Option<&BTreeSet<String>> {
        self.columns.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// The constraints, ordered by column name.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.columns.iter()
    }

    /// A textual form that only depends on the content of the filter.
    /// Columns and values are already sorted, and separated by control
    /// characters that do not appear in spreadsheet cells.
    pub fn canonical_text(&self) -> String {
        let mut s = String::new();
        for (column, values) in self.columns.iter() {
            s.push_str(column);
            s.push('\u{1f}');
            for v in values.iter() {
                s.push_str(v);
                s.push('\u{1e}');
            }
            s.push('\u{1d}');
        }
        s
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for FilterSpec {
    fn from_iter<T: IntoIterator<Item = (S, Vec<String>)>>(iter: T) -> Self {
        let mut res = FilterSpec::new();
        for (column, values) in iter {
            let column: String = column.into();
            res.insert(&column, values.into_iter().collect());
        }
        res
    }
}

/// One configured demographic dimension: a display label and the column
/// names it may appear under, in order of preference.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DemographicSpec {
    pub label: String,
    pub aliases: Vec<String>,
}

impl DemographicSpec {
    pub fn new(label: &str, aliases: &[&str]) -> DemographicSpec {
        DemographicSpec {
            label: label.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ******** Output data structures *********

/// The tally of one response value.
#[derive(PartialEq, Debug, Clone)]
pub struct ResponseStat {
    pub response: String,
    /// Number of respondents who gave this response.
    pub count: u64,
    /// Sum of the weights of these respondents.
    pub weight_sum: f64,
    /// Share of the weighted total, in [0, 100].
    pub percentage: f64,
}

/// The weighted distribution of the answers to one variable.
///
/// Invariants: the `weight_sum` of all the responses adds up to
/// `total_weight`, and their `count` adds up to `total_count`.
#[derive(PartialEq, Debug, Clone)]
pub struct VariableStats {
    pub data: Vec<ResponseStat>,
    pub total_weight: f64,
    pub total_count: u64,
    /// Same as `total_count`. Kept for the consumers that read this name.
    pub total_responses: u64,
}

impl VariableStats {
    pub const EMPTY: VariableStats = VariableStats {
        data: Vec::new(),
        total_weight: 0.0,
        total_count: 0,
        total_responses: 0,
    };

    pub fn response(&self, name: &str) -> Option<&ResponseStat> {
        self.data.iter().find(|rs| rs.response == name)
    }
}

/// The combined tally of several sibling variables that encode a single
/// multi-mention question.
///
/// Percentages are relative to the respondent universe, so they may add up
/// to more than 100.
#[derive(PartialEq, Debug, Clone)]
pub struct AggregatedStats {
    pub data: Vec<ResponseStat>,
    /// Number of respondents of the first variable, used as denominator.
    pub universe: u64,
    pub total_weight: f64,
    pub total_count: u64,
}

impl AggregatedStats {
    pub fn response(&self, name: &str) -> Option<&ResponseStat> {
        self.data.iter().find(|rs| rs.response == name)
    }
}

/// A filterable column with all the values observed in the dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DemographicVariable {
    /// The column name that matched in the dataset.
    pub key: String,
    pub label: String,
    /// Distinct values, sorted.
    pub values: Vec<String>,
}

/// The rows of two waves that pass the same filter.
///
/// The two lists are independent: they are not paired row by row and
/// usually have different lengths.
#[derive(PartialEq, Debug, Clone)]
pub struct WaveFilterResult<'a> {
    pub wave1_rows: Vec<&'a Row>,
    pub wave2_rows: Vec<&'a Row>,
}

/// Errors raised while assembling a dataset by hand.
///
/// The statistics themselves never fail: degenerate inputs produce empty
/// or zero results.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyErrors {
    /// The header row does not contain any usable column name.
    EmptyHeader,
    /// A data row was added before the header row.
    MissingHeader,
}

impl Error for SurveyErrors {}

impl Display for SurveyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyErrors::EmptyHeader => write!(f, "the header row has no named column"),
            SurveyErrors::MissingHeader => write!(f, "a data row was added before the header"),
        }
    }
}

/// The percentages of one response in two waves.
#[derive(PartialEq, Debug, Clone)]
pub struct ResponseComparison {
    pub response: String,
    pub previous: f64,
    pub current: f64,
    /// `current - previous`, in percentage points.
    pub difference: f64,
}

/// The same question tallied on two waves under the same filters.
#[derive(PartialEq, Debug, Clone)]
pub struct WaveComparison {
    pub responses: Vec<ResponseComparison>,
    pub previous_sample: u64,
    pub current_sample: u64,
    pub previous_margin: f64,
    pub current_margin: f64,
}
