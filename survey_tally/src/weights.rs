use log::{debug, warn};

use crate::dataset::Row;

// Markers of the precise weight column. "deciamis" is a misspelling that
// exists in the headers of published datasets and must keep matching.
const PRECISE_WEIGHT_MARKERS: [&str; 4] = ["16 casas", "decimais", "deciamis", "spss"];

const GENERIC_WEIGHT_NAMES: [&str; 2] = ["weights", "weight"];

/// Finds the weight column among the given column names.
///
/// A column whose name mentions the full-precision weight wins over a column
/// simply named `weight`/`weights`. Within each rule, the first column in the
/// given order is selected. Returns `None` when no column qualifies; rows are
/// then weighted 0.
pub fn resolve_weight_column<'a, I>(columns: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let columns: Vec<&str> = columns.into_iter().collect();
    let precise = columns.iter().find(|c| {
        let lc = c.to_lowercase();
        PRECISE_WEIGHT_MARKERS.iter().any(|m| lc.contains(m))
    });
    if let Some(c) = precise {
        debug!("resolve_weight_column: precise weight column {:?}", c);
        return Some(c.to_string());
    }
    let generic = columns
        .iter()
        .find(|c| GENERIC_WEIGHT_NAMES.contains(&c.to_lowercase().as_str()));
    if let Some(c) = generic {
        debug!("resolve_weight_column: generic weight column {:?}", c);
        return Some(c.to_string());
    }
    warn!(
        "resolve_weight_column: no weight column among {} columns, all weights are 0",
        columns.len()
    );
    None
}

/// Reads a weight cell written with either a decimal comma or a decimal point.
/// Missing, empty or unreadable cells weigh 0.
pub fn parse_weight(cell: Option<&str>) -> f64 {
    let s = match cell {
        Some(s) => s.trim(),
        None => return 0.0,
    };
    if s.is_empty() {
        return 0.0;
    }
    // Every comma becomes a point and the whole text must parse.
    match s.replace(',', ".").parse::<f64>() {
        Ok(w) if w.is_finite() => w,
        _ => {
            debug!("parse_weight: could not read weight {:?}", s);
            0.0
        }
    }
}

/// The weight of a row, given the resolved weight column.
pub fn row_weight(row: &Row, weight_column: Option<&str>) -> f64 {
    match weight_column {
        Some(c) => parse_weight(row.get(c)),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precise_weight_wins() {
        let cols = ["ID", "weights", "Peso 16 casas decimais", "P1"];
        assert_eq!(
            resolve_weight_column(cols),
            Some("Peso 16 casas decimais".to_string())
        );
    }

    #[test]
    fn misspelled_marker_still_matches() {
        let cols = ["Weight", "PESO DECIAMIS"];
        assert_eq!(resolve_weight_column(cols), Some("PESO DECIAMIS".to_string()));
        let cols = ["weight", "peso_SPSS"];
        assert_eq!(resolve_weight_column(cols), Some("peso_SPSS".to_string()));
    }

    #[test]
    fn generic_weight_is_exact_match() {
        assert_eq!(
            resolve_weight_column(["ID", "Weights"]),
            Some("Weights".to_string())
        );
        assert_eq!(resolve_weight_column(["ID", "weighted_flag"]), None);
        assert_eq!(resolve_weight_column(["ID", "P1"]), None);
    }

    #[test]
    fn first_precise_column_in_order() {
        let cols = ["peso spss", "peso 16 casas"];
        assert_eq!(resolve_weight_column(cols), Some("peso spss".to_string()));
    }

    #[test]
    fn parses_locale_numbers() {
        assert_eq!(parse_weight(Some("1,25")), 1.25);
        assert_eq!(parse_weight(Some(" 0.5 ")), 0.5);
        assert_eq!(parse_weight(Some("2")), 2.0);
    }

    #[test]
    fn bad_cells_weigh_zero() {
        assert_eq!(parse_weight(None), 0.0);
        assert_eq!(parse_weight(Some("")), 0.0);
        assert_eq!(parse_weight(Some("#NULL!")), 0.0);
        assert_eq!(parse_weight(Some("NaN")), 0.0);
        assert_eq!(parse_weight(Some("1,234,5")), 0.0);
        assert_eq!(parse_weight(Some("1.5abc")), 0.0);
    }

    #[test]
    fn row_without_weight_column() {
        let row = Row::from_pairs(&[("P1", "Sim"), ("weight", "3")]);
        assert_eq!(row_weight(&row, None), 0.0);
        assert_eq!(row_weight(&row, Some("weight")), 3.0);
        assert_eq!(row_weight(&row, Some("other")), 0.0);
    }
}
