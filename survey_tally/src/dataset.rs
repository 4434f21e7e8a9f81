use log::{debug, info, warn};

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// The column layout shared by all the rows of one dataset.
// Invariant: `names` is free of duplicates and empty strings, and `slots`
// maps every name to its position in `names`.
#[derive(Eq, PartialEq, Debug)]
struct Schema {
    names: Vec<String>,
    slots: HashMap<String, usize>,
}

impl Schema {
    fn from_names(names: Vec<String>) -> Schema {
        let slots = names
            .iter()
            .enumerate()
            .map(|(idx, n)| (n.clone(), idx))
            .collect();
        Schema { names, slots }
    }
}

/// The answers of one respondent, addressed by column name.
///
/// The set of columns is only known at runtime (it comes from the header row
/// of the spreadsheet), so a row is looked up by name instead of by field.
/// A cell may be missing when the source row was shorter than the header.
#[derive(Debug, Clone)]
pub struct Row {
    schema: Arc<Schema>,
    cells: Vec<Option<String>>,
}

impl Row {
    /// Builds a standalone row. If a column name appears more than once, the
    /// last value wins, as it does for parsed spreadsheets.
    pub fn from_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> Row {
        let mut names: Vec<String> = Vec::new();
        let mut cells: Vec<Option<String>> = Vec::new();
        for (k, v) in pairs.iter() {
            let k = k.as_ref();
            if k.is_empty() {
                continue;
            }
            if let Some(pos) = names.iter().position(|n| n == k) {
                cells[pos] = Some(v.as_ref().to_string());
            } else {
                names.push(k.to_string());
                cells.push(Some(v.as_ref().to_string()));
            }
        }
        Row {
            schema: Arc::new(Schema::from_names(names)),
            cells,
        }
    }

    /// The value of a cell. `None` when the column does not exist or the
    /// cell was missing in the source.
    pub fn get(&self, column: &str) -> Option<&str> {
        let slot = *self.schema.slots.get(column)?;
        self.cells.get(slot)?.as_deref()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.schema.slots.contains_key(column)
    }

    /// The column names of this row, in header order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.schema.names.iter().map(|s| s.as_str())
    }

    pub(crate) fn same_layout(&self, other: &Row) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Row) -> bool {
        self.schema.names == other.schema.names && self.cells == other.cells
    }
}

impl Eq for Row {}

/// A spreadsheet payload turned into rows addressable by column name.
#[derive(PartialEq, Debug, Clone)]
pub struct ProcessedDataset {
    /// The header row, as received.
    pub headers: Vec<String>,
    /// Column name to column position in the source matrix. Empty names are
    /// left out. When a name is repeated, the last column wins.
    pub header_index_map: HashMap<String, usize>,
    pub rows: Vec<Row>,
    pub row_count: usize,
}

impl ProcessedDataset {
    pub fn empty() -> ProcessedDataset {
        ProcessedDataset {
            headers: Vec::new(),
            header_index_map: HashMap::new(),
            rows: Vec::new(),
            row_count: 0,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.header_index_map.contains_key(column)
    }
}

/// All the column names seen in a set of rows, in order of first appearance.
pub fn key_space<R: Borrow<Row>>(rows: &[R]) -> Vec<&str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<&str> = Vec::new();
    let mut last: Option<&Row> = None;
    for r in rows.iter() {
        let row: &Row = r.borrow();
        // Rows of a parsed dataset share their layout: only look at it once.
        if let Some(prev) = last {
            if prev.same_layout(row) {
                continue;
            }
        }
        for c in row.columns() {
            if seen.insert(c) {
                res.push(c);
            }
        }
        last = Some(row);
    }
    res
}

/// Parses a header row followed by data rows.
///
/// This never fails: an empty matrix gives an empty dataset, short rows get
/// missing cells and extra cells without a header are dropped.
pub fn parse_matrix(matrix: &[Vec<String>]) -> ProcessedDataset {
    let (header, data) = match matrix.split_first() {
        Some(p) => p,
        None => {
            warn!("parse_matrix: empty matrix, no header row");
            return ProcessedDataset::empty();
        }
    };

    let mut header_index_map: HashMap<String, usize> = HashMap::new();
    let mut names: Vec<String> = Vec::new();
    for (idx, h) in header.iter().enumerate() {
        if h.is_empty() {
            continue;
        }
        if let Some(prev) = header_index_map.insert(h.clone(), idx) {
            // TODO: confirm with the data owners whether the first column should win instead.
            warn!(
                "parse_matrix: duplicate header {:?} at columns {} and {}, keeping column {}",
                h, prev, idx, idx
            );
        } else {
            names.push(h.clone());
        }
    }
    debug!(
        "parse_matrix: {} named columns out of {}",
        names.len(),
        header.len()
    );

    // Source position of every slot of the schema.
    let positions: Vec<usize> = names.iter().map(|n| header_index_map[n]).collect();
    let schema = Arc::new(Schema::from_names(names));

    let rows: Vec<Row> = data
        .iter()
        .map(|values| Row {
            schema: schema.clone(),
            cells: positions.iter().map(|pos| values.get(*pos).cloned()).collect(),
        })
        .collect();

    info!("parse_matrix: parsed {} rows", rows.len());
    ProcessedDataset {
        headers: header.clone(),
        header_index_map,
        row_count: rows.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn parses_header_and_rows() {
        let m = matrix(&[&["ID", "P1", "PESO"], &["1", "Sim", "1,2"], &["2", "Não", "0,8"]]);
        let ds = parse_matrix(&m);
        assert_eq!(ds.row_count, 2);
        assert_eq!(ds.headers, vec!["ID", "P1", "PESO"]);
        assert_eq!(ds.header_index_map.get("P1"), Some(&1));
        assert_eq!(ds.rows[1].get("P1"), Some("Não"));
        assert_eq!(ds.rows[0].get("PESO"), Some("1,2"));
        assert_eq!(ds.rows[0].get("MISSING"), None);
    }

    #[test]
    fn empty_headers_are_dropped() {
        let m = matrix(&[&["ID", "", "P1"], &["1", "lost", "Sim"]]);
        let ds = parse_matrix(&m);
        assert!(!ds.has_column(""));
        assert_eq!(ds.header_index_map.len(), 2);
        let cols: Vec<&str> = ds.rows[0].columns().collect();
        assert_eq!(cols, vec!["ID", "P1"]);
        assert_eq!(ds.rows[0].get("P1"), Some("Sim"));
    }

    #[test]
    fn duplicate_headers_last_wins() {
        let m = matrix(&[&["P1", "P1"], &["first", "second"]]);
        let ds = parse_matrix(&m);
        assert_eq!(ds.header_index_map.get("P1"), Some(&1));
        assert_eq!(ds.rows[0].get("P1"), Some("second"));
        assert_eq!(ds.rows[0].columns().count(), 1);
    }

    #[test]
    fn short_rows_have_missing_cells() {
        let m = matrix(&[&["ID", "P1", "PESO"], &["1"]]);
        let ds = parse_matrix(&m);
        assert_eq!(ds.rows[0].get("ID"), Some("1"));
        assert_eq!(ds.rows[0].get("P1"), None);
        assert!(ds.rows[0].has_column("PESO"));
    }

    #[test]
    fn empty_matrix() {
        let ds = parse_matrix(&[]);
        assert_eq!(ds, ProcessedDataset::empty());
        let ds = parse_matrix(&matrix(&[&["ID"]]));
        assert_eq!(ds.row_count, 0);
        assert!(ds.has_column("ID"));
    }

    #[test]
    fn parsing_is_idempotent() {
        let m = matrix(&[
            &["ID", "P1", "", "P1", "PESO"],
            &["1", "a", "x", "b", "1"],
            &["2", "c"],
        ]);
        assert_eq!(parse_matrix(&m), parse_matrix(&m));
    }

    #[test]
    fn key_space_keeps_first_appearance_order() {
        let rows = vec![
            Row::from_pairs(&[("B", "1"), ("A", "2")]),
            Row::from_pairs(&[("C", "3"), ("A", "4")]),
        ];
        assert_eq!(key_space(&rows), vec!["B", "A", "C"]);
        let refs: Vec<&Row> = rows.iter().collect();
        assert_eq!(key_space(&refs), vec!["B", "A", "C"]);
        let none: Vec<Row> = vec![];
        assert!(key_space(&none).is_empty());
    }

    #[test]
    fn rows_compare_by_content() {
        let m = matrix(&[&["Q", "w"], &["Sim", "1,0"]]);
        let ds = parse_matrix(&m);
        assert_eq!(ds.rows[0], Row::from_pairs(&[("Q", "Sim"), ("w", "1,0")]));
        assert_ne!(ds.rows[0], Row::from_pairs(&[("w", "1,0"), ("Q", "Sim")]));
    }
}
