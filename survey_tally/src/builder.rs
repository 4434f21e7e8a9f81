pub use crate::config::*;

use crate::dataset::{parse_matrix, ProcessedDataset};

/// A builder for assembling a dataset row by row.
///
/// Readers that stream their source (CSV records, spreadsheet rows) should
/// prefer it to collecting a matrix by hand.
///
/// ```
/// use survey_tally::builder::Builder;
/// # use survey_tally::SurveyErrors;
///
/// let mut builder = Builder::new().header(&["ID", "P1", "weight"])?;
///
/// builder.add_row(&["1", "Sim", "1,5"])?;
/// builder.add_row(&["2", "Não"])?;
///
/// let dataset = builder.build();
/// assert_eq!(dataset.row_count, 2);
/// # Ok::<(), SurveyErrors>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    pub(crate) _header: Option<Vec<String>>,
    pub(crate) _rows: Vec<Vec<String>>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _header: None,
            _rows: Vec::new(),
        }
    }

    /// Sets the header row. At least one column must have a name.
    pub fn header<S: AsRef<str>>(self, names: &[S]) -> Result<Builder, SurveyErrors> {
        let names: Vec<String> = names.iter().map(|s| s.as_ref().to_string()).collect();
        if names.iter().all(|s| s.is_empty()) {
            return Err(SurveyErrors::EmptyHeader);
        }
        Ok(Builder {
            _header: Some(names),
            _rows: self._rows,
        })
    }

    /// Adds the cells of one respondent, in header order. Rows may be shorter
    /// or longer than the header.
    pub fn add_row<S: AsRef<str>>(&mut self, cells: &[S]) -> Result<(), SurveyErrors> {
        if self._header.is_none() {
            return Err(SurveyErrors::MissingHeader);
        }
        self._rows
            .push(cells.iter().map(|s| s.as_ref().to_string()).collect());
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    /// The header followed by the rows, as a raw payload would carry them.
    pub fn matrix(&self) -> RawMatrix {
        let mut res: RawMatrix = Vec::with_capacity(self._rows.len() + 1);
        if let Some(h) = self._header.as_ref() {
            res.push(h.clone());
        }
        res.extend(self._rows.iter().cloned());
        res
    }

    pub fn build(&self) -> ProcessedDataset {
        parse_matrix(&self.matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_need_a_header() {
        let mut b = Builder::new();
        assert_eq!(b.add_row(&["1"]), Err(SurveyErrors::MissingHeader));
        assert_eq!(
            Builder::new().header(&["", ""]).err(),
            Some(SurveyErrors::EmptyHeader)
        );
    }

    #[test]
    fn builds_the_same_dataset_as_the_matrix() {
        let mut b = Builder::new().header(&["ID", "P1"]).unwrap();
        b.add_row(&["1", "Sim"]).unwrap();
        b.add_row(&["2"]).unwrap();
        assert_eq!(b.num_rows(), 2);
        let m = b.matrix();
        assert_eq!(m.len(), 3);
        assert_eq!(b.build(), parse_matrix(&m));
        assert_eq!(b.build().rows[1].get("P1"), None);
    }
}
