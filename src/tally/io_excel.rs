// Reader for Excel workbooks.

use calamine::{open_workbook, Reader, Xlsx};
use survey_tally::builder::Builder;

use crate::tally::io_common::cell_from_calamine;
use crate::tally::*;

/// Reads one worksheet of a workbook: the named one, or else the first one.
/// The first row of the worksheet is the header.
pub fn read_excel_dataset(path: &str, worksheet_name: Option<&str>) -> TallyResult<ProcessedDataset> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    debug!(
        "read_excel_dataset: {:?} has the worksheets {:?}",
        path,
        workbook.sheet_names()
    );
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut rows = wrange.rows();
    let header: Vec<String> = rows
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(cell_from_calamine)
        .collect();
    debug!("read_excel_dataset: header: {:?}", header);
    let mut builder = Builder::new()
        .header(&header)
        .context(InvalidHeaderSnafu { path })?;
    for row in rows {
        let cells: Vec<String> = row.iter().map(cell_from_calamine).collect();
        builder
            .add_row(&cells)
            .context(InvalidHeaderSnafu { path })?;
    }
    info!(
        "read_excel_dataset: {} rows read from {:?}",
        builder.num_rows(),
        path
    );
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook_path() -> String {
        format!("{}/testdata/two_waves/round1.xlsx", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn reads_the_named_worksheet() {
        let ds = read_excel_dataset(&workbook_path(), Some("Dados")).unwrap();
        assert_eq!(ds.row_count, 3);
        assert_eq!(ds.rows[0].get("ID"), Some("1"));
        assert_eq!(ds.rows[0].get("weight"), Some("1.5"));
        assert_eq!(ds.rows[2].get("Q1"), Some("#NULL!"));

        let stats = ds.variable_stats("Q1", &FilterSpec::new()).unwrap();
        assert_eq!(stats.total_count, 2);
        assert!((stats.response("Sim").unwrap().percentage - 60.0).abs() < 1e-9);
    }

    #[test]
    fn reads_the_first_worksheet_by_default() {
        let ds = read_excel_dataset(&workbook_path(), None).unwrap();
        assert_eq!(ds.row_count, 1);
        assert!(ds.has_column("Nota"));

        let res = read_excel_dataset(&workbook_path(), Some("Resumo"));
        assert!(matches!(res, Err(TallyError::EmptyExcel { .. })));
    }

    #[test]
    fn missing_workbook() {
        let res = read_excel_dataset("/nonexistent/wave.xlsx", None);
        assert!(matches!(res, Err(TallyError::OpeningExcel { .. })));
    }
}
