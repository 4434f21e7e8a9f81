// Primitives for reading CSV files.

use csv::ReaderBuilder;
use survey_tally::builder::Builder;

use crate::tally::*;

/// Reads a CSV file whose first line is the header. Lines may have fewer
/// cells than the header.
pub fn read_csv_dataset(path: &str) -> TallyResult<ProcessedDataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.records();

    let header = match records.next() {
        Some(line_r) => line_r.context(CsvLineParseSnafu { lineno: 1_usize })?,
        None => {
            warn!("read_csv_dataset: {:?} is empty", path);
            return Ok(ProcessedDataset::empty());
        }
    };
    let names: Vec<&str> = header.iter().collect();
    debug!("read_csv_dataset: header: {:?}", names);
    let mut builder = Builder::new()
        .header(&names)
        .context(InvalidHeaderSnafu { path })?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<&str> = line.iter().collect();
        builder
            .add_row(&cells)
            .context(InvalidHeaderSnafu { path })?;
    }
    info!(
        "read_csv_dataset: {} rows read from {:?}",
        builder.num_rows(),
        path
    );
    Ok(builder.build())
}
