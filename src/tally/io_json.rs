// Reader for the payload of the spreadsheet API.

use crate::tally::io_common::cell_from_json;
use crate::tally::*;

#[derive(Debug, Deserialize)]
struct ApiPayload {
    data: Option<ApiData>,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    values: Option<Vec<Vec<JSValue>>>,
}

/// Extracts the matrix of cells from the text of a payload
/// `{"data": {"values": [[...], ...]}}`.
pub fn parse_json_payload(contents: &str, path: &str) -> TallyResult<RawMatrix> {
    let payload: ApiPayload = serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
    let values = payload
        .data
        .and_then(|d| d.values)
        .context(MissingValuesSnafu { path })?;
    Ok(values
        .iter()
        .map(|row| row.iter().map(cell_from_json).collect())
        .collect())
}

pub fn read_json_payload(path: &str) -> TallyResult<ProcessedDataset> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let matrix = parse_json_payload(&contents, path)?;
    debug!("read_json_payload: {} lines in {:?}", matrix.len(), path);
    Ok(parse_matrix(&matrix))
}
