// Conversions shared by the readers and the writers.

use calamine::DataType;

use crate::tally::*;

/// Writes a number the way a spreadsheet displays it: integers without a
/// decimal part.
pub fn format_number(f: f64) -> String {
    if f == 0.0 {
        // Avoids "-0".
        return "0".to_string();
    }
    f.to_string()
}

/// The text of a spreadsheet cell.
pub fn cell_from_calamine(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Float(f) => format_number(*f),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        // Dates are kept as their serial number.
        DataType::DateTime(f) => format_number(*f),
        DataType::Error(e) => e.to_string(),
        DataType::Empty => String::new(),
        #[allow(unreachable_patterns)]
        _ => {
            warn!("cell_from_calamine: unsupported cell {:?}", cell);
            String::new()
        }
    }
}

/// The text of a cell of an API payload. Cells are normally strings.
pub fn cell_from_json(cell: &JSValue) -> String {
    match cell {
        JSValue::String(s) => s.clone(),
        JSValue::Null => String::new(),
        JSValue::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        JSValue::Bool(b) => b.to_string(),
        x => {
            warn!("cell_from_json: unexpected cell {:?}", x);
            x.to_string()
        }
    }
}

/// A file name derived from the name of the survey.
pub fn summary_file_name(survey_name: &str, format: OutputFormat) -> String {
    let stem: String = survey_name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "survey".to_string() } else { stem };
    format!("{}_summary.{}", stem, format.extension())
}
