/// Label that replaces all the "does not know" / "did not answer" variants.
pub const NS_NR: &str = "NS/NR";

// Cells that stand for "no data". Compared after trimming, case-sensitive.
const MISSING_MARKERS: [&str; 5] = ["", "#NULL!", "#NULL", "#null", "-1"];

const NS_NR_MARKERS: [&str; 2] = ["não sabe", "não respondeu"];

/// The outcome of cleaning one response cell.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum NormalizedResponse {
    /// The cell does not count for any statistic.
    Excluded,
    Answer(String),
}

/// Cleans a raw response cell.
///
/// Missing cells and the "no data" markers are excluded. All the variants of
/// "does not know" and "did not answer" are reported as [`NS_NR`]. Anything
/// else is kept, trimmed.
pub fn normalize_response(cell: Option<&str>) -> NormalizedResponse {
    let s = match cell {
        Some(s) => s.trim(),
        None => return NormalizedResponse::Excluded,
    };
    if MISSING_MARKERS.contains(&s) {
        return NormalizedResponse::Excluded;
    }
    let lc = s.to_lowercase();
    if NS_NR_MARKERS.iter().any(|m| lc.contains(m)) {
        return NormalizedResponse::Answer(NS_NR.to_string());
    }
    NormalizedResponse::Answer(s.to_string())
}
