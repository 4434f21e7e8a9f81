// The summary of a survey, and its JSON and CSV renditions.

use csv::Writer;

use crate::tally::*;

/// The tally of one configured question on the current wave.
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionReport {
    pub id: String,
    pub label: Option<String>,
    pub variables: Vec<String>,
    /// False when none of the variables exist in the wave.
    pub found: bool,
    pub sample_size: u64,
    pub total_weight: f64,
    pub responses: Vec<ResponseStat>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct BreakdownGroup {
    pub value: String,
    pub sample_size: u64,
    pub responses: Vec<ResponseStat>,
}

/// One question, tallied separately for every value of a demographic column.
#[derive(PartialEq, Debug, Clone)]
pub struct BreakdownReport {
    pub question: String,
    pub column: String,
    pub groups: Vec<BreakdownGroup>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonReport {
    pub question: String,
    pub previous_round: u32,
    pub current_round: u32,
    pub comparison: WaveComparison,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SurveyReport {
    pub survey: String,
    pub rounds: Vec<u32>,
    pub filters: FilterSpec,
    pub catalog: Vec<DemographicVariable>,
    pub questions: Vec<QuestionReport>,
    /// Only present when a breakdown column is configured.
    pub breakdowns: Option<Vec<BreakdownReport>>,
    /// Only present when there are two waves or more.
    pub comparisons: Option<Vec<ComparisonReport>>,
}

// Percentages and weights are reported with two decimals.
fn round2(x: f64) -> f64 {
    let r = (x * 100.0).round() / 100.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

fn responses_to_json(responses: &[ResponseStat]) -> Vec<JSValue> {
    responses
        .iter()
        .map(|rs| {
            json!({
                "response": rs.response,
                "count": rs.count,
                "weightSum": round2(rs.weight_sum),
                "percentage": round2(rs.percentage),
            })
        })
        .collect()
}

fn filters_to_json(filters: &FilterSpec) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (column, values) in filters.iter() {
        let vs: Vec<&String> = values.iter().collect();
        m.insert(column.clone(), json!(vs));
    }
    JSValue::Object(m)
}

fn catalog_to_json(catalog: &[DemographicVariable]) -> Vec<JSValue> {
    catalog
        .iter()
        .map(|dv| json!({"key": dv.key, "label": dv.label, "values": dv.values}))
        .collect()
}

fn question_to_json(q: &QuestionReport) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    m.insert("question".to_string(), json!(q.id));
    if let Some(label) = q.label.as_ref() {
        m.insert("label".to_string(), json!(label));
    }
    m.insert("variables".to_string(), json!(q.variables));
    m.insert("found".to_string(), json!(q.found));
    m.insert("sampleSize".to_string(), json!(q.sample_size));
    m.insert(
        "marginOfError".to_string(),
        json!(round2(margin_of_error(q.sample_size))),
    );
    m.insert("totalWeight".to_string(), json!(round2(q.total_weight)));
    m.insert(
        "responses".to_string(),
        json!(responses_to_json(&q.responses)),
    );
    JSValue::Object(m)
}

fn breakdown_to_json(b: &BreakdownReport) -> JSValue {
    let groups: Vec<JSValue> = b
        .groups
        .iter()
        .map(|g| {
            json!({
                "value": g.value,
                "sampleSize": g.sample_size,
                "marginOfError": round2(margin_of_error(g.sample_size)),
                "responses": responses_to_json(&g.responses),
            })
        })
        .collect();
    json!({"question": b.question, "column": b.column, "groups": groups})
}

fn comparison_to_json(c: &ComparisonReport) -> JSValue {
    let responses: Vec<JSValue> = c
        .comparison
        .responses
        .iter()
        .map(|rc| {
            json!({
                "response": rc.response,
                "previous": round2(rc.previous),
                "current": round2(rc.current),
                "difference": round2(rc.difference),
            })
        })
        .collect();
    json!({
        "question": c.question,
        "previousRound": c.previous_round,
        "currentRound": c.current_round,
        "previousSample": c.comparison.previous_sample,
        "currentSample": c.comparison.current_sample,
        "previousMargin": round2(c.comparison.previous_margin),
        "currentMargin": round2(c.comparison.current_margin),
        "responses": responses,
    })
}

impl SurveyReport {
    pub fn to_json(&self) -> JSValue {
        let mut m: JSMap<String, JSValue> = JSMap::new();
        m.insert(
            "config".to_string(),
            json!({
                "survey": self.survey,
                "rounds": self.rounds,
                "filters": filters_to_json(&self.filters),
            }),
        );
        m.insert(
            "catalog".to_string(),
            json!(catalog_to_json(&self.catalog)),
        );
        let results: Vec<JSValue> = self.questions.iter().map(question_to_json).collect();
        m.insert("results".to_string(), json!(results));
        if let Some(bs) = self.breakdowns.as_ref() {
            let l: Vec<JSValue> = bs.iter().map(breakdown_to_json).collect();
            m.insert("breakdown".to_string(), json!(l));
        }
        if let Some(cs) = self.comparisons.as_ref() {
            let l: Vec<JSValue> = cs.iter().map(comparison_to_json).collect();
            m.insert("comparison".to_string(), json!(l));
        }
        JSValue::Object(m)
    }

    /// One line per question and response:
    /// `question,response,count,weightSum,percentage`.
    pub fn to_csv(&self) -> TallyResult<Vec<u8>> {
        let mut wtr = Writer::from_writer(Vec::new());
        wtr.write_record(["question", "response", "count", "weightSum", "percentage"])
            .context(CsvWriteSnafu {})?;
        for q in self.questions.iter() {
            for rs in q.responses.iter() {
                wtr.write_record([
                    q.id.clone(),
                    rs.response.clone(),
                    rs.count.to_string(),
                    round2(rs.weight_sum).to_string(),
                    round2(rs.percentage).to_string(),
                ])
                .context(CsvWriteSnafu {})?;
            }
        }
        wtr.into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.to_string()))
            .context(WritingOutputSnafu { path: "csv buffer" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SurveyReport {
        SurveyReport {
            survey: "S".to_string(),
            rounds: vec![1],
            filters: FilterSpec::new().with("SEXO", ["F"]),
            catalog: vec![],
            questions: vec![QuestionReport {
                id: "P1".to_string(),
                label: None,
                variables: vec!["P1".to_string()],
                found: true,
                sample_size: 3,
                total_weight: 3.0,
                responses: vec![
                    ResponseStat {
                        response: "Sim".to_string(),
                        count: 2,
                        weight_sum: 2.0,
                        percentage: 200.0 / 3.0,
                    },
                    ResponseStat {
                        response: "Não, nunca".to_string(),
                        count: 1,
                        weight_sum: 1.0,
                        percentage: 100.0 / 3.0,
                    },
                ],
            }],
            breakdowns: None,
            comparisons: None,
        }
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(200.0 / 3.0), 66.67);
        assert_eq!(round2(-0.001), 0.0);
        assert_eq!(round2(1.96 * 0.25 * 100.0), 49.0);
    }

    #[test]
    fn json_rendition() {
        let js = report().to_json();
        assert_eq!(js["config"]["filters"]["SEXO"], json!(["F"]));
        assert_eq!(js["results"][0]["responses"][0]["percentage"], json!(66.67));
        assert_eq!(js["results"][0]["marginOfError"], json!(56.58));
        assert!(js["results"][0].get("label").is_none());
        assert!(js.get("breakdown").is_none());
        assert!(js.get("comparison").is_none());
    }

    #[test]
    fn csv_rendition() {
        let bytes = report().to_csv().unwrap();
        let s = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "question,response,count,weightSum,percentage");
        assert_eq!(lines[1], "P1,Sim,2,2,66.67");
        assert_eq!(lines[2], "P1,\"Não, nunca\",1,1,33.33");
    }
}
