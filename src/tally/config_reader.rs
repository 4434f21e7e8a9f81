use std::collections::{BTreeMap, HashMap};

use crate::tally::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "outputFormat")]
    pub output_format: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct WaveSource {
    pub round: u32,
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DemographicConfig {
    pub label: String,
    pub aliases: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionConfig {
    pub id: String,
    pub label: Option<String>,
    pub variables: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub waves: Vec<WaveSource>,
    #[serde(rename = "columnNameMap", default)]
    pub column_name_map: HashMap<String, String>,
    #[serde(default)]
    pub demographics: Vec<DemographicConfig>,
    pub questions: Vec<QuestionConfig>,
    #[serde(default)]
    pub filters: BTreeMap<String, Vec<String>>,
    #[serde(rename = "breakdownBy")]
    pub breakdown_by: Option<String>,
}

impl SurveyConfig {
    /// The configured filters. Columns listed without any value are dropped.
    pub fn filter_spec(&self) -> FilterSpec {
        self.filters
            .iter()
            .map(|(column, values)| (column.clone(), values.clone()))
            .collect()
    }

    pub fn demographic_specs(&self) -> Vec<DemographicSpec> {
        self.demographics
            .iter()
            .map(|d| DemographicSpec {
                label: d.label.clone(),
                aliases: d.aliases.clone(),
            })
            .collect()
    }
}

/// The formats of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(s: Option<&str>) -> TallyResult<OutputFormat> {
        match s.map(|x| x.to_lowercase()).as_deref() {
            None | Some("") | Some("json") => Ok(OutputFormat::Json),
            Some("csv") => Ok(OutputFormat::Csv),
            Some(x) => UnknownOutputFormatSnafu { format: x }.fail(),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

pub fn read_config(path: &str) -> TallyResult<SurveyConfig> {
    let config_str = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(&config_str).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> TallyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

/// Parses filters written as `COLUMN=VALUE`. A column repeated several times
/// accepts all its values.
pub fn parse_filter_args(args: &[String]) -> TallyResult<FilterSpec> {
    let mut res = FilterSpec::new();
    for arg in args.iter() {
        match arg.split_once('=') {
            Some((column, value)) if !column.trim().is_empty() => {
                res.add_value(column.trim(), value);
            }
            _ => return InvalidFilterSnafu { arg: arg.as_str() }.fail(),
        }
    }
    Ok(res)
}
