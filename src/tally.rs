pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_json;
pub mod report;

use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use survey_tally::cache::StatsCache;
use survey_tally::demographics::build_catalog;
use survey_tally::waves::compare_waves;
use survey_tally::*;

use crate::args::Args;
use crate::tally::config_reader::*;
use crate::tally::io_common::summary_file_name;
use crate::tally::report::*;

#[derive(Debug, Snafu)]
pub enum TallyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("The payload {path} has no data.values matrix"))]
    MissingValues { path: String },

    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of a CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing a CSV line"))]
    CsvWrite { source: csv::Error },

    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet to read in {path}"))]
    EmptyExcel { path: String },

    #[snafu(display("Invalid header in {path}"))]
    InvalidHeader { source: SurveyErrors, path: String },
    #[snafu(display("Unknown provider {provider}: expected json, csv or xlsx"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown output format {format}: expected json or csv"))]
    UnknownOutputFormat { format: String },
    #[snafu(display("Invalid filter {arg:?}: expected COLUMN=VALUE"))]
    InvalidFilter { arg: String },
    #[snafu(display("No wave configured"))]
    MissingWaves {},
    #[snafu(display("No parent directory for {path}"))]
    MissingParentDir { path: String },
    #[snafu(display(
        "Difference detected between calculated summary and reference summary {path}"
    ))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TallyResult<T> = Result<T, TallyError>;

fn read_wave(root: &Path, ws: &WaveSource) -> TallyResult<ProcessedDataset> {
    let path = root.join(&ws.file_path).display().to_string();
    info!(
        "read_wave: round {} from {:?} ({})",
        ws.round, path, ws.provider
    );
    let dataset = match ws.provider.to_lowercase().as_str() {
        "json" => io_json::read_json_payload(&path)?,
        "csv" => io_csv::read_csv_dataset(&path)?,
        "xlsx" | "excel" => {
            io_excel::read_excel_dataset(&path, ws.excel_worksheet_name.as_deref())?
        }
        x => return UnknownProviderSnafu { provider: x }.fail(),
    };
    if dataset.row_count == 0 {
        warn!("read_wave: no respondent in {:?}", path);
    }
    Ok(dataset)
}

fn tally_question(
    cache: &mut StatsCache,
    q: &QuestionConfig,
    filters: &FilterSpec,
) -> QuestionReport {
    let found = q.variables.iter().any(|v| cache.dataset().has_column(v));
    if !found {
        warn!(
            "tally_question: {:?}: none of {:?} in the current wave",
            q.id, q.variables
        );
    }
    let (sample_size, total_weight, responses) = match q.variables.as_slice() {
        [single] => {
            let stats = cache
                .variable_stats(single, filters)
                .unwrap_or(VariableStats::EMPTY);
            (stats.total_count, stats.total_weight, stats.data)
        }
        vars => {
            let agg = cache.aggregate_variables(vars, filters);
            (agg.universe, agg.total_weight, agg.data)
        }
    };
    QuestionReport {
        id: q.id.clone(),
        label: q.label.clone(),
        variables: q.variables.clone(),
        found,
        sample_size,
        total_weight,
        responses,
    }
}

// The values of a breakdown column: from the catalog when it is a configured
// demographic, else observed in the dataset.
fn breakdown_values(
    catalog: &[DemographicVariable],
    dataset: &ProcessedDataset,
    column: &str,
) -> Vec<String> {
    if let Some(dv) = catalog.iter().find(|dv| dv.key == column) {
        return dv.values.clone();
    }
    let spec = DemographicSpec::new(column, &[column]);
    build_catalog(dataset, &[spec])
        .into_iter()
        .next()
        .map(|dv| dv.values)
        .unwrap_or_default()
}

fn breakdown_question(
    cache: &mut StatsCache,
    q: &QuestionConfig,
    filters: &FilterSpec,
    column: &str,
    values: &[String],
) -> BreakdownReport {
    let group_filters = breakdown_filters(filters, column, values, &cache.dataset().rows);
    let groups: Vec<BreakdownGroup> = match q.variables.as_slice() {
        [single] => group_filters
            .into_iter()
            .filter_map(|(value, f)| {
                cache
                    .variable_stats(single, &f)
                    .map(|stats| BreakdownGroup {
                        value,
                        sample_size: stats.total_count,
                        responses: stats.data,
                    })
            })
            .collect(),
        vars => group_filters
            .into_iter()
            .map(|(value, f)| {
                let agg = cache.aggregate_variables(vars, &f);
                BreakdownGroup {
                    value,
                    sample_size: agg.universe,
                    responses: agg.data,
                }
            })
            .collect(),
    };
    BreakdownReport {
        question: q.id.clone(),
        column: column.to_string(),
        groups,
    }
}

/// Tallies all the questions of a survey.
///
/// The last wave of the configuration is the current one. When there is a
/// wave before it, every question is also compared with that wave. Relative
/// file paths are resolved against `root`.
pub fn build_summary(config: &SurveyConfig, root: &Path) -> TallyResult<SurveyReport> {
    let (current_ws, previous_ws) = match config.waves.split_last() {
        Some((last, rest)) => (last, rest.last()),
        None => return MissingWavesSnafu {}.fail(),
    };
    let filters = config.filter_spec();
    let mut cache = StatsCache::new(read_wave(root, current_ws)?);
    let catalog = build_catalog(cache.dataset(), &config.demographic_specs());

    let questions: Vec<QuestionReport> = config
        .questions
        .iter()
        .map(|q| tally_question(&mut cache, q, &filters))
        .collect();

    let breakdowns = match config.breakdown_by.as_deref() {
        Some(column) => {
            let values = breakdown_values(&catalog, cache.dataset(), column);
            info!("build_summary: breakdown by {:?}: {:?}", column, values);
            Some(
                config
                    .questions
                    .iter()
                    .map(|q| breakdown_question(&mut cache, q, &filters, column, &values))
                    .collect(),
            )
        }
        None => None,
    };

    let comparisons = match previous_ws {
        Some(pws) => {
            let previous = read_wave(root, pws)?;
            let l: Vec<ComparisonReport> = config
                .questions
                .iter()
                .map(|q| ComparisonReport {
                    question: q.id.clone(),
                    previous_round: pws.round,
                    current_round: current_ws.round,
                    comparison: compare_waves(
                        &q.variables,
                        &filters,
                        &previous.rows,
                        &cache.dataset().rows,
                        &config.column_name_map,
                    ),
                })
                .collect();
            Some(l)
        }
        None => None,
    };
    debug!(
        "build_summary: {} cached results, {} cache hits",
        cache.len(),
        cache.hits()
    );

    Ok(SurveyReport {
        survey: config.output_settings.survey_name.clone(),
        rounds: config.waves.iter().map(|w| w.round).collect(),
        filters,
        catalog,
        questions,
        breakdowns,
        comparisons,
    })
}

// None stands for the standard output.
fn output_path(
    config: &SurveyConfig,
    root: &Path,
    out: Option<&str>,
    format: OutputFormat,
) -> Option<PathBuf> {
    match out {
        Some("") | Some("stdout") => None,
        Some(p) => Some(PathBuf::from(p)),
        None => config.output_settings.output_directory.as_ref().map(|d| {
            root.join(d)
                .join(summary_file_name(&config.output_settings.survey_name, format))
        }),
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> TallyResult<()> {
    match path {
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(bytes)
                .context(WritingOutputSnafu { path: "stdout" })?;
        }
        Some(p) => {
            let ps = p.display().to_string();
            if let Some(parent) = p.parent().filter(|x| !x.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context(WritingOutputSnafu { path: ps.as_str() })?;
            }
            fs::write(p, bytes).context(WritingOutputSnafu { path: ps.as_str() })?;
            info!("write_output: summary written to {:?}", ps);
        }
    }
    Ok(())
}

/// Compares a summary with a reference file and prints the differences.
pub fn check_reference(summary_path: &str, pretty_js_stats: &str) -> TallyResult<()> {
    let summary_ref = read_summary(summary_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu { path: summary_path }.fail();
    }
    info!("check_reference: summary matches {:?}", summary_path);
    Ok(())
}

fn run_config(
    config: &SurveyConfig,
    root: &Path,
    check_summary_path: Option<String>,
    out: Option<String>,
    out_format: Option<String>,
) -> TallyResult<()> {
    let format = OutputFormat::parse(
        out_format
            .as_deref()
            .or(config.output_settings.output_format.as_deref()),
    )?;

    let report = build_summary(config, root)?;
    let result_js = report.to_json();
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(SerializingJsonSnafu {})?;

    let bytes: Vec<u8> = match format {
        OutputFormat::Json => format!("{}\n", pretty_js_stats).into_bytes(),
        OutputFormat::Csv => report.to_csv()?,
    };
    let target = output_path(config, root, out.as_deref(), format);
    write_output(target.as_deref(), &bytes)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        check_reference(&summary_p, &pretty_js_stats)?;
    }
    Ok(())
}

/// Tallies the survey described by a configuration file.
pub fn run_survey(
    config_path: &str,
    check_summary_path: Option<String>,
    out: Option<String>,
    out_format: Option<String>,
) -> TallyResult<()> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let root_p = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu { path: config_path })?;
    run_config(&config, root_p, check_summary_path, out, out_format)
}

/// Tallies a single file given on the command line. Every variable is its own
/// question.
pub fn run_survey_quick(input: &str, args: &Args) -> TallyResult<()> {
    if args.variables.is_empty() {
        whatever!("No --variable given to tabulate {}", input)
    }
    let provider = match args.input_type.as_ref() {
        Some(t) => t.clone(),
        None => Path::new(input)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .context(UnknownProviderSnafu { provider: input })?,
    };
    let filters: BTreeMap<String, Vec<String>> = config_reader::parse_filter_args(&args.filters)?
        .iter()
        .map(|(column, values)| (column.clone(), values.iter().cloned().collect()))
        .collect();
    let survey_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(input)
        .to_string();

    let config = SurveyConfig {
        output_settings: OutputSettings {
            survey_name,
            output_directory: None,
            output_format: None,
        },
        waves: vec![WaveSource {
            round: 1,
            provider,
            file_path: input.to_string(),
            excel_worksheet_name: None,
        }],
        column_name_map: HashMap::new(),
        demographics: vec![],
        questions: args
            .variables
            .iter()
            .map(|v| QuestionConfig {
                id: v.clone(),
                label: None,
                variables: vec![v.clone()],
            })
            .collect(),
        filters,
        breakdown_by: None,
    };
    debug!("run_survey_quick: {:?}", config);
    run_config(
        &config,
        Path::new(""),
        args.reference.clone(),
        args.out.clone(),
        args.out_format.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn test_dir(test_name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join(test_name)
    }

    fn run_survey_test(test_name: &str, summary_lpath: &str) -> TallyResult<()> {
        let dir = test_dir(test_name);
        run_survey(
            &dir.join(format!("{}_config.json", test_name)).display().to_string(),
            Some(dir.join(summary_lpath).display().to_string()),
            None,
            None,
        )
    }

    fn load_config(test_name: &str) -> SurveyConfig {
        let p = test_dir(test_name).join(format!("{}_config.json", test_name));
        read_config(&p.display().to_string()).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_wave() {
        let res = run_survey_test("single_wave", "single_wave_expected_summary.json");
        assert!(res.is_ok(), "{:?}", res);
    }

    #[test]
    fn single_wave_wrong_reference() {
        let res = run_survey_test("single_wave", "wrong_expected_summary.json");
        assert!(matches!(res, Err(TallyError::ReferenceMismatch { .. })));
    }

    #[test]
    fn two_waves() {
        let config = load_config("two_waves");
        let report = build_summary(&config, &test_dir("two_waves")).unwrap();
        assert_eq!(report.rounds, vec![1, 2]);
        assert_eq!(report.catalog.len(), 1);
        assert_eq!(report.catalog[0].values, vec!["F", "M"]);

        let p1 = &report.questions[0];
        assert_eq!(p1.sample_size, 4);
        assert_eq!(p1.responses[0].response, "Sim");
        assert!(close(p1.responses[0].percentage, 62.5));

        let comps = report.comparisons.unwrap();
        let c = &comps[0].comparison;
        assert_eq!((c.previous_sample, c.current_sample), (3, 4));
        let names: Vec<&str> = c.responses.iter().map(|r| r.response.as_str()).collect();
        assert_eq!(names, vec!["Sim", "NS/NR", "Não"]);
        assert!(close(c.responses[0].difference, 62.5 - 200.0 / 3.0));
        assert!(close(c.responses[1].previous, 0.0));
        assert!(close(c.responses[1].difference, 25.0));

        // Multi-mention question, no renamed column.
        let midia = &comps[1].comparison;
        assert_eq!(midia.previous_sample, 4);
        assert!(close(midia.responses[0].previous, 75.0));
        assert!(close(midia.responses[0].current, 75.0));
    }

    #[test]
    fn two_waves_breakdown() {
        let config = load_config("two_waves");
        let report = build_summary(&config, &test_dir("two_waves")).unwrap();
        let bds = report.breakdowns.unwrap();
        assert_eq!(bds[0].column, "SEXO");

        let p1 = &bds[0].groups;
        assert_eq!(p1.len(), 2);
        assert_eq!(p1[0].value, "F");
        assert_eq!(p1[0].sample_size, 2);
        assert!(close(p1[0].responses[0].percentage, 100.0));
        assert_eq!(p1[1].responses[0].response, "NS/NR");
        assert!(close(p1[1].responses[0].percentage, 200.0 / 3.0));

        let midia = &bds[1].groups;
        assert_eq!(midia[0].sample_size, 2);
        let names: Vec<&str> = midia[0]
            .responses
            .iter()
            .map(|r| r.response.as_str())
            .collect();
        assert_eq!(names, vec!["TV", "Rádio", "Internet"]);
        assert!(close(midia[0].responses[1].percentage, 75.0));
    }

    #[test]
    fn breakdown_groups_padded_cells_through_the_cache() {
        let m: Vec<Vec<String>> = [
            ["P1", "M1", "M2", "weight", "REGIAO"],
            ["Sim", "TV", "Rádio", "1", "Sul "],
            ["Não", "TV", "", "1", "Sul"],
            ["Sim", "Rádio", "", "2", "Norte"],
        ]
        .iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect();
        let mut cache = StatsCache::new(parse_matrix(&m));
        let values = breakdown_values(&[], cache.dataset(), "REGIAO");
        assert_eq!(values, vec!["Norte".to_string(), "Sul".to_string()]);

        let single = QuestionConfig {
            id: "P1".to_string(),
            label: None,
            variables: vec!["P1".to_string()],
        };
        let filters = FilterSpec::new();
        let bd = breakdown_question(&mut cache, &single, &filters, "REGIAO", &values);
        assert_eq!(bd.groups.len(), 2);
        assert_eq!(bd.groups[1].value, "Sul");
        assert_eq!(bd.groups[1].sample_size, 2);
        let sum: u64 = bd.groups.iter().map(|g| g.sample_size).sum();
        assert_eq!(sum, 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.hits(), 0);

        breakdown_question(&mut cache, &single, &filters, "REGIAO", &values);
        assert_eq!(cache.hits(), 2);

        let multi = QuestionConfig {
            id: "M".to_string(),
            label: None,
            variables: vec!["M1".to_string(), "M2".to_string()],
        };
        let bd = breakdown_question(&mut cache, &multi, &filters, "REGIAO", &values);
        assert_eq!(bd.groups[1].sample_size, 2);
        assert_eq!(cache.len(), 6);
    }

    #[test]
    fn two_waves_filtered() {
        let mut config = load_config("two_waves");
        config.filters.insert("SEXO".to_string(), vec!["F".to_string()]);
        let report = build_summary(&config, &test_dir("two_waves")).unwrap();
        assert_eq!(report.questions[0].sample_size, 2);
        assert!(close(report.questions[0].responses[0].percentage, 100.0));

        let comps = report.comparisons.unwrap();
        let c = &comps[0].comparison;
        assert_eq!(c.responses.len(), 2);
        assert_eq!(c.responses[1].response, "Não");
        assert!(close(c.responses[1].previous, 50.0));
        assert!(close(c.responses[1].current, 0.0));
        assert!(close(c.responses[1].difference, -50.0));
    }

    #[test]
    fn missing_question_variables() {
        let mut config = load_config("single_wave");
        config.questions.push(QuestionConfig {
            id: "P99".to_string(),
            label: None,
            variables: vec!["P99".to_string()],
        });
        let report = build_summary(&config, &test_dir("single_wave")).unwrap();
        let q = report.questions.last().unwrap();
        assert!(!q.found);
        assert_eq!(q.sample_size, 0);
        assert!(q.responses.is_empty());
    }

    #[test]
    fn invalid_configurations() {
        let mut config = load_config("single_wave");
        config.waves[0].provider = "parquet".to_string();
        let res = build_summary(&config, &test_dir("single_wave"));
        assert!(matches!(res, Err(TallyError::UnknownProvider { .. })));

        config.waves.clear();
        let res = build_summary(&config, &test_dir("single_wave"));
        assert!(matches!(res, Err(TallyError::MissingWaves {})));
    }

    #[test]
    fn writes_to_the_output_directory() {
        let config = load_config("single_wave");
        let root = Path::new("/tmp/surveytally");
        let p = output_path(&config, root, None, OutputFormat::Csv);
        assert_eq!(p, None);
        let p = output_path(&config, root, Some("stdout"), OutputFormat::Csv);
        assert_eq!(p, None);

        let mut config = config;
        config.output_settings.output_directory = Some("out".to_string());
        let p = output_path(&config, root, None, OutputFormat::Csv);
        assert_eq!(
            p,
            Some(PathBuf::from("/tmp/surveytally/out/Teste_summary.csv"))
        );
        let p = output_path(&config, root, Some("x.json"), OutputFormat::Json);
        assert_eq!(p, Some(PathBuf::from("x.json")));
    }

    #[test]
    fn quick_tabulation() {
        let input = test_dir("two_waves").join("round1.csv").display().to_string();
        let args = Args::parse_from([
            "surveytally",
            "--input",
            input.as_str(),
            "--variable",
            "Q1",
            "--filter",
            "SEXO=F",
        ]);
        let res = run_survey_quick(&input, &args);
        assert!(res.is_ok(), "{:?}", res);

        let args = Args::parse_from(["surveytally", "--input", input.as_str()]);
        assert!(run_survey_quick(&input, &args).is_err());
    }
}
