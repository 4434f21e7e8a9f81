use clap::Parser;

/// This is a tabulation program for weighted survey waves.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file describing the survey: waves, questions, filters.
    /// See the manual of the survey_tally crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing a summary in JSON format. If provided, surveytally will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the survey will be written to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (json or csv, default json) The format of the summary.
    #[clap(long, value_parser)]
    pub out_format: Option<String>,

    /// (file path or empty) A single wave to tabulate without a configuration file.
    /// Ignored when --config is provided.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (json, csv or xlsx) The type of the input. Inferred from the file extension if not provided.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (repeatable) A variable to tabulate from the input. Each variable is reported as its own question.
    #[clap(long = "variable", value_parser)]
    pub variables: Vec<String>,

    /// (repeatable, COLUMN=VALUE) Only count the respondents with this value. Repeating a column accepts
    /// several values for it.
    #[clap(short, long = "filter", value_parser)]
    pub filters: Vec<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
