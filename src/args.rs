use clap::Parser;

/// Aggregates recorded election results and projects candidates under what-if scenarios.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the election: data sources, parties,
    /// settings and scenarios. Data files are looked up relative to this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) A file of vote records. Setting this option overrides the
    /// sources listed in the --config file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (json, csv or excel) The type of the --input file. Guessed from the file extension
    /// when not provided.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, the name of the worksheet to use. The first worksheet
    /// is used otherwise.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default summary) The query to run: summary, parties, ranking, sections, geography,
    /// leaders, metrics, zones, competitors, recommendations, compare, scenarios, project.
    #[clap(short, long, value_parser)]
    pub query: Option<String>,

    /// Restricts the query to the candidates of one position.
    #[clap(long, value_parser)]
    pub position: Option<String>,

    /// Restricts the sections query to one zone.
    #[clap(long, value_parser)]
    pub zone: Option<String>,

    /// The candidate number the query is about.
    #[clap(long, value_parser)]
    pub candidate: Option<String>,

    /// The second candidate number of a comparison.
    #[clap(long, value_parser)]
    pub versus: Option<String>,

    /// (comma-separated candidate numbers) The competitors of the competitors query.
    #[clap(long, value_parser)]
    pub competitors: Option<String>,

    /// (zone, section, neighborhood or city) The geographic dimension of the geography and
    /// compare queries. Defaults to zone.
    #[clap(long, value_parser)]
    pub dimension: Option<String>,

    /// Only keeps the first candidates of the ranking.
    #[clap(long, value_parser)]
    pub limit: Option<usize>,

    /// The id of the scenario to start the projection from.
    #[clap(long, value_parser)]
    pub scenario: Option<String>,

    /// (city=+ or city=-, repeatable) Moves the multiplier of a city by one step.
    #[clap(long, value_parser)]
    pub adjust: Vec<String>,

    /// (city=value, repeatable) Sets the multiplier of a city.
    #[clap(long, value_parser)]
    pub multiplier: Vec<String>,

    /// (file path, 'stdout' or empty) Where the JSON output is written. Defaults to the
    /// standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference output in JSON format. If provided, the output is checked
    /// against it and any difference is an error.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (command line) A program that comments on the projection. It receives the projection
    /// context as JSON on its standard input and answers on its standard output.
    #[clap(long, value_parser)]
    pub assistant_cmd: Option<String>,

    /// The question asked to the assistant.
    #[clap(long, value_parser)]
    pub question: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
