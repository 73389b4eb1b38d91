use log::{debug, info, warn};

use electoral_engine::collaborators::{ConversationTurn, TurnRole};
use electoral_engine::projection::AdjustDirection;
use electoral_engine::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::app::assistant::CommandAssistant;
use crate::app::config_reader::*;
use crate::app::output::*;
use crate::app::provider::FileProvider;
use crate::args::Args;

pub mod assistant;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_json;
pub mod output;
pub mod provider;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the output"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}: {source}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: u64,
    },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet with data in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Missing column {column} in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Invalid record at line {lineno} of {path}: {reason}"))]
    InvalidRecord {
        path: String,
        lineno: u64,
        reason: String,
    },
    #[snafu(display("Invalid dataset {path}: {source}"))]
    InvalidDataset { source: EngineErrors, path: String },
    #[snafu(display("Provider not implemented: {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("No parent directory for {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Invalid argument --{arg}: {reason}"))]
    InvalidArgument { arg: String, reason: String },
    #[snafu(display("Could not load the dataset: {source}"))]
    LoadingDataset { source: CollaboratorFailure },
    #[snafu(display("Invalid scenario catalog: {source}"))]
    InvalidCatalog { source: EngineErrors },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the output and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;
pub type BAppResult<T> = Result<T, Box<AppError>>;

/// Everything a query runs against.
struct Election {
    output_settings: OutputSettings,
    settings: EngineSettings,
    dataset: Arc<Dataset>,
    catalog: ScenarioCatalog,
}

fn guess_provider(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("json") => "json",
        Some("xlsx") | Some("xls") => "excel",
        _ => "csv",
    }
    .to_string()
}

fn required<'a>(value: &'a Option<String>, arg: &str) -> AppResult<&'a str> {
    value.as_deref().context(InvalidArgumentSnafu {
        arg,
        reason: "required by this query",
    })
}

fn dimension_arg(args: &Args) -> AppResult<GeographyDimension> {
    match &args.dimension {
        None => Ok(GeographyDimension::Zone),
        Some(d) => GeographyDimension::parse(d).context(InvalidArgumentSnafu {
            arg: "dimension",
            reason: format!("unknown dimension {:?}", d),
        }),
    }
}

/// Splits a `city=value` argument.
fn city_assignment<'a>(arg: &str, s: &'a str) -> AppResult<(&'a str, &'a str)> {
    match s.rsplit_once('=') {
        Some((city, value)) if !city.trim().is_empty() => Ok((city.trim(), value.trim())),
        _ => InvalidArgumentSnafu {
            arg,
            reason: format!("expected city=value, got {:?}", s),
        }
        .fail(),
    }
}

fn load_election(args: &Args) -> BAppResult<Election> {
    let config = match &args.config {
        Some(p) => Some(read_config(p)?),
        None => None,
    };

    let (root, sources): (PathBuf, Vec<DatasetSource>) = match (&args.input, &config, &args.config) {
        (Some(input), _, _) => (
            PathBuf::new(),
            vec![DatasetSource {
                provider: args
                    .input_type
                    .clone()
                    .unwrap_or_else(|| guess_provider(input)),
                file_path: input.clone(),
                excel_worksheet_name: args.excel_worksheet_name.clone(),
                position: None,
            }],
        ),
        (None, Some(c), Some(config_path)) => {
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {
                    path: config_path.clone(),
                })?;
            (root.to_path_buf(), c.dataset_sources.clone())
        }
        _ => (PathBuf::new(), vec![]),
    };
    if sources.is_empty() {
        return InvalidArgumentSnafu {
            arg: "input",
            reason: "no dataset source: pass --config with datasetSources or --input",
        }
        .fail()
        .map_err(Box::new);
    }

    let settings = match &config {
        Some(c) => c.engine_settings()?,
        None => EngineSettings::DEFAULT_SETTINGS,
    };
    let parties = config.as_ref().map(|c| c.party_names()).unwrap_or_default();

    let provider = FileProvider::new(root, sources, parties);
    let dataset = Arc::new(provider.fetch(None).context(LoadingDatasetSnafu {})?);

    let catalog = match &config {
        Some(c) => c.scenario_catalog(&dataset.cities(), &settings)?,
        None => ScenarioCatalog::presets(&dataset.cities(), &settings),
    };

    let output_settings = match config {
        Some(c) => c.output_settings,
        None => OutputSettings {
            election_name: args
                .input
                .clone()
                .map(|p| io_common::simplify_file_name(&p))
                .unwrap_or_default(),
            output_directory: None,
            election_date: None,
            jurisdiction: None,
        },
    };

    Ok(Election {
        output_settings,
        settings,
        dataset,
        catalog,
    })
}

fn run_projection(args: &Args, election: &Election) -> BAppResult<JSValue> {
    let number = required(&args.candidate, "candidate")?;
    let mut session = SimulationSession::new(
        Arc::clone(&election.dataset),
        election.catalog.clone(),
        election.settings.clone(),
    );
    if !session.select_candidate(number) {
        warn!("run_projection: unknown candidate {:?}", number);
        return Ok(JSValue::Null);
    }
    if let Some(scenario_id) = &args.scenario {
        if !session.apply_scenario(number, scenario_id) {
            return InvalidArgumentSnafu {
                arg: "scenario",
                reason: format!("unknown scenario {:?}", scenario_id),
            }
            .fail()
            .map_err(Box::new);
        }
    }
    for adj in args.adjust.iter() {
        let (city, dir) = city_assignment("adjust", adj)?;
        let direction = match dir {
            "+" => AdjustDirection::Increase,
            "-" => AdjustDirection::Decrease,
            x => {
                return InvalidArgumentSnafu {
                    arg: "adjust",
                    reason: format!("expected + or -, got {:?}", x),
                }
                .fail()
                .map_err(Box::new)
            }
        };
        session.adjust_city(city, direction);
    }
    for m in args.multiplier.iter() {
        let (city, value) = city_assignment("multiplier", m)?;
        let value: f64 = value.parse().ok().context(InvalidArgumentSnafu {
            arg: "multiplier",
            reason: format!("not a number: {:?}", value),
        })?;
        session.set_city_multiplier(city, value);
    }

    let projection = match session.recompute() {
        Some(p) => p,
        None => return Ok(JSValue::Null),
    };
    let mut js = projection_to_json(&projection, session.mode(), &session.scenario_name());

    if let Some(cmd) = &args.assistant_cmd {
        if let Some(context) = session.assistant_context() {
            let history: Vec<ConversationTurn> = args
                .question
                .iter()
                .map(|q| ConversationTurn {
                    role: TurnRole::User,
                    text: q.clone(),
                })
                .collect();
            let assistant = CommandAssistant::new(cmd);
            js["assistant"] = match assistant.analyze(&context, &history) {
                Ok(answer) => json!({ "answer": answer }),
                Err(failure) => {
                    warn!("run_projection: {}", failure);
                    json!({ "error": failure.to_string() })
                }
            };
        }
    }
    Ok(js)
}

fn run_engine_query(args: &Args, query: &str, election: &Election) -> BAppResult<JSValue> {
    let ds = election.dataset.as_ref();
    let settings = &election.settings;
    let position = args.position.as_deref();
    info!("run_engine_query: {} (position {:?})", query, position);
    let js = match query {
        "summary" => summary_to_json(&aggregation::summarize(ds, position)),
        "parties" => parties_to_json(&aggregation::by_party(ds, position)),
        "ranking" => ranking_to_json(ds, &aggregation::ranking(ds, position, args.limit)),
        "sections" => sections_to_json(&aggregation::by_section(
            ds,
            args.zone.as_deref(),
            position,
        )),
        "geography" => {
            let dimension = dimension_arg(args)?;
            geography_to_json(
                dimension,
                &aggregation::by_geography(ds, dimension, position),
            )
        }
        "leaders" => leaders_to_json(&insights::leader_insights(ds, position)),
        "metrics" => {
            let number = required(&args.candidate, "candidate")?;
            match insights::performance_metrics(ds, number, settings) {
                Some(m) => metrics_to_json(&m),
                None => JSValue::Null,
            }
        }
        "zones" => {
            let number = required(&args.candidate, "candidate")?;
            zones_to_json(&insights::zone_distribution(ds, number, settings))
        }
        "competitors" => {
            let number = required(&args.candidate, "candidate")?;
            let competitors: Vec<String> = required(&args.competitors, "competitors")?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            competitors_to_json(&insights::competitor_comparison(ds, number, &competitors))
        }
        "recommendations" => {
            let number = required(&args.candidate, "candidate")?;
            recommendations_to_json(&recommendations::recommendations(ds, number, settings))
        }
        "compare" => {
            let a = required(&args.candidate, "candidate")?;
            let b = required(&args.versus, "versus")?;
            comparison_to_json(&comparison::compare(ds, a, b, dimension_arg(args)?))
        }
        "scenarios" => scenarios_to_json(election.catalog.scenarios()),
        "project" => run_projection(args, election)?,
        x => {
            return InvalidArgumentSnafu {
                arg: "query",
                reason: format!("unknown query {:?}", x),
            }
            .fail()
            .map_err(Box::new)
        }
    };
    Ok(js)
}

fn build_output_js(args: &Args) -> BAppResult<JSValue> {
    let election = load_election(args)?;
    let query = args.query.clone().unwrap_or_else(|| "summary".to_string());
    let results = run_engine_query(args, query.as_str(), &election)?;
    Ok(json!({
        "config": output_settings_to_json(&election.output_settings),
        "dataset": dataset_to_json(&election.dataset),
        "query": query,
        "results": results
    }))
}

fn write_output(out: &Option<String>, pretty_js: &str) -> BAppResult<()> {
    match out.as_deref() {
        None | Some("") | Some("stdout") => println!("{}", pretty_js),
        Some(path) => {
            info!("write_output: writing {:?}", path);
            fs::write(path, pretty_js).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js: &str) -> BAppResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(SerializingJsonSnafu {})?;
    if pretty_reference != pretty_js {
        warn!("Found differences with the reference {:?}", reference_path);
        print_diff(pretty_reference.as_str(), pretty_js, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail()
        .map_err(Box::new);
    }
    debug!("check_reference: output matches {:?}", reference_path);
    Ok(())
}

pub fn run_query(args: &Args) -> BAppResult<()> {
    let js = build_output_js(args)?;
    let pretty_js = serde_json::to_string_pretty(&js).context(SerializingJsonSnafu {})?;
    write_output(&args.out, pretty_js.as_str())?;
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, pretty_js.as_str())?;
    }
    Ok(())
}
