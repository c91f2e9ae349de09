//! Command surface for the feedback observation generator.
//!
//! Host programs should embed generation through:
//! - [`run_cli`] for full parsed CLI execution.
//! - [`run_command`] for a parsed [`Command`] against an already loaded
//!   [`RunContext`].
//!
//! Data goes to stdout (or `--output`); logs go to stderr.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use feedback_synth_core::{
    assemble_specs, reference_requests, GeneratorConfig, Polarity, RequestSpec, Roster, Scenario,
    ScenarioRow, ScenarioSummary, SeededRandom, COLUMNS,
};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "fsynth")]
#[command(about = "Synthetic peer-feedback observation generator")]
pub struct Cli {
    /// Overrides the seed from the generator config.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON generator config; defaults apply to missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON roster document; the built-in reference roster otherwise.
    #[arg(long)]
    roster: Option<PathBuf>,

    #[arg(long, default_value = "warn")]
    log_level: LogLevelArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Scenario {
        #[command(subcommand)]
        command: Box<ScenarioCommand>,
    },
    Generate(GenerateArgs),
    Roster {
        #[command(subcommand)]
        command: Box<RosterCommand>,
    },
    Config {
        #[command(subcommand)]
        command: Box<ConfigCommand>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScenarioCommand {
    Run(ScenarioRunArgs),
    Summary(ScenarioSummaryArgs),
}

#[derive(Debug, Args)]
pub struct ScenarioRunArgs {
    /// JSON `{ "requests": [...] }` document; the reference scenario otherwise.
    #[arg(long)]
    requests: Option<PathBuf>,
    #[arg(long, default_value = "table")]
    format: OutputFormatArg,
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ScenarioSummaryArgs {
    #[arg(long)]
    requests: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[arg(long)]
    author: String,
    #[arg(long)]
    subject: String,
    #[arg(long)]
    polarity: PolarityArg,
    /// Defaults to the config's `default_count`.
    #[arg(long)]
    count: Option<usize>,
    #[arg(long, default_value = "table")]
    format: OutputFormatArg,
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum RosterCommand {
    Show(RosterShowArgs),
    Validate,
}

#[derive(Debug, Args)]
pub struct RosterShowArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum, Eq, PartialEq)]
pub enum OutputFormatArg {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolarityArg {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Config and roster shared by every command of one invocation.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: GeneratorConfig,
    pub roster: Roster,
}

impl RunContext {
    /// Loads the optional config and roster files and applies a seed override.
    ///
    /// # Errors
    /// Returns an error when a file cannot be read or parsed, or when the
    /// decoded config or roster fails validation.
    pub fn load(
        seed: Option<u64>,
        config_path: Option<&Path>,
        roster_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => GeneratorConfig::from_json(&read_json(path)?)
                .with_context(|| format!("invalid generator config {}", path.display()))?,
            None => GeneratorConfig::v1(),
        };
        if let Some(seed) = seed {
            config.seed = seed;
        }

        let roster = match roster_path {
            Some(path) => Roster::from_json(&read_json(path)?)
                .with_context(|| format!("invalid roster {}", path.display()))?,
            None => Roster::reference()?,
        };

        Ok(Self { config, roster })
    }
}

/// Executes the parsed top-level CLI command graph.
///
/// # Errors
/// Returns an error when config or roster loading fails or the command fails.
pub fn run_cli(cli: Cli) -> Result<()> {
    init_tracing(cli.log_level);
    let context = RunContext::load(cli.seed, cli.config.as_deref(), cli.roster.as_deref())?;
    tracing::debug!(seed = context.config.seed, "context loaded");
    run_command(cli.command, &context)
}

/// Executes a parsed command against a loaded context.
///
/// # Errors
/// Returns an error when request loading, generation, rendering, or output
/// writing fails.
pub fn run_command(command: Command, context: &RunContext) -> Result<()> {
    match command {
        Command::Scenario { command } => run_scenario(*command, context),
        Command::Generate(args) => {
            let specs = vec![RequestSpec::new(
                &args.author,
                &args.subject,
                map_polarity(args.polarity),
                args.count,
            )];
            let scenario = build_scenario(&specs, context)?;
            emit(
                &render_scenario(&scenario, args.format)?,
                args.output.as_deref(),
            )
        }
        Command::Roster { command } => run_roster(*command, context),
        Command::Config { command } => match *command {
            ConfigCommand::Show => {
                println!("{}", serde_json::to_string_pretty(&context.config)?);
                Ok(())
            }
        },
    }
}

fn run_scenario(command: ScenarioCommand, context: &RunContext) -> Result<()> {
    match command {
        ScenarioCommand::Run(args) => {
            let specs = load_requests(args.requests.as_deref())?;
            let scenario = build_scenario(&specs, context)?;
            emit(
                &render_scenario(&scenario, args.format)?,
                args.output.as_deref(),
            )
        }
        ScenarioCommand::Summary(args) => {
            let specs = load_requests(args.requests.as_deref())?;
            let scenario = build_scenario(&specs, context)?;
            let summary = scenario.summary();
            if args.json {
                let payload = build_summary_json_payload(context.config.seed, summary);
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_summary(&summary);
            }
            Ok(())
        }
    }
}

fn run_roster(command: RosterCommand, context: &RunContext) -> Result<()> {
    match command {
        RosterCommand::Show(args) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&context.roster.to_document())?
                );
            } else {
                print_roster(&context.roster);
            }
            Ok(())
        }
        RosterCommand::Validate => {
            let empty_pools = context
                .roster
                .people()
                .iter()
                .filter(|person| person.strengths.is_empty() || person.weaknesses.is_empty())
                .count();
            println!(
                "roster ok: people={} attributes={} people_with_empty_pool={}",
                context.roster.people().len(),
                context.roster.attributes().len(),
                empty_pools
            );
            Ok(())
        }
    }
}

fn build_scenario(specs: &[RequestSpec], context: &RunContext) -> Result<Scenario> {
    let mut rng = SeededRandom::new(context.config.seed);
    Ok(assemble_specs(
        specs,
        &context.roster,
        &context.config,
        &mut rng,
    )?)
}

fn load_requests(path: Option<&Path>) -> Result<Vec<RequestSpec>> {
    match path {
        Some(path) => Ok(RequestSpec::list_from_json(&read_json(path)?)
            .with_context(|| format!("invalid requests file {}", path.display()))?),
        None => Ok(reference_requests()),
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("{} must be valid JSON", path.display()))
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed writing scenario to {}", path.display())),
        None => {
            print!("{rendered}");
            Ok(())
        }
    }
}

fn init_tracing(level: LogLevelArg) {
    let level = match level {
        LogLevelArg::Error => tracing::Level::ERROR,
        LogLevelArg::Warn => tracing::Level::WARN,
        LogLevelArg::Info => tracing::Level::INFO,
        LogLevelArg::Debug => tracing::Level::DEBUG,
        LogLevelArg::Trace => tracing::Level::TRACE,
    };
    // A subscriber may already be installed by an embedding host or a prior run.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn map_polarity(value: PolarityArg) -> Polarity {
    match value {
        PolarityArg::Positive => Polarity::Positive,
        PolarityArg::Negative => Polarity::Negative,
    }
}

/// Renders rows in the given format, always in [`COLUMNS`] order.
///
/// # Errors
/// Returns an error when JSON serialization fails.
pub fn render_scenario(scenario: &Scenario, format: OutputFormatArg) -> Result<String> {
    match format {
        OutputFormatArg::Json => {
            let mut body = serde_json::to_string_pretty(scenario)?;
            body.push('\n');
            Ok(body)
        }
        OutputFormatArg::Csv => Ok(render_csv(scenario.rows())),
        OutputFormatArg::Table => Ok(render_table(scenario.rows())),
    }
}

fn render_csv(rows: &[ScenarioRow]) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');
    for row in rows {
        let fields = [
            row.random_value.to_string(),
            csv_field(&row.author),
            csv_field(&row.subject),
            row.observation_type.as_str().to_string(),
            row.attribute.to_string(),
            row.value.to_string(),
            csv_field(row.attribute_name.as_deref().unwrap_or("")),
            csv_field(row.subject_name.as_deref().unwrap_or("")),
            csv_field(row.author_name.as_deref().unwrap_or("")),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn render_table(rows: &[ScenarioRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:<6} {:<7} {:<16} {:<9} {:<5} {:<40} {:<16} author_name",
        "random_value",
        "author",
        "subject",
        "observation_type",
        "attribute",
        "value",
        "attribute_name",
        "subject_name"
    );
    let _ = writeln!(out, "{}", "-".repeat(140));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<20.16} {:<6} {:<7} {:<16} {:<9} {:<5} {:<40} {:<16} {}",
            row.random_value,
            row.author,
            row.subject,
            row.observation_type.as_str(),
            row.attribute,
            row.value,
            row.attribute_name.as_deref().unwrap_or("unknown"),
            row.subject_name.as_deref().unwrap_or("unknown"),
            row.author_name.as_deref().unwrap_or("unknown")
        );
    }
    out
}

fn print_summary(summary: &ScenarioSummary) {
    println!("total_rows={}", summary.total_rows);
    println!(
        "{:<20} {:<20} {:<5} {:<5} {:<8} {:<4} {:<4} mean",
        "author", "subject", "rows", "dots", "rankings", "min", "max"
    );
    println!("{}", "-".repeat(80));
    for pair in &summary.pairs {
        println!(
            "{:<20} {:<20} {:<5} {:<5} {:<8} {:<4} {:<4} {:.3}",
            pair.author_name.as_deref().unwrap_or(&pair.author),
            pair.subject_name.as_deref().unwrap_or(&pair.subject),
            pair.rows,
            pair.dots,
            pair.rankings,
            pair.min_value,
            pair.max_value,
            pair.mean_value
        );
    }
}

fn print_roster(roster: &Roster) {
    println!("attributes={}", roster.attributes().len());
    for entry in roster.attributes().entries() {
        println!("  {:>2} {}", entry.id, entry.name);
    }
    println!("people={}", roster.people().len());
    println!(
        "{:<4} {:<16} {:<5} {:<7} {:<16} {:<16} description",
        "id", "name", "dot", "ranking", "weaknesses", "strengths"
    );
    println!("{}", "-".repeat(100));
    for person in roster.people() {
        println!(
            "{:<4} {:<16} {:<5.2} {:<7.2} {:<16} {:<16} {}",
            person.id,
            person.name,
            person.dot_factor,
            person.ranking_factor,
            join_ids(&person.weaknesses),
            join_ids(&person.strengths),
            person.description
        );
    }
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ScenarioSummaryJsonPayload {
    contract_version: String,
    seed: u64,
    summary: ScenarioSummary,
}

fn build_summary_json_payload(seed: u64, summary: ScenarioSummary) -> ScenarioSummaryJsonPayload {
    ScenarioSummaryJsonPayload {
        contract_version: "scenario_summary.v1".to_string(),
        seed,
        summary,
    }
}
