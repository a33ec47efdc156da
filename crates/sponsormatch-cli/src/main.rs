// crates/sponsormatch-cli/src/main.rs
// ============================================================================
// Module: SponsorMatch CLI Entry Point
// Description: Command dispatcher wiring configuration, adapters, the match
//   pipeline, and the tool surface together.
// Purpose: The one composition root a deployment actually runs.
// Dependencies: clap, sponsormatch-config, sponsormatch-core, sponsormatch-mcp,
//   sponsormatch-providers, sponsormatch-store, tokio, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! Four subcommands: `serve` runs the long-running stdio tool loop;
//! `match` runs one contextual match against a catalog file loaded fresh
//! into an in-process index; `ingest` validates and embeds a catalog file
//! against the configured index; `report` prints a campaign's analytics
//! summary. Every subcommand loads the same [`sponsormatch_config::SponsorMatchConfig`]
//! and wires adapters through [`adapters`], so `serve` and the MCP tool
//! surface it exposes see exactly the adapters a one-shot `match` call would.

mod adapters;
mod catalog;
mod error;
mod serve;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use sponsormatch_config::SponsorMatchConfig;
use sponsormatch_core::error::MatchError;
use sponsormatch_core::interfaces::AnalyticsStore;
use sponsormatch_core::interfaces::VectorIndex;
use sponsormatch_mcp::ToolRouter;
use sponsormatch_mcp::ToolScope;

use crate::error::CliError;

/// A contextual sponsorship-matching engine: targeting, policy, pacing, and
/// an auditable decision trace for every request.
#[derive(Debug, Parser)]
#[command(name = "sponsormatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Runs the long-running stdio tool loop.
    Serve(ServeArgs),
    /// Runs one contextual match against a catalog file.
    Match(MatchArgs),
    /// Embeds and upserts a catalog file into the configured vector index.
    Ingest(IngestArgs),
    /// Prints a campaign's analytics summary.
    Report(ReportArgs),
}

#[derive(Debug, clap::Args)]
struct ServeArgs {
    /// Path to the configuration file; defaults per `SponsorMatchConfig::load`.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct MatchArgs {
    /// Path to the configuration file; defaults per `SponsorMatchConfig::load`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path to a JSON catalog file: an array of creative records.
    #[arg(long)]
    catalog: PathBuf,
    /// Free-form context text to match against.
    #[arg(long)]
    context: String,
    /// Number of candidates requested.
    #[arg(long, default_value_t = 10)]
    top_k: u32,
    /// Placement slot the creative would render in.
    #[arg(long, default_value = "inline")]
    placement: String,
    /// Surface the placement renders within.
    #[arg(long, default_value = "feed")]
    surface: String,
    /// Restrict to creatives tagged with any of these topics.
    #[arg(long = "topic")]
    topics: Vec<String>,
    /// Restrict to creatives tagged with any of these verticals.
    #[arg(long = "vertical")]
    verticals: Vec<String>,
    /// Restrict to creatives tagged with any of these audience segments.
    #[arg(long = "audience-segment")]
    audience_segments: Vec<String>,
    /// Restrict to creatives tagged with any of these keywords.
    #[arg(long = "keyword")]
    keywords: Vec<String>,
    /// Restrict to creatives eligible in this locale.
    #[arg(long)]
    locale: Option<String>,
    /// Accept age-restricted creatives for this request.
    #[arg(long)]
    age_restricted_ok: bool,
    /// Accept sensitive creatives for this request.
    #[arg(long)]
    sensitive_ok: bool,
    /// A `keyword=factor` keyword boost, repeatable.
    #[arg(long = "boost")]
    boost: Vec<String>,
}

#[derive(Debug, clap::Args)]
struct IngestArgs {
    /// Path to the configuration file; defaults per `SponsorMatchConfig::load`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path to a JSON catalog file: an array of creative records.
    #[arg(long)]
    catalog: PathBuf,
}

#[derive(Debug, clap::Args)]
struct ReportArgs {
    /// Path to the configuration file; defaults per `SponsorMatchConfig::load`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Campaign identifier to report on.
    #[arg(long)]
    campaign_id: String,
    /// Window start, RFC 3339; omit for an unbounded start.
    #[arg(long)]
    since: Option<String>,
    /// Window end, RFC 3339; omit for "now".
    #[arg(long)]
    until: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(error = %error, "sponsormatch command failed");
            let _ = write_stderr_line(&format!("error: {error}"));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Match(args) => command_match(args),
        Commands::Ingest(args) => command_ingest(args),
        Commands::Report(args) => command_report(args),
    }
}

async fn command_serve(args: ServeArgs) -> Result<ExitCode, CliError> {
    let config = SponsorMatchConfig::load(args.config.as_deref())?;
    let embedding = adapters::build_embedding(&config)?;
    let index = adapters::build_index(&config);
    let analytics = adapters::build_analytics(&config)?;
    let router =
        ToolRouter::new(embedding, index, analytics, config.service.max_top_k, config.service.enable_result_cache);
    tracing::info!("sponsormatch serving tool calls on stdio");
    serve::run(router).await?;
    Ok(ExitCode::SUCCESS)
}

fn command_match(args: MatchArgs) -> Result<ExitCode, CliError> {
    let config = SponsorMatchConfig::load(args.config.as_deref())?;
    let embedding = adapters::build_embedding(&config)?;
    let index = adapters::build_index(&config);
    let analytics = adapters::build_analytics(&config)?;

    let creatives = catalog::load_catalog(&args.catalog)?;
    let dimension = embedding.embed("sponsormatch catalog seed")?.len();
    index.ensure_collection(dimension, &config.catalog.model_id, config.catalog.schema_version)?;
    let items = creatives
        .iter()
        .map(|creative| Ok((embedding.embed(&catalog::embedding_text(creative))?, creative.clone())))
        .collect::<Result<Vec<_>, MatchError>>()?;
    index.upsert(&items)?;

    let boost = parse_boost(&args.boost)?;
    let params = serde_json::json!({
        "context_text": args.context,
        "top_k": args.top_k,
        "placement": { "placement": args.placement, "surface": args.surface },
        "constraints": {
            "topics": args.topics,
            "verticals": args.verticals,
            "audience_segments": args.audience_segments,
            "keywords": args.keywords,
            "locale": args.locale,
            "age_restricted_ok": args.age_restricted_ok,
            "sensitive_ok": args.sensitive_ok,
        },
        "boost": boost,
    });

    let router = ToolRouter::new(embedding, index, analytics, config.service.max_top_k, config.service.enable_result_cache);
    let response = router.dispatch("ads_match", ToolScope::ReadOnly, params)?;
    write_stdout_line(&serde_json::to_string_pretty(&response)?)?;
    Ok(ExitCode::SUCCESS)
}

fn command_ingest(args: IngestArgs) -> Result<ExitCode, CliError> {
    let config = SponsorMatchConfig::load(args.config.as_deref())?;
    let embedding = adapters::build_embedding(&config)?;
    let index = adapters::build_index(&config);

    let creatives = catalog::load_catalog(&args.catalog)?;
    let dimension = embedding.embed("sponsormatch catalog seed")?.len();
    let handle = index.ensure_collection(dimension, &config.catalog.model_id, config.catalog.schema_version)?;
    let items = creatives
        .iter()
        .map(|creative| Ok((embedding.embed(&catalog::embedding_text(creative))?, creative.clone())))
        .collect::<Result<Vec<_>, MatchError>>()?;
    let count = items.len();
    index.upsert(&items)?;
    tracing::info!(collection = %handle.name, upserted = count, "catalog ingested");
    write_stdout_line(&format!("upserted {count} creatives into collection `{}`", handle.name))?;
    Ok(ExitCode::SUCCESS)
}

fn command_report(args: ReportArgs) -> Result<ExitCode, CliError> {
    let config = SponsorMatchConfig::load(args.config.as_deref())?;
    let analytics = adapters::build_analytics(&config)?
        .ok_or_else(|| CliError::InvalidArgument("report requires analytics.plane = \"sqlite\"".to_string()))?;

    let since = args.since.as_deref().map(parse_timestamp).transpose()?;
    let until = args.until.as_deref().map(parse_timestamp).transpose()?;
    let campaign_id = sponsormatch_core::identifiers::CampaignId::from(args.campaign_id.as_str());
    let report = analytics.campaign_report(&campaign_id, since, until)?;
    let rendered = serde_json::to_string_pretty(&serde_json::json!({
        "campaign_id": campaign_id,
        "stats": report.stats,
        "top_creatives": report.top_creatives,
    }))?;
    write_stdout_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime, CliError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|error| CliError::InvalidArgument(format!("invalid timestamp `{value}`: {error}")))
}

fn parse_boost(entries: &[String]) -> Result<BTreeMap<String, f64>, CliError> {
    let mut boost = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| CliError::InvalidArgument(format!("boost `{entry}` must be `keyword=factor`")))?;
        let factor: f64 = value
            .parse()
            .map_err(|_| CliError::InvalidArgument(format!("boost factor `{value}` is not a number")))?;
        boost.insert(key.to_string(), factor);
    }
    Ok(boost)
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
