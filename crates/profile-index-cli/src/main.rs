use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use profile_index_api::{match_percentage, LoadReport, QueryEngine};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

mod repl;

use repl::Repl;

const CLI_CONTRACT_VERSION: &str = "cli.v1";

#[derive(Debug, Parser)]
#[command(name = "pidx")]
#[command(about = "Profile classification and index CLI")]
struct Cli {
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Start with execution-time display disabled.
    #[arg(long, default_value_t = false)]
    no_timing: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Users in a category, falling back to a tag with the same name.
    Find(FindArgs),
    /// Raw profile text for one user.
    Profile(UserArgs),
    /// Per-classifier verdicts for one user.
    Explain(UserArgs),
    Stats,
    /// Interactive command loop on stdin.
    Repl,
}

#[derive(Debug, Args)]
struct FindArgs {
    #[arg(long)]
    key: String,
}

#[derive(Debug, Args)]
struct UserArgs {
    #[arg(long)]
    user_id: String,
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let engine = QueryEngine::new()?;
    let report = engine.load_directory(&cli.data_dir)?;

    match cli.command.unwrap_or(Command::Repl) {
        Command::Find(args) => run_find(&engine, &args),
        Command::Profile(args) => run_profile(&engine, &args),
        Command::Explain(args) => run_explain(&engine, &args),
        Command::Stats => run_stats(&engine, &report),
        Command::Repl => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            Repl::new(&engine, !cli.no_timing).run(stdin.lock(), &mut stdout)
        }
    }
}

fn run_find(engine: &QueryEngine, args: &FindArgs) -> Result<()> {
    let result = engine.find(&args.key);
    let percentage = match_percentage(result.user_ids.len(), result.total_users);
    emit_json(serde_json::json!({
        "key": result.key,
        "matched": result.matched,
        "user_ids": result.user_ids,
        "count": result.user_ids.len(),
        "total_users": result.total_users,
        "percentage": (percentage * 100.0).round() / 100.0
    }))
}

fn run_profile(engine: &QueryEngine, args: &UserArgs) -> Result<()> {
    let profile = engine
        .get_user(&args.user_id)
        .ok_or_else(|| anyhow!("user {} not found", args.user_id))?;
    emit_json(serde_json::json!({
        "user_id": profile.id(),
        "version_marker": profile.version_marker(),
        "profile": profile.raw_content(),
        "categories": profile.categories(),
        "tags": profile.tags()
    }))
}

fn run_explain(engine: &QueryEngine, args: &UserArgs) -> Result<()> {
    let report = engine
        .explain(&args.user_id)
        .ok_or_else(|| anyhow!("user {} not found", args.user_id))?;
    emit_json(serde_json::json!({
        "user_id": args.user_id,
        "classification": report
    }))
}

fn run_stats(engine: &QueryEngine, report: &LoadReport) -> Result<()> {
    emit_json(serde_json::json!({
        "stats": engine.stats(),
        "load": report
    }))
}
