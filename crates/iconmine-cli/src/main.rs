//! iconmine CLI: mine ICON timer reports into the monitoring stack.

mod elastic;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use iconmine_core::{
    DocumentSink, JsonLinesSink, LogMiner, MineSummary, MinedLog, MinerConfig, COLUMNS,
};

use crate::elastic::{ElasticConfig, ElasticSink};

#[derive(Parser)]
#[command(
    name = "iconmine",
    about = "Mine ICON timer reports from model logs into Elasticsearch",
    version
)]
struct Cli {
    /// YAML file overriding the built-in extraction patterns
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Also write diagnostics to this file as JSON lines
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine every not-yet-processed run directory under ROOT
    Mine {
        /// Directory holding the run directories
        root: PathBuf,
        /// File listing already mined directories (default: ROOT/mined_dirs.log)
        #[arg(long)]
        state_file: Option<PathBuf>,
        /// Print documents as JSON lines instead of indexing them; the state
        /// file is read but not updated
        #[arg(long)]
        dry_run: bool,
        /// Elasticsearch URL
        #[arg(long, default_value = "https://elastic.mch.eck.cscs.ch:9200")]
        url: String,
        /// Elasticsearch user
        #[arg(long, default_value = "elastic")]
        user: String,
        /// Elasticsearch password
        #[arg(long, short, env = "ICONMINE_ES_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Target index
        #[arg(long, default_value = "icon")]
        index: String,
        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Show the records mined from one log file
    Inspect {
        /// Path to the log file
        file: PathBuf,
    },
    /// Export the documents of one log file to CSV or JSON
    Export {
        /// Path to the log file
        file: PathBuf,
        /// Output format
        #[arg(long, short, default_value = "csv", value_parser = ["csv", "json"])]
        format: String,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the effective extraction config as YAML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    let config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            MinerConfig::load(path)?
        }
        None => MinerConfig::default(),
    };

    match cli.command {
        Commands::Mine {
            root,
            state_file,
            dry_run,
            url,
            user,
            password,
            index,
            timeout_secs,
        } => {
            let state_file = state_file.unwrap_or_else(|| root.join("mined_dirs.log"));
            let sink: Box<dyn DocumentSink> = if dry_run {
                Box::new(JsonLinesSink::new(std::io::stdout()))
            } else {
                let password = password.ok_or_else(|| {
                    anyhow!("an Elasticsearch password is required (--password or ICONMINE_ES_PASSWORD)")
                })?;
                Box::new(ElasticSink::new(ElasticConfig {
                    url,
                    username: user,
                    password,
                    index,
                    timeout: Duration::from_secs(timeout_secs),
                })?)
            };
            cmd_mine(&config, &root, &state_file, !dry_run, sink)?;
        }
        Commands::Inspect { file } => {
            cmd_inspect(&config, &file)?;
        }
        Commands::Export {
            file,
            format,
            output,
        } => {
            cmd_export(&config, &file, &format, output)?;
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (
                Some(fmt::layer().json().with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

// ─── Command implementations ──────────────────────────────────────────────────

fn cmd_mine(
    config: &MinerConfig,
    root: &Path,
    state_file: &Path,
    record_state: bool,
    mut sink: Box<dyn DocumentSink>,
) -> Result<()> {
    if !root.is_dir() {
        anyhow::bail!("Root directory not found: {}", root.display());
    }
    let miner = LogMiner::new(config)?;
    info!(
        root = %root.display(),
        state_file = %state_file.display(),
        record_state,
        "Starting mining pass"
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
    spinner.set_message(format!("Mining {}", root.display()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let summary = miner.mine_tree(root, state_file, record_state, sink.as_mut());
    spinner.finish_and_clear();

    print_summary(&summary?);
    Ok(())
}

fn print_summary(summary: &MineSummary) {
    eprintln!("Directories mined: {}", summary.directories);
    eprintln!(
        "Files:             {} mined, {} without tables, {} unreadable",
        summary.files, summary.skipped_files, summary.failed_files
    );
    eprintln!(
        "Documents:         {} indexed, {} rejected",
        summary.indexed, summary.rejected
    );
}

fn mine_one(config: &MinerConfig, file: &Path) -> Result<MinedLog> {
    if !file.exists() {
        anyhow::bail!("Log file not found: {}", file.display());
    }
    let miner = LogMiner::new(config)?;
    miner
        .mine_file(file)?
        .ok_or_else(|| anyhow!("No timer table found in {}", file.display()))
}

fn cmd_inspect(config: &MinerConfig, file: &Path) -> Result<()> {
    let mined = mine_one(config, file)?;

    println!("File: {}", file.display());
    println!("Experiment: {}", display_or_dash(&mined.experiment));
    println!("Timestamp: {}", mined.time_stamp);
    println!("Tables: {}", mined.tables);
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(COLUMNS);
    for doc in &mined.documents {
        table.add_row(
            doc.record
                .values()
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())),
        );
    }
    println!("── Records ({}) ─────────────────────────", mined.documents.len());
    println!("{}", table);
    Ok(())
}

fn cmd_export(config: &MinerConfig, file: &Path, format: &str, output: Option<PathBuf>) -> Result<()> {
    let mined = mine_one(config, file)?;

    let content = match format {
        "json" => serde_json::to_string_pretty(&mined.documents)?,
        "csv" => {
            let mut keys: Vec<&str> = COLUMNS.to_vec();
            keys.extend(["time_stamp", "experiment"]);
            let mut out = keys.join(",") + "\n";
            for doc in &mined.documents {
                let value = serde_json::to_value(doc)?;
                let vals: Vec<String> = keys
                    .iter()
                    .map(|k| match &value[*k] {
                        serde_json::Value::Null => String::new(),
                        serde_json::Value::String(s) => csv_field(s),
                        other => other.to_string(),
                    })
                    .collect();
                out += &(vals.join(",") + "\n");
            }
            out
        }
        _ => anyhow::bail!("Unknown format: {}", format),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &content)?;
            println!(
                "Exported {} rows to {}",
                mined.documents.len(),
                path.display()
            );
        }
        None => print!("{}", content),
    }

    Ok(())
}

// ─── Utilities ────────────────────────────────────────────────────────────────

/// Quote a CSV field when it holds a delimiter, quote or line break.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn display_or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("nh_solve"), "nh_solve");
        assert_eq!(csv_field("exp,a"), "\"exp,a\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }
}
