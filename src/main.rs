//! lfa - Log Forwarding Analyzer CLI

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use log_forwarding_analyzer::constants::{APP_NAME, APP_VERSION};
use log_forwarding_analyzer::logic::aggregator::ExclusionBasis;
use log_forwarding_analyzer::logic::ingest::jsonl::event_from_value;
use log_forwarding_analyzer::logic::ingest::InputFormat;
use log_forwarding_analyzer::logic::report::{render_summary, render_totals, ReportWriter};
use log_forwarding_analyzer::{Analyzer, AnalyzerConfig};

#[derive(Parser)]
#[command(name = "lfa", about = "Log forwarding analysis and SIEM volume estimation", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Policy sources and model shared by every subcommand
#[derive(Args)]
struct SourceArgs {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Panorama configuration export (XML)
    #[arg(long)]
    panorama: Option<PathBuf>,
    /// Local firewall configuration export (XML)
    #[arg(long)]
    local: Option<PathBuf>,
    /// JSON array of rule records
    #[arg(long)]
    rules_json: Option<PathBuf>,
    /// Classifier model file
    #[arg(long)]
    model: Option<PathBuf>,
}

impl SourceArgs {
    fn load_config(&self) -> Result<AnalyzerConfig> {
        let mut config = AnalyzerConfig::load(self.config.as_deref()).context("loading config")?;
        if self.panorama.is_some() {
            config.source.panorama_config = self.panorama.clone();
        }
        if self.local.is_some() {
            config.source.local_config = self.local.clone();
        }
        if self.rules_json.is_some() {
            config.source.rules_json = self.rules_json.clone();
        }
        if self.model.is_some() {
            config.source.model_path = self.model.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze log exports and write reports.
    Analyze {
        /// Log files or directories. Defaults to `source.inputs` from the config.
        inputs: Vec<PathBuf>,
        /// Input format (csv, json, syslog). Guessed from the extension when omitted.
        #[arg(long)]
        format: Option<InputFormat>,
        /// Data directory; reports go to `<output>/reports/latest`.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip events whose rule is not in the loaded policy.
        #[arg(long)]
        strict: bool,
        /// Split included/excluded traffic with the full policy instead of the heuristic.
        #[arg(long)]
        policy_basis: bool,
        /// Print the summary without writing report files.
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Decide one event (JSON object from --event or stdin) and print the decision.
    Decide {
        /// Event as a JSON object.
        #[arg(long)]
        event: Option<String>,
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// List the rules loaded from the policy sources.
    Rules {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::debug!("{} v{}", APP_NAME, APP_VERSION);

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Analyze {
            inputs,
            format,
            output,
            strict,
            policy_basis,
            dry_run,
            sources,
        } => cmd_analyze(inputs, format, output, strict, policy_basis, dry_run, &sources),
        Commands::Decide { event, sources } => cmd_decide(event, &sources),
        Commands::Rules { sources } => cmd_rules(&sources),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn cmd_analyze(
    inputs: Vec<PathBuf>,
    format: Option<InputFormat>,
    output: Option<PathBuf>,
    strict: bool,
    policy_basis: bool,
    dry_run: bool,
    sources: &SourceArgs,
) -> Result<()> {
    let mut config = sources.load_config()?;
    if format.is_some() {
        config.source.format = format;
    }
    if let Some(dir) = output {
        config.paths.data_dir = dir;
    }
    if strict {
        config.aggregation.strict_rule_match = true;
    }
    if policy_basis {
        config.aggregation.exclusion_basis = ExclusionBasis::Policy;
    }

    let inputs = if inputs.is_empty() {
        config.source.inputs.clone()
    } else {
        inputs
    };
    if inputs.is_empty() {
        bail!("no log inputs given");
    }

    let data_dir = config.paths.data_dir.clone();
    let analyzer = Analyzer::from_config(config).context("loading policy sources")?;
    let outcome = analyzer.run(&inputs).context("analyzing logs")?;

    print!("{}", render_summary(&outcome.summary, &outcome.daily, &outcome.storage));
    print!("\n{}", render_totals(&outcome.totals));
    println!(
        "\n{} rules analyzed, {} malformed entries skipped, {} events without a rule",
        outcome.reports.len(),
        outcome.entries_skipped,
        outcome.events_unattributed
    );

    if dry_run {
        return Ok(());
    }
    let written = ReportWriter::new(&data_dir)
        .write(&outcome.summary, &outcome.daily, &outcome.storage, &outcome.reports)
        .context("writing reports")?;
    println!("Reports written to {}", written.forwarding.display());
    Ok(())
}

fn cmd_decide(event: Option<String>, sources: &SourceArgs) -> Result<()> {
    let raw = match event {
        Some(raw) => raw,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading event from stdin")?;
            buf
        }
    };
    let value: serde_json::Value = serde_json::from_str(&raw).context("parsing event JSON")?;
    let Some(event) = event_from_value(&value) else {
        bail!("event must be a JSON object");
    };

    let analyzer = Analyzer::from_config(sources.load_config()?).context("loading policy sources")?;
    let decision = analyzer.policy().decide(&event);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn cmd_rules(sources: &SourceArgs) -> Result<()> {
    let analyzer = Analyzer::from_config(sources.load_config()?).context("loading policy sources")?;
    let registry = analyzer.registry();
    if registry.is_empty() {
        println!("No rules loaded.");
        return Ok(());
    }

    println!("{} rules:", registry.len());
    for rule in registry.iter() {
        println!(
            "{:<40} {:<45} forwarding {}",
            rule.key(),
            rule.source().location(),
            if rule.forwarding_enabled { "on" } else { "off" }
        );
    }
    Ok(())
}
