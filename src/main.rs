// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! dnsvc command line: analyse record sets, generate records from zones.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dnsvc::{
    analyzer::analyze_zone_with,
    config::EngineConfig,
    constants::{DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    record::{fqdn, Record},
    registry::ServiceRegistry,
    service::service_capabilities,
    zone::{StoredZone, Synthesis, Zone},
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Analyse DNS zones into services and generate records back.
#[derive(Parser, Debug)]
#[command(name = "dnsvc")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse records (one per line, `<name> <ttl> IN <type> <rdata>`) and print the zone as JSON
    Analyze {
        /// Zone origin
        #[arg(long)]
        origin: String,

        /// Record file, standard input when omitted
        #[arg(long)]
        input: Option<PathBuf>,

        /// Engine settings file (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the maximum number of records of one zone
        #[arg(long)]
        max_records: Option<usize>,
    },

    /// Read a zone as JSON and print its records
    Generate {
        /// Zone origin
        #[arg(long)]
        origin: String,

        /// Zone file, standard input when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// List the known service kinds in priority order
    Services,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let registry = ServiceRegistry::builtin().context("Failed to build the service registry")?;
    debug!(kinds = registry.len(), "service registry ready");

    match cli.command {
        Command::Analyze {
            origin,
            input,
            config,
            max_records,
        } => {
            let config = load_config(config.as_deref(), max_records)?;
            let text = read_input(input.as_deref())?;
            println!("{}", analyze(&registry, &config, &origin, &text)?);
        }
        Command::Generate { origin, input } => {
            let text = read_input(input.as_deref())?;
            let synthesis = generate(&registry, &origin, &text)?;
            for record in &synthesis.records {
                println!("{record}");
            }
            if !synthesis.is_complete() {
                for failure in &synthesis.failures {
                    eprintln!(
                        "{} service {} on '{}': {}",
                        failure.type_key, failure.service_id, failure.domain, failure.error
                    );
                }
                bail!(
                    "{} service(s) failed to generate their records",
                    synthesis.failures.len()
                );
            }
        }
        Command::Services => {
            for line in list_services(&registry) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// Logs go to stderr, stdout is reserved for command output.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

fn load_config(path: Option<&Path>, max_records: Option<usize>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_yaml_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(max_records) = max_records {
        config.max_records_per_zone = max_records;
    }
    config.validate()?;
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read standard input")?;
            Ok(text)
        }
    }
}

/// Parse record lines, skipping blank lines and `;` comments.
fn parse_records(text: &str) -> Result<Vec<Record>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with(';')
        })
        .map(|(n, line)| {
            line.parse::<Record>()
                .with_context(|| format!("Invalid record on line {}", n + 1))
        })
        .collect()
}

fn analyze(
    registry: &ServiceRegistry,
    config: &EngineConfig,
    origin: &str,
    text: &str,
) -> Result<String> {
    let records = parse_records(text)?;
    info!(origin, records = records.len(), "analysing records");

    let analysis = analyze_zone_with(registry, &fqdn(origin), records, config)
        .with_context(|| format!("Failed to analyse {origin}"))?;
    let zone = Zone::from_analysis(analysis);

    serde_json::to_string_pretty(&zone).context("Failed to encode the zone")
}

fn generate(registry: &ServiceRegistry, origin: &str, text: &str) -> Result<Synthesis> {
    let stored: StoredZone = serde_json::from_str(text).context("Failed to decode the zone")?;
    let zone = Zone::from_stored(stored, registry).context("Failed to load the zone")?;

    Ok(zone.generate_records(origin))
}

fn list_services(registry: &ServiceRegistry) -> Vec<String> {
    registry
        .ordered_entries()
        .map(|entry| {
            let capabilities = service_capabilities(entry.create().as_ref());
            let mut line = format!("{:>5}  {:<28} {}", entry.priority, entry.type_key, entry.infos.name);
            if !capabilities.is_empty() {
                line.push_str(&format!(" [{}]", capabilities.join(", ")));
            }
            line
        })
        .collect()
}
