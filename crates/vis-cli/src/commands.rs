use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use vis_ledger::{LedgerService, PrepareRequest, ResolveQuery, RollbackRequest};
use vis_server::{ServerConfig, VisServer};
use vis_store::SqliteLedgerStore;
use vis_types::{badge_color, ObjectId, ObjectIdGenerator, RepoSummary, VersionRecord};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    tracing::debug!(?config, "resolved configuration");
    let format = cli.format;
    match cli.command {
        Command::Serve(_) => cmd_serve(config),
        Command::Prepare(args) => cmd_prepare(&open_ledger(&config)?, args, format),
        Command::Commit(args) => cmd_commit(&open_ledger(&config)?, args, format),
        Command::Rollback(args) => cmd_rollback(&open_ledger(&config)?, args, format),
        Command::Resolve(args) => cmd_resolve(&open_ledger(&config)?, args, format),
        Command::Repos => cmd_repos(&open_ledger(&config)?, format),
        Command::Show(args) => cmd_show(&open_ledger(&config)?, args, format),
    }
}

/// Config file first, then flags and `VIS_*` variables on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(ms) = cli.busy_timeout_ms {
        config.busy_timeout_ms = ms;
    }
    if let Command::Serve(ServeArgs { bind: Some(addr) }) = &cli.command {
        config.bind_addr = *addr;
    }
    Ok(config)
}

fn machine_ids() -> anyhow::Result<ObjectIdGenerator> {
    ObjectIdGenerator::detect().context("cannot derive a machine identity from network interfaces")
}

fn open_ledger(config: &ServerConfig) -> anyhow::Result<LedgerService> {
    let store = SqliteLedgerStore::open(&config.database, &config.sqlite_options())
        .with_context(|| format!("opening {}", config.database.display()))?;
    Ok(LedgerService::new(Arc::new(store), Arc::new(machine_ids()?)))
}

fn cmd_serve(config: ServerConfig) -> anyhow::Result<()> {
    let server = VisServer::open(config, machine_ids()?)?;
    println!(
        "vis server on {} (database: {})",
        server.config().bind_addr.to_string().bold(),
        server.config().database.display()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_prepare(
    ledger: &LedgerService,
    args: PrepareArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let request = PrepareRequest {
        namespace: args.slot.namespace,
        repo_id: args.slot.repo,
        version_type: args.slot.version_type,
        value: args.value,
        auto_commit: args.auto_commit,
    };
    let id = ledger.prepare(&request)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "tx_id": id, "committed": request.auto_commit })
        ),
        OutputFormat::Text if request.auto_commit => {
            println!("{} Committed {}", "✓".green().bold(), id.to_string().yellow())
        }
        OutputFormat::Text => println!("{}", id),
    }
    Ok(())
}

fn cmd_commit(
    ledger: &LedgerService,
    args: CommitArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    ledger.commit_hex(&args.tx_id)?;
    let tx_id = args.tx_id.trim();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "tx_id": tx_id, "committed": true }))
        }
        OutputFormat::Text => println!("{} Committed {}", "✓".green().bold(), tx_id.yellow()),
    }
    Ok(())
}

fn cmd_rollback(
    ledger: &LedgerService,
    args: SlotArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let request = RollbackRequest {
        namespace: args.namespace,
        repo_id: args.repo,
        version_type: args.version_type,
    };
    let removed = ledger.rollback(&request)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "removed": removed })),
        OutputFormat::Text => println!(
            "{} Rolled back {}/{}: {} record(s) removed",
            "✓".green().bold(),
            request.namespace.trim().bold(),
            request.repo_id.trim(),
            removed
        ),
    }
    Ok(())
}

fn cmd_resolve(
    ledger: &LedgerService,
    args: ResolveArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let query = ResolveQuery {
        namespace: args.namespace,
        repo_id: args.repo,
        version_type: args.version_type,
    };
    let value = ledger.resolve_or_placeholder(&query)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "version_type": query.type_label(), "value": value })
        ),
        OutputFormat::Text => println!("{}", value),
    }
    Ok(())
}

fn cmd_repos(ledger: &LedgerService, format: OutputFormat) -> anyhow::Result<()> {
    let summaries = ledger.summaries()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Text if summaries.is_empty() => println!("No committed versions."),
        OutputFormat::Text => {
            for summary in &summaries {
                print_summary(summary);
            }
        }
    }
    Ok(())
}

fn print_summary(summary: &RepoSummary) {
    println!(
        "{}/{}  {}",
        summary.namespace.bold(),
        summary.repo_id.bold(),
        summary.last_value.as_deref().unwrap_or(vis_ledger::NOT_AVAILABLE).yellow()
    );
    println!(
        "  {} committed: release {}  development {}  nightly {}  patch {}",
        summary.total(),
        summary.release_count,
        summary.development_count,
        summary.nightly_count,
        summary.patch_count
    );
    if let Some(updated) = summary.last_updated {
        println!("  updated {}", updated.to_rfc3339().dimmed());
    }
}

fn cmd_show(ledger: &LedgerService, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id: ObjectId = args.tx_id.trim().to_ascii_lowercase().parse()?;
    let record = ledger
        .record(&id)?
        .with_context(|| format!("no record with id {id}"))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => print_record(&record),
    }
    Ok(())
}

fn print_record(record: &VersionRecord) {
    let status = if record.is_committed() {
        record.status.as_str().green()
    } else {
        record.status.as_str().yellow()
    };
    println!("Record {}  {}", record.id.to_string().yellow().bold(), status);
    println!("  Slot: {}", record.key().to_string().bold());
    println!(
        "  Value: {} ({})",
        record.value,
        badge_color(record.version_type.as_str()).dimmed()
    );
    println!("  Created: {}", record.created.to_rfc3339());
    println!("  Minted: {}", record.id.timestamp().to_rfc3339().dimmed());
}
