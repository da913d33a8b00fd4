//! Binary entrypoint for the craftcost CLI.
//!
//! Commands:
//! - `serve [--cli]` - run the dispatcher and periodic saver, optionally with a terminal session
//! - `init` - create a starter `config.toml`
//! - `status` - print snapshot and catalog summary
//! - `price <faction> <expression>` - one-off price estimate
//! - `plan <faction> <item>` - one-off crafting plan
//!
//! See the library crate docs for module-level details: `craftcost::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio::io::BufReader;

use craftcost::catalog::{Discipline, Faction};
use craftcost::config::Config;
use craftcost::dispatch::{start_dispatcher, Action, Dispatcher, DispatcherState};
use craftcost::frontend::{run_cli, CliExit};
use craftcost::storage::saver::{final_save, spawn_saver};
use craftcost::storage::{open_catalog, CatalogSource, SnapshotStore};

#[derive(Parser)]
#[command(name = "craftcost")]
#[command(about = "Crafting cost estimator for item and recipe catalogs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve commands until shutdown
    Serve {
        /// Attach an interactive session on stdin/stdout
        #[arg(long)]
        cli: bool,
    },
    /// Write a default configuration file
    Init,
    /// Show snapshot and catalog summary
    Status {
        /// Only count recipes of this discipline
        #[arg(long)]
        discipline: Option<String>,
    },
    /// Estimate crafting prices of items matching an expression
    Price {
        /// elyos, asmodian, 1 or 2
        faction: String,
        /// Case-insensitive regular expression over item names
        pattern: String,
    },
    /// Show what to buy and craft for an item
    Plan {
        /// elyos, asmodian, 1 or 2
        faction: String,
        /// Exact item name (case-sensitive)
        item: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
            warn!("{} already exists; leaving it untouched", cli.config);
            return Ok(());
        }
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = match Config::load(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            // Running without a config file is fine; a broken one is not.
            if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                return Err(e);
            }
            Config::default()
        }
    };
    init_logging(&Some(config.clone()), cli.verbose);

    let store = SnapshotStore::new(&config.catalog.snapshot_path);
    match cli.command {
        Commands::Serve { cli: attach_cli } => serve(config, store, attach_cli).await?,
        Commands::Status { discipline } => {
            let only = discipline.as_deref().map(parse_discipline).transpose()?;
            show_status(&store, &config, only).await?
        }
        Commands::Price { faction, pattern } => {
            let faction = parse_faction(&faction)?;
            let (catalog, _) = open_catalog(&store, &config.catalog.seed_path).await?;
            let reply = Dispatcher::new(catalog).execute(Action::GetPrice, faction, &pattern, None);
            println!("{}", reply.trim_end());
        }
        Commands::Plan { faction, item } => {
            let faction = parse_faction(&faction)?;
            let (catalog, _) = open_catalog(&store, &config.catalog.seed_path).await?;
            let reply = Dispatcher::new(catalog).execute(Action::GetPlan, faction, &item, None);
            println!("{}", reply.trim_end());
        }
        Commands::Init => {}
    }

    Ok(())
}

fn parse_faction(text: &str) -> Result<Faction> {
    Faction::from_name(text).ok_or_else(|| anyhow!("Unknown faction '{}' (expected elyos or asmodian)", text))
}

fn parse_discipline(text: &str) -> Result<Discipline> {
    Discipline::from_name(text).ok_or_else(|| {
        let known: Vec<&str> = Discipline::ALL.iter().map(|d| d.display_name()).collect();
        anyhow!("Unknown discipline '{}' (expected one of {})", text, known.join(", "))
    })
}

async fn serve(config: Config, store: SnapshotStore, attach_cli: bool) -> Result<()> {
    info!("Starting craftcost v{}", env!("CARGO_PKG_VERSION"));
    let (catalog, source) = open_catalog(&store, &config.catalog.seed_path).await?;
    match source {
        CatalogSource::Snapshot => info!("Catalog restored from {}", store.path().display()),
        CatalogSource::Seed(report) => info!(
            "Catalog seeded from {} ({} items, {} recipes)",
            config.catalog.seed_path, report.items, report.recipes
        ),
        CatalogSource::Empty => warn!("Serving an empty catalog"),
    }

    let (handle, task) = start_dispatcher(catalog, config.dispatcher.queue_capacity);
    let saver = config
        .persistence
        .save_interval()
        .map(|every| spawn_saver(handle.clone(), store.clone(), every));

    if attach_cli {
        let stdin = BufReader::new(tokio::io::stdin());
        match run_cli(handle.clone(), stdin, tokio::io::stdout()).await {
            Ok(CliExit::Quit | CliExit::Eof) => info!("CLI session detached; Ctrl-C stops the service"),
            Ok(CliExit::Shutdown | CliExit::DispatcherClosed) => {}
            // Keep serving so shutdown still ends with a final save.
            Err(e) => error!("CLI session failed: {}; Ctrl-C stops the service", e),
        }
    }

    let mut state = handle.subscribe();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received; shutting down");
            let _ = handle.shutdown().await;
        }
        _ = state.wait_for(|s| *s == DispatcherState::Closed) => {}
    }
    drop(handle);

    let catalog = task.await.map_err(|e| anyhow!("Dispatcher task failed: {}", e))?;
    if let Some(saver) = saver {
        let _ = saver.await;
    }
    if final_save(&catalog, &store).await? {
        info!("Final snapshot saved");
    }
    Ok(())
}

async fn show_status(store: &SnapshotStore, config: &Config, only: Option<Discipline>) -> Result<()> {
    println!("craftcost v{}", env!("CARGO_PKG_VERSION"));
    match store.info().await {
        Some(info) => {
            let modified = info
                .modified
                .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("Snapshot: {} ({} bytes, modified {})", store.path().display(), info.bytes, modified);
        }
        None => println!("Snapshot: {} (not written yet)", store.path().display()),
    }
    let Some(catalog) = store.load().await? else {
        println!("Seed: {}", config.catalog.seed_path);
        return Ok(());
    };
    println!("State: {:?}", catalog.state());
    for faction in Faction::ALL {
        let items = catalog.items(faction);
        let priced = items.values().filter(|i| i.has_price()).count();
        println!(
            "{}: {} items ({} priced), {} recipes",
            faction,
            items.len(),
            priced,
            catalog.recipe_count(faction)
        );
        for discipline in Discipline::ALL.into_iter().filter(|d| only.map_or(true, |o| o == *d)) {
            let count = catalog.recipes(faction, discipline).len();
            if count > 0 {
                println!("  {}: {}", discipline, count);
            }
        }
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| std::fs::OpenOptions::new().create(true).append(true).open(file).ok());

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only in the foreground
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
