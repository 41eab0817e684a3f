//! Folio CLI - Command-line interface for the Folio investment tracker

use clap::{Parser, Subcommand};
use folio::backend::ComposeManager;
use folio::client::ApiClient;
use folio::config;
use folio::storage::{KvSnapshotStore, KvStore};
use folio::ui::{self, Icons};
use folio::watchlist::{ItemUpdate, WatchlistStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Investment tracking platform - watchlist, mock data API, backend services")]
#[command(long_about = r#"
Folio keeps a persistent watchlist of symbols with tags and groups,
serves the platform's mock data API, and manages the dockerized
backend services.

Example usage:
  folio add AAPL --tags tech
  folio group create "Tech Giants" --color blue
  folio group add tech-giants AAPL
  folio list --tag tech
  folio serve --port 8080
  folio backend status
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the watchlist database (defaults to the configured path)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a folio.toml config and prepare the data directory
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Track a symbol
    Add {
        /// Ticker symbol (case-insensitive)
        symbol: String,

        /// Tags to seed the item with
        #[arg(short, long)]
        tags: Vec<String>,

        /// Free-form note
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Stop tracking a symbol (removes it from every group)
    Remove {
        /// Ticker symbol
        symbol: String,
    },

    /// Set the note on a tracked symbol
    Note {
        /// Ticker symbol
        symbol: String,

        /// Note text
        notes: String,
    },

    /// Attach or detach a tag
    Tag {
        /// Ticker symbol
        symbol: String,

        /// Tag (case-sensitive)
        tag: String,

        /// Detach instead of attach
        #[arg(long)]
        remove: bool,
    },

    /// Manage symbol groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Show the watchlist
    List {
        /// Only symbols in this group
        #[arg(short, long)]
        group: Option<String>,

        /// Only symbols carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// List every tag in use
    Tags,

    /// Select a group (or clear the selection)
    Select {
        /// Group id; omit to clear
        group: Option<String>,
    },

    /// Set the search term and show matching symbols
    Search {
        /// Search text
        term: String,
    },

    /// Run the mock data API server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch a resource collection from the platform API
    Fetch {
        /// Resource to fetch
        #[arg(value_enum)]
        resource: FetchResource,
    },

    /// Manage the dockerized backend services
    Backend {
        /// Path to the docker-compose file
        #[arg(long)]
        compose_file: Option<PathBuf>,

        #[command(subcommand)]
        command: BackendCommands,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    /// Create a group
    Create {
        /// Display name; the id is derived from it
        name: String,

        /// Display color
        #[arg(short, long, default_value = "blue")]
        color: String,
    },

    /// Delete a group (items are untouched)
    Delete {
        /// Group id
        id: String,
    },

    /// Add a symbol to a group
    Add {
        /// Group id
        id: String,

        /// Ticker symbol
        symbol: String,
    },

    /// Remove a symbol from a group
    Remove {
        /// Group id
        id: String,

        /// Ticker symbol
        symbol: String,
    },

    /// Show one group, or all groups when no id is given
    Show {
        /// Group id
        id: Option<String>,
    },
}

#[derive(Clone, clap::ValueEnum)]
enum FetchResource {
    Investments,
    Recommendations,
}

#[derive(Subcommand)]
enum BackendCommands {
    /// Check docker and docker compose availability
    Check,
    /// Start all backend services
    Start,
    /// Stop all backend services
    Stop,
    /// Show per-service status
    Status,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = config::load_config(None)?.unwrap_or_default();
    let database = resolve_database(cli.database, &config);

    match cli.command {
        Commands::Init { force } => {
            let config_path = config::default_config_path();
            let cwd = std::env::current_dir()?;
            let db_path = config::default_database_path_in(&cwd);

            let config = config::FolioConfig {
                database: Some(".folio/folio.db".to_string()),
                port: Some(8080),
                compose_file: None,
                api_base_url: Some("http://localhost:8080".to_string()),
            };
            config::write_config(&config_path, &config, force)?;
            config::ensure_db_dir(&db_path)?;
            config::ensure_gitignore(&cwd)?;

            ui::success(&format!("Wrote {}", config_path.display()));
            ui::summary_row("database:", &db_path.display().to_string());
            ui::summary_row("port:", "8080");
        }

        Commands::Add { symbol, tags, notes } => {
            let mut store = open_store(&database)?;
            let existed = store.get_item(&symbol).is_some();

            store.add_symbol(&symbol, tags);
            if let Some(notes) = notes {
                store.update_symbol(&symbol, ItemUpdate { notes: Some(notes) });
            }
            flush(&mut store);

            if existed {
                println!("{} {} is already tracked", Icons::INFO, symbol.to_uppercase());
            } else {
                ui::success(&format!("Tracking {}", symbol.to_uppercase()));
            }
        }

        Commands::Remove { symbol } => {
            let mut store = open_store(&database)?;
            let tracked = store.get_item(&symbol).is_some();
            store.remove_symbol(&symbol);
            flush(&mut store);

            if tracked {
                println!("{} Removed {} from the watchlist", Icons::DEL, symbol.to_uppercase());
            } else {
                println!("{} {} was not tracked", Icons::INFO, symbol.to_uppercase());
            }
        }

        Commands::Note { symbol, notes } => {
            let mut store = open_store(&database)?;
            if store.get_item(&symbol).is_none() {
                ui::warn(&format!("{} is not tracked", symbol.to_uppercase()));
                return Ok(());
            }
            store.update_symbol(&symbol, ItemUpdate { notes: Some(notes) });
            flush(&mut store);
            println!("{} Noted {}", Icons::NOTE, symbol.to_uppercase());
        }

        Commands::Tag { symbol, tag, remove } => {
            let mut store = open_store(&database)?;
            if store.get_item(&symbol).is_none() {
                ui::warn(&format!("{} is not tracked", symbol.to_uppercase()));
                return Ok(());
            }

            if remove {
                store.remove_tag(&symbol, &tag);
                println!("{} Removed tag '{}' from {}", Icons::TAG, tag, symbol.to_uppercase());
            } else {
                store.add_tag(&symbol, &tag);
                println!("{} Tagged {} with '{}'", Icons::TAG, symbol.to_uppercase(), tag);
            }
            flush(&mut store);
        }

        Commands::Group { command } => {
            run_group_command(&database, command)?;
        }

        Commands::List { group, tag } => {
            let store = open_store(&database)?;

            let items: Vec<&folio::WatchlistItem> = if let Some(group_id) = &group {
                if store.get_group(group_id).is_none() {
                    ui::warn(&format!("No group with id '{}'", group_id));
                    return Ok(());
                }
                let symbols = store.symbols_by_group(group_id);
                let mut rows = Vec::new();
                for symbol in &symbols {
                    match store.get_item(symbol) {
                        Some(item) => rows.push(item),
                        None => println!("{} {} (referenced, not tracked)", Icons::INFO, symbol),
                    }
                }
                rows
            } else if let Some(tag) = &tag {
                store
                    .symbols_by_tag(tag)
                    .iter()
                    .filter_map(|s| store.get_item(s))
                    .collect()
            } else {
                store.items().iter().collect()
            };

            if items.is_empty() {
                println!("{} Watchlist is empty.", Icons::EYE);
            } else {
                println!("{} Watchlist ({} symbols)", Icons::EYE, items.len());
                println!("{}", ui::watchlist_table(&items));
            }
        }

        Commands::Tags => {
            let store = open_store(&database)?;
            let tags = store.all_tags();

            if tags.is_empty() {
                println!("{} No tags in use.", Icons::TAG);
            } else {
                for tag in tags {
                    let count = store.symbols_by_tag(&tag).len();
                    println!("{} {} ({})", Icons::TAG, tag, count);
                }
            }
        }

        Commands::Select { group } => {
            let mut store = open_store(&database)?;
            match &group {
                Some(id) => {
                    if store.get_group(id).is_none() {
                        ui::warn(&format!("No group with id '{}'", id));
                        return Ok(());
                    }
                    store.set_selected_group(Some(id.as_str()));
                    ui::success(&format!("Selected group '{}'", id));
                }
                None => {
                    store.set_selected_group(None);
                    ui::success("Cleared group selection");
                }
            }
            flush(&mut store);
        }

        Commands::Search { term } => {
            let mut store = open_store(&database)?;
            store.set_search_term(&term);
            flush(&mut store);

            let needle = term.to_uppercase();
            let matches: Vec<&folio::WatchlistItem> = store
                .items()
                .iter()
                .filter(|item| item.symbol.contains(needle.as_str()))
                .collect();

            if matches.is_empty() {
                println!("{} No symbols match '{}'", Icons::CROSS, term);
            } else {
                println!("{}", ui::watchlist_table(&matches));
            }
        }

        Commands::Serve { port } => {
            let port = port.or(config.port).unwrap_or(8080);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(folio::server::start_server(port))?;
        }

        Commands::Fetch { resource } => {
            let base_url = config
                .api_base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:8080".to_string());
            let path = match resource {
                FetchResource::Investments => "/api/v1/investments",
                FetchResource::Recommendations => "/api/v1/recommendations",
            };

            let client = ApiClient::new(base_url)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let response = runtime.block_on(client.get::<serde_json::Value>(path));

            if response.success {
                if let Some(data) = response.data {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                }
            } else {
                ui::error(response.error.as_deref().unwrap_or("Request failed"));
            }
        }

        Commands::Backend { compose_file, command } => {
            let compose_file = resolve_compose_file(compose_file, &config);
            run_backend_command(compose_file, command);
        }
    }

    Ok(())
}

fn run_group_command(database: &Path, command: GroupCommands) -> anyhow::Result<()> {
    let mut store = open_store(database)?;

    match command {
        GroupCommands::Create { name, color } => {
            let id = store.create_group(&name, &color);
            flush(&mut store);
            ui::success(&format!("Created group '{}' (id: {})", name, id));
        }

        GroupCommands::Delete { id } => {
            let existed = store.get_group(&id).is_some();
            store.delete_group(&id);
            flush(&mut store);

            if existed {
                println!("{} Deleted group '{}'", Icons::DEL, id);
            } else {
                println!("{} No group with id '{}'", Icons::INFO, id);
            }
        }

        GroupCommands::Add { id, symbol } => {
            if store.get_group(&id).is_none() {
                ui::warn(&format!("No group with id '{}'", id));
                return Ok(());
            }
            store.add_to_group(&id, &symbol);
            flush(&mut store);
            ui::success(&format!("Added {} to '{}'", symbol.to_uppercase(), id));
        }

        GroupCommands::Remove { id, symbol } => {
            if store.get_group(&id).is_none() {
                ui::warn(&format!("No group with id '{}'", id));
                return Ok(());
            }
            store.remove_from_group(&id, &symbol);
            flush(&mut store);
            ui::success(&format!("Removed {} from '{}'", symbol.to_uppercase(), id));
        }

        GroupCommands::Show { id } => {
            match id {
                Some(id) => match store.get_group(&id) {
                    Some(group) => {
                        println!("{} {} ({}, {})", Icons::FOLDER, group.name, group.id, group.color);
                        if group.symbols.is_empty() {
                            println!("  {}", ui::dim("empty"));
                        } else {
                            for symbol in &group.symbols {
                                let marker = if store.get_item(symbol).is_some() {
                                    Icons::STAR
                                } else {
                                    Icons::INFO
                                };
                                println!("  {} {}", marker, symbol);
                            }
                        }
                    }
                    None => ui::warn(&format!("No group with id '{}'", id)),
                },
                None => {
                    if store.groups().is_empty() {
                        println!("{} No groups defined.", Icons::FOLDER);
                    } else {
                        println!("{}", ui::groups_table(store.groups()));
                        if let Some(selected) = store.selected_group_id() {
                            ui::summary_row("selected:", selected);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn run_backend_command(compose_file: PathBuf, command: BackendCommands) {
    let manager = ComposeManager::new(compose_file);

    match command {
        BackendCommands::Check => {
            let docker = manager.check_docker();
            if docker.available {
                ui::status(
                    Icons::WHALE,
                    "docker",
                    docker.version.as_deref().unwrap_or("available"),
                );
            } else {
                ui::error(docker.error.as_deref().unwrap_or("Docker not available"));
            }

            let compose = manager.check_compose();
            if compose.available {
                ui::status(
                    Icons::WHALE,
                    "compose",
                    compose.version.as_deref().unwrap_or("available"),
                );
            } else {
                ui::error("Docker Compose not found");
            }
        }

        BackendCommands::Start => {
            println!("{} Starting backend services...", Icons::ROCKET);
            let result = manager.start();
            if result.success {
                ui::success("Backend services started");
            } else {
                ui::error(result.error.as_deref().unwrap_or("Failed to start services"));
            }
        }

        BackendCommands::Stop => {
            let result = manager.stop();
            if result.success {
                ui::success("Backend services stopped");
            } else {
                ui::error(result.error.as_deref().unwrap_or("Failed to stop services"));
            }
        }

        BackendCommands::Status => {
            let status = manager.status();
            if let Some(error) = &status.error {
                ui::error(error);
                return;
            }

            println!("{} Backend status", Icons::STATS);
            if status.services.is_empty() {
                println!("  {}", ui::dim("no services"));
            } else {
                println!("{}", ui::services_table(&status.services));
            }
            ui::summary_row(
                "running:",
                if status.services_running { "yes" } else { "no" },
            );
        }
    }
}

/// Open the snapshot-backed watchlist store
fn open_store(database: &Path) -> anyhow::Result<WatchlistStore> {
    config::ensure_db_dir(database)?;
    let kv = KvStore::open(database)?;
    Ok(WatchlistStore::load_or_default(Box::new(KvSnapshotStore::new(kv))))
}

/// Persist pending mutations, warning on (non-fatal) write failure
fn flush(store: &mut WatchlistStore) {
    if !store.flush() {
        ui::warn("Could not persist the watchlist; changes are kept in memory");
    }
}

/// CLI flag beats the config file beats the default location
fn resolve_database(cli: Option<PathBuf>, config: &config::FolioConfig) -> PathBuf {
    cli.or_else(|| config.database.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| config::default_database_path_in(Path::new(".")))
}

fn resolve_compose_file(cli: Option<PathBuf>, config: &config::FolioConfig) -> PathBuf {
    cli.or_else(|| config.compose_file.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| config::default_compose_path_in(Path::new(".")))
}
