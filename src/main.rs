//! Uniquity
//!
//! Command-line front end for the character catalog and the favorites list.
//!
//! # Usage
//!
//! ```bash
//! # List groups
//! uniquity groups
//!
//! # Show a group as keyboard rows
//! uniquity group "Basic Latin"
//!
//! # Describe one codepoint
//! uniquity show U+1F600
//!
//! # Search names and aliases
//! uniquity search smiling --limit 20
//!
//! # Manage favorites
//! uniquity fav add 2764
//! uniquity fav list
//!
//! # Build a snapshot from UCD text files
//! uniquity import-ucd ./ucd ./ucd.toml
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uniquity::{
    rows, ucd, Catalog, CatalogHandle, CatalogState, Codepoint, Config, DatasetSource,
    FavoritesStore, InputCore, Intent, NamedCharacter, Reaction, SearchSession,
};

/// Unicode character catalog and favorites
#[derive(Parser)]
#[command(name = "uniquity")]
#[command(version)]
#[command(about = "Browse, search and favorite Unicode characters")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all groups
    Groups,

    /// Show the characters of a group
    Group {
        /// Group name, with spaces or underscores (e.g., "Basic Latin")
        name: String,
    },

    /// Describe a codepoint
    Show {
        /// Hexadecimal codepoint (e.g., 1F600 or U+1F600)
        codepoint: String,
    },

    /// Search character names and aliases
    Search {
        /// Text to look for
        query: String,

        /// Maximum number of results (overrides the configuration)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Favorites operations
    #[command(subcommand)]
    Fav(FavCommands),

    /// Build a dataset snapshot from UCD text files
    ImportUcd {
        /// Directory with Blocks.txt, UnicodeData.txt and NameAliases.txt
        dir: PathBuf,

        /// Snapshot file to write
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum FavCommands {
    /// Add a codepoint to the favorites
    Add {
        /// Hexadecimal codepoint
        codepoint: String,
    },

    /// Remove a codepoint from the favorites
    Remove {
        /// Hexadecimal codepoint
        codepoint: String,
    },

    /// List favorites in the order they were added
    List,

    /// Drop favorites the loaded dataset does not contain
    Prune,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    debug!("using {:?}", config);

    match cli.command {
        Commands::Groups => handle_groups(&config),
        Commands::Group { name } => handle_group(&config, &name),
        Commands::Show { codepoint } => handle_show(&config, &codepoint),
        Commands::Search { query, limit } => handle_search(&config, &query, limit),
        Commands::Fav(cmd) => handle_fav(&config, cmd),
        Commands::ImportUcd { dir, out } => handle_import(&dir, &out),
    }
}

/// How a command treats a catalog that loaded empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmptyCatalog {
    /// Read from it; every lookup comes back empty.
    Degrade,
    /// Refuse to run, for commands that would act on the missing data.
    Refuse,
}

/// Picks the catalog a command runs against.
fn usable_catalog(handle: &CatalogHandle, on_empty: EmptyCatalog) -> Result<Arc<Catalog>> {
    let catalog = match handle.state() {
        CatalogState::Ready(catalog) => return Ok(catalog),
        CatalogState::NotLoaded => return Err(anyhow!("dataset was not loaded")),
        CatalogState::Empty => handle
            .catalog()
            .ok_or_else(|| anyhow!("dataset was not loaded"))?,
    };
    let reason = handle.load_failure().unwrap_or("the dataset is empty");
    match on_empty {
        EmptyCatalog::Degrade => {
            warn!("no characters available: {}", reason);
            Ok(catalog)
        }
        EmptyCatalog::Refuse => Err(anyhow!("no characters available: {}", reason)),
    }
}

fn load_catalog(source: &DatasetSource, on_empty: EmptyCatalog) -> Result<Arc<Catalog>> {
    let handle = CatalogHandle::new();
    handle.load_blocking(source);
    usable_catalog(&handle, on_empty)
}

fn open_favorites(config: &Config) -> Result<FavoritesStore> {
    FavoritesStore::open(&config.favorites_path).with_context(|| {
        format!(
            "failed to open favorites {}",
            config.favorites_path.display()
        )
    })
}

/// Parses a codepoint typed on the command line: hex digits, optionally
/// with a `U+` prefix and surrounding whitespace.
fn parse_codepoint(text: &str) -> Result<Codepoint> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("U+")
        .or_else(|| trimmed.strip_prefix("u+"))
        .unwrap_or(trimmed);
    digits
        .parse::<Codepoint>()
        .with_context(|| format!("not a codepoint: {}", text))
}

fn describe(named: &NamedCharacter) -> String {
    let label = format!("U+{}", named.codepoint);
    let text = named.text.as_deref().unwrap_or_default();
    format!("{:<8} {:<3} {}", label, text, named.name)
}

fn handle_groups(config: &Config) -> Result<()> {
    let catalog = load_catalog(&config.dataset, EmptyCatalog::Degrade)?;
    for group in catalog.list_groups() {
        println!(
            "{:<48} {:>6}",
            group.display_name(),
            catalog.characters_in_group(&group.name).len()
        );
    }
    Ok(())
}

fn handle_group(config: &Config, name: &str) -> Result<()> {
    let catalog = load_catalog(&config.dataset, EmptyCatalog::Degrade)?;
    let group = catalog
        .group(name)
        .or_else(|| catalog.group_by_display_name(name))
        .ok_or_else(|| {
            anyhow!(
                "Unknown group: {}. Use 'uniquity groups' to see available groups.",
                name
            )
        })?;

    let characters = catalog.characters_in_group(&group.name);
    println!("{} ({} characters)", group.display_name(), characters.len());
    let keys: Vec<String> = characters
        .iter()
        .map(|ch| ch.codepoint.to_text().unwrap_or_default())
        .collect();
    for row in rows(&keys) {
        println!("  {}", row.join(" "));
    }
    Ok(())
}

fn handle_show(config: &Config, codepoint: &str) -> Result<()> {
    let catalog = load_catalog(&config.dataset, EmptyCatalog::Degrade)?;
    let favorites = open_favorites(config)?;
    let codepoint = parse_codepoint(codepoint)?;

    println!("{}", describe(&catalog.named(codepoint)));
    match catalog.get_character(codepoint) {
        Some(ch) => {
            let group = catalog
                .group(&ch.group_name)
                .map(|g| g.display_name())
                .unwrap_or_else(|| ch.group_name.clone());
            println!("  group:    {}", group);
        }
        None => println!("  not in the dataset"),
    }
    for alias in catalog.aliases_for(codepoint) {
        println!("  alias:    {}", alias.alias);
    }
    match codepoint.to_utf16() {
        Ok(units) => {
            let units: Vec<String> = units.iter().map(|u| format!("{:04X}", u)).collect();
            println!("  utf-16:   {}", units.join(" "));
        }
        Err(e) => println!("  utf-16:   {}", e),
    }
    if favorites.is_favorite(codepoint) {
        println!("  favorite");
    }
    Ok(())
}

fn handle_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(config.search_limit);
    let catalog = load_catalog(&config.dataset, EmptyCatalog::Degrade)?;
    let session = SearchSession::new(limit);
    let ticket = session.issue(query);
    session.run(&ticket, &catalog);

    let snapshot = session.snapshot();
    for ch in &snapshot.results {
        println!("{}", describe(&catalog.named(ch.codepoint)));
    }
    println!("{} results", snapshot.results.len());
    Ok(())
}

fn handle_fav(config: &Config, cmd: FavCommands) -> Result<()> {
    let favorites = Arc::new(open_favorites(config)?);

    match cmd {
        FavCommands::Add { codepoint } => {
            let codepoint = parse_codepoint(&codepoint)?;
            let core = InputCore::new(Arc::clone(&favorites));
            match core.dispatch(Intent::LongPressed(codepoint))? {
                Reaction::Favorited(favorite) => {
                    println!("added U+{} as favorite #{}", favorite.codepoint, favorite.id)
                }
                Reaction::AlreadyFavorite(codepoint) => {
                    println!("U+{} is already a favorite", codepoint)
                }
                other => debug!("unexpected reaction {:?}", other),
            }
        }

        FavCommands::Remove { codepoint } => {
            let codepoint = parse_codepoint(&codepoint)?;
            match favorites.remove(codepoint)? {
                0 => println!("U+{} was not a favorite", codepoint),
                _ => println!("removed U+{}", codepoint),
            }
        }

        FavCommands::List => {
            let catalog = load_catalog(&config.dataset, EmptyCatalog::Degrade)?;
            for named in favorites.named(&catalog) {
                println!(
                    "#{:<4} {}",
                    named.favorite_id.unwrap_or_default(),
                    describe(&named)
                );
            }
        }

        FavCommands::Prune => {
            // pruning against a failed load would drop every favorite
            let catalog = load_catalog(&config.dataset, EmptyCatalog::Refuse)?;
            let removed = favorites.prune_missing(&catalog)?;
            println!("removed {} favorites", removed);
        }
    }

    Ok(())
}

fn handle_import(dir: &Path, out: &Path) -> Result<()> {
    let dataset = ucd::import_dir(dir)
        .with_context(|| format!("failed to import UCD from {}", dir.display()))?;
    dataset
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!(
        "wrote {} groups, {} characters, {} aliases to {}",
        dataset.groups().len(),
        dataset.characters().len(),
        dataset.aliases().len(),
        out.display()
    );
    Ok(())
}
