//! Catalog ingest CLI application.

use anyhow::{bail, Context, Result};
use catalog_ingest::fetchers::{
    AnimeCastFetcher, AnimeFetcher, AnimeFullFetcher, CharacterFetcher, EpisodeFetcher,
    GenreFetcher, MagazineFetcher, MangaCharacterFetcher, MangaFetcher, PersonFetcher,
    ProducerFetcher,
};
use catalog_ingest::{
    DatabaseOperationResult, FetchClient, FetchMode, FetcherContext, ItemFetcher, PageFetcher,
    ProgressReporter, TrackingProgress,
};
use clap::{Parser, Subcommand, ValueEnum};
use shared::{Catalog, Config, Database, GenreKind};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the final result as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Anime records
    Anime(EntityArgs),
    /// Manga records
    Manga(EntityArgs),
    /// Character records
    Characters(EntityArgs),
    /// People (voice actors, staff, authors)
    People(EntityArgs),
    /// Producers, studios and licensors
    Producers(EntityArgs),
    /// Manga magazines (listing only)
    Magazines(EntityArgs),
    /// Anime and manga genre lists
    Genres {
        /// Which genre list to fetch
        #[arg(long, value_enum, default_value_t = GenreSelection::All)]
        kind: GenreSelection,
        /// Overwrite stored rows
        #[arg(long)]
        update: bool,
    },
    /// Episode lists of stored anime
    Episodes(EntityArgs),
    /// Genre, producer and relation links of stored anime
    AnimeFull(EntityArgs),
    /// Characters, voice actors and staff of stored anime
    AnimeCast(EntityArgs),
    /// Characters of stored manga
    MangaCharacters(EntityArgs),
    /// Every anime of one broadcast season
    Season {
        year: u32,
        /// winter, spring, summer or fall
        season: String,
        /// Overwrite stored rows
        #[arg(long)]
        update: bool,
    },
}

#[derive(clap::Args, Debug)]
struct EntityArgs {
    /// Overwrite stored rows instead of skipping them
    #[arg(long, global = true)]
    update: bool,

    #[command(subcommand)]
    operation: Operation,
}

#[derive(Subcommand, Debug)]
enum Operation {
    /// One id
    Single { id: u32 },
    /// Scan ids upward until the not-found threshold
    Range {
        #[arg(long, default_value_t = 1)]
        start: u32,
    },
    /// Scan every id in [start, end]
    Between { start: u32, end: u32 },
    /// Specific ids, e.g. the failures of an earlier run
    List {
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<u32>,
    },
    /// Walk the listing endpoint
    Pages {
        #[arg(long, default_value_t = 1)]
        start_page: u32,
    },
    /// Every id already in the local catalog
    Stored,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GenreSelection {
    Anime,
    Manga,
    All,
}

/// Where `stored` takes its ids from
#[derive(Clone, Copy)]
enum StoredIds {
    Anime,
    Manga,
    Unsupported,
}

fn mode(update: bool) -> FetchMode {
    if update {
        FetchMode::Update
    } else {
        FetchMode::Insert
    }
}

fn stored_ids(catalog: &Catalog, source: StoredIds, label: &str) -> Result<Vec<u32>> {
    match source {
        StoredIds::Anime => catalog.anime_ids(),
        StoredIds::Manga => catalog.manga_ids(),
        StoredIds::Unsupported => bail!("'stored' is not available for {}", label),
    }
}

/// Operations served by a per-id endpoint
async fn run_item<F: ItemFetcher>(
    fetcher: &F,
    operation: &Operation,
    mode: FetchMode,
    stored: StoredIds,
) -> Result<DatabaseOperationResult> {
    let result = match operation {
        Operation::Single { id } => fetcher.single(*id, mode).await?,
        Operation::Range { start } => fetcher.range(*start, None, mode).await?,
        Operation::Between { start, end } => fetcher.range(*start, Some(*end), mode).await?,
        Operation::List { ids } => fetcher.from_list(ids, mode).await?,
        Operation::Stored => {
            let ids = stored_ids(&fetcher.context().catalog, stored, fetcher.label())?;
            info!(count = ids.len(), "Processing stored ids");
            fetcher.from_list(&ids, mode).await?
        }
        Operation::Pages { .. } => bail!(
            "{} has no listing endpoint; use single, range, between, list or stored",
            fetcher.label()
        ),
    };
    Ok(result)
}

/// Operations of entities that have both per-id and listing endpoints
async fn run_entity<F: ItemFetcher + PageFetcher>(
    fetcher: &F,
    operation: &Operation,
    mode: FetchMode,
    stored: StoredIds,
) -> Result<DatabaseOperationResult> {
    match operation {
        Operation::Pages { start_page } => Ok(fetcher.all(*start_page, mode).await?),
        _ => run_item(fetcher, operation, mode, stored).await,
    }
}

async fn run_magazines(fetcher: &MagazineFetcher, args: &EntityArgs) -> Result<DatabaseOperationResult> {
    let result = match (&args.operation, mode(args.update)) {
        (Operation::Single { id }, FetchMode::Insert) => fetcher.insert_single(*id).await?,
        (Operation::Single { id }, FetchMode::Update) => fetcher.update_single(*id).await?,
        (Operation::Pages { start_page }, mode) => fetcher.all(*start_page, mode).await?,
        _ => bail!("magazines support only 'single' and 'pages'"),
    };
    Ok(result)
}

async fn run(command: &Command, ctx: FetcherContext) -> Result<DatabaseOperationResult> {
    match command {
        Command::Anime(args) => {
            run_entity(&AnimeFetcher::new(ctx), &args.operation, mode(args.update), StoredIds::Anime).await
        }
        Command::Manga(args) => {
            run_entity(&MangaFetcher::new(ctx), &args.operation, mode(args.update), StoredIds::Manga).await
        }
        Command::Characters(args) => {
            run_entity(
                &CharacterFetcher::new(ctx),
                &args.operation,
                mode(args.update),
                StoredIds::Unsupported,
            )
            .await
        }
        Command::People(args) => {
            run_entity(
                &PersonFetcher::new(ctx),
                &args.operation,
                mode(args.update),
                StoredIds::Unsupported,
            )
            .await
        }
        Command::Producers(args) => {
            run_entity(
                &ProducerFetcher::new(ctx),
                &args.operation,
                mode(args.update),
                StoredIds::Unsupported,
            )
            .await
        }
        Command::Magazines(args) => run_magazines(&MagazineFetcher::new(ctx), args).await,
        Command::Genres { kind, update } => {
            let fetcher = GenreFetcher::new(ctx);
            let result = match (kind, mode(*update)) {
                (GenreSelection::All, FetchMode::Insert) => fetcher.insert_all().await?,
                (GenreSelection::All, FetchMode::Update) => fetcher.update_all().await?,
                (GenreSelection::Anime, FetchMode::Insert) => fetcher.insert_genres(GenreKind::Anime).await?,
                (GenreSelection::Anime, FetchMode::Update) => fetcher.update_genres(GenreKind::Anime).await?,
                (GenreSelection::Manga, FetchMode::Insert) => fetcher.insert_genres(GenreKind::Manga).await?,
                (GenreSelection::Manga, FetchMode::Update) => fetcher.update_genres(GenreKind::Manga).await?,
            };
            Ok(result)
        }
        Command::Episodes(args) => {
            run_item(&EpisodeFetcher::new(ctx), &args.operation, mode(args.update), StoredIds::Anime).await
        }
        Command::AnimeFull(args) => {
            run_item(&AnimeFullFetcher::new(ctx), &args.operation, mode(args.update), StoredIds::Anime).await
        }
        Command::AnimeCast(args) => {
            run_item(&AnimeCastFetcher::new(ctx), &args.operation, mode(args.update), StoredIds::Anime).await
        }
        Command::MangaCharacters(args) => {
            run_item(
                &MangaCharacterFetcher::new(ctx),
                &args.operation,
                mode(args.update),
                StoredIds::Manga,
            )
            .await
        }
        Command::Season { year, season, update } => {
            let fetcher = AnimeFetcher::new(ctx);
            let result = if *update {
                fetcher.update_season(*year, season).await?
            } else {
                fetcher.insert_season(*year, season).await?
            };
            Ok(result)
        }
    }
}

fn print_summary(result: &DatabaseOperationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{}", result);
    if !result.failed_ids.is_empty() {
        let ids: Vec<String> = result.failed_ids.iter().map(u32::to_string).collect();
        println!("failed ids: {}", ids.join(","));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level()
    };

    shared::logging::init(shared::LogConfig {
        log_dir: config.log_dir().to_string_lossy().to_string(),
        component: "catalog-ingest".to_string(),
        default_level: log_level,
        console: config.logging.console,
        file: config.logging.file,
        json_format: config.logging.json_format,
    })?;

    info!("Catalog ingest starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    // Initialize database
    let db_path = config.database_path();
    info!(db_path = %db_path.display(), "Opening database");
    let database = Database::open(&db_path).context("Failed to open database")?;
    let catalog = Arc::new(Catalog::new(database));

    // Initialize API client
    let client = Arc::new(FetchClient::new(&config.catalog_api).context("Failed to create API client")?);
    let progress = Arc::new(TrackingProgress::new(config.traversal.progress_log_every));
    let ctx = FetcherContext::new(client, catalog, config.traversal.clone(), progress.clone());

    match run(&args.command, ctx).await {
        Ok(result) => {
            info!(
                inserted = result.inserted,
                updated = result.updated,
                skipped = result.skipped,
                errors = result.errors,
                "Catalog ingest finished"
            );
            print_summary(&result, args.json)
        }
        Err(e) => {
            let partial = progress.snapshot();
            error!(error = %e, progress = %partial, "Run aborted");
            eprintln!("aborted after {}", partial);
            Err(e)
        }
    }
}
