mod cli;

use localflix::{
    config,
    library::{FixedFolderPicker, LibraryService},
    server,
};
use localflix::assets::{AssetStorage, DerivedAssetCache};
use localflix_common::{CategoryId, FolderId};
use localflix_db::pool::init_pool;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{CategoryAction, Cli, Commands, FolderAction};
use std::path::Path;
use std::sync::Arc;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting localflix server");
    tracing::info!(
        "Server will listen on {}:{}, public URL {}",
        config.server.host,
        config.server.port,
        config.server.base_url()
    );

    let db_pool = open_database(&config)?;

    std::fs::create_dir_all(&config.storage.derived_dir).with_context(|| {
        format!(
            "Failed to create derived asset directory: {}",
            config.storage.derived_dir.display()
        )
    })?;

    server::start_server(config, db_pool).await
}

fn open_database(config: &config::Config) -> Result<localflix_db::pool::DbPool> {
    let db_path = config.storage.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }

    let db_path_str = db_path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path_str);
    Ok(init_pool(&db_path_str)?)
}

fn library_service(config_path: Option<&Path>) -> Result<LibraryService> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_database(&config)?;
    let assets = DerivedAssetCache::new(
        AssetStorage::new(config.storage.derived_dir.clone()),
        Arc::new(server::process_runner(&config)),
        config.assets.thumbnail_offset_secs,
    );
    Ok(LibraryService::new(pool, assets))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "localflix=trace,localflix_av=trace,localflix_db=debug,tower_http=debug".to_string()
        } else {
            "localflix=info,localflix_av=info,localflix_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("localflix {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Category { action } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_category(action, cli.config.as_deref()))
        }
        Commands::Folder { action } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_folder(action, cli.config.as_deref()))
        }
    }
}

async fn run_category(action: CategoryAction, config_path: Option<&Path>) -> Result<()> {
    let library = library_service(config_path)?;

    match action {
        CategoryAction::List => {
            for category in library.list_categories().await? {
                println!("{}\t{}", category.id, category.name);
            }
        }
        CategoryAction::Add { name } => {
            let category = library.create_category(&name).await?;
            println!("Created category {} ({})", category.name, category.id);
        }
        CategoryAction::Rename { id, name } => {
            let category = library.rename_category(CategoryId::new(id), &name).await?;
            println!("Renamed category {} to {}", category.id, category.name);
        }
        CategoryAction::Remove { id } => {
            library.delete_category(CategoryId::new(id)).await?;
            println!("Removed category {}", id);
        }
    }

    Ok(())
}

async fn run_folder(action: FolderAction, config_path: Option<&Path>) -> Result<()> {
    let library = library_service(config_path)?;

    match action {
        FolderAction::List { category } => {
            let folders = match category {
                Some(id) => library.list_folders_by_category(CategoryId::new(id)).await?,
                None => library.list_folders().await?,
            };
            for folder in folders {
                println!("{}\t{}\t{}", folder.id, folder.category_id, folder.path);
            }
        }
        FolderAction::Add { category_id, path } => {
            let path = match path {
                Some(path) => path,
                None => std::env::current_dir()?,
            };
            let path = std::fs::canonicalize(&path)
                .with_context(|| format!("Cannot resolve {}", path.display()))?;

            let picker = FixedFolderPicker(Some(path));
            match library
                .add_picked_folder(&picker, CategoryId::new(category_id))
                .await?
            {
                Some(folder) => println!("Registered folder {} ({})", folder.path, folder.id),
                None => println!("No folder selected"),
            }
        }
        FolderAction::Remove { id } => {
            library.delete_folder(FolderId::new(id)).await?;
            println!("Removed folder {}", id);
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let paths = localflix_av::tools::resolve_tool_paths(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    );
    let tools = localflix_av::check_tools(&paths);
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Thumbnails, subtitles and durations will be unavailable.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Public URL: {}", config.server.base_url());
            println!("  Database: {}", config.storage.database_path().display());
            println!("  Derived assets: {}", config.storage.derived_dir.display());
            println!("  Extensions: {}", config.catalog.extensions.join(", "));
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
