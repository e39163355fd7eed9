use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use neko_love::{AssetCatalog, CatalogWatcher, Config, FilterRegistry, ImageService};

#[derive(Parser)]
#[command(name = "neko-love")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Asset root directory (overrides NEKO_ASSETS_ROOT)
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Base URL for public image links (overrides NEKO_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the categories found under the asset root
    Categories,

    /// Print a random image URL from a category
    Random { category: String },

    /// List a category's files
    Files { category: String },

    /// Show cached metadata for one image
    Meta { category: String, name: String },

    /// List the available filters
    Filters,

    /// Apply a filter to an image file
    Apply {
        filter: String,
        input: PathBuf,
        output: PathBuf,
    },

    /// Keep the catalog live and log reloads until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::from_env();
    if let Some(assets) = cli.assets {
        config.assets_root = assets;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Commands::Filters => {
            for name in FilterRegistry::new().names() {
                println!("{}", name);
            }
        }
        Commands::Apply { filter, input, output } => {
            // Filtering needs no asset tree
            let service = ImageService::new(
                Arc::new(AssetCatalog::new(config.assets_root.clone())),
                FilterRegistry::new(),
                config.base_url.clone(),
            );
            let data = tokio::fs::read(&input).await?;
            let result = service.filter_bytes_async(filter, data).await?;
            tokio::fs::write(&output, &result.bytes).await?;
            println!("{} ({}, {} bytes)", output.display(), result.content_type, result.bytes.len());
        }
        command => {
            let catalog = Arc::new(AssetCatalog::open(config.assets_root.clone())?);
            let service = ImageService::new(Arc::clone(&catalog), FilterRegistry::new(), config.base_url.clone());
            run_catalog_command(command, &service, catalog).await?;
        }
    }

    Ok(())
}

async fn run_catalog_command(
    command: Commands,
    service: &ImageService,
    catalog: Arc<AssetCatalog>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Categories => {
            for name in catalog.categories() {
                let count = catalog.get_files(&name).map(|f| f.len()).unwrap_or(0);
                println!("{}\t{}", name, count);
            }
        }
        Commands::Random { category } => {
            println!("{}", serde_json::to_string_pretty(&service.random_image(&category)?)?);
        }
        Commands::Files { category } => {
            println!("{}", serde_json::to_string_pretty(&service.category_listing(&category)?)?);
        }
        Commands::Meta { category, name } => {
            println!("{}", serde_json::to_string_pretty(&service.image_metadata(&category, &name)?)?);
        }
        Commands::Watch => {
            let watcher = CatalogWatcher::spawn(catalog)?;
            tracing::info!("watching for changes, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down");
            drop(watcher);
        }
        Commands::Filters | Commands::Apply { .. } => {}
    }
    Ok(())
}
