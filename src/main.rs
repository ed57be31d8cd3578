//! CLI entry point for folio

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::{commands, server, Folio};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Post repository, search, feeds and JSON API for a Markdown/MDX blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List posts, tags or load errors
    List {
        /// Type of content to list (post, tag, error)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Fuzzy search titles, summaries and tags
    Search {
        /// Search query
        query: String,
    },

    /// Write RSS, Atom and JSON feeds
    Feed,

    /// Write the JSON export of the post cache
    Snapshot,

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// Slug for the new post (defaults to the slugified title)
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Remove generated feeds and the cache export
    Clean,

    /// Serve the JSON API
    #[command(alias = "s")]
    Serve {
        /// IP address to bind to
        #[arg(short, long)]
        ip: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Reload posts when the content directory changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug { "folio=debug,info" } else { "folio=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::List { r#type } => {
            let folio = Folio::new(&base_dir)?;
            commands::list::run(&folio, &r#type).await?;
        }

        Commands::Search { query } => {
            let folio = Folio::new(&base_dir)?;
            commands::search::run(&folio, &query).await?;
        }

        Commands::Feed => {
            let folio = Folio::new(&base_dir)?;
            tracing::info!("Generating feeds...");
            let written = commands::feed::run(&folio).await?;
            for path in written {
                println!("Wrote {}", path.display());
            }
        }

        Commands::Snapshot => {
            let folio = Folio::new(&base_dir)?;
            let path = commands::snapshot::run(&folio).await?;
            println!("Wrote {}", path.display());
        }

        Commands::New { title, slug } => {
            let folio = Folio::new(&base_dir)?;
            tracing::info!("Creating new post with title: {}", title);
            commands::new::create_post(&folio, &title, slug.as_deref())?;
        }

        Commands::Clean => {
            let folio = Folio::new(&base_dir)?;
            tracing::info!("Cleaning generated files...");
            commands::clean::run(&folio)?;
            println!("Cleaned successfully!");
        }

        Commands::Serve { ip, port, watch } => {
            let folio = Folio::new(&base_dir)?;
            let ip = ip.unwrap_or_else(|| folio.config.server.ip.clone());
            let port = port.unwrap_or(folio.config.server.port);

            tracing::info!("Starting server at http://{}:{}", ip, port);
            server::start(&folio, &ip, port, watch).await?;
        }

        Commands::Version => {
            println!("folio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
