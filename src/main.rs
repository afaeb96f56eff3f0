//! # Blog Augment CLI (`blogai`)
//!
//! Operator interface to the blog's content-augmentation subsystem.
//!
//! ## Usage
//!
//! ```bash
//! blogai --config ./config/blogai.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `blogai init` | Create the SQLite database and run schema migrations |
//! | `blogai import <dir>` | Import Markdown articles from a directory |
//! | `blogai providers` | List configured AI providers |
//! | `blogai classify <slug>` | Categorize an article by keyword taxonomy |
//! | `blogai summarize <slug> --provider P` | Summarize an article (cached for 7 days) |
//! | `blogai vectorize <slug>` / `--all` | Chunk and embed articles into the vector store |
//! | `blogai ask "<question>" --provider P` | Answer a question from the blog's articles |
//! | `blogai comment add <slug> ...` | Store and moderate a new comment |
//! | `blogai comment moderate <id>` | Re-run moderation for a stored comment |
//!
//! Diagnostics go to stderr and are filtered with `RUST_LOG`; command
//! results go to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use blog_augment::{ask, classify, config, import, migrate, moderate, providers, summarize, vectorize};
use blog_augment_core::error::GenerationError;

/// Blog Augment CLI: summaries, classification, retrieval-augmented Q&A,
/// and comment moderation for a personal blog.
#[derive(Parser)]
#[command(
    name = "blogai",
    about = "Blog Augment: AI-assisted summaries, Q&A, and comment moderation for a blog",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/blogai.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Import `*.md` files from a directory as published articles.
    ///
    /// The file stem is the slug; the first `# ` heading is the title.
    Import {
        /// Directory to scan recursively.
        dir: PathBuf,
    },

    /// List configured AI providers.
    Providers,

    /// Classify an article as tech or life by keyword taxonomy.
    Classify {
        slug: String,

        /// Persist the computed category.
        #[arg(long)]
        save: bool,
    },

    /// Summarize an article and extract keywords.
    ///
    /// A summary younger than seven days is returned from the cache without
    /// contacting the provider.
    Summarize {
        slug: String,

        /// Provider name from `[[providers]]`.
        #[arg(long)]
        provider: String,

        /// Regenerate even if the cached summary is fresh.
        #[arg(long)]
        force: bool,
    },

    /// Chunk and embed articles into the vector store.
    Vectorize {
        /// Article slug. Omit with `--all`.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        slug: Option<String>,

        /// Vectorize every article.
        #[arg(long)]
        all: bool,
    },

    /// Answer a question grounded in the blog's articles.
    Ask {
        question: String,

        #[arg(long)]
        provider: String,
    },

    /// Manage comments.
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },
}

#[derive(Subcommand)]
enum CommentAction {
    /// Store a new comment and moderate it.
    ///
    /// If moderation fails the comment is kept as pending.
    Add {
        slug: String,

        #[arg(long)]
        author: String,

        #[arg(long)]
        text: String,

        #[arg(long)]
        provider: String,
    },

    /// Re-run moderation for a stored comment.
    Moderate {
        id: String,

        #[arg(long)]
        provider: String,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_augment=info,blogai=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { dir } => {
            import::run_import(&cfg, &dir).await?;
        }
        Commands::Providers => {
            providers::run_providers(&cfg)?;
        }
        Commands::Classify { slug, save } => {
            classify::run_classify(&cfg, &slug, save).await?;
        }
        Commands::Summarize {
            slug,
            provider,
            force,
        } => {
            summarize::run_summarize(&cfg, &slug, &provider, force).await?;
        }
        Commands::Vectorize { slug, all: _ } => {
            vectorize::run_vectorize(&cfg, slug.as_deref()).await?;
        }
        Commands::Ask { question, provider } => {
            ask::run_ask(&cfg, &question, &provider).await?;
        }
        Commands::Comment { action } => match action {
            CommentAction::Add {
                slug,
                author,
                text,
                provider,
            } => {
                moderate::run_comment_add(&cfg, &slug, &author, &text, &provider).await?;
            }
            CommentAction::Moderate { id, provider } => {
                moderate::run_comment_moderate(&cfg, &id, &provider).await?;
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Provider detail goes to the log; the terminal gets the
            // sanitized message.
            match e.downcast_ref::<GenerationError>() {
                Some(gen) => {
                    tracing::error!(error = %gen, "generation failed");
                    eprintln!("Error: {}", gen.user_message());
                }
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
