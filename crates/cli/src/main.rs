mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "blogkit")]
#[command(version, about = "Static blog generator backed by a headless CMS", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Initialize new blog directory
    Init {
        /// Path to blog directory
        path: PathBuf,

        /// Site title
        #[arg(long)]
        title: Option<String>,

        /// microCMS service domain (the part before .microcms.io)
        #[arg(long)]
        service_domain: Option<String>,
    },

    /// Check blog configuration
    Check {
        /// Path to blog directory
        path: PathBuf,
    },

    /// Fetch content and build the static site
    Build {
        /// Path to blog directory
        path: PathBuf,

        /// Output directory for generated site
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Build and serve the site locally, rebuilding on config changes
    Preview {
        /// Path to blog directory
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Init {
            path,
            title,
            service_domain,
        } => commands::init::run(path, title, service_domain).await,
        Command::Check { path } => commands::check::run(path).await,
        Command::Build { path, output } => commands::build::run(path, output).await,
        Command::Preview { path, port } => commands::preview::run(path, port).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "blogkit", &mut io::stdout());
            Ok(())
        }
    }
}
