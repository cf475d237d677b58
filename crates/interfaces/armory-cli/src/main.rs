use armory_cli::commands;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the install tree against the remote manifest
    Check {
        #[arg(long, env = "ARMORY_MANIFEST_URL")]
        manifest: String,
        #[arg(long)]
        path: Utf8PathBuf,
        #[arg(
            long,
            value_delimiter = ',',
            help = "Filenames never auto-created when missing (default: item.filter)"
        )]
        keep: Option<Vec<String>>,
    },
    /// Fetch stale or missing files and install them atomically
    Update {
        #[arg(long, env = "ARMORY_MANIFEST_URL")]
        manifest: String,
        #[arg(long)]
        path: Utf8PathBuf,
        #[arg(
            long,
            value_delimiter = ',',
            help = "Filenames never auto-created when missing (default: item.filter)"
        )]
        keep: Option<Vec<String>>,
        #[arg(short, long, default_value_t = armory_config::DEFAULT_DOWNLOAD_THREADS)]
        threads: usize,
        #[arg(long)]
        limit_mb: Option<u64>,
    },
    /// Print the CRC32 of a local file
    Hash { file: Utf8PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("default subscriber");

    match cli.command {
        Commands::Check {
            manifest,
            path,
            keep,
        } => commands::cmd_check(manifest, path, keep).await?,
        Commands::Update {
            manifest,
            path,
            keep,
            threads,
            limit_mb,
        } => commands::cmd_update(manifest, path, keep, threads, limit_mb).await?,
        Commands::Hash { file } => commands::cmd_hash(file).await?,
    }

    Ok(())
}
