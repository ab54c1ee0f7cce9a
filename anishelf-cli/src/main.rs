//! AniShelf command-line client.
//!
//! Usage:
//!   anishelf --url https://abcd.supabase.co --anon-key KEY \
//!       --login fern --password secret1 list --query pelicula --sort nombre
//!
//! Connection settings can also come from ANISHELF_SUPABASE_URL,
//! ANISHELF_SUPABASE_ANON_KEY, ANISHELF_PREFS_PATH, ANISHELF_LOGIN and
//! ANISHELF_PASSWORD.

use anishelf_cli::{run, Cli};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    run(cli).await
}
