//! Argument parsing, rendering and command dispatch for the `anishelf`
//! binary.

use std::path::PathBuf;

use anishelf_library::{AuthError, Library, LibraryConfig};
use anishelf_model::{
    parse_genres, Entry, EntryDraft, EntryPatch, EntryStatus, SignUpForm, SortPreference,
};
use anishelf_prefs::PreferenceBackend;
use anishelf_remote::SupabaseConfig;
use anishelf_types::EntryId;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

const SYNOPSIS_PREVIEW: usize = 100;
const GENRES_SHOWN: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "anishelf")]
#[command(about = "Track the anime you watch")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Supabase project URL
    #[arg(long = "url", env = "ANISHELF_SUPABASE_URL")]
    pub supabase_url: String,

    /// Supabase anon key
    #[arg(long = "anon-key", env = "ANISHELF_SUPABASE_ANON_KEY", hide_env_values = true)]
    pub anon_key: String,

    /// Where sort preferences are kept
    #[arg(long = "prefs", env = "ANISHELF_PREFS_PATH")]
    pub prefs_path: Option<PathBuf>,

    /// Email or username to sign in with
    #[arg(long, env = "ANISHELF_LOGIN")]
    pub login: Option<String>,

    /// Password for --login
    #[arg(long, env = "ANISHELF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// How long to wait for the auth service at start-up (ms)
    #[arg(long, default_value_t = 5_000)]
    pub loading_timeout_ms: u64,
}

impl ConnectionArgs {
    pub fn supabase_config(&self) -> SupabaseConfig {
        SupabaseConfig {
            project_url: self.supabase_url.clone(),
            anon_key: self.anon_key.clone(),
            ..Default::default()
        }
    }

    pub fn library_config(&self) -> LibraryConfig {
        LibraryConfig {
            loading_timeout_ms: self.loading_timeout_ms,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show your list, filtered and sorted
    List {
        /// Match against titles and genres, ignoring accents and case
        #[arg(short, long)]
        query: Option<String>,

        /// nombre, fecha, fecha2, favorito, rating (or by_title, newest_first, ...)
        #[arg(short, long, value_parser = parse_sort)]
        sort: Option<SortPreference>,
    },
    /// Add an entry
    Add(EntryFields),
    /// Change fields of an entry
    Edit {
        id: EntryId,
        #[command(flatten)]
        fields: PatchFields,
    },
    /// Remove an entry
    Delete { id: EntryId },
    /// Empty the query and go back to newest first
    ClearFilters,
    /// Create an account
    SignUp {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Show who you are signed in as
    Whoami,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct EntryFields {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub cover: String,
    #[arg(long, default_value = "")]
    pub synopsis: String,
    /// Comma-separated
    #[arg(long, default_value = "")]
    pub genres: String,
    /// Visto, Viéndolo, Por ver, Favorito, Dropped
    #[arg(long, default_value = "Visto")]
    pub status: EntryStatus,
    #[arg(long, default_value_t = 0.0)]
    pub rating: f64,
}

impl EntryFields {
    pub fn to_draft(&self) -> EntryDraft {
        EntryDraft {
            title: self.title.clone(),
            cover_url: self.cover.clone(),
            synopsis: self.synopsis.clone(),
            genres: parse_genres(&self.genres),
            status: self.status,
            rating: self.rating,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct PatchFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub cover: Option<String>,
    #[arg(long)]
    pub synopsis: Option<String>,
    #[arg(long)]
    pub genres: Option<String>,
    #[arg(long)]
    pub status: Option<EntryStatus>,
    #[arg(long)]
    pub rating: Option<f64>,
}

impl PatchFields {
    pub fn to_patch(&self) -> EntryPatch {
        EntryPatch {
            title: self.title.clone(),
            cover_url: self.cover.clone(),
            synopsis: self.synopsis.clone(),
            genres: self.genres.as_deref().map(parse_genres),
            status: self.status,
            rating: self.rating,
        }
    }
}

fn parse_sort(s: &str) -> Result<SortPreference, String> {
    SortPreference::parse(s).ok_or_else(|| {
        let known: Vec<&str> = SortPreference::ALL.iter().map(|p| p.storage_token()).collect();
        format!("unknown sort {s:?}, expected one of {}", known.join(", "))
    })
}

/// One entry as a list line plus an indented synopsis preview.
pub fn render_entry(entry: &Entry) -> String {
    let (genres, hidden) = entry.genre_preview(GENRES_SHOWN);
    let mut genre_text = genres.join(", ");
    if hidden > 0 {
        genre_text.push_str(&format!(" +{hidden}"));
    }

    let mut line = format!(
        "#{}  {}  [{}]  {:.1}",
        entry.id, entry.title, entry.status, entry.rating
    );
    if !genre_text.is_empty() {
        line.push_str(&format!("  ({genre_text})"));
    }
    let synopsis = entry.synopsis_preview(SYNOPSIS_PREVIEW);
    if !synopsis.trim().is_empty() {
        line.push_str(&format!("\n    {synopsis}"));
    }
    line
}

/// Renders the view, or a hint when nothing matches.
pub fn render_view(entries: &[Entry], query: &str) -> String {
    if entries.is_empty() {
        return if query.is_empty() {
            "No entries yet. Add one with `anishelf add --title ...`.".to_string()
        } else {
            format!("Nothing matches {query:?}.")
        };
    }
    entries
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs one command against the configured project.
pub async fn run(cli: Cli) -> Result<()> {
    let library = Library::open(
        cli.connection.supabase_config(),
        cli.connection.prefs_path.as_deref(),
        cli.connection.library_config(),
    )
    .context("Failed to set up AniShelf")?;

    let state = library.start().await;
    debug!("Start-up identity state: {:?}", state);

    if let Some(login) = &cli.connection.login {
        let password = cli
            .connection
            .password
            .as_deref()
            .context("--login needs --password (or ANISHELF_PASSWORD)")?;
        library.sign_in(login, password).await?;
        info!("Signed in as {}", library.display_name().await);
    }

    match cli.command {
        Command::List { query, sort } => {
            if let Some(sort) = sort {
                library.set_criterion(sort).await;
            }
            let query = query.unwrap_or_default();
            library.set_query(query.clone()).await;
            println!(
                "{}'s list, {}:",
                library.display_name().await,
                library.criterion().await.label()
            );
            println!("{}", render_view(&library.view().await, &query));
        }
        Command::Add(fields) => {
            require_identity(&library)?;
            let entry = library.create(&fields.to_draft()).await?;
            println!("Added:\n{}", render_entry(&entry));
        }
        Command::Edit { id, fields } => {
            require_identity(&library)?;
            let entry = library.update(id, &fields.to_patch()).await?;
            println!("Updated:\n{}", render_entry(&entry));
        }
        Command::Delete { id } => {
            require_identity(&library)?;
            library.delete(id).await?;
            println!("Deleted #{id}");
        }
        Command::ClearFilters => {
            library.clear_filters().await;
            println!("Filters cleared; sorting {}", SortPreference::NewestFirst.label());
        }
        Command::SignUp {
            username,
            email,
            password,
            confirm_password,
        } => {
            let form = SignUpForm {
                username,
                email,
                password,
                confirm_password,
            };
            match library.sign_up(&form).await {
                Ok(_) => println!("Welcome, {}!", library.display_name().await),
                Err(AuthError::ConfirmationRequired) => {
                    println!("{}", AuthError::ConfirmationRequired)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Whoami => println!("{}", library.display_name().await),
    }
    Ok(())
}

fn require_identity<B: PreferenceBackend>(library: &Library<B>) -> Result<()> {
    if library.identity().is_none() {
        bail!("Sign in first (--login and --password)");
    }
    Ok(())
}
