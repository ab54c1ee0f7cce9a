//! AniShelf library layer.
//!
//! Ties the remote collaborator, the per-identity sort preference and the
//! filter/sort engine into something a front end can drive:
//!
//! - [`SessionGate`]: resolves and tracks the signed-in identity
//! - [`EntryStore`]: the identity's entries, with validated remote records
//! - [`Library`]: the facade holding the current query and criterion
//!
//! ```no_run
//! use anishelf_library::{Library, LibraryConfig};
//! use anishelf_remote::SupabaseConfig;
//!
//! # async fn run() -> anishelf_library::LibraryResult<()> {
//! let library = Library::open(
//!     SupabaseConfig {
//!         project_url: "https://abcd.supabase.co".into(),
//!         anon_key: "anon".into(),
//!         ..Default::default()
//!     },
//!     None,
//!     LibraryConfig::default(),
//! )?;
//! library.start().await;
//! for entry in library.view().await {
//!     println!("{}", entry.title);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod library;
mod session;
mod store;

pub use config::LibraryConfig;
pub use error::{
    AuthError, AuthResult, LibraryError, LibraryResult, StoreError, StoreResult, Submission,
};
pub use library::Library;
pub use session::{IdentityState, SessionGate};
pub use store::{EntryStore, Quarantined};
