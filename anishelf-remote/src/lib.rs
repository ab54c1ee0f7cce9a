//! Remote collaborator for AniShelf.
//!
//! Everything AniShelf persists lives in a hosted backend-as-a-service that
//! provides both authentication and table storage. This crate defines:
//!
//! - [`RemoteBackend`]: the session and table operations the library needs
//! - [`Filter`] / [`Order`]: equality filters and ordering for table calls
//! - [`Session`], [`User`], [`AuthEvent`]: auth state
//! - [`SupabaseClient`]: the HTTP implementation against a Supabase project
//!
//! Callers construct one client and pass it around as
//! `Arc<dyn RemoteBackend>`, which keeps test doubles easy to swap in.

mod backend;
mod error;
mod session;
mod supabase;

pub use backend::{Filter, Order, RemoteBackend};
pub use error::{RemoteError, RemoteResult};
pub use session::{AuthEvent, Session, SignUpOutcome, User};
pub use supabase::{SupabaseClient, SupabaseConfig};
