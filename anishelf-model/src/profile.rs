use anishelf_types::IdentityId;
use serde::{Deserialize, Serialize};

/// A row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: IdentityId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Name shown to a signed-in (or anonymous) user.
///
/// Profile username, then the local part of the email, then a short id,
/// then `Guest`.
pub fn display_name(
    profile: Option<&UserProfile>,
    email: Option<&str>,
    identity: Option<&IdentityId>,
) -> String {
    if let Some(username) = profile.map(|p| p.username.trim()).filter(|u| !u.is_empty()) {
        return username.to_string();
    }
    if let Some(local) = email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
    {
        return local.to_string();
    }
    if let Some(id) = identity {
        return format!("User_{}", id.short(6));
    }
    "Guest".to_string()
}
