use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Shortest password the sign-up form accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    /// Checks the form before anything is sent to the auth service.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.username.trim().is_empty() {
            return Err(ModelError::Validation("username is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(ModelError::Validation("enter a valid email".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ModelError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.password != self.confirm_password {
            return Err(ModelError::Validation("passwords do not match".to_string()));
        }
        Ok(())
    }

    /// User metadata attached to the new account.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "username": self.username.trim() })
    }
}

/// What the user typed in the sign-in identifier box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInIdentifier {
    Email(String),
    /// No `@`: resolved to an email through the profiles table.
    Username(String),
}

impl SignInIdentifier {
    pub fn parse(input: &str) -> Self {
        if input.contains('@') {
            SignInIdentifier::Email(input.to_string())
        } else {
            SignInIdentifier::Username(input.trim().to_string())
        }
    }
}
