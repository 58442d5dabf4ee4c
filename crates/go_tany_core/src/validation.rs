//! crates/go_tany_core/src/validation.rs
//!
//! Form checks that run before any identity provider call.

use serde::{Deserialize, Serialize};

pub const MIN_USERNAME_LEN: usize = 4;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Mohon isi semua field")]
    MissingCredentials,
    #[error("Nama depan harus diisi")]
    MissingFirstName,
    #[error("Nama belakang harus diisi")]
    MissingLastName,
    #[error("Username minimal 4 karakter")]
    UsernameTooShort,
    #[error("Email harus diisi")]
    MissingEmail,
    #[error("Nomor telepon harus diisi")]
    MissingPhone,
    #[error("Password minimal 8 karakter")]
    PasswordTooShort,
    #[error("Password tidak cocok")]
    PasswordMismatch,
    #[error("Anda harus menyetujui syarat dan ketentuan")]
    TermsNotAccepted,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_terms: bool,
}

impl SignUpForm {
    /// Checks fields in display order and reports the first problem.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::MissingFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::MissingLastName);
        }
        if self.username.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::UsernameTooShort);
        }
        if self.email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if self.phone.is_empty() {
            return Err(ValidationError::MissingPhone);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if !self.agree_terms {
            return Err(ValidationError::TermsNotAccepted);
        }
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    /// One point each for length, mixed case, a digit and a symbol.
    pub fn of(password: &str) -> Self {
        let mut score = 0;
        if password.chars().count() >= MIN_PASSWORD_LEN {
            score += 1;
        }
        if password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_uppercase())
        {
            score += 1;
        }
        if password.chars().any(|c| c.is_ascii_digit()) {
            score += 1;
        }
        if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
            score += 1;
        }
        match score {
            0 | 1 => PasswordStrength::Weak,
            2 | 3 => PasswordStrength::Medium,
            _ => PasswordStrength::Strong,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PasswordStrength::Weak => "Lemah",
            PasswordStrength::Medium => "Sedang",
            PasswordStrength::Strong => "Kuat",
        }
    }
}
