//! crates/go_tany_core/src/errors.rs
//!
//! Classification of identity provider failures into user-facing messages.

use crate::ports::{IdentityError, PortError};

/// Error codes used by identity providers.
pub mod codes {
    pub const EMAIL_ALREADY_IN_USE: &str = "auth/email-already-in-use";
    pub const INVALID_EMAIL: &str = "auth/invalid-email";
    pub const OPERATION_NOT_ALLOWED: &str = "auth/operation-not-allowed";
    pub const WEAK_PASSWORD: &str = "auth/weak-password";
    pub const USER_DISABLED: &str = "auth/user-disabled";
    pub const USER_NOT_FOUND: &str = "auth/user-not-found";
    pub const WRONG_PASSWORD: &str = "auth/wrong-password";
    pub const INVALID_CREDENTIAL: &str = "auth/invalid-credential";
    pub const TOO_MANY_REQUESTS: &str = "auth/too-many-requests";
    pub const POPUP_CLOSED_BY_USER: &str = "auth/popup-closed-by-user";
    pub const NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";
}

pub const GENERIC_AUTH_MESSAGE: &str = "Terjadi kesalahan. Silakan coba lagi.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    EmailAlreadyInUse,
    InvalidEmail,
    OperationNotAllowed,
    WeakPassword,
    UserDisabled,
    UserNotFound,
    WrongPassword,
    InvalidCredential,
    TooManyRequests,
    PopupClosedByUser,
    NetworkRequestFailed,
    Unknown,
}

impl AuthErrorKind {
    /// Every kind with a known provider code.
    pub const KNOWN: [AuthErrorKind; 11] = [
        AuthErrorKind::EmailAlreadyInUse,
        AuthErrorKind::InvalidEmail,
        AuthErrorKind::OperationNotAllowed,
        AuthErrorKind::WeakPassword,
        AuthErrorKind::UserDisabled,
        AuthErrorKind::UserNotFound,
        AuthErrorKind::WrongPassword,
        AuthErrorKind::InvalidCredential,
        AuthErrorKind::TooManyRequests,
        AuthErrorKind::PopupClosedByUser,
        AuthErrorKind::NetworkRequestFailed,
    ];

    pub fn from_code(code: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|kind| kind.code() == Some(code))
            .unwrap_or(AuthErrorKind::Unknown)
    }

    pub fn code(self) -> Option<&'static str> {
        let code = match self {
            AuthErrorKind::EmailAlreadyInUse => codes::EMAIL_ALREADY_IN_USE,
            AuthErrorKind::InvalidEmail => codes::INVALID_EMAIL,
            AuthErrorKind::OperationNotAllowed => codes::OPERATION_NOT_ALLOWED,
            AuthErrorKind::WeakPassword => codes::WEAK_PASSWORD,
            AuthErrorKind::UserDisabled => codes::USER_DISABLED,
            AuthErrorKind::UserNotFound => codes::USER_NOT_FOUND,
            AuthErrorKind::WrongPassword => codes::WRONG_PASSWORD,
            AuthErrorKind::InvalidCredential => codes::INVALID_CREDENTIAL,
            AuthErrorKind::TooManyRequests => codes::TOO_MANY_REQUESTS,
            AuthErrorKind::PopupClosedByUser => codes::POPUP_CLOSED_BY_USER,
            AuthErrorKind::NetworkRequestFailed => codes::NETWORK_REQUEST_FAILED,
            AuthErrorKind::Unknown => return None,
        };
        Some(code)
    }

    pub fn message(self) -> &'static str {
        match self {
            AuthErrorKind::EmailAlreadyInUse => "Email sudah terdaftar. Silakan gunakan email lain.",
            AuthErrorKind::InvalidEmail => "Format email tidak valid.",
            AuthErrorKind::OperationNotAllowed => "Operasi tidak diizinkan.",
            AuthErrorKind::WeakPassword => "Password terlalu lemah. Minimal 6 karakter.",
            AuthErrorKind::UserDisabled => "Akun ini telah dinonaktifkan.",
            AuthErrorKind::UserNotFound => "Email tidak terdaftar.",
            AuthErrorKind::WrongPassword => "Password salah.",
            AuthErrorKind::InvalidCredential => "Email atau password salah.",
            AuthErrorKind::TooManyRequests => "Terlalu banyak percobaan. Coba lagi nanti.",
            AuthErrorKind::PopupClosedByUser => "Login dibatalkan.",
            AuthErrorKind::NetworkRequestFailed => "Koneksi jaringan bermasalah.",
            AuthErrorKind::Unknown => GENERIC_AUTH_MESSAGE,
        }
    }
}

/// Maps a provider error code to its user-facing message. Never empty.
pub fn auth_error_message(code: &str) -> &'static str {
    AuthErrorKind::from_code(code).message()
}

/// The failure half of every session operation result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AuthFailure {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthFailure {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
        }
    }
}

impl From<IdentityError> for AuthFailure {
    fn from(err: IdentityError) -> Self {
        AuthFailure::new(AuthErrorKind::from_code(&err.code))
    }
}

// Document store failures carry no provider code.
impl From<PortError> for AuthFailure {
    fn from(_: PortError) -> Self {
        AuthFailure::new(AuthErrorKind::Unknown)
    }
}

pub type AuthResult<T> = Result<T, AuthFailure>;
