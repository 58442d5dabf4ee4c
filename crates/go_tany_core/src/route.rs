//! crates/go_tany_core/src/route.rs
//!
//! The application's route table and which guard protects each route.

use crate::guard::GuardKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Landing,
    /// `/login`
    Login,
    /// `/daftar`
    Register,
    /// `/beranda`
    Home,
    /// `/database`
    Database,
    /// `/detail/:id`, with the raw id segment.
    Detail(String),
    /// `/scan`
    Scan,
}

impl Route {
    /// Where the protected guard sends signed-out users.
    pub const SIGN_IN: Route = Route::Login;
    /// Where the public-only guard sends signed-in users.
    pub const AUTHENTICATED_LANDING: Route = Route::Home;

    /// Parses a path. Unknown paths fall back to the landing page.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Landing,
            "/login" => Route::Login,
            "/daftar" => Route::Register,
            "/beranda" => Route::Home,
            "/database" => Route::Database,
            "/scan" => Route::Scan,
            other => match other.strip_prefix("/detail/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::Detail(id.to_string()),
                _ => Route::Landing,
            },
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/daftar".to_string(),
            Route::Home => "/beranda".to_string(),
            Route::Database => "/database".to_string(),
            Route::Detail(id) => format!("/detail/{id}"),
            Route::Scan => "/scan".to_string(),
        }
    }

    /// `None` for routes every visitor may see.
    pub fn guard(&self) -> Option<GuardKind> {
        match self {
            Route::Landing => None,
            Route::Login | Route::Register => Some(GuardKind::PublicOnly),
            Route::Home | Route::Database | Route::Detail(_) | Route::Scan => Some(GuardKind::Protected),
        }
    }
}
