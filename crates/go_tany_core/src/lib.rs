pub mod analysis;
pub mod catalog;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod guard;
pub mod ports;
pub mod profile;
pub mod route;
pub mod seed;
pub mod session;
pub mod validation;

pub use analysis::{AnalysisError, Analyzer, MockPredictor};
pub use catalog::{catalog, get_disease_by_id, CatalogSource};
pub use domain::{
    AnalysisResult, DiseaseId, DiseaseRecord, Identity, ImageFile, NewProfile, NewScan,
    ProfileUpdate, ScanRecord, Tag, UserProfile,
};
pub use errors::{AuthErrorKind, AuthFailure, AuthResult};
pub use filter::{filter, CatalogView, FilterCriteria, ALL_PLANTS};
pub use guard::{AuthPhase, GuardDecision, GuardKind};
pub use ports::{
    BlobStore, DiseasePredictor, DocumentStore, IdentityChanges, IdentityError, IdentityProvider,
    IdentityResult, PortError, PortResult,
};
pub use profile::ProfileService;
pub use route::Route;
pub use session::{SessionHolder, SessionState, Subscription};
