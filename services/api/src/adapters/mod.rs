pub mod blobs;
pub mod db;
pub mod identity;
pub mod memory;
pub mod pg_identity;

pub use blobs::FsBlobStore;
pub use db::DbAdapter;
pub use identity::{ConsentBroker, FederatedProfile};
pub use memory::{MemoryBlobStore, MemoryDocumentStore, MemoryIdentityProvider};
pub use pg_identity::PgIdentityProvider;
