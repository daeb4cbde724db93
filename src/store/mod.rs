pub mod memory;
pub mod record;
pub mod repository;
pub mod traits;

pub use memory::MemoryStore;
pub use repository::{ListingRepository, OwnerMap, LISTINGS, RENTALS, USERS};
pub use traits::{AuthService, Document, DocumentStore, EqualityFilter, StaticAuth};
