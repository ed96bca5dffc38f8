pub mod lecture_catalog;
pub mod signaling;

pub use lecture_catalog::InMemoryLectureCatalog;
pub use signaling::InMemorySignalingRepository;
