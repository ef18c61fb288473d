pub mod config;
pub mod coordinator;
pub mod generator;
pub mod logger;
pub mod navigation;
pub mod project;
pub mod quota;
pub mod storage;
pub mod validation;

// Re-export the session surface at the modules namespace top level
pub use coordinator::{AppCoordinator, GenerateOutcome, QuotaLevel, QuotaStatus};
pub use generator::{GenerationOutput, GenerationRequest, Generator, MockGenerator};
pub use navigation::{NavigationController, NavigationEvent, NavigationOutcome};
pub use quota::{GenerationGate, QuotaTracker};
pub use storage::{KeyValueStore, Persisted, StateStorage};
