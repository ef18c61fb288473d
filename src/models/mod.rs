pub mod config;
pub mod navigation;
pub mod project;
pub mod quota;

pub use config::{AppConfig, StorageBackend};
pub use navigation::{Destination, NavigationStack};
pub use project::{GenerationKind, GenerationResult, Project, ProjectStatus, StyleParameters};
pub use quota::UserQuota;
