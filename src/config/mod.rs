pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{CollectionPaths, MockSection, RunnerSection, ServerConfig, ServerSection, TriggerSection};
