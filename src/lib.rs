pub mod collection;
pub mod config;
pub mod error;
pub mod faker;
pub mod logger;
pub mod mock;
pub mod params;
pub mod schema;
pub mod server;
pub mod template;
pub mod trigger;
pub mod variable;

// Re-export commonly used types
pub use error::{Result, ScenarioError};
