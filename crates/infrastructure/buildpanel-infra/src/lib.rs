pub mod runner;

// Re-exports for convenience
pub use runner::{ProcessRunner, RunError};
