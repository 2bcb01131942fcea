pub mod app_core;
pub mod broadcaster;
pub mod domain;
pub mod kernel;
pub mod logging;
pub mod persistence;
pub mod ports;
pub mod runner;
pub mod viewmodel;

pub use app_core::*;
pub use broadcaster::{SubscriptionId, UpdateBroadcaster};
pub use domain::{AppState, BootState, LogLevel, LogMessage};
pub use kernel::AppKernel;
pub use logging::Logged;
pub use ports::*;
pub use viewmodel::*;
