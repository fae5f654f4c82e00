pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod env;
pub mod executor;
pub mod guard;
#[cfg(feature = "cli")]
pub mod printer;
pub mod runner;
pub mod scenario;
