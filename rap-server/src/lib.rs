//! # rap-server
//!
//! Server engine for RAP.
//!
//! This crate provides:
//! - [`CommandHandler`]: dispatches decoded commands to a register backend
//!   and turns backend failures into Naks
//! - [`Server`]: a background worker receiving commands from a transport
//! - YAML configuration with environment overrides for the `rapd` daemon

pub mod config;
pub mod error;
pub mod handler;
pub mod server;

pub use config::Config;
pub use error::ServerError;
pub use handler::CommandHandler;
pub use server::{MalformedPolicy, Server, ServerConfig, ServerStats};
