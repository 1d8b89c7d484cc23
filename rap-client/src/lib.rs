//! # rap-client
//!
//! Client library for RAP.
//!
//! This crate provides:
//! - [`Connection`]: one command/response round trip at a time, correlated
//!   by transaction id
//! - [`Client`]: a [`rap_core::RegisterTarget`] that maps each register
//!   operation onto the best command family the profile enables, falling
//!   back to single accesses otherwise

pub mod client;
pub mod connection;
pub mod error;

pub use client::Client;
pub use connection::Connection;
pub use error::ClientError;

#[cfg(test)]
mod test_support;
