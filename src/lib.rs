//! Repbook server library.
//!
//! The HTTP API and its storage backends, shared by the `repbook-server`
//! and `repbook-admin` binaries.

pub mod server;
