//! # heimdall-auth-memory
//!
//! In-memory storage backend for `heimdall-auth`.
//!
//! This crate is the reference implementation of the storage contracts:
//! development, tests, and single-process deployments use it directly,
//! while production runs against the relational backend. The token store
//! honors the same guarantees that backend provides with transactions —
//! in particular, refresh rotation is a single critical section, so of N
//! concurrent refreshes with one token exactly one wins.

mod client;
mod revoked;
mod token;
mod user;

pub use client::MemoryClientStorage;
pub use revoked::MemoryRevokedTokenStorage;
pub use token::MemoryTokenStorage;
pub use user::MemoryUserStorage;
