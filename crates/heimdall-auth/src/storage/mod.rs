//! Storage traits for clients, token pairs, and user profiles.
//!
//! The lifecycle service is written against these traits and is safe to run
//! across many processes with no shared memory; all concurrency guarantees
//! live behind the traits (see [`TokenStorage::rotate`]).

pub mod client;
pub mod revoked_token;
pub mod token;
pub mod user;

pub use client::ClientStorage;
pub use revoked_token::RevokedTokenStorage;
pub use token::TokenStorage;
pub use user::UserStorage;
