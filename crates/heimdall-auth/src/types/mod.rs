//! Domain types for clients, token pairs, users, and statistics.

pub mod client;
pub mod stats;
pub mod token_record;
pub mod user;

pub use client::{Client, ClientStatus, ClientValidationError, DEFAULT_CLIENT_SCOPES};
pub use stats::{ClientStats, StatsTimeframe, TokenStats};
pub use token_record::{TokenRecord, TokenRecordError};
pub use user::{UserInfoResponse, UserProfile};
