//! Per-client token statistics.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Aggregation window for client statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsTimeframe {
    /// Last hour.
    LastHour,
    /// Last 24 hours.
    LastDay,
    /// Last 7 days.
    LastWeek,
    /// Last 30 days.
    LastMonth,
}

impl StatsTimeframe {
    /// Returns the timeframe token used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastHour => "1h",
            Self::LastDay => "24h",
            Self::LastWeek => "7d",
            Self::LastMonth => "30d",
        }
    }

    /// Parses a timeframe token.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1h" => Some(Self::LastHour),
            "24h" => Some(Self::LastDay),
            "7d" => Some(Self::LastWeek),
            "30d" => Some(Self::LastMonth),
            _ => None,
        }
    }

    /// Returns the window length.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self {
            Self::LastHour => Duration::hours(1),
            Self::LastDay => Duration::hours(24),
            Self::LastWeek => Duration::days(7),
            Self::LastMonth => Duration::days(30),
        }
    }
}

impl std::fmt::Display for StatsTimeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Token-pair counts reported by the token store for one client within a
/// window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStats {
    /// Pairs created directly (not via rotation) in the window.
    pub issued: u64,

    /// Pairs created by refresh rotation in the window.
    pub refreshed: u64,

    /// Window pairs whose access token is unrevoked and unexpired.
    pub active: u64,

    /// All pairs created in the window.
    pub total: u64,

    /// Most recent pair creation time in the window.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub last_issued_at: Option<OffsetDateTime>,
}

/// Combined per-client statistics: token counts plus credential-validation
/// failures.
///
/// A nonexistent client yields the zero value rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    /// Token-pair counts for the window.
    #[serde(flatten)]
    pub tokens: TokenStats,

    /// Failed credential validations in the window.
    pub auth_failures: u64,
}
