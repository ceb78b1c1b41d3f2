//! Query filter settings and the fetch-cache partitioning context.
//!
//! [`FilterSettings`] is an immutable value: the `with_*` operations return
//! a new value rather than mutating in place, so a settings change is always
//! an explicit new context. Two fetches under equal settings are
//! interchangeable for caching purposes; any change invalidates all prior
//! tile knowledge (the coordinator resets its cache and store when the
//! active settings change).

use std::fmt;

/// Default maximum number of records requested per batch.
pub const DEFAULT_LIMIT: u32 = 100;

/// Ranking applied by the backend when truncating a batch to the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RankingKey {
    /// Bridges with the lowest structural rating first.
    #[default]
    LowestRating,
    /// Bridges carrying the highest average daily traffic first.
    HighestAdt,
    /// Bridges in the worst overall condition first.
    WorstCondition,
}

impl RankingKey {
    /// The wire name of this ranking, as understood by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingKey::LowestRating => "lowestRating",
            RankingKey::HighestAdt => "highestADT",
            RankingKey::WorstCondition => "worstBridgeCondition",
        }
    }
}

impl fmt::Display for RankingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active query parameters that partition fetch caching.
///
/// Equal settings values are one cache context: a tile marked fetched under
/// one `FilterSettings` is never re-requested while those settings stay
/// active. The value accompanies every fetch call so the capability can
/// apply the matching query strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterSettings {
    ranking: RankingKey,
    limit: u32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            ranking: RankingKey::default(),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FilterSettings {
    /// Create settings with an explicit ranking and limit.
    pub fn new(ranking: RankingKey, limit: u32) -> Self {
        Self { ranking, limit }
    }

    /// The active ranking.
    pub fn ranking(&self) -> RankingKey {
        self.ranking
    }

    /// The per-batch record limit.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns a copy with a different ranking.
    pub fn with_ranking(self, ranking: RankingKey) -> Self {
        Self { ranking, ..self }
    }

    /// Returns a copy with a different record limit.
    pub fn with_limit(self, limit: u32) -> Self {
        Self { limit, ..self }
    }

    /// The `"{ranking}_{limit}"` context string, used in logs and by wire
    /// protocols that expect a flat context key.
    pub fn context_key(&self) -> String {
        format!("{}_{}", self.ranking.as_str(), self.limit)
    }
}

impl fmt::Display for FilterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.ranking, self.limit)
    }
}
