use serde::{Deserialize, Serialize};

/// A ranked player, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: String,
    pub username: String,
    pub score: i64,
    /// Always derived from `score`, never taken from upstream
    pub level: u32,
    pub wins: u32,
    pub games_played: u32,
    pub losses: u32,
    /// Percentage, one decimal (0.0–100.0)
    pub win_rate: f64,
    /// 1-based rank
    pub rank: u32,
    /// ISO-8601 timestamp
    pub last_active: Option<String>,
    pub avatar: Option<String>,
}

/// A team waiting in a matchmaking queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub id: String,
    pub team_name: String,
    pub players: Vec<PlayerRecord>,
    pub average_level: u32,
    pub average_score: i64,
    /// ISO-8601 timestamp
    pub joined_at: String,
    /// 1-based position in the queue
    pub position: u32,
    /// Milliseconds since `joined_at`
    pub wait_time: i64,
}

/// A completed match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub queue: Option<String>,
    pub winner: Option<String>,
    pub played_at: Option<String>,
    pub players: Vec<PlayerRecord>,
}

/// Aggregate statistics for a guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildStats {
    pub total_players: u64,
    pub total_games: u64,
    pub total_wins: u64,
    pub average_score: i64,
    pub average_level: u32,
    pub average_win_rate: f64,
    pub top_player: Option<String>,
}

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Live,
    MockUnconfigured,
    MockFallbackOnError,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Live => "live",
            Provenance::MockUnconfigured => "mock-unconfigured",
            Provenance::MockFallbackOnError => "mock-fallback-on-error",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical records tagged with their provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub records: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    pub fn live(records: T) -> Self {
        Sourced {
            records,
            provenance: Provenance::Live,
        }
    }

    pub fn mock(records: T, provenance: Provenance) -> Self {
        Sourced { records, provenance }
    }
}

/// Snapshot of the client's configuration, safe to expose (no credential).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStatus {
    pub is_configured: bool,
    pub has_api_key: bool,
    pub has_guild_id: bool,
    pub base_url: String,
    /// Environment variables still to be set
    pub missing: Vec<&'static str>,
}

/// Outcome of probing one generic path during endpoint discovery.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointReport {
    pub path: String,
    pub ok: bool,
    pub status: Option<u16>,
    pub error: Option<String>,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
    pub offset: usize,
    pub season: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct QueueQuery {
    pub limit: Option<usize>,
}
