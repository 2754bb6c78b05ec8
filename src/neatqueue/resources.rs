//! Candidate endpoints and accepted envelope keys for each NeatQueue resource.
//!
//! NeatQueue publishes no authoritative schema, so these are best guesses,
//! ordered from most specific (guild-scoped) to most generic.
//!
//! Templates may contain `{guild}`, `{player}`, `{limit}` and `{offset}`.

use serde_json::Value;

use super::normalize::find_container;

/// What a 2xx payload must look like for a candidate to count as a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// An array, or an object holding an array under one of these keys.
    Container(&'static [&'static str]),
    /// An array or any non-empty object.
    Document,
}

impl Shape {
    pub fn accepts(&self, payload: &Value) -> bool {
        match self {
            Shape::Container(keys) => find_container(payload, keys).is_some(),
            Shape::Document => match payload {
                Value::Array(_) => true,
                Value::Object(map) => !map.is_empty(),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
    pub name: &'static str,
    pub candidates: &'static [&'static str],
    pub shape: Shape,
}

/// Envelope keys for player lists, in precedence order.
pub const PLAYER_ENVELOPE: &[&str] = &["leaderboard", "players", "data", "playerstats"];

/// Envelope keys for queue teams, in precedence order.
pub const TEAM_ENVELOPE: &[&str] = &["leaderboard", "players", "data", "queue", "teams"];

pub const SEASON_ENVELOPE: &[&str] = &["seasons", "data"];

pub const MATCH_ENVELOPE: &[&str] = &["matches", "games", "data"];

pub const LEADERBOARD: ResourceDescriptor = ResourceDescriptor {
    name: "leaderboard",
    candidates: &[
        "/api/playerstats/{guild}",
        "/api/queues/{guild}/players",
        "/api/leaderboard/{guild}",
        "/api/guild/{guild}/leaderboard",
        "/api/server/{guild}/leaderboard",
    ],
    shape: Shape::Container(PLAYER_ENVELOPE),
};

/// Last resort for the leaderboard when no guild-scoped path answers.
pub const GLOBAL_STATS: ResourceDescriptor = ResourceDescriptor {
    name: "global-stats",
    candidates: &["/api/stats"],
    shape: Shape::Document,
};

pub const PLAYER_STATS: ResourceDescriptor = ResourceDescriptor {
    name: "player-stats",
    candidates: &[
        "/api/playerstats/{guild}/{player}",
        "/api/players/{player}?server={guild}",
        "/api/guild/{guild}/players/{player}",
        "/api/server/{guild}/players/{player}",
    ],
    shape: Shape::Document,
};

pub const GUILD_STATS: ResourceDescriptor = ResourceDescriptor {
    name: "guild-stats",
    candidates: &[
        "/api/playerstats/{guild}",
        "/api/guild/{guild}/stats",
        "/api/server/{guild}/stats",
        "/api/stats/{guild}",
    ],
    shape: Shape::Document,
};

pub const SEASONS: ResourceDescriptor = ResourceDescriptor {
    name: "seasons",
    candidates: &[
        "/api/seasons/{guild}",
        "/api/guild/{guild}/seasons",
        "/api/server/{guild}/seasons",
    ],
    shape: Shape::Container(SEASON_ENVELOPE),
};

pub const MATCHES: ResourceDescriptor = ResourceDescriptor {
    name: "matches",
    candidates: &[
        "/api/matches/{guild}?limit={limit}&offset={offset}",
        "/api/guild/{guild}/matches?limit={limit}&offset={offset}",
        "/api/server/{guild}/matches?limit={limit}&offset={offset}",
    ],
    shape: Shape::Container(MATCH_ENVELOPE),
};

pub const QUEUE: ResourceDescriptor = ResourceDescriptor {
    name: "queue",
    candidates: &[
        "/api/queues/{guild}",
        "/api/queues/{guild}/teams",
        "/api/queue/{guild}",
        "/api/queue/{guild}/teams",
        "/api/queues",
        "/api/queue",
    ],
    shape: Shape::Container(TEAM_ENVELOPE),
};

/// Generic paths hit once each by endpoint discovery.
pub const DISCOVERY_PATHS: &[&str] = &[
    "/", "/api", "/v1", "/v1/api", "/api/v1", "/webhook", "/guilds", "/leaderboard", "/players",
    "/stats", "/health", "/status",
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_container_shape() {
        let shape = Shape::Container(PLAYER_ENVELOPE);
        assert!(shape.accepts(&json!([])));
        assert!(shape.accepts(&json!({"players": []})));
        assert!(shape.accepts(&json!({"playerstats": [{"id": 1}]})));
        assert!(!shape.accepts(&json!({"players": null})));
        assert!(!shape.accepts(&json!({"players": {}})));
        assert!(!shape.accepts(&json!({"data": {"message": "no stats yet"}})));
        assert!(!Shape::Container(TEAM_ENVELOPE).accepts(&json!({"queue": "closed"})));
        assert!(!shape.accepts(&json!({"message": "ok"})));
        assert!(!shape.accepts(&json!({})));
        assert!(!shape.accepts(&json!("ok")));
        assert!(!shape.accepts(&Value::Null));
    }

    #[test]
    fn test_document_shape() {
        assert!(Shape::Document.accepts(&json!({"total_games": 3})));
        assert!(Shape::Document.accepts(&json!([1])));
        assert!(!Shape::Document.accepts(&json!({})));
        assert!(!Shape::Document.accepts(&json!(42)));
    }

    #[test]
    fn test_guild_scoped_candidates_come_first() {
        for desc in [LEADERBOARD, PLAYER_STATS, GUILD_STATS, SEASONS, MATCHES, QUEUE] {
            assert!(
                desc.candidates[0].contains("{guild}"),
                "{} should start guild-scoped",
                desc.name
            );
        }
    }
}
