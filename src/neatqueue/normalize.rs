//! Maps whatever JSON NeatQueue returns onto the canonical record types.
//!
//! Every canonical field has an ordered list of upstream synonyms; the first
//! present, non-null one wins. Envelopes are resolved the same way: a bare
//! array first, then each container key in precedence order.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use super::metrics;
use super::models::{GuildStats, MatchRecord, PlayerRecord, TeamRecord};
use super::resources::{MATCH_ENVELOPE, PLAYER_ENVELOPE, SEASON_ENVELOPE, TEAM_ENVELOPE};

const ID_KEYS: &[&str] = &["user_id", "id", "discord_id", "userId"];
const NAME_KEYS: &[&str] = &["username", "display_name", "name", "ign"];
const SCORE_KEYS: &[&str] = &["rating", "score", "points", "mmr"];
const WIN_KEYS: &[&str] = &["wins", "total_wins", "win"];
const GAMES_KEYS: &[&str] = &["total_games", "games_played", "matches_played", "games"];
const LAST_ACTIVE_KEYS: &[&str] = &["last_active", "last_played", "lastActive"];
const AVATAR_KEYS: &[&str] = &["avatar", "avatar_url"];

const TEAM_ID_KEYS: &[&str] = &["id", "team_id", "teamId"];
const TEAM_NAME_KEYS: &[&str] = &["teamName", "team_name", "name"];
const MEMBER_KEYS: &[&str] = &["players", "members"];
const JOINED_KEYS: &[&str] = &["joinedAt", "joined_at", "timestamp", "createdAt", "created_at"];

const MATCH_ID_KEYS: &[&str] = &["match_id", "id", "game_id", "game_num"];
const MATCH_QUEUE_KEYS: &[&str] = &["queue_name", "queue", "channel"];
const MATCH_WINNER_KEYS: &[&str] = &["winner", "winning_team"];
const MATCH_TIME_KEYS: &[&str] = &["played_at", "timestamp", "created_at", "time"];
const MATCH_PLAYER_KEYS: &[&str] = &["players", "participants", "members"];

const SEASON_KEYS: &[&str] = &["name", "id", "season", "season_id"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Epoch values at or above this are taken as milliseconds, below as seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

// ── Envelope and field resolution ──────────────────────────────────────────────

/// The record list inside `raw`: the value itself if it is an array, else the
/// first of `keys` that holds an array.
pub fn find_container<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    if let Some(items) = raw.as_array() {
        return Some(items);
    }
    keys.iter().find_map(|k| raw.get(*k).and_then(Value::as_array))
}

fn field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find(|v| !v.is_null())
}

fn as_i64(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_f64().map(|f| f.round() as i64))
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()).map(|f| f.round() as i64))
}

fn as_u32(v: &Value) -> Option<u32> {
    as_i64(v).map(|n| n.clamp(0, u32::MAX as i64) as u32)
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn from_epoch(n: i64) -> Option<DateTime<Utc>> {
    if n.abs() >= EPOCH_MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(n).single()
    } else {
        Utc.timestamp_opt(n, 0).single()
    }
}

/// Parse an RFC 3339 string, a naive UTC datetime, or a numeric epoch.
pub fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NAIVE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|naive| naive.and_utc())
            })
            .or_else(|| s.trim().parse::<i64>().ok().and_then(from_epoch)),
        Value::Number(_) => as_i64(v).and_then(from_epoch),
        _ => None,
    }
}

/// Strings are kept verbatim; numeric epochs become RFC 3339.
fn timestamp_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) => parse_timestamp(v).map(|dt| dt.to_rfc3339()),
        _ => None,
    }
}

// ── Players ────────────────────────────────────────────────────────────────────

/// Build one player from an upstream entry at 1-based `position`.
///
/// Bare strings are taken as a username. Anything that is neither a string
/// nor an object yields `None`.
fn player_from(item: &Value, position: u32) -> Option<PlayerRecord> {
    if let Value::String(name) = item {
        return Some(build_player(position.to_string(), name.clone(), 0, 0, 0, position, None, None));
    }
    if !item.is_object() {
        return None;
    }

    let id = field(item, ID_KEYS)
        .and_then(as_text)
        .unwrap_or_else(|| position.to_string());
    let username = field(item, NAME_KEYS)
        .and_then(as_text)
        .unwrap_or_else(|| format!("Player {}", position));
    let score = field(item, SCORE_KEYS).and_then(as_i64).unwrap_or(0).max(0);
    let wins = field(item, WIN_KEYS).and_then(as_u32).unwrap_or(0);
    let games_played = field(item, GAMES_KEYS).and_then(as_u32).unwrap_or(0);
    let rank = item
        .get("rank")
        .and_then(as_i64)
        .filter(|r| *r > 0)
        .map(|r| r.min(u32::MAX as i64) as u32)
        .unwrap_or(position);
    let last_active = field(item, LAST_ACTIVE_KEYS).and_then(timestamp_text);
    let avatar = field(item, AVATAR_KEYS).and_then(as_text);

    Some(build_player(
        id,
        username,
        score,
        wins,
        games_played,
        rank,
        last_active,
        avatar,
    ))
}

/// Assemble a record, deriving level, losses and win rate.
#[allow(clippy::too_many_arguments)]
pub fn build_player(
    id: String,
    username: String,
    score: i64,
    wins: u32,
    games_played: u32,
    rank: u32,
    last_active: Option<String>,
    avatar: Option<String>,
) -> PlayerRecord {
    PlayerRecord {
        id,
        username,
        score,
        level: metrics::level(score),
        wins,
        games_played,
        losses: metrics::losses(wins, games_played),
        win_rate: metrics::win_rate(wins, games_played),
        rank,
        last_active,
        avatar,
    }
}

fn players_in(items: &[Value]) -> Vec<PlayerRecord> {
    items
        .iter()
        .filter(|item| item.is_object() || item.is_string())
        .enumerate()
        .filter_map(|(i, item)| player_from(item, i as u32 + 1))
        .collect()
}

/// Normalize a leaderboard-like payload. Upstream order is preserved.
pub fn normalize_players(raw: &Value) -> Vec<PlayerRecord> {
    find_container(raw, PLAYER_ENVELOPE)
        .map(|items| players_in(items))
        .unwrap_or_default()
}

/// Whether `raw` has a player list under a recognized envelope.
pub fn has_player_envelope(raw: &Value) -> bool {
    find_container(raw, PLAYER_ENVELOPE).is_some()
}

/// Pick a single player out of a player-stats payload.
///
/// With a list envelope the entry whose id matches `player_id` wins, else the
/// first entry. A bare object counts as the record itself if it carries an id
/// or score field.
pub fn normalize_player(raw: &Value, player_id: &str) -> Option<PlayerRecord> {
    if let Some(items) = find_container(raw, PLAYER_ENVELOPE) {
        let players = players_in(items);
        let idx = players.iter().position(|p| p.id == player_id).unwrap_or(0);
        return players.into_iter().nth(idx);
    }

    let item = match raw.get("player") {
        Some(inner) if inner.is_object() => inner,
        _ => raw,
    };
    let recognizable = field(item, ID_KEYS).is_some() || field(item, SCORE_KEYS).is_some();
    if !recognizable {
        return None;
    }
    player_from(item, 1)
}

// ── Teams ──────────────────────────────────────────────────────────────────────

fn team_from(item: &Value, position: u32, now: DateTime<Utc>) -> TeamRecord {
    let id = field(item, TEAM_ID_KEYS)
        .and_then(as_text)
        .unwrap_or_else(|| position.to_string());
    let team_name = field(item, TEAM_NAME_KEYS)
        .and_then(as_text)
        .unwrap_or_else(|| format!("Team {}", position));
    let players = field(item, MEMBER_KEYS)
        .and_then(Value::as_array)
        .map(|members| players_in(members))
        .unwrap_or_default();

    let joined = field(item, JOINED_KEYS);
    let joined_at = joined
        .and_then(timestamp_text)
        .unwrap_or_else(|| now.to_rfc3339());
    let wait_time = metrics::wait_time_ms(joined.and_then(parse_timestamp), now);

    TeamRecord {
        id,
        team_name,
        average_level: metrics::average_level(players.iter().map(|p| p.level)),
        average_score: metrics::average_score(players.iter().map(|p| p.score)),
        players,
        joined_at,
        position,
        wait_time,
    }
}

/// Normalize a queue payload. Position is the order of appearance.
pub fn normalize_teams(raw: &Value, now: DateTime<Utc>) -> Vec<TeamRecord> {
    let Some(items) = find_container(raw, TEAM_ENVELOPE) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .enumerate()
        .map(|(i, item)| team_from(item, i as u32 + 1, now))
        .collect()
}

// ── Guild stats, seasons, matches ──────────────────────────────────────────────

/// Aggregate a player list into guild-wide stats.
pub fn aggregate_players(players: &[PlayerRecord]) -> GuildStats {
    let average_win_rate = if players.is_empty() {
        0.0
    } else {
        let sum: f64 = players.iter().map(|p| p.win_rate).sum();
        (sum / players.len() as f64 * 10.0).round() / 10.0
    };
    let top_player = players
        .iter()
        .fold(None::<&PlayerRecord>, |best, p| match best {
            Some(b) if b.score >= p.score => Some(b),
            _ => Some(p),
        })
        .map(|p| p.username.clone());

    GuildStats {
        total_players: players.len() as u64,
        total_games: players.iter().map(|p| p.games_played as u64).sum(),
        total_wins: players.iter().map(|p| p.wins as u64).sum(),
        average_score: metrics::average_score(players.iter().map(|p| p.score)),
        average_level: metrics::average_level(players.iter().map(|p| p.level)),
        average_win_rate,
        top_player,
    }
}

/// Guild stats from either a player list or a flat stats object.
pub fn normalize_guild_stats(raw: &Value) -> GuildStats {
    if has_player_envelope(raw) {
        return aggregate_players(&normalize_players(raw));
    }

    fn count(raw: &Value, keys: &[&str]) -> u64 {
        field(raw, keys)
            .and_then(as_i64)
            .map(|n| n.max(0) as u64)
            .unwrap_or(0)
    }

    let average_score = field(raw, &["average_score", "avg_rating", "average_rating"])
        .and_then(as_i64)
        .unwrap_or(0)
        .max(0);

    GuildStats {
        total_players: count(raw, &["total_players", "players_count", "playerCount"]),
        total_games: count(raw, &["total_games", "games_played", "matches"]),
        total_wins: count(raw, &["total_wins", "wins"]),
        average_score,
        average_level: metrics::level(average_score),
        average_win_rate: 0.0,
        top_player: field(raw, &["top_player", "topPlayer"]).and_then(as_text),
    }
}

pub fn normalize_seasons(raw: &Value) -> Vec<String> {
    let Some(items) = find_container(raw, SEASON_ENVELOPE) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => field(item, SEASON_KEYS).and_then(as_text),
            other => as_text(other),
        })
        .collect()
}

pub fn normalize_matches(raw: &Value) -> Vec<MatchRecord> {
    let Some(items) = find_container(raw, MATCH_ENVELOPE) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .enumerate()
        .map(|(i, item)| MatchRecord {
            id: field(item, MATCH_ID_KEYS)
                .and_then(as_text)
                .unwrap_or_else(|| (i + 1).to_string()),
            queue: field(item, MATCH_QUEUE_KEYS).and_then(as_text),
            winner: field(item, MATCH_WINNER_KEYS).and_then(as_text),
            played_at: field(item, MATCH_TIME_KEYS).and_then(timestamp_text),
            players: field(item, MATCH_PLAYER_KEYS)
                .and_then(Value::as_array)
                .map(|members| players_in(members))
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_array_input() {
        let players = normalize_players(&json!([{"id": 1, "username": "a", "rating": 10}]));
        assert_eq!(players.len(), 1);
        let p = &players[0];
        assert_eq!(p.id, "1");
        assert_eq!(p.username, "a");
        assert_eq!(p.score, 10);
        assert_eq!(p.level, 1);
        assert_eq!(p.rank, 1);
    }

    #[test]
    fn test_envelope_transparency() {
        let inner = json!([
            {"user_id": "42", "display_name": "Alpha", "mmr": 900, "wins": 3, "games": 4},
            {"discord_id": 7, "name": "Beta", "points": "650.6"},
        ]);
        let expected = normalize_players(&inner);
        assert_eq!(expected.len(), 2);
        for key in ["players", "data", "leaderboard", "playerstats"] {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert(key.to_string(), inner.clone());
            let wrapped = Value::Object(wrapped);
            assert_eq!(normalize_players(&wrapped), expected, "envelope {}", key);
        }
    }

    #[test]
    fn test_envelope_precedence() {
        let raw = json!({
            "data": [{"id": "from-data"}],
            "leaderboard": [{"id": "from-leaderboard"}],
        });
        assert_eq!(normalize_players(&raw)[0].id, "from-leaderboard");

        // A non-array value under a key falls through to the next key
        let raw = json!({"leaderboard": {"season": 2}, "players": [{"id": "p"}]});
        assert_eq!(normalize_players(&raw)[0].id, "p");
    }

    #[test]
    fn test_unrecognized_envelope_is_empty() {
        assert!(normalize_players(&json!({"total_games": 10})).is_empty());
        assert!(normalize_players(&json!("nope")).is_empty());
        assert!(!has_player_envelope(&json!({"total_games": 10})));
    }

    #[test]
    fn test_synonym_order() {
        let p = &normalize_players(&json!([{
            "id": "second",
            "user_id": "first",
            "score": 900,
            "rating": 1200,
            "total_wins": 9,
            "wins": 5,
            "games_played": 20,
            "total_games": 10,
        }]))[0];
        assert_eq!(p.id, "first");
        assert_eq!(p.score, 1200);
        assert_eq!(p.level, 5);
        assert_eq!(p.wins, 5);
        assert_eq!(p.games_played, 10);
        assert_eq!(p.losses, 5);
        assert_relative_eq!(p.win_rate, 50.0);
    }

    #[test]
    fn test_null_synonym_is_skipped() {
        let p = &normalize_players(&json!([{"rating": null, "score": 600}]))[0];
        assert_eq!(p.score, 600);
        assert_eq!(p.level, 3);
    }

    #[test]
    fn test_defaults() {
        let p = &normalize_players(&json!([{}, {}]))[1];
        assert_eq!(p.id, "2");
        assert_eq!(p.username, "Player 2");
        assert_eq!(p.score, 0);
        assert_eq!(p.level, 1);
        assert_eq!(p.rank, 2);
        assert_relative_eq!(p.win_rate, 0.0);
        assert!(p.last_active.is_none());
        assert!(p.avatar.is_none());
    }

    #[test]
    fn test_upstream_level_and_losses_ignored() {
        let p = &normalize_players(&json!([{
            "score": 3000, "level": 99, "wins": 8, "total_games": 6, "losses": 40
        }]))[0];
        assert_eq!(p.level, 11);
        assert_eq!(p.losses, 0);
    }

    #[test]
    fn test_rank_honored_or_positional() {
        let players = normalize_players(&json!([
            {"id": "a", "rank": 4},
            {"id": "b"},
            {"id": "c", "rank": 0},
        ]));
        let ranks: Vec<u32> = players.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![4, 2, 3]);
    }

    #[test]
    fn test_unusable_entries_leave_no_rank_gap() {
        let players = normalize_players(&json!([{"id": "a"}, null, 42, {"id": "c"}]));
        let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
        let ranks: Vec<u32> = players.iter().map(|p| p.rank).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn test_order_not_resorted() {
        let players = normalize_players(&json!([{"score": 10}, {"score": 5000}]));
        assert_eq!(players[0].score, 10);
        assert_eq!(players[0].rank, 1);
        assert_eq!(players[1].rank, 2);
    }

    #[test]
    fn test_negative_and_fractional_score() {
        let players = normalize_players(&json!([{"rating": -40}, {"rating": 1499.6}]));
        assert_eq!(players[0].score, 0);
        assert_eq!(players[1].score, 1500);
        assert_eq!(players[1].level, 6);
    }

    #[test]
    fn test_huge_scores_stay_in_range() {
        let players = normalize_players(&json!([{"rating": 1_288_490_188_500i64}]));
        assert_eq!(players[0].score, 1_288_490_188_500);
        assert_eq!(players[0].level, u32::MAX);

        let teams = normalize_teams(
            &json!([{"players": [{"rating": 1e19}, {"rating": 1e19}]}]),
            now(),
        );
        assert_eq!(teams[0].average_score, i64::MAX);
        assert_eq!(teams[0].average_level, u32::MAX);

        let stats = aggregate_players(&teams[0].players);
        assert_eq!(stats.average_score, i64::MAX);
    }

    #[test]
    fn test_last_active_epoch_is_converted() {
        let p = &normalize_players(&json!([{"last_played": 1714564800}]))[0];
        assert_eq!(p.last_active.as_deref(), Some("2024-05-01T12:00:00+00:00"));

        let p = &normalize_players(&json!([{"last_active": "2024-01-01T00:00:00Z"}]))[0];
        assert_eq!(p.last_active.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_normalize_player_matches_id() {
        let raw = json!({"players": [{"id": "1", "score": 1}, {"id": "2", "score": 600}]});
        let p = normalize_player(&raw, "2").unwrap();
        assert_eq!(p.score, 600);
        assert_eq!(p.rank, 2);

        let p = normalize_player(&raw, "unknown").unwrap();
        assert_eq!(p.id, "1");
    }

    #[test]
    fn test_normalize_player_bare_object() {
        let p = normalize_player(&json!({"user_id": "9", "mmr": 300}), "9").unwrap();
        assert_eq!(p.id, "9");
        assert_eq!(p.level, 2);

        let p = normalize_player(&json!({"player": {"id": "3"}}), "3").unwrap();
        assert_eq!(p.id, "3");

        assert!(normalize_player(&json!({"message": "not found"}), "9").is_none());
        assert!(normalize_player(&json!({"players": []}), "9").is_none());
    }

    #[test]
    fn test_teams_from_queue_envelope() {
        let raw = json!({"queue": [
            {
                "name": "Apes",
                "members": [{"score": 600}, {"score": 1200}],
                "joinedAt": "2024-05-01T11:59:00Z",
            },
            {"players": []},
        ]});
        let teams = normalize_teams(&raw, now());
        assert_eq!(teams.len(), 2);

        let apes = &teams[0];
        assert_eq!(apes.id, "1");
        assert_eq!(apes.team_name, "Apes");
        assert_eq!(apes.players.len(), 2);
        assert_eq!(apes.average_level, 4);
        assert_eq!(apes.average_score, 900);
        assert_eq!(apes.position, 1);
        assert_eq!(apes.wait_time, 60_000);

        let empty = &teams[1];
        assert_eq!(empty.team_name, "Team 2");
        assert_eq!(empty.average_level, 1);
        assert_eq!(empty.average_score, 0);
        assert_eq!(empty.wait_time, 0);
        assert_eq!(empty.joined_at, now().to_rfc3339());
    }

    #[test]
    fn test_teams_envelope_precedence() {
        let raw = json!({"teams": [{"name": "T"}], "data": [{"name": "D"}]});
        assert_eq!(normalize_teams(&raw, now())[0].team_name, "D");
        assert!(normalize_teams(&json!({"status": "idle"}), now()).is_empty());
    }

    #[test]
    fn test_team_members_as_names() {
        let raw = json!([{"teamId": 5, "players": ["alice", "bob"], "timestamp": 1714564790000i64}]);
        let team = &normalize_teams(&raw, now())[0];
        assert_eq!(team.id, "5");
        assert_eq!(team.players[1].username, "bob");
        assert_eq!(team.wait_time, 10_000);
    }

    #[test]
    fn test_guild_stats_from_players() {
        let stats = normalize_guild_stats(&json!({"playerstats": [
            {"username": "a", "rating": 900, "wins": 1, "total_games": 2},
            {"username": "b", "rating": 1500, "wins": 3, "total_games": 4},
        ]}));
        assert_eq!(stats.total_players, 2);
        assert_eq!(stats.total_games, 6);
        assert_eq!(stats.total_wins, 4);
        assert_eq!(stats.average_score, 1200);
        assert_eq!(stats.average_level, 5);
        assert_relative_eq!(stats.average_win_rate, 62.5);
        assert_eq!(stats.top_player.as_deref(), Some("b"));
    }

    #[test]
    fn test_guild_stats_from_flat_object() {
        let stats = normalize_guild_stats(&json!({"players_count": 120, "matches": "48"}));
        assert_eq!(stats.total_players, 120);
        assert_eq!(stats.total_games, 48);
        assert_eq!(stats.average_level, 1);
        assert!(stats.top_player.is_none());
    }

    #[test]
    fn test_seasons() {
        let seasons = normalize_seasons(&json!({"seasons": ["S1", 2, {"name": "Winter"}, {"x": 1}]}));
        assert_eq!(seasons, vec!["S1", "2", "Winter"]);
        assert!(normalize_seasons(&json!({})).is_empty());
    }

    #[test]
    fn test_matches() {
        let matches = normalize_matches(&json!({"matches": [
            {"game_num": 77, "queue_name": "5v5", "winner": "Team 1",
             "created_at": "2024-04-30T10:00:00Z", "participants": [{"name": "x"}]},
            {},
        ]}));
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "77");
        assert_eq!(matches[0].queue.as_deref(), Some("5v5"));
        assert_eq!(matches[0].players[0].username, "x");
        assert_eq!(matches[1].id, "2");
        assert!(matches[1].players.is_empty());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = now();
        assert_eq!(parse_timestamp(&json!("2024-05-01T12:00:00Z")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-05-01 12:00:00")), Some(expected));
        assert_eq!(parse_timestamp(&json!(1714564800)), Some(expected));
        assert_eq!(parse_timestamp(&json!(1714564800000i64)), Some(expected));
        assert_eq!(parse_timestamp(&json!("garbage")), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
    }
}
