//! Deterministic placeholder data for when NeatQueue is unreachable or
//! unconfigured. Output is shaped exactly like normalized live data.

use std::sync::Arc;

use super::clock::Clock;
use super::models::{GuildStats, MatchRecord, PlayerRecord, TeamRecord};
use super::normalize::{aggregate_players, build_player};

/// (username, score, wins, games played)
const MOCK_PLAYERS: [(&str, i64, u32, u32); 15] = [
    ("ApeKing001", 15420, 128, 150),
    ("BananaMaster", 13850, 115, 142),
    ("SquadLeader", 12750, 102, 135),
    ("NeatGamer", 11600, 95, 128),
    ("QueueMaster", 10950, 88, 120),
    ("DiscordApe", 10200, 82, 115),
    ("RankClimber", 9750, 76, 108),
    ("BotSlayer", 9150, 71, 102),
    ("ElitePlayer", 8650, 65, 95),
    ("TopApe", 8200, 60, 90),
    ("ClimbMaster", 7850, 55, 85),
    ("RankWarrior", 7500, 50, 80),
    ("GameChanger", 7200, 47, 75),
    ("ProGamer", 6900, 43, 70),
    ("SkillMaster", 6600, 40, 65),
];

pub const MOCK_PLAYER_COUNT: usize = MOCK_PLAYERS.len();

#[derive(Clone)]
pub struct MockDataProvider {
    clock: Arc<dyn Clock>,
}

impl MockDataProvider {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MockDataProvider { clock }
    }

    /// The first `limit` placeholder players (all 15 if `limit >= 15`).
    pub fn leaderboard(&self, limit: usize) -> Vec<PlayerRecord> {
        let now = self.clock.now().to_rfc3339();
        MOCK_PLAYERS
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, (username, score, wins, games))| {
                let position = i as u32 + 1;
                build_player(
                    position.to_string(),
                    username.to_string(),
                    *score,
                    *wins,
                    *games,
                    position,
                    Some(now.clone()),
                    None,
                )
            })
            .collect()
    }

    /// Look a placeholder player up by id or (case-insensitive) username.
    pub fn player(&self, player_id: &str) -> Option<PlayerRecord> {
        self.leaderboard(MOCK_PLAYER_COUNT)
            .into_iter()
            .find(|p| p.id == player_id || p.username.eq_ignore_ascii_case(player_id))
    }

    pub fn guild_stats(&self) -> GuildStats {
        aggregate_players(&self.leaderboard(MOCK_PLAYER_COUNT))
    }

    pub fn seasons(&self) -> Vec<String> {
        vec!["current".to_string()]
    }

    /// Nobody is queued in the placeholder world.
    pub fn queue(&self) -> Vec<TeamRecord> {
        Vec::new()
    }

    pub fn matches(&self) -> Vec<MatchRecord> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neatqueue::clock::FixedClock;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn provider() -> MockDataProvider {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        MockDataProvider::new(Arc::new(FixedClock(now)))
    }

    #[test]
    fn test_first_entry() {
        let board = provider().leaderboard(50);
        assert_eq!(board.len(), 15);
        let first = &board[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.username, "ApeKing001");
        assert_eq!(first.score, 15420);
        assert_eq!(first.wins, 128);
        assert_eq!(first.games_played, 150);
        assert_eq!(first.losses, 22);
        assert_eq!(first.level, 52);
        assert_eq!(first.rank, 1);
        assert_relative_eq!(first.win_rate, 85.3);
        assert_eq!(first.last_active.as_deref(), Some("2024-05-01T12:00:00+00:00"));
        assert!(first.avatar.is_none());
    }

    #[test]
    fn test_limit_truncates() {
        let board = provider().leaderboard(3);
        let names: Vec<&str> = board.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["ApeKing001", "BananaMaster", "SquadLeader"]);
        assert!(provider().leaderboard(0).is_empty());
    }

    #[test]
    fn test_ranks_contiguous_and_scores_descending() {
        let board = provider().leaderboard(15);
        for (i, p) in board.iter().enumerate() {
            assert_eq!(p.rank as usize, i + 1);
        }
        assert!(board.windows(2).all(|w| w[0].score > w[1].score));
        assert_eq!(board[14].username, "SkillMaster");
    }

    #[test]
    fn test_player_lookup() {
        let p = provider();
        assert_eq!(p.player("2").unwrap().username, "BananaMaster");
        assert_eq!(p.player("topape").unwrap().rank, 10);
        assert!(p.player("nobody").is_none());
    }

    #[test]
    fn test_guild_stats() {
        let stats = provider().guild_stats();
        assert_eq!(stats.total_players, 15);
        assert_eq!(stats.top_player.as_deref(), Some("ApeKing001"));
    }
}
