//! Derived player and team metrics.
//!
//! NeatQueue never supplies these consistently, so every record (live or
//! mock) runs through the same formulas here.

use chrono::{DateTime, Utc};

/// Score points per level.
pub const POINTS_PER_LEVEL: i64 = 300;

/// `floor(score / 300) + 1`. Negative scores are treated as 0.
pub fn level(score: i64) -> u32 {
    let score = score.max(0);
    u32::try_from(score / POINTS_PER_LEVEL + 1).unwrap_or(u32::MAX)
}

/// Win percentage in `0.0..=100.0`, rounded to one decimal.
pub fn win_rate(wins: u32, games_played: u32) -> f64 {
    if games_played == 0 {
        return 0.0;
    }
    let wins = wins.min(games_played);
    let pct = wins as f64 / games_played as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

pub fn losses(wins: u32, games_played: u32) -> u32 {
    games_played.saturating_sub(wins)
}

/// Floor of the mean level, or 1 for an empty group.
pub fn average_level<I>(levels: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let (sum, count) = levels
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), l| (sum + l as u64, count + 1));
    if count == 0 {
        1
    } else {
        (sum / count) as u32
    }
}

/// Floor of the mean score, or 0 for an empty group.
pub fn average_score<I>(scores: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0i128, 0i128), |(sum, count), s| (sum + s as i128, count + 1));
    if count == 0 {
        0
    } else {
        // The mean of i64 values always fits back into i64
        sum.div_euclid(count) as i64
    }
}

/// Milliseconds between `joined_at` and `now`, clamped at 0 for clock skew.
pub fn wait_time_ms(joined_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match joined_at {
        Some(joined) => (now - joined).num_milliseconds().max(0),
        None => 0,
    }
}
