use serde::Serialize;
use tracing::debug;

use crate::amount::Amount;

const PODIUM_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub username: String,
    pub total_winnings: Amount,
    pub avatar: String,
}

/// Players ranked by cumulative winnings, highest first.
#[derive(Debug, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ranked board from `(username, winnings, avatar)` rows. Repeated names are merged.
    pub fn from_seed<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Amount, &'a str)>,
    {
        let mut board = Self::new();
        for (username, winnings, avatar) in rows {
            board.credit(username, winnings, avatar);
        }
        board.rerank();
        board
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn podium(&self) -> &[LeaderboardEntry] {
        &self.entries[..self.entries.len().min(PODIUM_SIZE)]
    }

    pub fn get(&self, username: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.username == username)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds `amount` to `username` (creating the entry with `default_avatar` on a first win)
    /// and returns the re-ranked board.
    pub fn record_win(
        &mut self,
        username: &str,
        amount: Amount,
        default_avatar: &str,
    ) -> &[LeaderboardEntry] {
        self.credit(username, amount, default_avatar);
        self.rerank();
        if let Some(entry) = self.get(username) {
            debug!(
                username,
                %amount,
                total = %entry.total_winnings,
                rank = entry.rank,
                "leaderboard updated"
            );
        }
        &self.entries
    }

    fn credit(&mut self, username: &str, amount: Amount, default_avatar: &str) {
        match self.entries.iter_mut().find(|e| e.username == username) {
            Some(entry) => entry.total_winnings += amount,
            None => self.entries.push(LeaderboardEntry {
                rank: self.entries.len() + 1,
                username: username.to_string(),
                total_winnings: amount,
                avatar: default_avatar.to_string(),
            }),
        }
    }

    fn rerank(&mut self) {
        // sort_by is stable: equal totals keep their previous order
        self.entries.sort_by(|a, b| b.total_winnings.cmp(&a.total_winnings));
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            entry.rank = idx + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Leaderboard {
        Leaderboard::from_seed([
            ("未来战士", Amount::from_yuan(666), "⚡"),
            ("赛博玩家001", Amount::from_yuan(888), "🤖"),
            ("霓虹猎手", Amount::from_yuan(555), "🔥"),
        ])
    }

    fn names(board: &Leaderboard) -> Vec<&str> {
        board.entries().iter().map(|e| e.username.as_str()).collect()
    }

    #[test]
    fn seed_is_ranked() {
        let board = seeded();
        assert_eq!(names(&board), ["赛博玩家001", "未来战士", "霓虹猎手"]);
        let ranks: Vec<usize> = board.entries().iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);
    }

    #[test]
    fn first_win_appends_with_default_avatar() {
        let mut board = seeded();
        let ranked = board.record_win("你", Amount::from_cents(1_234), "🎯");
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[3].username, "你");
        assert_eq!(ranked[3].rank, 4);
        assert_eq!(ranked[3].avatar, "🎯");
    }

    #[test]
    fn repeat_wins_accumulate_and_climb() {
        let mut board = seeded();
        board.record_win("你", Amount::from_yuan(600), "🎯");
        board.record_win("你", Amount::from_yuan(100), "🚫");
        let me = board.get("你").unwrap();
        assert_eq!(me.total_winnings, Amount::from_yuan(700));
        assert_eq!(me.rank, 2);
        assert_eq!(me.avatar, "🎯");
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn ties_keep_first_recorded_order() {
        let mut board = Leaderboard::new();
        board.record_win("a", Amount::from_yuan(5), "1");
        board.record_win("b", Amount::from_yuan(5), "2");
        assert_eq!(names(&board), ["a", "b"]);
        board.record_win("c", Amount::from_yuan(6), "3");
        assert_eq!(names(&board), ["c", "a", "b"]);
    }

    #[test]
    fn podium_is_at_most_three() {
        let mut board = Leaderboard::new();
        assert!(board.podium().is_empty());
        board.record_win("a", Amount::CENT, "1");
        assert_eq!(board.podium().len(), 1);
        assert_eq!(seeded().podium().len(), 3);
    }
}
