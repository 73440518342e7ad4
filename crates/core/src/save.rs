//! Keyed JSON persistence for players and match history.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    models::Player,
    summary::{InningsSummary, MatchResult},
};

/// Key holding the player registry.
pub const PLAYERS_KEY: &str = "players";
/// Key holding the match history list.
pub const MATCHES_KEY: &str = "matches";

/// Names of the two sides in a stored match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTeams {
    /// Side that batted first.
    pub team1_name: String,
    /// Side that batted second.
    pub team2_name: String,
}

/// One completed match as kept in the history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// When the match was finalised.
    pub timestamp: DateTime<Utc>,
    /// Team names in batting order.
    pub teams: MatchTeams,
    /// First innings.
    pub innings1: InningsSummary,
    /// Second innings.
    pub innings2: InningsSummary,
    /// Result of the match.
    pub result: MatchResult,
}

impl MatchRecord {
    /// Short `A vs B` heading for listings.
    pub fn title(&self) -> String {
        format!("{} vs {}", self.teams.team1_name, self.teams.team2_name)
    }
}

/// Directory-backed key/value store, one JSON file per key.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Create a store rooted at the provided directory. Nothing touches the
    /// disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the JSON files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }

    /// Read a value. A key that was never written is `Ok(None)`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(value))
    }

    /// Write a value, replacing the previous file in one rename so readers
    /// never see a partial document.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.path_for(key);
        let serialised = serde_json::to_vec_pretty(value)
            .with_context(|| format!("failed to serialise {key}"))?;

        let mut file = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("failed to create temp file in {}", self.root.display()))?;
        file.write_all(&serialised)
            .with_context(|| format!("failed to write {}", path.display()))?;
        file.persist(&path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        debug!(key, path = %path.display(), "Stored value");
        Ok(())
    }

    /// Stored players, or `None` when nothing usable is on disk. A corrupt
    /// file is logged and treated as missing so the caller can fall back to
    /// the default roster.
    pub fn load_players(&self) -> Option<Vec<Player>> {
        match self.load::<Vec<Player>>(PLAYERS_KEY) {
            Ok(players) => players,
            Err(err) => {
                warn!("Failed to load players: {err:#}");
                None
            }
        }
    }

    /// Persist the whole player list.
    pub fn save_players(&self, players: &[Player]) -> Result<()> {
        self.save(PLAYERS_KEY, players)
    }

    /// Add a match to the front of the history.
    pub fn record_match(&self, record: &MatchRecord) -> Result<()> {
        let mut history: Vec<MatchRecord> = self.load(MATCHES_KEY)?.unwrap_or_default();
        history.insert(0, record.clone());
        self.save(MATCHES_KEY, &history)?;
        info!(
            teams = %record.title(),
            result = %record.result.text,
            stored = history.len(),
            "Match recorded"
        );
        Ok(())
    }

    /// Stored matches, newest first. Unreadable history reads as empty.
    pub fn match_history(&self) -> Vec<MatchRecord> {
        match self.load::<Vec<MatchRecord>>(MATCHES_KEY) {
            Ok(history) => history.unwrap_or_default(),
            Err(err) => {
                warn!("Failed to load match history: {err:#}");
                Vec::new()
            }
        }
    }
}

fn sanitize_key(input: &str) -> String {
    let result: String = input
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
        .collect();
    if result.is_empty() {
        "data".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn innings(batting: &str, bowling: &str, total: u32) -> InningsSummary {
        InningsSummary {
            batting_team_name: batting.to_string(),
            bowling_team_name: bowling.to_string(),
            total,
            wickets: 2,
            overs: 6,
            balls: 0,
            extras: 1,
            batsmen: Vec::new(),
            bowlers: Vec::new(),
            target: None,
        }
    }

    fn record(minute: u32, text: &str) -> MatchRecord {
        MatchRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 18, minute, 0).unwrap(),
            teams: MatchTeams {
                team1_name: "Team A".to_string(),
                team2_name: "Team B".to_string(),
            },
            innings1: innings("Team A", "Team B", 40),
            innings2: innings("Team B", "Team A", 35),
            result: MatchResult {
                winner_name: Some("Team A".to_string()),
                text: text.to_string(),
                target: 41,
            },
        }
    }

    #[test]
    fn missing_keys_load_as_none() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::new(dir.path().join("nested"));
        assert_eq!(store.load::<Vec<Player>>(PLAYERS_KEY)?, None);
        assert!(store.load_players().is_none());
        assert!(store.match_history().is_empty());
        Ok(())
    }

    #[test]
    fn players_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::new(dir.path());
        let players = vec![
            Player::new(1, "Rishu", 9.0, 9.0),
            Player::new(2, "Dev", 4.2, 8.1),
        ];
        store.save_players(&players)?;
        assert!(store.path_for(PLAYERS_KEY).exists());
        assert_eq!(store.load_players(), Some(players));
        Ok(())
    }

    #[test]
    fn corrupt_players_file_degrades_to_none() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::new(dir.path());
        fs::write(store.path_for(PLAYERS_KEY), "{ not json")?;
        assert!(store.load::<Vec<Player>>(PLAYERS_KEY).is_err());
        assert!(store.load_players().is_none());
        Ok(())
    }

    #[test]
    fn history_is_newest_first() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::new(dir.path());
        store.record_match(&record(0, "first"))?;
        store.record_match(&record(30, "second"))?;

        let history = store.match_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].result.text, "second");
        assert_eq!(history[1].result.text, "first");
        assert_eq!(history[0].title(), "Team A vs Team B");
        Ok(())
    }

    #[test]
    fn overwrite_replaces_the_whole_document() -> Result<()> {
        let dir = tempdir()?;
        let store = Store::new(dir.path());
        store.save("note", &vec![1, 2, 3])?;
        store.save("note", &vec![4])?;
        assert_eq!(store.load::<Vec<u32>>("note")?, Some(vec![4]));
        let leftovers = fs::read_dir(dir.path())?.count();
        assert_eq!(leftovers, 1);
        Ok(())
    }

    #[test]
    fn keys_are_sanitised_into_file_names() {
        assert_eq!(sanitize_key("match history/../2024!"), "matchhistory2024");
        assert_eq!(sanitize_key("../"), "data");
        let store = Store::new("/tmp/gully");
        assert_eq!(store.path_for("players"), PathBuf::from("/tmp/gully/players.json"));
    }
}
