use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::normalize::MultiKillConvention;

pub const DEFAULT_API_BASE: &str = "http://euw.lolesports.com/api";
const DEFAULT_DB_FILE: &str = "fantasy_scores.sqlite";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

// key:tournament-id:generation
const DEFAULT_TOURNAMENTS: &str = "S4SUMMERNA:104:classic,S4SUMMEREU:102:classic";

/// Upstream API generation. The endpoints kept their shapes across
/// generations except where noted: the relaunch dropped the per-team
/// roster endpoint (player-to-team assignment becomes positional), started
/// reporting multi-kill tiers as exclusive counts, and added an
/// isFinished flag plus starter/rolling-average fields on stat entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiGeneration {
    Classic,
    Relaunch,
}

impl ApiGeneration {
    pub fn multi_kill_convention(self) -> MultiKillConvention {
        match self {
            ApiGeneration::Classic => MultiKillConvention::Cumulative,
            ApiGeneration::Relaunch => MultiKillConvention::Exclusive,
        }
    }

    pub fn has_roster_endpoint(self) -> bool {
        matches!(self, ApiGeneration::Classic)
    }

    pub fn tracks_finished_flag(self) -> bool {
        matches!(self, ApiGeneration::Relaunch)
    }

    fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(ApiGeneration::Classic),
            "relaunch" => Some(ApiGeneration::Relaunch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TournamentConfig {
    pub key: String,
    pub id: u64,
    pub generation: ApiGeneration,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub api_base: String,
    pub db_path: PathBuf,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub tournaments: Vec<TournamentConfig>,
}

impl RunConfig {
    pub fn from_env() -> Result<Self> {
        let api_base = env_or("FANTASY_API_BASE", DEFAULT_API_BASE);
        let db_path = PathBuf::from(env_or("FANTASY_DB", DEFAULT_DB_FILE));
        let timeout_secs = env::var("FANTASY_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);
        let retry_attempts = env::var("FANTASY_HTTP_RETRIES")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRY_ATTEMPTS)
            .clamp(1, 5);
        let tournaments =
            parse_tournament_list(&env_or("FANTASY_TOURNAMENTS", DEFAULT_TOURNAMENTS))?;

        Ok(Self {
            api_base,
            db_path,
            timeout_secs,
            retry_attempts,
            tournaments,
        })
    }
}

/// Parses "KEY:ID:GENERATION" entries separated by commas or semicolons,
/// deduplicating by tournament id.
pub fn parse_tournament_list(raw: &str) -> Result<Vec<TournamentConfig>> {
    let mut out: Vec<TournamentConfig> = Vec::new();
    for part in raw.split([',', ';']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let mut fields = part.split(':');
        let key = fields
            .next()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("tournament entry {part:?} missing key"))?
            .trim()
            .to_string();
        let id = fields
            .next()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|id| *id != 0)
            .ok_or_else(|| anyhow!("tournament entry {part:?} missing numeric id"))?;
        let generation = match fields.next() {
            Some(token) => ApiGeneration::parse(token)
                .ok_or_else(|| anyhow!("tournament entry {part:?} has unknown generation"))?,
            None => ApiGeneration::Classic,
        };
        if out.iter().any(|t| t.id == id) {
            continue;
        }
        out.push(TournamentConfig { key, id, generation });
    }
    if out.is_empty() {
        return Err(anyhow!("no tournaments configured"));
    }
    Ok(out)
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        _ => default.to_string(),
    }
}
