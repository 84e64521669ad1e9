use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};
use rusqlite::Transaction;

use crate::store::{self, InsertOutcome, PlayerRow, TeamRow};

/// The identifier-less stats generation lists two teams' worth of player
/// entries per match in payload order; the first eight belong to the
/// first-seen team.
pub const PLAYERS_PER_SIDE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamOutcome {
    Inserted,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerOutcome {
    Inserted,
    Skipped,
    Promoted,
}

/// Run-scoped dedup and replacement decisions for teams and players.
/// Upstream repeats both across match records, and repeats players with
/// upgraded starter flags; state lives here, never in globals, so two
/// runs (or two tests) cannot leak into each other.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    known_teams: HashSet<i64>,
    // player id -> starter flag recorded at insert time
    known_players: HashMap<i64, bool>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Teams insert exactly once per run; later sightings are no-ops.
    pub fn resolve_team(&mut self, tx: &Transaction<'_>, row: &TeamRow) -> Result<TeamOutcome> {
        if !self.known_teams.insert(row.id) {
            return Ok(TeamOutcome::Skipped);
        }
        match store::insert_team(tx, row)? {
            InsertOutcome::Inserted => Ok(TeamOutcome::Inserted),
            InsertOutcome::Conflict => Ok(TeamOutcome::Skipped),
        }
    }

    /// Players insert once per run. A repeat sighting is a no-op unless it
    /// promotes a starter over a recorded non-starter, in which case the
    /// old row is deleted and the insert retried exactly once. A conflict
    /// surviving that retry means the ingestion order is broken.
    pub fn resolve_player(&mut self, tx: &Transaction<'_>, row: &PlayerRow) -> Result<PlayerOutcome> {
        let incoming_starter = row.starter.unwrap_or(false);

        if let Some(&recorded_starter) = self.known_players.get(&row.id) {
            if incoming_starter && !recorded_starter {
                self.promote(tx, row)?;
                return Ok(PlayerOutcome::Promoted);
            }
            return Ok(PlayerOutcome::Skipped);
        }

        match store::insert_player(tx, row)? {
            InsertOutcome::Inserted => {
                self.known_players.insert(row.id, incoming_starter);
                Ok(PlayerOutcome::Inserted)
            }
            InsertOutcome::Conflict if incoming_starter => {
                self.promote(tx, row)?;
                Ok(PlayerOutcome::Promoted)
            }
            InsertOutcome::Conflict => {
                bail!("duplicate player {} and incoming record is not a starter", row.id)
            }
        }
    }

    fn promote(&mut self, tx: &Transaction<'_>, row: &PlayerRow) -> Result<()> {
        store::delete_player(tx, row.id)?;
        if store::insert_player(tx, row)? == InsertOutcome::Conflict {
            bail!("player {} still conflicts after starter promotion", row.id);
        }
        self.known_players.insert(row.id, true);
        Ok(())
    }
}

/// Positional fallback for player entries without roster membership:
/// entry positions 0..PLAYERS_PER_SIDE map to the first team observed in
/// the match's team-stat block, the remainder to the second.
pub fn team_for_position(index: usize, team_order: &[i64; 2]) -> i64 {
    if index < PLAYERS_PER_SIDE {
        team_order[0]
    } else {
        team_order[1]
    }
}
