use anyhow::{Result, anyhow};
use serde_json::{Map, Value};

use crate::api::{self, Contestant, MatchData, RosterPlayer};
use crate::scoring;
use crate::store::{MatchRow, PlayerRow, PlayerScoreRow, Side, TeamRow, TeamScoreRow};

/// How the stats endpoint reports multi-kill counters. Older payloads
/// report cumulative ">=N streak" counts; newer ones report per-tier
/// counts directly. Scoring always consumes exclusive tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiKillConvention {
    Cumulative,
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiKills {
    pub double: i64,
    pub triple: i64,
    pub quadra: i64,
    pub penta: i64,
}

impl MultiKills {
    pub fn from_raw(
        double: i64,
        triple: i64,
        quadra: i64,
        penta: i64,
        convention: MultiKillConvention,
    ) -> Self {
        match convention {
            MultiKillConvention::Cumulative => Self {
                double: double - triple,
                triple: triple - quadra,
                quadra: quadra - penta,
                penta,
            },
            MultiKillConvention::Exclusive => Self {
                double,
                triple,
                quadra,
                penta,
            },
        }
    }
}

/// Summary entries of one stat block, selected by key substring ("team" /
/// "player") in payload order. Metadata keys like matchId sit alongside
/// the summaries, so selection is by key, never by position.
pub fn summary_entries<'a>(block: &'a Map<String, Value>, needle: &str) -> Vec<&'a Value> {
    block
        .iter()
        .filter(|(key, value)| key.contains(needle) && value.is_object())
        .map(|(_, value)| value)
        .collect()
}

pub fn team_row(contestant: &Contestant, tournament_name: &str) -> TeamRow {
    TeamRow {
        id: contestant.id as i64,
        name: contestant.name.trim().to_string(),
        code: contestant.acronym.clone(),
        // The upstream tournament name leads with its region tag.
        region: tournament_name.chars().take(2).collect(),
    }
}

pub fn player_row_from_roster(player: &RosterPlayer, team_id: i64) -> PlayerRow {
    PlayerRow {
        id: player.id as i64,
        team_id,
        name: player.name.clone(),
        role: player.role.clone(),
        starter: player.starter,
        avg_game_points: player.avg_game_points,
    }
}

/// Builds a player row from a stats-endpoint summary entry, for the
/// generation without a roster endpoint. The rolling-average field is
/// optional upstream and defaults to zero.
pub fn player_row_from_stats(entry: &Value, team_id: i64) -> Result<PlayerRow> {
    Ok(PlayerRow {
        id: require_i64(entry, "playerId")?,
        team_id,
        name: require_str(entry, "name")?,
        role: require_str(entry, "role")?,
        starter: Some(entry.get("isStarter").and_then(api::as_bool_any).unwrap_or(false)),
        avg_game_points: Some(
            entry
                .get("avgGamePoints")
                .and_then(api::as_f64_any)
                .unwrap_or(0.0),
        ),
    })
}

pub fn match_row(m: &MatchData, week: String, finished: bool) -> MatchRow {
    MatchRow {
        id: m.id as i64,
        team1_id: m.blue_id as i64,
        team2_id: m.red_id as i64,
        date_time: m.date_time,
        week,
        tournament: m.tournament_name.clone(),
        finished,
    }
}

pub fn team_score_row(entry: &Value, m: &MatchData) -> Result<TeamScoreRow> {
    let team_id = require_i64(entry, "teamId")?;
    let side = if team_id as u64 == m.blue_id {
        Side::Blue
    } else {
        Side::Red
    };

    let victory = require_i64(entry, "matchVictory")?;
    let defeat = require_i64(entry, "matchDefeat")?;
    let barons = require_i64(entry, "baronsKilled")?;
    let dragons = require_i64(entry, "dragonsKilled")?;
    let first_blood = require_i64(entry, "firstBlood")?;
    let first_tower = require_i64(entry, "firstTower")?;
    let first_inhibitor = require_i64(entry, "firstInhibitor")?;
    let towers_killed = require_i64(entry, "towersKilled")?;

    Ok(TeamScoreRow {
        team_id,
        match_id: m.id as i64,
        side,
        victory,
        defeat,
        barons,
        dragons,
        first_blood,
        first_tower,
        first_inhibitor,
        towers_killed,
        points: scoring::round_points(scoring::team_points(
            victory,
            barons,
            dragons,
            first_blood,
            towers_killed,
        )),
    })
}

pub fn player_score_row(
    entry: &Value,
    match_id: i64,
    convention: MultiKillConvention,
) -> Result<PlayerScoreRow> {
    let player_id = require_i64(entry, "playerId")?;
    let kills = require_i64(entry, "kills")?;
    let deaths = require_i64(entry, "deaths")?;
    let assists = require_i64(entry, "assists")?;
    let creep_score = require_i64(entry, "minionKills")?;
    let tiers = MultiKills::from_raw(
        require_i64(entry, "doubleKills")?,
        require_i64(entry, "tripleKills")?,
        require_i64(entry, "quadraKills")?,
        require_i64(entry, "pentaKills")?,
        convention,
    );

    Ok(PlayerScoreRow {
        player_id,
        match_id,
        kills,
        deaths,
        assists,
        creep_score,
        double_kills: tiers.double,
        triple_kills: tiers.triple,
        quadra_kills: tiers.quadra,
        penta_kills: tiers.penta,
        points: scoring::round_points(scoring::player_points(
            kills,
            deaths,
            assists,
            creep_score,
            tiers.triple,
            tiers.quadra,
            tiers.penta,
        )),
    })
}

fn require_i64(entry: &Value, key: &str) -> Result<i64> {
    entry
        .get(key)
        .and_then(api::as_i64_any)
        .ok_or_else(|| anyhow!("missing stat field {key}"))
}

fn require_str(entry: &Value, key: &str) -> Result<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("missing stat field {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn sample_match() -> MatchData {
        MatchData {
            id: 5001,
            blue_id: 1,
            red_id: 2,
            date_time: Utc::now(),
            week: None,
            round: Some("Week 1".to_string()),
            tournament_name: None,
            finished: None,
        }
    }

    #[test]
    fn cumulative_counters_decompose_into_exclusive_tiers() {
        let tiers = MultiKills::from_raw(5, 2, 1, 0, MultiKillConvention::Cumulative);
        assert_eq!(
            tiers,
            MultiKills {
                double: 3,
                triple: 1,
                quadra: 1,
                penta: 0
            }
        );
        // Sanity: tier sizes times counts stay within a plausible kill total.
        let weighted = 2 * tiers.double + 3 * tiers.triple + 4 * tiers.quadra + 5 * tiers.penta;
        assert!(weighted <= 20);
    }

    #[test]
    fn exclusive_counters_pass_through() {
        let tiers = MultiKills::from_raw(3, 1, 1, 0, MultiKillConvention::Exclusive);
        assert_eq!(
            tiers,
            MultiKills {
                double: 3,
                triple: 1,
                quadra: 1,
                penta: 0
            }
        );
    }

    #[test]
    fn summary_entries_filter_by_key_in_order() {
        let block = json!({
            "matchId": 5001,
            "teamOne": {"teamId": 1},
            "gameId": 9,
            "teamTwo": {"teamId": 2}
        });
        let entries = summary_entries(block.as_object().unwrap(), "team");
        let ids: Vec<i64> = entries
            .iter()
            .map(|e| e.get("teamId").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn side_assignment_compares_blue_contestant() {
        let m = sample_match();
        let blue = json!({
            "teamId": 1, "matchVictory": 1, "matchDefeat": 0, "baronsKilled": 1,
            "dragonsKilled": 2, "firstBlood": 1, "firstTower": 1,
            "firstInhibitor": 1, "towersKilled": 3
        });
        let red = json!({
            "teamId": 2, "matchVictory": 0, "matchDefeat": 1, "baronsKilled": 0,
            "dragonsKilled": 1, "firstBlood": 0, "firstTower": 0,
            "firstInhibitor": 0, "towersKilled": 1
        });
        let blue_row = team_score_row(&blue, &m).unwrap();
        let red_row = team_score_row(&red, &m).unwrap();
        assert_eq!(blue_row.side, Side::Blue);
        assert_eq!(red_row.side, Side::Red);
        assert_eq!(blue_row.points, 11.0);
    }

    #[test]
    fn team_score_row_rejects_missing_counters() {
        let m = sample_match();
        let entry = json!({"teamId": 1, "matchVictory": 1});
        assert!(team_score_row(&entry, &m).is_err());
    }

    #[test]
    fn player_score_row_scores_exclusive_tiers() {
        let entry = json!({
            "playerId": 11, "kills": 12, "deaths": 4, "assists": 3,
            "minionKills": 200, "doubleKills": 1, "tripleKills": 1,
            "quadraKills": 0, "pentaKills": 0
        });
        let row = player_score_row(&entry, 5001, MultiKillConvention::Cumulative).unwrap();
        assert_eq!(row.double_kills, 0);
        assert_eq!(row.triple_kills, 1);
        assert_eq!(row.points, 32.5);
    }

    #[test]
    fn team_row_trims_name_and_tags_region() {
        let contestant = Contestant {
            id: 7,
            name: "SK Gaming ".to_string(),
            acronym: "SK".to_string(),
        };
        let row = team_row(&contestant, "EU LCS Summer");
        assert_eq!(row.name, "SK Gaming");
        assert_eq!(row.region, "EU");
    }
}
