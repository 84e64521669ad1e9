use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fixed upstream pattern, e.g. "2014-05-20T15:00Z".
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

pub fn tournament_url(base: &str, tournament_id: u64) -> String {
    format!("{base}/tournament/{tournament_id}.json")
}

pub fn team_url(base: &str, team_id: u64) -> String {
    format!("{base}/team/{team_id}.json")
}

pub fn match_url(base: &str, match_id: u64) -> String {
    format!("{base}/match/{match_id}.json")
}

pub fn stats_url(base: &str, tournament_id: u64, date_begin: i64, date_end: i64) -> String {
    format!("{base}/gameStatsFantasy.json?tournamentId={tournament_id}&dateBegin={date_begin}&dateEnd={date_end}")
}

pub fn parse_api_datetime(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .map(|dt| dt.and_utc())
        .with_context(|| format!("invalid upstream datetime {raw:?}"))
}

#[derive(Debug, Clone)]
pub struct TournamentData {
    pub name: String,
    pub date_begin: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    /// Contestants in payload order.
    pub contestants: Vec<Contestant>,
}

#[derive(Debug, Clone)]
pub struct Contestant {
    pub id: u64,
    pub name: String,
    pub acronym: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterPlayer {
    #[serde(rename = "playerId")]
    pub id: u64,
    pub name: String,
    pub role: String,
    #[serde(rename = "isStarter", default)]
    pub starter: Option<bool>,
    #[serde(rename = "avgGamePoints", default)]
    pub avg_game_points: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct MatchData {
    pub id: u64,
    pub blue_id: u64,
    pub red_id: u64,
    pub date_time: DateTime<Utc>,
    pub week: Option<String>,
    pub round: Option<String>,
    pub tournament_name: Option<String>,
    pub finished: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct StatsData {
    pub team_games: Vec<GameBlock>,
    pub player_games: Vec<GameBlock>,
}

/// One per-match stat block from the aggregate stats endpoint. `entries`
/// keeps the block's full keyed object in payload order; summary entries
/// are mixed with metadata keys and are selected later by key substring.
#[derive(Debug, Clone)]
pub struct GameBlock {
    pub match_id: u64,
    pub entries: Map<String, Value>,
}

pub fn parse_tournament(v: &Value) -> Result<TournamentData> {
    let name = v
        .get("name")
        .and_then(Value::as_str)
        .context("tournament payload missing name")?
        .to_string();
    let date_begin = parse_api_datetime(
        v.get("dateBegin")
            .and_then(Value::as_str)
            .context("tournament payload missing dateBegin")?,
    )?;
    let date_end = parse_api_datetime(
        v.get("dateEnd")
            .and_then(Value::as_str)
            .context("tournament payload missing dateEnd")?,
    )?;

    let mut contestants = Vec::new();
    if let Some(obj) = v.get("contestants").and_then(Value::as_object) {
        for (key, entry) in obj {
            contestants.push(parse_contestant(entry).with_context(|| format!("invalid contestant {key}"))?);
        }
    }

    Ok(TournamentData {
        name,
        date_begin,
        date_end,
        contestants,
    })
}

fn parse_contestant(v: &Value) -> Result<Contestant> {
    let id = v
        .get("id")
        .and_then(as_u64_any)
        .ok_or_else(|| anyhow!("missing contestant id"))?;
    let name = v
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing contestant name"))?
        .to_string();
    let acronym = v
        .get("acronym")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing contestant acronym"))?
        .to_string();
    Ok(Contestant { id, name, acronym })
}

pub fn parse_roster(v: &Value) -> Result<Vec<RosterPlayer>> {
    let roster = v
        .get("roster")
        .and_then(Value::as_object)
        .context("team payload missing roster object")?;
    let mut out = Vec::with_capacity(roster.len());
    for (key, entry) in roster {
        let player: RosterPlayer = serde_json::from_value(entry.clone())
            .with_context(|| format!("invalid roster entry {key}"))?;
        out.push(player);
    }
    Ok(out)
}

pub fn parse_match(v: &Value) -> Result<MatchData> {
    let id = v
        .get("matchId")
        .and_then(as_u64_any)
        .context("match payload missing matchId")?;
    let contestants = v
        .get("contestants")
        .context("match payload missing contestants")?;
    let blue_id = contestants
        .get("blue")
        .and_then(|c| c.get("id"))
        .and_then(as_u64_any)
        .context("match payload missing blue contestant id")?;
    let red_id = contestants
        .get("red")
        .and_then(|c| c.get("id"))
        .and_then(as_u64_any)
        .context("match payload missing red contestant id")?;
    let date_time = parse_api_datetime(
        v.get("dateTime")
            .and_then(Value::as_str)
            .context("match payload missing dateTime")?,
    )?;

    let tournament = v.get("tournament");
    let round = tournament
        .and_then(|t| t.get("round"))
        .and_then(as_label_any);
    let week = v.get("week").and_then(as_label_any);
    let tournament_name = tournament
        .and_then(|t| t.get("name"))
        .and_then(Value::as_str)
        .map(|s| s.to_string());
    let finished = v.get("isFinished").and_then(as_bool_any);

    Ok(MatchData {
        id,
        blue_id,
        red_id,
        date_time,
        week,
        round,
        tournament_name,
        finished,
    })
}

pub fn parse_stats(v: &Value) -> Result<StatsData> {
    Ok(StatsData {
        team_games: parse_game_blocks(v.get("teamStats")).context("invalid teamStats")?,
        player_games: parse_game_blocks(v.get("playerStats")).context("invalid playerStats")?,
    })
}

fn parse_game_blocks(section: Option<&Value>) -> Result<Vec<GameBlock>> {
    let Some(obj) = section.and_then(Value::as_object) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(obj.len());
    for (key, game) in obj {
        let block = game
            .as_object()
            .ok_or_else(|| anyhow!("game block {key} is not an object"))?;
        let match_id = block
            .get("matchId")
            .and_then(as_u64_any)
            .ok_or_else(|| anyhow!("game block {key} missing matchId"))?;
        out.push(GameBlock {
            match_id,
            entries: block.clone(),
        });
    }
    Ok(out)
}

// Upstream is inconsistent about numeric fields: ids arrive as strings on
// some endpoints and as numbers on others.
pub fn as_u64_any(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<u64>().ok()
}

pub fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

pub fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok()
}

pub fn as_bool_any(v: &Value) -> Option<bool> {
    if let Some(b) = v.as_bool() {
        return Some(b);
    }
    as_i64_any(v).map(|n| n != 0)
}

fn as_label_any(v: &Value) -> Option<String> {
    if let Some(s) = v.as_str() {
        return Some(s.to_string());
    }
    v.as_i64().map(|n| n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_api_datetime_fixed_pattern() {
        let dt = parse_api_datetime("2014-05-20T15:00Z").unwrap();
        assert_eq!(dt.timestamp(), 1_400_598_000);
        assert!(parse_api_datetime("2014-05-20 15:00").is_err());
    }

    #[test]
    fn contestant_ids_accept_strings_and_numbers() {
        let string_id = json!({"id": "7", "name": "SK Gaming ", "acronym": "SK"});
        let numeric_id = json!({"id": 7, "name": "SK Gaming", "acronym": "SK"});
        assert_eq!(parse_contestant(&string_id).unwrap().id, 7);
        assert_eq!(parse_contestant(&numeric_id).unwrap().id, 7);
    }

    #[test]
    fn game_blocks_preserve_payload_order() {
        let v = json!({
            "teamStats": {
                "b": {"matchId": 2},
                "a": {"matchId": 1},
                "c": {"matchId": "3"}
            }
        });
        let stats = parse_stats(&v).unwrap();
        let ids: Vec<u64> = stats.team_games.iter().map(|g| g.match_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert!(stats.player_games.is_empty());
    }

    #[test]
    fn match_payload_optional_fields() {
        let v = json!({
            "matchId": 5001,
            "contestants": {"blue": {"id": "1"}, "red": {"id": "2"}},
            "dateTime": "2014-06-01T17:00Z",
            "tournament": {"round": "Week 4", "name": "Summer Split"},
            "isFinished": 1
        });
        let m = parse_match(&v).unwrap();
        assert_eq!((m.blue_id, m.red_id), (1, 2));
        assert_eq!(m.round.as_deref(), Some("Week 4"));
        assert_eq!(m.week, None);
        assert_eq!(m.finished, Some(true));
    }
}
