use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, params};

#[derive(Debug, Clone)]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct PlayerRow {
    pub id: i64,
    pub team_id: i64,
    pub name: String,
    pub role: String,
    pub starter: Option<bool>,
    pub avg_game_points: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct MatchRow {
    pub id: i64,
    pub team1_id: i64,
    pub team2_id: i64,
    pub date_time: DateTime<Utc>,
    pub week: String,
    pub tournament: Option<String>,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Blue,
    Red,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Blue => "blue",
            Side::Red => "red",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamScoreRow {
    pub team_id: i64,
    pub match_id: i64,
    pub side: Side,
    pub victory: i64,
    pub defeat: i64,
    pub barons: i64,
    pub dragons: i64,
    pub first_blood: i64,
    pub first_tower: i64,
    pub first_inhibitor: i64,
    pub towers_killed: i64,
    pub points: f64,
}

#[derive(Debug, Clone)]
pub struct PlayerScoreRow {
    pub player_id: i64,
    pub match_id: i64,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub creep_score: i64,
    pub double_kills: i64,
    pub triple_kills: i64,
    pub quadra_kills: i64,
    pub penta_kills: i64,
    pub points: f64,
}

/// Result of an insert that callers may need to branch on. A primary-key
/// collision surfaces as `Conflict`; every other failure is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Conflict,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", true)
        .context("enable foreign keys")?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    conn.pragma_update(None, "foreign_keys", true)
        .context("enable foreign keys")?;
    Ok(conn)
}

/// Every run re-derives the whole dataset, so the schema is dropped and
/// recreated up front. Drop order is children first to satisfy the
/// cascading foreign keys.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS player_scores;
        DROP TABLE IF EXISTS team_scores;
        DROP TABLE IF EXISTS matches;
        DROP TABLE IF EXISTS players;
        DROP TABLE IF EXISTS teams;

        CREATE TABLE teams (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            region TEXT NOT NULL
        );

        CREATE TABLE players (
            id INTEGER PRIMARY KEY,
            team_id INTEGER NOT NULL
                REFERENCES teams(id) ON DELETE CASCADE ON UPDATE CASCADE,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            starter INTEGER NULL,
            avg_game_points REAL NULL
        );

        CREATE TABLE matches (
            id INTEGER PRIMARY KEY,
            team1_id INTEGER NOT NULL
                REFERENCES teams(id) ON DELETE CASCADE ON UPDATE CASCADE,
            team2_id INTEGER NOT NULL
                REFERENCES teams(id) ON DELETE CASCADE ON UPDATE CASCADE,
            datetime TEXT NOT NULL,
            week TEXT NOT NULL,
            tournament TEXT NULL,
            finished INTEGER NOT NULL
        );

        CREATE TABLE team_scores (
            team_id INTEGER NOT NULL
                REFERENCES teams(id) ON DELETE CASCADE ON UPDATE CASCADE,
            match_id INTEGER NOT NULL
                REFERENCES matches(id) ON DELETE CASCADE ON UPDATE CASCADE,
            side TEXT NOT NULL,
            victory INTEGER NOT NULL,
            defeat INTEGER NOT NULL,
            barons INTEGER NOT NULL,
            dragons INTEGER NOT NULL,
            first_blood INTEGER NOT NULL,
            first_tower INTEGER NOT NULL,
            first_inhibitor INTEGER NOT NULL,
            towers_killed INTEGER NOT NULL,
            points REAL NOT NULL,
            PRIMARY KEY (team_id, match_id)
        );

        CREATE TABLE player_scores (
            player_id INTEGER NOT NULL
                REFERENCES players(id) ON DELETE CASCADE ON UPDATE CASCADE,
            match_id INTEGER NOT NULL
                REFERENCES matches(id) ON DELETE CASCADE ON UPDATE CASCADE,
            kills INTEGER NOT NULL,
            deaths INTEGER NOT NULL,
            assists INTEGER NOT NULL,
            creep_score INTEGER NOT NULL,
            double_kills INTEGER NOT NULL,
            triple_kills INTEGER NOT NULL,
            quadra_kills INTEGER NOT NULL,
            penta_kills INTEGER NOT NULL,
            points REAL NOT NULL,
            PRIMARY KEY (player_id, match_id)
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn insert_team(tx: &Transaction<'_>, row: &TeamRow) -> Result<InsertOutcome> {
    pk_guarded(tx.execute(
        "INSERT INTO teams (id, name, code, region) VALUES (?1, ?2, ?3, ?4)",
        params![row.id, row.name, row.code, row.region],
    ))
    .context("insert team")
}

pub fn insert_player(tx: &Transaction<'_>, row: &PlayerRow) -> Result<InsertOutcome> {
    pk_guarded(tx.execute(
        "INSERT INTO players (id, team_id, name, role, starter, avg_game_points)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.id,
            row.team_id,
            row.name,
            row.role,
            row.starter.map(|b| b as i64),
            row.avg_game_points,
        ],
    ))
    .context("insert player")
}

pub fn delete_player(tx: &Transaction<'_>, player_id: i64) -> Result<()> {
    tx.execute("DELETE FROM players WHERE id = ?1", params![player_id])
        .context("delete player")?;
    Ok(())
}

pub fn insert_match(tx: &Transaction<'_>, row: &MatchRow) -> Result<()> {
    tx.execute(
        "INSERT INTO matches (id, team1_id, team2_id, datetime, week, tournament, finished)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            row.id,
            row.team1_id,
            row.team2_id,
            row.date_time.to_rfc3339(),
            row.week,
            row.tournament,
            row.finished as i64,
        ],
    )
    .with_context(|| format!("insert match {}", row.id))?;
    Ok(())
}

pub fn insert_team_score(tx: &Transaction<'_>, row: &TeamScoreRow) -> Result<()> {
    tx.execute(
        "INSERT INTO team_scores (
            team_id, match_id, side, victory, defeat, barons, dragons,
            first_blood, first_tower, first_inhibitor, towers_killed, points
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            row.team_id,
            row.match_id,
            row.side.as_str(),
            row.victory,
            row.defeat,
            row.barons,
            row.dragons,
            row.first_blood,
            row.first_tower,
            row.first_inhibitor,
            row.towers_killed,
            row.points,
        ],
    )
    .with_context(|| format!("insert team score ({}, {})", row.team_id, row.match_id))?;
    Ok(())
}

pub fn insert_player_score(tx: &Transaction<'_>, row: &PlayerScoreRow) -> Result<()> {
    tx.execute(
        "INSERT INTO player_scores (
            player_id, match_id, kills, deaths, assists, creep_score,
            double_kills, triple_kills, quadra_kills, penta_kills, points
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            row.player_id,
            row.match_id,
            row.kills,
            row.deaths,
            row.assists,
            row.creep_score,
            row.double_kills,
            row.triple_kills,
            row.quadra_kills,
            row.penta_kills,
            row.points,
        ],
    )
    .with_context(|| format!("insert player score ({}, {})", row.player_id, row.match_id))?;
    Ok(())
}

fn pk_guarded(res: rusqlite::Result<usize>) -> Result<InsertOutcome> {
    match res {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Ok(InsertOutcome::Conflict)
        }
        Err(err) => Err(err.into()),
    }
}
