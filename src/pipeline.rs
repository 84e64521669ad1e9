use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, Transaction};

use crate::api::{self, GameBlock, MatchData};
use crate::config::{ApiGeneration, RunConfig, TournamentConfig};
use crate::fetch::Fetch;
use crate::normalize;
use crate::resolver::{self, IdentityResolver, PlayerOutcome, TeamOutcome};
use crate::store;

#[derive(Debug, Clone, Default)]
pub struct TournamentSummary {
    pub key: String,
    pub teams_inserted: usize,
    pub players_inserted: usize,
    pub players_promoted: usize,
    pub matches_inserted: usize,
    pub matches_unfinished: usize,
    pub team_scores_inserted: usize,
    pub player_scores_inserted: usize,
    pub records_skipped: usize,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub tournaments: Vec<TournamentSummary>,
}

/// Runs the whole ingestion inside one transaction: schema reset, then
/// every configured tournament in order, then commit. Any error unwinds
/// before the commit and the store is left exactly as it was.
pub fn run(conn: &mut Connection, cfg: &RunConfig, fetcher: &dyn Fetch) -> Result<RunSummary> {
    let tx = conn.transaction().context("begin ingest transaction")?;
    store::init_schema(&tx)?;

    let mut resolver = IdentityResolver::new();
    let mut summary = RunSummary::default();
    for tcfg in &cfg.tournaments {
        let tournament = ingest_tournament(&tx, fetcher, &cfg.api_base, tcfg, &mut resolver)
            .with_context(|| format!("ingest tournament {}", tcfg.key))?;
        summary.tournaments.push(tournament);
    }

    tx.commit().context("commit ingest transaction")?;
    Ok(summary)
}

fn ingest_tournament(
    tx: &Transaction<'_>,
    fetcher: &dyn Fetch,
    api_base: &str,
    tcfg: &TournamentConfig,
    resolver: &mut IdentityResolver,
) -> Result<TournamentSummary> {
    let mut summary = TournamentSummary {
        key: tcfg.key.clone(),
        ..TournamentSummary::default()
    };

    let payload = fetcher
        .fetch_json(&api::tournament_url(api_base, tcfg.id))
        .context("fetch tournament")?;
    let tournament = api::parse_tournament(&payload).context("parse tournament")?;

    for contestant in &tournament.contestants {
        let row = normalize::team_row(contestant, &tournament.name);
        if resolver.resolve_team(tx, &row)? == TeamOutcome::Inserted {
            summary.teams_inserted += 1;
        }

        if tcfg.generation.has_roster_endpoint() {
            let payload = fetcher
                .fetch_json(&api::team_url(api_base, contestant.id))
                .with_context(|| format!("fetch roster for team {}", contestant.id))?;
            let roster = api::parse_roster(&payload)
                .with_context(|| format!("parse roster for team {}", contestant.id))?;
            for player in &roster {
                let row = normalize::player_row_from_roster(player, contestant.id as i64);
                match resolver.resolve_player(tx, &row)? {
                    PlayerOutcome::Inserted => summary.players_inserted += 1,
                    PlayerOutcome::Promoted => summary.players_promoted += 1,
                    PlayerOutcome::Skipped => {}
                }
            }
        }
    }

    let payload = fetcher
        .fetch_json(&api::stats_url(
            api_base,
            tcfg.id,
            tournament.date_begin.timestamp(),
            tournament.date_end.timestamp(),
        ))
        .context("fetch stats")?;
    let stats = api::parse_stats(&payload).context("parse stats")?;

    // The player-stat pass needs two things from the team-stat pass: the
    // finished flag per match and the order teams were first observed in
    // (the positional fallback keys off that order).
    let mut match_finished: HashMap<u64, bool> = HashMap::new();
    let mut match_team_order: HashMap<u64, [i64; 2]> = HashMap::new();

    for game in &stats.team_games {
        let payload = fetcher
            .fetch_json(&api::match_url(api_base, game.match_id))
            .with_context(|| format!("fetch match {}", game.match_id))?;
        let m = api::parse_match(&payload).with_context(|| format!("parse match {}", game.match_id))?;
        let week = week_label(tcfg.generation, &m)?;
        let finished = !tcfg.generation.tracks_finished_flag() || m.finished.unwrap_or(true);
        store::insert_match(tx, &normalize::match_row(&m, week, finished))?;
        summary.matches_inserted += 1;

        let entries = normalize::summary_entries(&game.entries, "team");
        if let Some(order) = observed_team_order(&entries) {
            match_team_order.insert(game.match_id, order);
        }

        match_finished.insert(game.match_id, finished);
        if !finished {
            summary.matches_unfinished += 1;
            println!(
                "[INFO] match {} not finished; recorded without scores",
                game.match_id
            );
            continue;
        }

        for entry in entries {
            match normalize::team_score_row(entry, &m) {
                Ok(row) => {
                    store::insert_team_score(tx, &row)?;
                    summary.team_scores_inserted += 1;
                }
                Err(err) => {
                    summary.records_skipped += 1;
                    println!(
                        "[WARN] skipping team stat record in match {}: {err}",
                        game.match_id
                    );
                }
            }
        }
    }

    for game in &stats.player_games {
        ingest_player_game(tx, tcfg, resolver, game, &match_finished, &match_team_order, &mut summary)?;
    }

    Ok(summary)
}

fn ingest_player_game(
    tx: &Transaction<'_>,
    tcfg: &TournamentConfig,
    resolver: &mut IdentityResolver,
    game: &GameBlock,
    match_finished: &HashMap<u64, bool>,
    match_team_order: &HashMap<u64, [i64; 2]>,
    summary: &mut TournamentSummary,
) -> Result<()> {
    let Some(&finished) = match_finished.get(&game.match_id) else {
        summary.records_skipped += 1;
        println!(
            "[WARN] player stats reference unknown match {}; skipping block",
            game.match_id
        );
        return Ok(());
    };
    if !finished {
        return Ok(());
    }

    let entries = normalize::summary_entries(&game.entries, "player");

    let team_order = if tcfg.generation.has_roster_endpoint() {
        None
    } else {
        let Some(order) = match_team_order.get(&game.match_id) else {
            summary.records_skipped += entries.len();
            println!(
                "[WARN] no team order observed for match {}; skipping player block",
                game.match_id
            );
            return Ok(());
        };
        Some(order)
    };

    for (index, entry) in entries.iter().enumerate() {
        // Without a roster endpoint the player is first seen here, so the
        // row is created (or promoted) before its score references it.
        if let Some(order) = team_order {
            let team_id = resolver::team_for_position(index, order);
            match normalize::player_row_from_stats(entry, team_id) {
                Ok(row) => match resolver.resolve_player(tx, &row)? {
                    PlayerOutcome::Inserted => summary.players_inserted += 1,
                    PlayerOutcome::Promoted => summary.players_promoted += 1,
                    PlayerOutcome::Skipped => {}
                },
                Err(err) => {
                    summary.records_skipped += 1;
                    println!(
                        "[WARN] skipping player record in match {}: {err}",
                        game.match_id
                    );
                    continue;
                }
            }
        }

        match normalize::player_score_row(
            entry,
            game.match_id as i64,
            tcfg.generation.multi_kill_convention(),
        ) {
            Ok(row) => {
                store::insert_player_score(tx, &row)?;
                summary.player_scores_inserted += 1;
            }
            Err(err) => {
                summary.records_skipped += 1;
                println!(
                    "[WARN] skipping player stat record in match {}: {err}",
                    game.match_id
                );
            }
        }
    }

    Ok(())
}

/// Week and round are the same opaque label seen through different API
/// generations; whichever the payload carries is stored as-is.
fn week_label(generation: ApiGeneration, m: &MatchData) -> Result<String> {
    let label = match generation {
        ApiGeneration::Classic => m.round.clone().or_else(|| m.week.clone()),
        ApiGeneration::Relaunch => m.week.clone().or_else(|| m.round.clone()),
    };
    label.ok_or_else(|| anyhow!("match {} has no week/round label", m.id))
}

fn observed_team_order(entries: &[&serde_json::Value]) -> Option<[i64; 2]> {
    let mut order: Vec<i64> = Vec::with_capacity(2);
    for entry in entries {
        let Some(team_id) = entry.get("teamId").and_then(api::as_i64_any) else {
            continue;
        };
        if !order.contains(&team_id) {
            order.push(team_id);
        }
    }
    if order.len() == 2 {
        Some([order[0], order[1]])
    } else {
        None
    }
}
