use std::path::PathBuf;

use anyhow::Result;

use lol_fantasy_ingest::config::{self, RunConfig};
use lol_fantasy_ingest::fetch::HttpFetcher;
use lol_fantasy_ingest::{pipeline, store};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut cfg = RunConfig::from_env()?;
    if let Some(db_path) = parse_db_path_arg() {
        cfg.db_path = db_path;
    }
    if let Some(raw) = parse_tournaments_arg() {
        cfg.tournaments = config::parse_tournament_list(&raw)?;
    }

    let fetcher = HttpFetcher::new(cfg.timeout_secs, cfg.retry_attempts)?;
    let mut conn = store::open_db(&cfg.db_path)?;
    let summary = pipeline::run(&mut conn, &cfg, &fetcher)?;

    println!("Fantasy ingest complete");
    println!("DB: {}", cfg.db_path.display());
    for item in &summary.tournaments {
        println!(
            "tournament {}: teams={} players={} (+{} promoted) matches={} ({} unfinished) team_scores={} player_scores={} skipped={}",
            item.key,
            item.teams_inserted,
            item.players_inserted,
            item.players_promoted,
            item.matches_inserted,
            item.matches_unfinished,
            item.team_scores_inserted,
            item.player_scores_inserted,
            item.records_skipped
        );
    }

    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn parse_tournaments_arg() -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--tournaments=") {
            if !raw.trim().is_empty() {
                return Some(raw.to_string());
            }
        }
        if arg == "--tournaments"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.clone());
        }
    }
    None
}
