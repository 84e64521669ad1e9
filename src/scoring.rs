/// Fantasy points for one team's game: 2 per win, 2 per baron, 1 per
/// dragon, 2 for first blood, 1 per tower taken.
pub fn team_points(victory: i64, barons: i64, dragons: i64, first_blood: i64, towers_killed: i64) -> f64 {
    (2 * victory + 2 * barons + dragons + 2 * first_blood + towers_killed) as f64
}

/// Fantasy points for one player's game. The multi-kill arguments are
/// exclusive tier counts (games with exactly that streak); the >=10
/// kills-or-assists bonus and the linear terms use the raw totals.
pub fn player_points(
    kills: i64,
    deaths: i64,
    assists: i64,
    creep_score: i64,
    triple_kills: i64,
    quadra_kills: i64,
    penta_kills: i64,
) -> f64 {
    let bonus = if kills >= 10 || assists >= 10 { 2.0 } else { 0.0 };
    2.0 * kills as f64 - 0.5 * deaths as f64
        + 1.5 * assists as f64
        + 0.01 * creep_score as f64
        + 2.0 * triple_kills as f64
        + 5.0 * quadra_kills as f64
        + 10.0 * penta_kills as f64
        + bonus
}

/// Points columns carry a two-decimal contract; rounding happens here,
/// immediately before a row is handed to storage.
pub fn round_points(points: f64) -> f64 {
    (points * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_points_sums_weighted_objectives() {
        assert_eq!(team_points(1, 1, 2, 1, 3), 11.0);
        assert_eq!(team_points(0, 0, 0, 0, 0), 0.0);
    }

    #[test]
    fn player_points_with_kill_bonus() {
        // 24 - 2 + 4.5 + 2 + 2 + 2 = 32.5
        assert_eq!(player_points(12, 4, 3, 200, 1, 0, 0), 32.5);
    }

    #[test]
    fn player_points_bonus_triggers_on_assists_alone() {
        let without = player_points(0, 0, 9, 0, 0, 0, 0);
        let with = player_points(0, 0, 10, 0, 0, 0, 0);
        assert_eq!(without, 13.5);
        assert_eq!(with, 17.0);
    }

    #[test]
    fn player_points_can_go_negative() {
        assert!(player_points(0, 9, 0, 50, 0, 0, 0) < 0.0);
    }

    #[test]
    fn round_points_two_decimals() {
        assert_eq!(round_points(32.499), 32.5);
        assert_eq!(round_points(-1.005), -1.0);
        assert_eq!(round_points(10.0), 10.0);
    }
}
