/// Points for clearing the board.
pub const BASE_SCORE: i64 = 1000;
/// Bonus per second left on the clock.
pub const TIME_BONUS_PER_SEC: i64 = 10;
/// Penalty per move (pair of flips).
pub const MOVE_PENALTY: i64 = 5;

/// Score for a won board.
///
/// `1000 + remaining × 10 − moves × 5`. No floor: a slow, sloppy win can
/// score below zero.
pub fn calculate_score(remaining_secs: u32, moves: u32) -> i64 {
    BASE_SCORE + i64::from(remaining_secs) * TIME_BONUS_PER_SEC
        - i64::from(moves) * MOVE_PENALTY
}
