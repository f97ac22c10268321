//! Tuning constants for the assessment and reward engines.

/// Rolling-accuracy thresholds for adaptive difficulty selection.
pub const ADAPTIVE_HARD_ACCURACY: f64 = 0.8;
pub const ADAPTIVE_MEDIUM_ACCURACY: f64 = 0.6;

/// Mastery classification bounds (percentages).
pub const WEAK_TOPIC_BELOW: f64 = 70.0;
pub const STRONG_TOPIC_AT_LEAST: f64 = 80.0;

/// Experience formula: base + floor(score/10)*10 + speed bonus.
pub const XP_BASE: u64 = 50;
pub const XP_SPEED_BONUS: u64 = 20;
/// Speed bonus applies when the attempt finished in under half the time
/// limit: time_limit_minutes * 60 / 2 = time_limit_minutes * 30 seconds.
pub const XP_SPEED_CUTOFF_SECS_PER_LIMIT_MINUTE: u64 = 30;

/// Level curve: cumulative xp to reach level 2, and the per-level growth of
/// the step between thresholds.
pub const LEVEL_BASE_STEP_XP: u64 = 100;
pub const LEVEL_STEP_GROWTH_XP: u64 = 50;

/// Streak length that unlocks the streak badge.
pub const STREAK_BADGE_DAYS: u32 = 7;

/// Question point values by difficulty.
pub const POINTS_EASY: u32 = 5;
pub const POINTS_MEDIUM: u32 = 10;
pub const POINTS_HARD: u32 = 15;

/// Invite codes are short, uppercase alphanumeric.
pub const INVITE_CODE_LEN: usize = 6;

/// Hard cap on questions accepted into a single quiz.
pub const MAX_QUESTIONS_PER_QUIZ: usize = 100;
