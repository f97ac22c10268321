use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::constants::{
    LEVEL_BASE_STEP_XP, LEVEL_STEP_GROWTH_XP, STREAK_BADGE_DAYS, XP_BASE, XP_SPEED_BONUS,
    XP_SPEED_CUTOFF_SECS_PER_LIMIT_MINUTE,
};
use crate::store::operations::attempts::AttemptSession;
use crate::store::operations::game_states::{Badge, BadgeCategory, GameState};
use crate::store::operations::quizzes::Quiz;

pub const BADGE_FIRST_QUIZ: &str = "first_quiz";
pub const BADGE_TEN_QUIZZES: &str = "ten_quizzes";
pub const BADGE_PERFECT_ACCURACY: &str = "perfect_accuracy";
pub const BADGE_WEEK_STREAK: &str = "week_streak";

/// What one completed attempt earned; serialized straight into the
/// results payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardOutcome {
    pub xp_gained: u64,
    pub total_xp: u64,
    pub level: u32,
    pub level_up: Option<LevelUp>,
    pub level_progress_percent: f64,
    pub streak_current: u32,
    pub new_badges: Vec<Badge>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
}

/// Base 50, plus 10 per full ten points of score, plus a flat speed bonus
/// when the whole attempt took under 30 seconds per limit minute.
pub fn xp_for_attempt(score: f64, time_spent_seconds: u64, time_limit_minutes: u32) -> u64 {
    let mut xp = XP_BASE + (score / 10.0).floor() as u64 * 10;
    let cutoff = time_limit_minutes as u64 * XP_SPEED_CUTOFF_SECS_PER_LIMIT_MINUTE;
    if time_spent_seconds < cutoff {
        xp += XP_SPEED_BONUS;
    }
    xp
}

/// Total xp needed to reach `level`. Level 1 is free; the step to level 2
/// costs 100 xp and each step after reaching level L grows by L * 50.
pub fn xp_threshold(level: u32) -> u64 {
    let mut threshold = 0u64;
    let mut step = LEVEL_BASE_STEP_XP;
    for reached in 2..=level {
        threshold += step;
        step += reached as u64 * LEVEL_STEP_GROWTH_XP;
    }
    threshold
}

pub fn level_for_xp(xp: u64) -> u32 {
    let mut level = 1;
    while xp >= xp_threshold(level + 1) {
        level += 1;
    }
    level
}

/// Position within the current level as a percentage, clamped to [0, 100].
pub fn level_progress_percent(xp: u64) -> f64 {
    let level = level_for_xp(xp);
    let lower = xp_threshold(level);
    let upper = xp_threshold(level + 1);
    let span = (upper - lower) as f64;
    (((xp - lower) as f64 / span) * 100.0).clamp(0.0, 100.0)
}

fn update_streak(state: &mut GameState, now: DateTime<Utc>) {
    let today = now.date_naive();
    match state.streak.last_activity {
        None => state.streak.current = 1,
        Some(last) => {
            let gap = today.num_days_from_ce() - last.date_naive().num_days_from_ce();
            if gap == 1 {
                state.streak.current += 1;
            } else if gap > 1 {
                state.streak.current = 1;
            }
            // Same day: unchanged.
        }
    }
    state.streak.longest = state.streak.longest.max(state.streak.current);
    state.streak.last_activity = Some(now);
}

fn update_stats(state: &mut GameState, attempt: &AttemptSession) {
    let stats = &mut state.stats;
    stats.quizzes_completed += 1;
    stats.questions_answered += attempt.answers.len() as u32;
    stats.correct_answers += attempt.correct_count;
    stats.average_accuracy = if stats.questions_answered == 0 {
        0.0
    } else {
        stats.correct_answers as f64 / stats.questions_answered as f64 * 100.0
    };
    stats.total_time_minutes += attempt.time_spent_seconds as f64 / 60.0;
    stats.fastest_completion_seconds = Some(match stats.fastest_completion_seconds {
        Some(best) => best.min(attempt.time_spent_seconds),
        None => attempt.time_spent_seconds,
    });
}

fn award_badges(state: &mut GameState, now: DateTime<Utc>) -> Vec<Badge> {
    let mut earned = Vec::new();
    let mut grant = |state: &mut GameState, id: &str, category: BadgeCategory| {
        if !state.has_badge(id) {
            let badge = Badge {
                id: id.to_string(),
                category,
                unlocked_at: now,
            };
            state.badges.push(badge.clone());
            earned.push(badge);
        }
    };

    if state.stats.quizzes_completed >= 1 {
        grant(state, BADGE_FIRST_QUIZ, BadgeCategory::Milestone);
    }
    if state.stats.quizzes_completed >= 10 {
        grant(state, BADGE_TEN_QUIZZES, BadgeCategory::Milestone);
    }
    if state.stats.questions_answered > 0
        && state.stats.correct_answers == state.stats.questions_answered
    {
        grant(state, BADGE_PERFECT_ACCURACY, BadgeCategory::Accuracy);
    }
    if state.streak.current >= STREAK_BADGE_DAYS {
        grant(state, BADGE_WEEK_STREAK, BadgeCategory::Streak);
    }
    earned
}

/// Fold one completed attempt into the student's game state. Pure over its
/// inputs; the caller persists the returned state under the per-student
/// lock and decides what to do when persistence fails.
pub fn apply_attempt_reward(
    state: &GameState,
    attempt: &AttemptSession,
    quiz: &Quiz,
    now: DateTime<Utc>,
) -> (GameState, RewardOutcome) {
    let mut next = state.clone();

    let score = attempt.score.unwrap_or(0.0);
    let xp_gained = xp_for_attempt(
        score,
        attempt.time_spent_seconds,
        quiz.settings.time_limit_minutes,
    );
    next.xp += xp_gained;

    let previous_level = next.level;
    next.level = level_for_xp(next.xp);
    let level_up = (next.level > previous_level).then_some(LevelUp {
        from: previous_level,
        to: next.level,
    });

    update_streak(&mut next, now);
    update_stats(&mut next, attempt);
    let new_badges = award_badges(&mut next, now);

    let outcome = RewardOutcome {
        xp_gained,
        total_xp: next.xp,
        level: next.level,
        level_up,
        level_progress_percent: level_progress_percent(next.xp),
        streak_current: next.streak.current,
        new_badges,
    };
    (next, outcome)
}
