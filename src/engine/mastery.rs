use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::constants::{STRONG_TOPIC_AT_LEAST, WEAK_TOPIC_BELOW};
use crate::store::operations::attempts::AttemptSession;
use crate::store::operations::progress::{ProgressRecord, TopicMastery};

/// Fold one answer into the per-topic counters. Only the touched topic's
/// entry is recomputed; cost does not grow with history size.
pub fn record_answer(progress: &mut ProgressRecord, topic: &str, is_correct: bool) {
    let entry = match progress.topic_mastery.iter_mut().find(|t| t.topic == topic) {
        Some(entry) => entry,
        None => {
            progress.topic_mastery.push(TopicMastery {
                topic: topic.to_string(),
                mastery: 0.0,
                questions_answered: 0,
                correct_answers: 0,
            });
            progress.topic_mastery.last_mut().unwrap()
        }
    };
    entry.questions_answered += 1;
    if is_correct {
        entry.correct_answers += 1;
    }
    entry.mastery = entry.correct_answers as f64 / entry.questions_answered as f64 * 100.0;
}

/// Rebuild the weak/strong topic lists from current mastery. A topic with
/// no answered questions is neither; no topic lands in both lists.
pub fn classify_topics(progress: &mut ProgressRecord) {
    progress.weak_topics.clear();
    progress.strong_topics.clear();
    for entry in &progress.topic_mastery {
        if entry.questions_answered == 0 {
            continue;
        }
        if entry.mastery < WEAK_TOPIC_BELOW {
            progress.weak_topics.push(entry.topic.clone());
        } else if entry.mastery >= STRONG_TOPIC_AT_LEAST {
            progress.strong_topics.push(entry.topic.clone());
        }
    }
}

/// Stamp a newly started attempt onto the progress record.
pub fn start_attempt(progress: &mut ProgressRecord, attempt_id: &str, now: DateTime<Utc>) {
    progress.attempt_ids.push(attempt_id.to_string());
    progress.attempt_count += 1;
    progress.last_attempt_at = Some(now);
}

/// Fold a completed attempt's score into the record and reclassify.
pub fn complete_attempt(progress: &mut ProgressRecord, attempt: &AttemptSession) {
    if let Some(score) = attempt.score {
        if score > progress.best_score {
            progress.best_score = score;
        }
    }
    classify_topics(progress);
}

/// Cross-quiz mastery: sum raw counters per topic name across records, then
/// derive percentages from the sums. Averaging the percentages would weight
/// a 1-question quiz the same as a 50-question one.
pub fn aggregate_topic_mastery(records: &[ProgressRecord]) -> Vec<TopicMastery> {
    let mut combined: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for record in records {
        for entry in &record.topic_mastery {
            let slot = combined.entry(entry.topic.clone()).or_insert((0, 0));
            slot.0 += entry.questions_answered;
            slot.1 += entry.correct_answers;
        }
    }
    combined
        .into_iter()
        .map(|(topic, (answered, correct))| TopicMastery {
            topic,
            mastery: if answered == 0 {
                0.0
            } else {
                correct as f64 / answered as f64 * 100.0
            },
            questions_answered: answered,
            correct_answers: correct,
        })
        .collect()
}
