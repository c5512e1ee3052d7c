//! Chat progress: percentage of a unit's lessons the learner has answered.

use std::collections::HashSet;

use crate::models::messages::Message;

/// Integer percentage (floored, capped at 100) of distinct lessons answered
/// by progress-advancing messages. A unit without lessons has no progress.
pub fn lesson_progress(messages: &[Message], lesson_count: i32) -> i32 {
    if lesson_count <= 0 {
        return 0;
    }
    let answered: HashSet<i64> = messages
        .iter()
        .filter(|m| m.kind.advances_progress())
        .filter_map(|m| m.lesson_to_answer_id)
        .collect();
    let answered = i64::try_from(answered.len()).unwrap_or(i64::MAX);
    let percent = (answered.saturating_mul(100) / i64::from(lesson_count)).min(100);
    // bounded by the min above
    percent as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::messages::{MessageKind, NewMessage};
    use chrono::Utc;
    use uuid::Uuid;

    fn answer(lesson: i64) -> Message {
        let mut new = NewMessage::new(Uuid::nil(), Uuid::nil(), MessageKind::Response);
        new.lesson_to_answer_id = Some(lesson);
        new.into_record(Uuid::new_v4(), Utc::now())
    }

    fn question(lesson: i64) -> Message {
        let mut new = NewMessage::new(Uuid::nil(), Uuid::nil(), MessageKind::Orct);
        new.lesson_to_answer_id = Some(lesson);
        new.into_record(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn counts_distinct_answered_lessons() {
        let messages = vec![question(1), answer(1), answer(1), question(2), answer(3)];
        assert_eq!(lesson_progress(&messages, 3), 66);
        assert_eq!(lesson_progress(&messages, 2), 100);
    }

    #[test]
    fn questions_alone_do_not_count() {
        assert_eq!(lesson_progress(&[question(1), question(2)], 2), 0);
    }

    #[test]
    fn empty_unit_has_no_progress() {
        assert_eq!(lesson_progress(&[answer(1)], 0), 0);
    }

    #[test]
    fn caps_at_one_hundred() {
        let messages = vec![answer(1), answer(2), answer(3)];
        assert_eq!(lesson_progress(&messages, 1), 100);
    }
}
