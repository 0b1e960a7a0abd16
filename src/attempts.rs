// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::db::Database;
use crate::error::Fallible;
use crate::types::attempt::AttemptId;
use crate::types::attempt::QuizAttempt;
use crate::types::timestamp::Timestamp;

const ATTEMPTS_KEY: &str = "tajweed_attempts";

/// The append-only history of completed quizzes.
///
/// The whole list is stored under one key and rewritten on every append.
#[derive(Clone)]
pub struct AttemptStore {
    db: Database,
}

impl AttemptStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add an attempt to the end of the history.
    pub fn append(&self, attempt: &QuizAttempt) -> Fallible<()> {
        self.db.update(ATTEMPTS_KEY, |current| {
            let mut history = parse_history(current);
            history.push(attempt.clone());
            Ok(serde_json::to_string(&history)?)
        })?;
        log::debug!(
            "Saved attempt {} ({}/{})",
            attempt.id,
            attempt.correct_count,
            attempt.questions_count
        );
        Ok(())
    }

    /// Every stored attempt, newest first.
    pub fn list_all(&self) -> Fallible<Vec<QuizAttempt>> {
        let mut history = parse_history(self.db.get(ATTEMPTS_KEY)?);
        history.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(history)
    }

    pub fn find_by_id(&self, id: &str) -> Fallible<Option<QuizAttempt>> {
        let history = parse_history(self.db.get(ATTEMPTS_KEY)?);
        Ok(history.into_iter().find(|attempt| attempt.id.matches(id)))
    }

    /// A time-based identifier that is greater than every stored one.
    pub fn next_id(&self, now: Timestamp) -> Fallible<AttemptId> {
        let history = parse_history(self.db.get(ATTEMPTS_KEY)?);
        let candidate = now.millis();
        let id = match history.iter().map(|attempt| attempt.id.value()).max() {
            Some(max) if max >= candidate => max + 1,
            _ => candidate,
        };
        Ok(AttemptId::new(id))
    }
}

/// An absent or unreadable history reads as empty.
fn parse_history(raw: Option<String>) -> Vec<QuizAttempt> {
    match raw {
        None => Vec::new(),
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(history) => history,
            Err(e) => {
                log::warn!("Attempt history is unreadable, treating it as empty: {e}");
                Vec::new()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;

    fn attempt(id: i64, day: u32, score: u8) -> QuizAttempt {
        QuizAttempt {
            id: AttemptId::new(id),
            date: Timestamp::new(Utc.with_ymd_and_hms(2025, 1, day, 9, 0, 0).unwrap()),
            questions_count: 0,
            correct_count: 0,
            score,
            questions: Vec::new(),
            answers: Vec::new(),
        }
    }

    #[test]
    fn test_append_then_find() -> Fallible<()> {
        let store = AttemptStore::new(Database::in_memory()?);
        let a = attempt(1736000000000, 4, 67);
        store.append(&a)?;
        assert_eq!(store.find_by_id("1736000000000")?, Some(a));
        assert_eq!(store.find_by_id("5")?, None);
        Ok(())
    }

    #[test]
    fn test_list_all_newest_first() -> Fallible<()> {
        let store = AttemptStore::new(Database::in_memory()?);
        store.append(&attempt(1, 2, 10))?;
        store.append(&attempt(2, 9, 20))?;
        store.append(&attempt(3, 5, 30))?;
        let scores: Vec<u8> = store.list_all()?.iter().map(|a| a.score).collect();
        assert_eq!(scores, vec![20, 30, 10]);
        Ok(())
    }

    #[test]
    fn test_corrupt_history_reads_as_empty() -> Fallible<()> {
        let db = Database::in_memory()?;
        db.put(ATTEMPTS_KEY, "{not json")?;
        let store = AttemptStore::new(db);
        assert!(store.list_all()?.is_empty());
        store.append(&attempt(1, 1, 50))?;
        assert_eq!(store.list_all()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_string_ids_are_found() -> Fallible<()> {
        let db = Database::in_memory()?;
        db.put(
            ATTEMPTS_KEY,
            r#"[{"id": "99", "date": "2025-01-01T00:00:00+00:00", "questionsCount": 1, "correctCount": 1, "score": 100, "questions": [], "answers": [1]}]"#,
        )?;
        let store = AttemptStore::new(db);
        let found = store.find_by_id("99")?;
        assert_eq!(found.map(|a| a.score), Some(100));
        Ok(())
    }

    #[test]
    fn test_next_id_is_unique() -> Fallible<()> {
        let store = AttemptStore::new(Database::in_memory()?);
        let now = Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let first = store.next_id(now)?;
        assert_eq!(first.value(), now.millis());
        store.append(&QuizAttempt {
            id: first,
            ..attempt(0, 1, 0)
        })?;
        let second = store.next_id(now)?;
        assert_eq!(second.value(), now.millis() + 1);
        Ok(())
    }
}
