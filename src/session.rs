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

use rand::Rng;

use crate::attempts::AttemptStore;
use crate::error::Fallible;
use crate::error::fail;
use crate::normalize::FlatBank;
use crate::sampler::sample;
use crate::types::attempt::AttemptId;
use crate::types::attempt::QuizAttempt;
use crate::types::question::FlatQuestion;
use crate::types::question::OPTION_COUNT;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    NotStarted,
    InProgress,
    /// Holds the id of the saved attempt.
    Completed(AttemptId),
}

/// One run through a quiz.
pub struct QuizSession {
    phase: Phase,
    questions: Vec<FlatQuestion>,
    answers: Vec<Option<u8>>,
    index: usize,
    answer_shown: bool,
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
            questions: Vec::new(),
            answers: Vec::new(),
            index: 0,
            answer_shown: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions(&self) -> &[FlatQuestion] {
        &self.questions
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn answer_shown(&self) -> bool {
        self.answer_shown
    }

    pub fn current(&self) -> Option<&FlatQuestion> {
        match self.phase {
            Phase::InProgress => self.questions.get(self.index),
            _ => None,
        }
    }

    pub fn current_answer(&self) -> Option<u8> {
        self.answers.get(self.index).copied().flatten()
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    /// Draw the quiz. Without a bank this does nothing and the session stays
    /// unstarted.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        bank: Option<&FlatBank>,
        desired: usize,
        rng: &mut R,
    ) -> Fallible<()> {
        if self.phase != Phase::NotStarted {
            return fail("quiz already started.");
        }
        let Some(bank) = bank else {
            log::debug!("No question bank loaded, not starting the quiz.");
            return Ok(());
        };
        if bank.is_empty() {
            log::warn!("The question bank has no questions.");
        }
        self.questions = sample(&bank.questions, desired, rng);
        self.answers = vec![None; self.questions.len()];
        self.index = 0;
        self.answer_shown = false;
        self.phase = Phase::InProgress;
        log::debug!(
            "Quiz started with {} of {desired} requested questions, from a bank of {}",
            self.questions.len(),
            bank.len()
        );
        Ok(())
    }

    /// Record the 1-based choice for the current question. Answering again
    /// replaces the earlier choice.
    pub fn answer(&mut self, choice: u8) -> Fallible<()> {
        if self.phase != Phase::InProgress {
            return fail("no quiz in progress.");
        }
        if choice == 0 || usize::from(choice) > OPTION_COUNT {
            return fail(format!("invalid option: {choice}"));
        }
        match self.answers.get_mut(self.index) {
            Some(slot) => *slot = Some(choice),
            None => return fail("no current question."),
        }
        self.answer_shown = true;
        Ok(())
    }

    /// Move to the next question, or finish if this was the last one.
    pub fn advance(&mut self, store: &AttemptStore) -> Fallible<Option<QuizAttempt>> {
        if self.phase != Phase::InProgress {
            return fail("no quiz in progress.");
        }
        if self.is_last() {
            let attempt = self.finish(store)?;
            Ok(Some(attempt))
        } else {
            self.index += 1;
            self.answer_shown = false;
            Ok(None)
        }
    }

    /// Score the quiz, save the attempt, and complete the session. Also used
    /// to end a quiz early: unanswered questions count as wrong.
    pub fn finish(&mut self, store: &AttemptStore) -> Fallible<QuizAttempt> {
        if self.phase != Phase::InProgress {
            return fail("no quiz in progress.");
        }
        let date = Timestamp::now();
        let (correct_count, score) = score(&self.questions, &self.answers);
        let attempt = QuizAttempt {
            id: store.next_id(date)?,
            date,
            questions_count: self.questions.len(),
            correct_count,
            score,
            questions: self.questions.clone(),
            answers: self.answers.clone(),
        };
        store.append(&attempt)?;
        self.phase = Phase::Completed(attempt.id);
        Ok(attempt)
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Count correct answers and turn them into a rounded percentage. An empty
/// quiz scores zero.
pub fn score(questions: &[FlatQuestion], answers: &[Option<u8>]) -> (usize, u8) {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| q.is_correct(answers.get(*i).copied().flatten()))
        .count();
    if questions.is_empty() {
        return (0, 0);
    }
    let percent = (correct as f64 / questions.len() as f64 * 100.0).round();
    (correct, percent as u8)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::db::Database;
    use crate::helper::SAMPLE_BANK;
    use crate::normalize::normalize;
    use crate::types::question::Question;
    use crate::types::question::QuestionBank;

    fn keyed(answer: u8) -> FlatQuestion {
        FlatQuestion {
            section_key: "section1".to_string(),
            section_title: "S".to_string(),
            subsection_key: "p".to_string(),
            question: Question {
                answer,
                ..Question::default()
            },
        }
    }

    fn started(desired: usize) -> Fallible<(QuizSession, AttemptStore)> {
        let bank = QuestionBank::from_json(SAMPLE_BANK)?;
        let flat = normalize(Some(&bank));
        let mut session = QuizSession::new();
        let mut rng = StdRng::seed_from_u64(42);
        session.start(Some(&flat), desired, &mut rng)?;
        Ok((session, AttemptStore::new(Database::in_memory()?)))
    }

    #[test]
    fn test_score() {
        let questions = vec![keyed(2), keyed(1), keyed(3)];
        let answers = vec![Some(2), Some(4), Some(3)];
        assert_eq!(score(&questions, &answers), (2, 67));
    }

    #[test]
    fn test_score_unanswered_is_wrong() {
        let questions = vec![keyed(1), keyed(1)];
        assert_eq!(score(&questions, &[None, Some(1)]), (1, 50));
        assert_eq!(score(&questions, &[]), (0, 0));
        assert_eq!(score(&[], &[]), (0, 0));
    }

    #[test]
    fn test_start_without_bank_is_a_no_op() -> Fallible<()> {
        let mut session = QuizSession::new();
        let mut rng = StdRng::seed_from_u64(1);
        session.start(None, 10, &mut rng)?;
        assert_eq!(session.phase(), Phase::NotStarted);
        assert!(session.current().is_none());
        Ok(())
    }

    #[test]
    fn test_start_twice_fails() -> Fallible<()> {
        let (mut session, _) = started(3)?;
        let mut rng = StdRng::seed_from_u64(1);
        assert!(session.start(None, 3, &mut rng).is_err());
        Ok(())
    }

    #[test]
    fn test_answer_requires_progress() {
        let mut session = QuizSession::new();
        assert!(session.answer(1).is_err());
    }

    #[test]
    fn test_answer_overwrites_and_does_not_advance() -> Fallible<()> {
        let (mut session, _) = started(3)?;
        assert_eq!(session.phase(), Phase::InProgress);
        session.answer(1)?;
        session.answer(4)?;
        assert_eq!(session.index(), 0);
        assert_eq!(session.current_answer(), Some(4));
        assert!(session.answer_shown());
        assert!(session.answer(0).is_err());
        assert!(session.answer(5).is_err());
        Ok(())
    }

    #[test]
    fn test_full_run() -> Fallible<()> {
        let (mut session, store) = started(6)?;
        let total = session.questions().len();
        assert_eq!(total, 6);
        let mut finished = None;
        for i in 0..total {
            let correct = session.current().unwrap().question.answer;
            // Answer the first half correctly and the rest wrongly.
            let choice = if i < 3 { correct } else { correct % 4 + 1 };
            session.answer(choice)?;
            finished = session.advance(&store)?;
            if i + 1 < total {
                assert!(finished.is_none());
                assert!(!session.answer_shown());
            }
        }
        let attempt = finished.unwrap();
        assert_eq!(attempt.correct_count, 3);
        assert_eq!(attempt.score, 50);
        assert_eq!(attempt.answers.len(), 6);
        assert_eq!(session.phase(), Phase::Completed(attempt.id));
        assert_eq!(
            store.find_by_id(&attempt.id.to_string())?,
            Some(attempt.clone())
        );
        assert!(session.advance(&store).is_err());
        assert!(session.answer(1).is_err());
        Ok(())
    }

    #[test]
    fn test_early_finish() -> Fallible<()> {
        let (mut session, store) = started(3)?;
        let correct = session.current().unwrap().question.answer;
        session.answer(correct)?;
        let attempt = session.finish(&store)?;
        assert_eq!(attempt.questions_count, 3);
        assert_eq!(attempt.correct_count, 1);
        assert_eq!(attempt.score, 33);
        assert_eq!(attempt.answers[1], None);
        assert_eq!(store.list_all()?.len(), 1);
        Ok(())
    }
}
