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

use std::collections::HashSet;

use crate::bank_store::QuestionBankStore;
use crate::error::Fallible;
use crate::error::fail;
use crate::normalize::SectionMeta;
use crate::normalize::normalize;
use crate::normalize::rebuild;
use crate::normalize::sections_of;
use crate::types::question::FlatQuestion;
use crate::types::question::OPTION_COUNT;
use crate::types::question::Question;
use crate::types::question::QuestionBank;

/// Section and part used for the first question of an empty bank.
const DEFAULT_SECTION: &str = "section1";
const DEFAULT_PART: &str = "part1";

/// An optional section/part filter. An empty scope matches everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {
    pub section: Option<String>,
    pub subsection: Option<String>,
}

impl Scope {
    pub fn new(section: Option<String>, subsection: Option<String>) -> Self {
        let blank_to_none = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        Self {
            section: blank_to_none(section),
            subsection: blank_to_none(subsection),
        }
    }

    pub fn matches(&self, question: &FlatQuestion) -> bool {
        let section = match &self.section {
            Some(key) => question.section_key == *key,
            None => true,
        };
        let subsection = match &self.subsection {
            Some(key) => question.subsection_key == *key,
            None => true,
        };
        section && subsection
    }
}

/// New content for an existing question.
#[derive(Clone, Debug, PartialEq)]
pub struct QuestionEdit {
    pub question: String,
    pub options: Vec<String>,
    pub answer: u8,
    pub explain: String,
    pub target_word: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditOp {
    Update { index: usize, edit: QuestionEdit },
    ToggleReviewed { index: usize },
    InsertAfter { index: usize },
    Delete { index: usize },
    /// Irreversible. Refused unless `confirmed`.
    DeleteUnreviewed { scope: Scope, confirmed: bool },
    Import { text: String },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Counts {
    pub total: usize,
    pub reviewed: usize,
    pub unreviewed: usize,
}

/// Editing state over the flattened bank.
pub struct ReviewEditor {
    questions: Vec<FlatQuestion>,
}

impl ReviewEditor {
    pub fn from_bank(bank: Option<&QuestionBank>) -> Self {
        Self {
            questions: normalize(bank).questions,
        }
    }

    pub fn questions(&self) -> &[FlatQuestion] {
        &self.questions
    }

    pub fn sections(&self) -> Vec<SectionMeta> {
        sections_of(&self.questions)
    }

    /// Positions of the questions within the scope.
    pub fn filter(&self, scope: &Scope) -> Vec<usize> {
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, q)| scope.matches(q))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn counts(&self) -> Counts {
        let reviewed = self
            .questions
            .iter()
            .filter(|q| q.question.reviewed)
            .count();
        Counts {
            total: self.questions.len(),
            reviewed,
            unreviewed: self.questions.len() - reviewed,
        }
    }

    /// Flip the reviewed flag. Returns the new value.
    pub fn toggle_reviewed(&mut self, index: usize) -> Fallible<bool> {
        let question = self.get_mut(index)?;
        question.question.reviewed = !question.question.reviewed;
        Ok(question.question.reviewed)
    }

    /// Insert a blank question after `index`, filed under the same section
    /// and part. Returns the new question's position.
    pub fn insert_after(&mut self, index: usize) -> Fallible<usize> {
        let (section_key, section_title, subsection_key) = if self.questions.is_empty() {
            (
                DEFAULT_SECTION.to_string(),
                String::new(),
                DEFAULT_PART.to_string(),
            )
        } else {
            let anchor = self.get(index)?;
            (
                anchor.section_key.clone(),
                anchor.section_title.clone(),
                anchor.subsection_key.clone(),
            )
        };
        let id = self.fresh_id(&format!("{section_key}-{subsection_key}-new"));
        let blank = FlatQuestion {
            section_key,
            section_title,
            subsection_key,
            question: Question {
                id,
                ..Question::default()
            },
        };
        let position = if self.questions.is_empty() {
            0
        } else {
            index + 1
        };
        self.questions.insert(position, blank);
        Ok(position)
    }

    pub fn delete_at(&mut self, index: usize) -> Fallible<FlatQuestion> {
        self.get(index)?;
        Ok(self.questions.remove(index))
    }

    pub fn update(&mut self, index: usize, edit: QuestionEdit) -> Fallible<()> {
        if edit.options.len() != OPTION_COUNT {
            return fail(format!(
                "a question needs exactly {OPTION_COUNT} options, got {}.",
                edit.options.len()
            ));
        }
        if edit.answer == 0 || usize::from(edit.answer) > OPTION_COUNT {
            return fail(format!("answer must be between 1 and {OPTION_COUNT}."));
        }
        let question = &mut self.get_mut(index)?.question;
        question.question = edit.question;
        question.options = edit.options;
        question.answer = edit.answer;
        question.explain = edit.explain;
        question.target_word = edit.target_word;
        Ok(())
    }

    /// Delete every unreviewed question within the scope. Reviewed questions
    /// and questions outside the scope are kept. Returns how many were
    /// deleted.
    pub fn delete_unreviewed(&mut self, scope: &Scope, confirmed: bool) -> Fallible<usize> {
        if !confirmed {
            return fail("bulk delete needs confirmation.");
        }
        let before = self.questions.len();
        self.questions
            .retain(|q| q.question.reviewed || !scope.matches(q));
        Ok(before - self.questions.len())
    }

    /// Replace the whole bank with an imported document. On error the
    /// editor is unchanged.
    pub fn import_json(&mut self, text: &str) -> Fallible<()> {
        let bank = QuestionBank::from_json(text)?;
        self.questions = normalize(Some(&bank)).questions;
        Ok(())
    }

    pub fn to_bank(&self) -> QuestionBank {
        rebuild(&self.questions)
    }

    pub fn export_json(&self) -> Fallible<String> {
        self.to_bank().to_json_pretty()
    }

    /// Apply an edit and write the rebuilt bank back to the store. The edit
    /// is made on a copy, which replaces this editor only once it is saved.
    pub fn apply(&mut self, op: EditOp, store: &QuestionBankStore) -> Fallible<()> {
        let mut draft = Self {
            questions: self.questions.clone(),
        };
        draft.edit(op)?;
        store.save(&draft.to_bank())?;
        *self = draft;
        Ok(())
    }

    fn edit(&mut self, op: EditOp) -> Fallible<()> {
        match op {
            EditOp::Update { index, edit } => self.update(index, edit)?,
            EditOp::ToggleReviewed { index } => {
                self.toggle_reviewed(index)?;
            }
            EditOp::InsertAfter { index } => {
                self.insert_after(index)?;
            }
            EditOp::Delete { index } => {
                self.delete_at(index)?;
            }
            EditOp::DeleteUnreviewed { scope, confirmed } => {
                let deleted = self.delete_unreviewed(&scope, confirmed)?;
                log::debug!("Deleted {deleted} unreviewed questions");
            }
            EditOp::Import { text } => self.import_json(&text)?,
        }
        Ok(())
    }

    fn get(&self, index: usize) -> Fallible<&FlatQuestion> {
        match self.questions.get(index) {
            Some(question) => Ok(question),
            None => fail(format!("no question at position {index}.")),
        }
    }

    fn get_mut(&mut self, index: usize) -> Fallible<&mut FlatQuestion> {
        match self.questions.get_mut(index) {
            Some(question) => Ok(question),
            None => fail(format!("no question at position {index}.")),
        }
    }

    fn fresh_id(&self, base: &str) -> String {
        let taken: HashSet<&str> = self.questions.iter().map(|q| q.id()).collect();
        let mut n = 1;
        loop {
            let candidate = format!("{base}-{n}");
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::helper::SAMPLE_BANK;
    use crate::helper::create_tmp_bank_directory;

    fn editor() -> Fallible<ReviewEditor> {
        let bank = QuestionBank::from_json(SAMPLE_BANK)?;
        Ok(ReviewEditor::from_bank(Some(&bank)))
    }

    fn ids(editor: &ReviewEditor) -> Vec<&str> {
        editor.questions().iter().map(|q| q.id()).collect()
    }

    fn scope(section: Option<&str>, subsection: Option<&str>) -> Scope {
        Scope::new(section.map(String::from), subsection.map(String::from))
    }

    #[test]
    fn test_filter() -> Fallible<()> {
        let editor = editor()?;
        assert_eq!(editor.filter(&Scope::default()).len(), 7);
        assert_eq!(editor.filter(&scope(Some("section1"), None)), vec![0, 1, 2]);
        assert_eq!(editor.filter(&scope(Some("section1"), Some("iqlab"))), vec![2]);
        assert_eq!(editor.filter(&scope(None, Some("madd_lazim"))), vec![6]);
        assert!(editor.filter(&scope(Some("section9"), None)).is_empty());
        Ok(())
    }

    #[test]
    fn test_blank_scope_fields_match_everything() {
        let scope = Scope::new(Some("".to_string()), Some("  ".to_string()));
        assert_eq!(scope, Scope::default());
    }

    #[test]
    fn test_toggle_reviewed() -> Fallible<()> {
        let mut editor = editor()?;
        assert!(!editor.toggle_reviewed(0)?);
        assert!(editor.toggle_reviewed(0)?);
        assert!(editor.toggle_reviewed(99).is_err());
        Ok(())
    }

    #[test]
    fn test_insert_after_copies_context() -> Fallible<()> {
        let mut editor = editor()?;
        let position = editor.insert_after(2)?;
        assert_eq!(position, 3);
        let inserted = &editor.questions()[3];
        assert_eq!(inserted.section_key, "section1");
        assert_eq!(inserted.subsection_key, "iqlab");
        assert_eq!(inserted.question.question, "");
        assert_eq!(inserted.id(), "section1-iqlab-new-1");
        editor.insert_after(3)?;
        assert_eq!(editor.questions()[4].id(), "section1-iqlab-new-2");
        assert_eq!(editor.counts().total, 9);
        Ok(())
    }

    #[test]
    fn test_insert_into_empty_bank() -> Fallible<()> {
        let mut editor = ReviewEditor::from_bank(None);
        assert_eq!(editor.insert_after(0)?, 0);
        assert_eq!(editor.questions()[0].section_key, "section1");
        Ok(())
    }

    #[test]
    fn test_delete_at() -> Fallible<()> {
        let mut editor = editor()?;
        let removed = editor.delete_at(1)?;
        assert_eq!(removed.id(), "q2");
        assert_eq!(ids(&editor), vec!["q1", "q3", "q4", "q5", "q6", "q7"]);
        assert!(editor.delete_at(6).is_err());
        Ok(())
    }

    #[test]
    fn test_update() -> Fallible<()> {
        let mut editor = editor()?;
        let edit = QuestionEdit {
            question: "New?".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer: 4,
            explain: "Because.".to_string(),
            target_word: "word".to_string(),
        };
        editor.update(0, edit.clone())?;
        let q = &editor.questions()[0].question;
        assert_eq!(q.question, "New?");
        assert_eq!(q.answer, 4);
        assert_eq!(q.id, "q1");
        assert!(q.reviewed);
        let bad_answer = QuestionEdit {
            answer: 5,
            ..edit.clone()
        };
        assert!(editor.update(0, bad_answer).is_err());
        let bad_options = QuestionEdit {
            options: vec!["a".into()],
            ..edit
        };
        assert!(editor.update(0, bad_options).is_err());
        Ok(())
    }

    #[test]
    fn test_delete_unreviewed_in_section() -> Fallible<()> {
        let mut editor = editor()?;
        let deleted = editor.delete_unreviewed(&scope(Some("section1"), None), true)?;
        assert_eq!(deleted, 2);
        assert_eq!(ids(&editor), vec!["q1", "q4", "q5", "q6", "q7"]);
        Ok(())
    }

    #[test]
    fn test_delete_unreviewed_needs_confirmation() -> Fallible<()> {
        let mut editor = editor()?;
        assert!(editor.delete_unreviewed(&Scope::default(), false).is_err());
        assert_eq!(editor.counts().total, 7);
        assert_eq!(editor.delete_unreviewed(&Scope::default(), true)?, 4);
        assert_eq!(
            editor.counts(),
            Counts {
                total: 3,
                reviewed: 3,
                unreviewed: 0
            }
        );
        Ok(())
    }

    #[test]
    fn test_import_malformed_keeps_state() -> Fallible<()> {
        let mut editor = editor()?;
        assert!(editor.import_json("{\"sections\": 5}").is_err());
        assert!(editor.import_json("not json").is_err());
        assert_eq!(editor.counts().total, 7);
        editor.import_json(r#"{"sections": {"section2": {"title": "T", "parts": {"p": [{"id": "n"}]}}}}"#)?;
        assert_eq!(ids(&editor), vec!["n"]);
        Ok(())
    }

    #[test]
    fn test_export_round_trips() -> Fallible<()> {
        let editor = editor()?;
        let exported = editor.export_json()?;
        assert_eq!(
            QuestionBank::from_json(&exported)?,
            QuestionBank::from_json(SAMPLE_BANK)?
        );
        Ok(())
    }

    #[test]
    fn test_apply_saves() -> Fallible<()> {
        let dir = create_tmp_bank_directory()?;
        let store = QuestionBankStore::new(Database::in_memory()?, dir.join("questions.json"));
        let mut editor = ReviewEditor::from_bank(store.load().as_ref());
        editor.apply(EditOp::Delete { index: 0 }, &store)?;
        assert_eq!(store.load().map(|b| b.question_count()), Some(6));
        let refused = editor.apply(
            EditOp::DeleteUnreviewed {
                scope: Scope::default(),
                confirmed: false,
            },
            &store,
        );
        assert!(refused.is_err());
        assert_eq!(store.load().map(|b| b.question_count()), Some(6));
        Ok(())
    }

    #[test]
    fn test_failed_save_keeps_editor_unchanged() -> Fallible<()> {
        let dir = create_tmp_bank_directory()?;
        let db_path = dir.join("tajweed.db").display().to_string();
        let store = QuestionBankStore::new(Database::new(&db_path)?, dir.join("questions.json"));
        let mut editor = ReviewEditor::from_bank(store.load().as_ref());
        // Break the store from another connection.
        rusqlite::Connection::open(&db_path)?.execute_batch("drop table kv;")?;
        let result = editor.apply(EditOp::Delete { index: 0 }, &store);
        assert!(result.is_err());
        assert_eq!(editor.questions().len(), 7);
        assert_eq!(ids(&editor)[0], "q1");
        Ok(())
    }
}
