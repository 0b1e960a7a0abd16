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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use crate::db::Database;
use crate::error::Fallible;
use crate::types::question::QuestionBank;

const BANK_KEY: &str = "tajweed_bank";

/// Where the question bank comes from: an edited copy in the key-value
/// store if there is one, otherwise the static JSON file.
#[derive(Clone)]
pub struct QuestionBankStore {
    db: Database,
    path: PathBuf,
}

impl QuestionBankStore {
    pub fn new(db: Database, path: PathBuf) -> Self {
        Self { db, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the bank. Failures are logged and yield `None`; callers treat
    /// that as "still loading".
    pub fn load(&self) -> Option<QuestionBank> {
        match self.load_cached() {
            Ok(Some(bank)) => return Some(bank),
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring edited bank: {e}"),
        }
        match self.load_static() {
            Ok(bank) => Some(bank),
            Err(e) => {
                log::error!("Failed to load question bank from {:?}: {e}", self.path);
                None
            }
        }
    }

    /// Load the static file, ignoring any edited copy.
    pub fn load_static(&self) -> Fallible<QuestionBank> {
        log::debug!("Loading question bank...");
        let start = Instant::now();
        let text = read_to_string(&self.path)?;
        let bank = QuestionBank::from_json(&text)?;
        let duration = start.elapsed().as_millis();
        log::debug!(
            "Question bank loaded in {duration}ms ({} questions).",
            bank.question_count()
        );
        Ok(bank)
    }

    pub fn load_cached(&self) -> Fallible<Option<QuestionBank>> {
        match self.db.get(BANK_KEY)? {
            Some(text) => Ok(Some(QuestionBank::from_json(&text)?)),
            None => Ok(None),
        }
    }

    /// Store an edited bank. It takes precedence over the static file from
    /// now on.
    pub fn save(&self, bank: &QuestionBank) -> Fallible<()> {
        let text = serde_json::to_string(bank)?;
        self.db.put(BANK_KEY, &text)?;
        Ok(())
    }

    /// Drop the edited copy. Returns whether there was one.
    pub fn reset(&self) -> Fallible<bool> {
        self.db.remove(BANK_KEY)
    }
}
