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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

use crate::attempts::AttemptStore;
use crate::cmd::open_database;
use crate::config::Config;
use crate::error::Fallible;
use crate::types::attempt::AttemptId;
use crate::types::attempt::QuizAttempt;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone)]
pub enum HistoryFormat {
    /// One line per attempt.
    Table,
    /// JSON output.
    Json,
}

impl Display for HistoryFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryFormat::Table => write!(f, "table"),
            HistoryFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRow {
    id: AttemptId,
    date: Timestamp,
    questions_count: usize,
    correct_count: usize,
    score: u8,
}

impl From<&QuizAttempt> for HistoryRow {
    fn from(attempt: &QuizAttempt) -> Self {
        Self {
            id: attempt.id,
            date: attempt.date,
            questions_count: attempt.questions_count,
            correct_count: attempt.correct_count,
            score: attempt.score,
        }
    }
}

pub fn print_history(config: &Config, format: HistoryFormat) -> Fallible<()> {
    let store = AttemptStore::new(open_database(config)?);
    let attempts = store.list_all()?;
    println!("{}", render_history(&attempts, format)?);
    Ok(())
}

fn render_history(attempts: &[QuizAttempt], format: HistoryFormat) -> Fallible<String> {
    let rows: Vec<HistoryRow> = attempts.iter().map(HistoryRow::from).collect();
    match format {
        HistoryFormat::Table => {
            if rows.is_empty() {
                return Ok("No attempts yet.".to_string());
            }
            let lines: Vec<String> = rows
                .iter()
                .map(|row| {
                    format!(
                        "{}  {}  {:>3}%  {}/{}",
                        row.id,
                        row.date.local_display(),
                        row.score,
                        row.correct_count,
                        row.questions_count
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
        HistoryFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
    }
}
