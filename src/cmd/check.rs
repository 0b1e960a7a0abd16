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

use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::sampler::GROUPS;
use crate::types::question::OPTION_COUNT;
use crate::types::question::QuestionBank;

pub fn check_bank(config: &Config) -> Fallible<()> {
    if !config.bank_path.exists() {
        return fail(format!("question bank {:?} does not exist.", config.bank_path));
    }
    let text = std::fs::read_to_string(&config.bank_path)?;
    let bank = QuestionBank::from_json(&text)?;
    let problems = find_problems(&bank);
    if problems.is_empty() {
        println!("ok ({} questions)", bank.question_count());
        return Ok(());
    }
    for problem in &problems {
        println!("{problem}");
    }
    fail(format!("{} problems found.", problems.len()))
}

/// Everything about a bank that would make a quiz misbehave.
pub fn find_problems(bank: &QuestionBank) -> Vec<String> {
    let mut problems = Vec::new();
    for group in GROUPS {
        if bank.sections.get(group).is_none() {
            problems.push(format!("{group}: section missing, quizzes will be shorter."));
        }
    }
    let mut ids: HashSet<&str> = HashSet::new();
    for (section_key, section) in bank.sections.iter() {
        if !GROUPS.contains(&section_key) {
            problems.push(format!("{section_key}: section is never used in quizzes."));
        }
        for (part_key, part) in section.parts.iter() {
            for (i, question) in part.iter().enumerate() {
                let at = format!("{section_key}/{part_key}#{}", i + 1);
                if question.question.trim().is_empty() {
                    problems.push(format!("{at}: question text is empty."));
                }
                if question.options.len() != OPTION_COUNT {
                    problems.push(format!(
                        "{at}: expected {OPTION_COUNT} options, found {}.",
                        question.options.len()
                    ));
                }
                if question.correct_option().is_none() {
                    problems.push(format!("{at}: answer {} is out of range.", question.answer));
                }
                if question.id.is_empty() {
                    problems.push(format!("{at}: missing id."));
                } else if !ids.insert(question.id.as_str()) {
                    problems.push(format!("{at}: duplicate id `{}`.", question.id));
                }
            }
        }
    }
    problems
}
