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

//! Conversion between the nested question bank and its flat form.
//!
//! The flat form is an arena of [`FlatQuestion`]s. Grouping is never stored
//! separately: it is derived from the arena by [`group_index`], and
//! [`rebuild`] is just that index materialized. Flattening a bank and
//! rebuilding it therefore gives back the same sections, parts and
//! questions in the same order. The one loss is that sections and parts
//! with no questions have no entry in the arena and do not come back.

use std::collections::HashSet;

use crate::types::question::FlatQuestion;
use crate::types::question::OPTION_COUNT;
use crate::types::question::Question;
use crate::types::question::QuestionBank;
use crate::types::question::Section;

#[derive(Clone, Debug, PartialEq)]
pub struct SectionMeta {
    pub key: String,
    pub title: String,
    /// Part keys, in document order.
    pub subsections: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatBank {
    pub questions: Vec<FlatQuestion>,
    pub sections: Vec<SectionMeta>,
}

impl FlatBank {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// One section of the derived index: the arena positions of its questions,
/// grouped by part, in first-seen order.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionGroup {
    pub key: String,
    pub title: String,
    pub parts: Vec<(String, Vec<usize>)>,
}

/// Flatten a bank. An absent bank flattens to nothing.
pub fn normalize(bank: Option<&QuestionBank>) -> FlatBank {
    let Some(bank) = bank else {
        return FlatBank::default();
    };
    let mut questions = Vec::with_capacity(bank.question_count());
    let mut sections = Vec::with_capacity(bank.sections.len());
    let mut seen_ids: HashSet<String> = HashSet::new();
    for (section_key, section) in bank.sections.iter() {
        sections.push(SectionMeta {
            key: section_key.to_string(),
            title: section.title.clone(),
            subsections: section.parts.keys().map(|k| k.to_string()).collect(),
        });
        for (part_key, part) in section.parts.iter() {
            for (position, question) in part.iter().enumerate() {
                let mut question = with_defaults(question.clone());
                if question.id.is_empty() || seen_ids.contains(&question.id) {
                    let fresh = fresh_id(
                        &format!("{section_key}-{part_key}-{}", position + 1),
                        &seen_ids,
                    );
                    if !question.id.is_empty() {
                        log::debug!("Duplicate question id {}, renamed to {fresh}", question.id);
                    }
                    question.id = fresh;
                }
                seen_ids.insert(question.id.clone());
                questions.push(FlatQuestion {
                    section_key: section_key.to_string(),
                    section_title: section.title.clone(),
                    subsection_key: part_key.to_string(),
                    question,
                });
            }
        }
    }
    FlatBank {
        questions,
        sections,
    }
}

/// Group the arena by section, then by part, both in first-seen order. A
/// section's title is taken from the first question seen in it.
pub fn group_index(questions: &[FlatQuestion]) -> Vec<SectionGroup> {
    let mut groups: Vec<SectionGroup> = Vec::new();
    for (position, flat) in questions.iter().enumerate() {
        let group = match groups.iter().position(|g| g.key == flat.section_key) {
            Some(i) => &mut groups[i],
            None => {
                groups.push(SectionGroup {
                    key: flat.section_key.clone(),
                    title: flat.section_title.clone(),
                    parts: Vec::new(),
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };
        match group
            .parts
            .iter_mut()
            .find(|(key, _)| *key == flat.subsection_key)
        {
            Some((_, positions)) => positions.push(position),
            None => group
                .parts
                .push((flat.subsection_key.clone(), vec![position])),
        }
    }
    groups
}

/// Rebuild the nested bank from the flat form.
pub fn rebuild(questions: &[FlatQuestion]) -> QuestionBank {
    let mut bank = QuestionBank::default();
    for group in group_index(questions) {
        let mut section = Section {
            title: group.title,
            ..Section::default()
        };
        for (part_key, positions) in group.parts {
            let part: Vec<Question> = positions
                .into_iter()
                .map(|i| questions[i].question.clone())
                .collect();
            section.parts.insert(part_key, part);
        }
        bank.sections.insert(group.key, section);
    }
    bank
}

/// Section metadata derived from the arena alone.
pub fn sections_of(questions: &[FlatQuestion]) -> Vec<SectionMeta> {
    group_index(questions)
        .into_iter()
        .map(|group| SectionMeta {
            key: group.key,
            title: group.title,
            subsections: group.parts.into_iter().map(|(key, _)| key).collect(),
        })
        .collect()
}

/// Fill in missing fields. Options are padded with blanks or cut down to
/// exactly [`OPTION_COUNT`]; `check` reports such questions in the file.
fn with_defaults(mut question: Question) -> Question {
    if question.options.len() > OPTION_COUNT {
        log::warn!(
            "Question {:?} has {} options, keeping the first {OPTION_COUNT}",
            question.id,
            question.options.len()
        );
    }
    question.options.resize(OPTION_COUNT, String::new());
    question
}

fn fresh_id(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
