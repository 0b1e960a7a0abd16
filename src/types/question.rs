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

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::types::ordered::OrderedMap;

/// Number of options every question offers.
pub const OPTION_COUNT: usize = 4;

/// The nested question bank: sections, each split into parts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(default)]
    pub sections: OrderedMap<Section>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parts: OrderedMap<Vec<Question>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Question {
    /// The prompt. May contain Quranic-script markup.
    pub question: String,
    pub options: Vec<String>,
    /// 1-based index of the correct option.
    pub answer: u8,
    pub explain: String,
    pub target_word: String,
    pub reviewed: bool,
    pub id: String,
}

impl Default for Question {
    fn default() -> Self {
        Self {
            question: String::new(),
            options: vec![String::new(); OPTION_COUNT],
            answer: 1,
            explain: String::new(),
            target_word: String::new(),
            reviewed: false,
            id: String::new(),
        }
    }
}

impl Question {
    /// The text of the correct option, if the answer index is in range.
    pub fn correct_option(&self) -> Option<&str> {
        let index = usize::from(self.answer).checked_sub(1)?;
        self.options.get(index).map(|s| s.as_str())
    }

    /// The text of the option with the given 1-based index.
    pub fn option(&self, choice: u8) -> Option<&str> {
        let index = usize::from(choice).checked_sub(1)?;
        self.options.get(index).map(|s| s.as_str())
    }
}

/// A question together with the section and part it was filed under.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatQuestion {
    #[serde(default)]
    pub section_key: String,
    #[serde(default)]
    pub section_title: String,
    #[serde(default)]
    pub subsection_key: String,
    #[serde(flatten)]
    pub question: Question,
}

impl FlatQuestion {
    pub fn id(&self) -> &str {
        &self.question.id
    }

    pub fn is_correct(&self, choice: Option<u8>) -> bool {
        choice == Some(self.question.answer)
    }
}

impl QuestionBank {
    pub fn from_json(text: &str) -> Fallible<Self> {
        let bank: QuestionBank = serde_json::from_str(text)?;
        Ok(bank)
    }

    pub fn to_json_pretty(&self) -> Fallible<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn question_count(&self) -> usize {
        self.sections
            .values()
            .flat_map(|section| section.parts.values())
            .map(|questions| questions.len())
            .sum()
    }
}
