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

use std::fs::write;
use std::path::PathBuf;

use tempfile::tempdir;

use crate::error::Fallible;

/// Create a fresh temporary directory that outlives the call.
pub fn create_tmp_directory() -> Fallible<PathBuf> {
    let dir: PathBuf = tempdir()?.keep().canonicalize()?;
    Ok(dir)
}

/// A small bank with three sections, used across tests.
pub const SAMPLE_BANK: &str = r#"{
  "sections": {
    "section1": {
      "title": "Noon Sakinah and Tanween",
      "parts": {
        "izhar": [
          {"id": "q1", "question": "Which rule applies in مِنْ هَادٍ?", "options": ["Izhar", "Idgham", "Iqlab", "Ikhfa"], "answer": 1, "explain": "Haa is a throat letter.", "targetWord": "مِنْ هَادٍ", "reviewed": true},
          {"id": "q2", "question": "Which rule applies in مَنْ آمَنَ?", "options": ["Ikhfa", "Izhar", "Iqlab", "Idgham"], "answer": 2, "explain": "Hamza is a throat letter.", "targetWord": "مَنْ آمَنَ", "reviewed": false}
        ],
        "iqlab": [
          {"id": "q3", "question": "Which rule applies in مِنْ بَعْدِ?", "options": ["Izhar", "Idgham", "Iqlab", "Ikhfa"], "answer": 3, "explain": "Noon before baa becomes meem.", "targetWord": "مِنْ بَعْدِ", "reviewed": false}
        ]
      }
    },
    "section2": {
      "title": "Meem Sakinah",
      "parts": {
        "ikhfa_shafawi": [
          {"id": "q4", "question": "Which rule applies in تَرْمِيهِم بِحِجَارَةٍ?", "options": ["Izhar Shafawi", "Ikhfa Shafawi", "Idgham Mithlayn", "None"], "answer": 2, "explain": "Meem before baa.", "targetWord": "تَرْمِيهِم بِحِجَارَةٍ", "reviewed": true},
          {"id": "q5", "question": "Which rule applies in لَهُم مَّا?", "options": ["Izhar Shafawi", "Ikhfa Shafawi", "Idgham Mithlayn", "None"], "answer": 3, "explain": "Meem before meem.", "targetWord": "لَهُم مَّا", "reviewed": false}
        ]
      }
    },
    "section3": {
      "title": "Madd",
      "parts": {
        "madd_tabii": [
          {"id": "q6", "question": "How many counts is madd tabii?", "options": ["1", "2", "4", "6"], "answer": 2, "explain": "Natural madd is two counts.", "targetWord": "قَالَ", "reviewed": false}
        ],
        "madd_lazim": [
          {"id": "q7", "question": "How many counts is madd lazim?", "options": ["2", "4", "5", "6"], "answer": 4, "explain": "Necessary madd is six counts.", "targetWord": "الضَّالِّينَ", "reviewed": true}
        ]
      }
    }
  }
}"#;

/// Write [`SAMPLE_BANK`] into a new temporary directory and return the
/// directory.
pub fn create_tmp_bank_directory() -> Fallible<PathBuf> {
    let dir = create_tmp_directory()?;
    write(dir.join("questions.json"), SAMPLE_BANK)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::question::QuestionBank;

    #[test]
    fn test_create_tmp_directory() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        assert!(dir.exists());
        Ok(())
    }

    #[test]
    fn test_sample_bank_parses() -> Fallible<()> {
        let bank = QuestionBank::from_json(SAMPLE_BANK)?;
        assert_eq!(bank.sections.len(), 3);
        assert_eq!(bank.question_count(), 7);
        Ok(())
    }
}
