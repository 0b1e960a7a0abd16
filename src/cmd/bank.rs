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

use crate::cmd::open_bank_store;
use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::question::QuestionBank;

/// Store the bank in `file` as the edited bank.
pub fn import_bank(config: &Config, file: &Path) -> Fallible<()> {
    if !file.exists() {
        return fail(format!("{file:?} does not exist."));
    }
    let bank = QuestionBank::from_json(&read_to_string(file)?)?;
    let store = open_bank_store(config)?;
    store.save(&bank)?;
    println!("Imported {} questions.", bank.question_count());
    Ok(())
}

pub fn reset_bank(config: &Config) -> Fallible<()> {
    let store = open_bank_store(config)?;
    if store.reset()? {
        println!("Edits discarded, using {:?}.", store.path());
    } else {
        println!("No edits to discard.");
    }
    Ok(())
}
