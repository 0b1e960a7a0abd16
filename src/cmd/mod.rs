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

pub mod bank;
pub mod check;
pub mod export;
pub mod history;
pub mod serve;

use crate::bank_store::QuestionBankStore;
use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;

fn open_database(config: &Config) -> Fallible<Database> {
    Database::new(&config.database_path()?)
}

fn open_bank_store(config: &Config) -> Fallible<QuestionBankStore> {
    let db = open_database(config)?;
    Ok(QuestionBankStore::new(db, config.bank_path.clone()))
}
