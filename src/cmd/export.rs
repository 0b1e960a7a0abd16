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

use crate::cmd::open_bank_store;
use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::normalize::normalize;

pub fn export_bank(config: &Config, flat: bool) -> Fallible<()> {
    let json = get_export(config, flat)?;
    println!("{json}");
    Ok(())
}

fn get_export(config: &Config, flat: bool) -> Fallible<String> {
    let store = open_bank_store(config)?;
    let Some(bank) = store.load() else {
        return fail("question bank could not be loaded.");
    };
    let json = if flat {
        serde_json::to_string_pretty(&normalize(Some(&bank)).questions)?
    } else {
        bank.to_json_pretty()?
    };
    Ok(json)
}
