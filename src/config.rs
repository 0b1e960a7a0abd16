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
use std::path::PathBuf;

use reqwest::Url;
use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

const CONFIG_FILE: &str = "tajweed.toml";
const DATABASE_FILE: &str = "tajweed.db";
const DEFAULT_BANK_FILE: &str = "questions.json";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_QUESTION_COUNT: usize = 30;
const DEFAULT_UPSTREAM: &str = "https://api.quran.com";

/// The optional `tajweed.toml` in the data directory.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    bank_path: Option<PathBuf>,
    port: Option<u16>,
    default_question_count: Option<usize>,
    upstream: Option<String>,
    open_browser: Option<bool>,
}

/// Values given on the command line. They win over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bank_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub open_browser: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub bank_path: PathBuf,
    pub port: u16,
    pub default_question_count: usize,
    /// Base URL of the Quran data service. Its host is the only one the
    /// proxy forwards to.
    pub upstream: Url,
    pub open_browser: bool,
}

impl Config {
    pub fn load(data_dir: Option<String>, overrides: Overrides) -> Fallible<Self> {
        let data_dir: PathBuf = match data_dir {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()?,
        };
        let data_dir = if data_dir.exists() {
            data_dir.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config_path = data_dir.join(CONFIG_FILE);
        let file: FileConfig = if config_path.exists() {
            log::debug!("Reading {config_path:?}");
            toml::from_str(&read_to_string(&config_path)?)?
        } else {
            FileConfig::default()
        };

        let bank_path = overrides
            .bank_path
            .or(file.bank_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BANK_FILE));
        let bank_path = if bank_path.is_absolute() {
            bank_path
        } else {
            data_dir.join(bank_path)
        };

        let upstream = file.upstream.as_deref().unwrap_or(DEFAULT_UPSTREAM);
        let upstream = Url::parse(upstream)
            .map_err(|e| ErrorReport::new(format!("invalid upstream URL `{upstream}`: {e}")))?;
        if upstream.host_str().is_none() {
            return fail(format!("upstream URL `{upstream}` has no host."));
        }

        let default_question_count = file
            .default_question_count
            .unwrap_or(DEFAULT_QUESTION_COUNT);
        if default_question_count == 0 {
            return fail("default_question_count must be at least 1.");
        }

        Ok(Self {
            bank_path,
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            default_question_count,
            upstream,
            open_browser: overrides.open_browser.or(file.open_browser).unwrap_or(true),
            data_dir,
        })
    }

    pub fn database_path(&self) -> Fallible<String> {
        let path = self.data_dir.join(DATABASE_FILE);
        match path.to_str() {
            Some(path) => Ok(path.to_string()),
            None => fail("invalid path"),
        }
    }
}
