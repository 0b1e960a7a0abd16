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

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::bank::import_bank;
use crate::cmd::bank::reset_bank;
use crate::cmd::check::check_bank;
use crate::cmd::export::export_bank;
use crate::cmd::history::HistoryFormat;
use crate::cmd::history::print_history;
use crate::cmd::serve::server::start_server;
use crate::config::Config;
use crate::config::Overrides;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve the quiz, results and review editor in the browser.
    Serve {
        /// Optional path to the data directory.
        directory: Option<String>,
        /// Path to the question bank, overriding the configuration.
        #[arg(long)]
        bank: Option<PathBuf>,
        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,
        /// Don't open the browser.
        #[arg(long)]
        no_open: bool,
    },
    /// Check the question bank file for errors.
    Check {
        /// Optional path to the data directory.
        directory: Option<String>,
    },
    /// Print the current question bank, including edits, as JSON.
    Export {
        /// Optional path to the data directory.
        directory: Option<String>,
        /// Print one record per question instead of the nested form.
        #[arg(long)]
        flat: bool,
    },
    /// Replace the edited question bank with the contents of a JSON file.
    Import {
        /// The JSON file to import.
        file: PathBuf,
        /// Optional path to the data directory.
        directory: Option<String>,
    },
    /// Discard edits and go back to the question bank file.
    Reset {
        /// Optional path to the data directory.
        directory: Option<String>,
    },
    /// Print the history of completed quizzes.
    History {
        /// Optional path to the data directory.
        directory: Option<String>,
        /// Output format.
        #[arg(long, default_value_t = HistoryFormat::Table)]
        format: HistoryFormat,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve {
            directory,
            bank,
            port,
            no_open,
        } => {
            let overrides = Overrides {
                bank_path: bank,
                port,
                open_browser: if no_open { Some(false) } else { None },
            };
            let config = Config::load(directory, overrides)?;
            start_server(config).await
        }
        Command::Check { directory } => {
            let config = Config::load(directory, Overrides::default())?;
            check_bank(&config)
        }
        Command::Export { directory, flat } => {
            let config = Config::load(directory, Overrides::default())?;
            export_bank(&config, flat)
        }
        Command::Import { file, directory } => {
            let config = Config::load(directory, Overrides::default())?;
            import_bank(&config, &file)
        }
        Command::Reset { directory } => {
            let config = Config::load(directory, Overrides::default())?;
            reset_bank(&config)
        }
        Command::History { directory, format } => {
            let config = Config::load(directory, Overrides::default())?;
            print_history(&config, format)
        }
    }
}
