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

use std::sync::Arc;
use std::sync::Mutex;

use crate::attempts::AttemptStore;
use crate::bank_store::QuestionBankStore;
use crate::config::Config;
use crate::db::Database;
use crate::editor::ReviewEditor;
use crate::session::QuizSession;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Database,
    pub bank_store: QuestionBankStore,
    pub attempts: AttemptStore,
    pub http: reqwest::Client,
    pub mutable: Arc<Mutex<MutableState>>,
}

pub struct MutableState {
    pub session: QuizSession,
    /// Loaded on the first visit to the review page.
    pub editor: Option<ReviewEditor>,
    /// Shown once at the top of the next page render.
    pub flash: Option<String>,
}
