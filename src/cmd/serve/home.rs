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

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::Redirect;
use maud::html;
use serde::Deserialize;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::error_page;
use crate::cmd::serve::template::page_template;
use crate::error::Fallible;
use crate::profile::set_trainee_name;
use crate::profile::trainee_name;
use crate::report::grade_label;
use crate::session::Phase;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    match render_home(&state) {
        Ok(html) => (StatusCode::OK, Html(html)),
        Err(e) => error_page(e.to_string()),
    }
}

fn render_home(state: &ServerState) -> Fallible<String> {
    let name = trainee_name(&state.db)?.unwrap_or_default();
    let bank = state.bank_store.load();
    let latest = state.attempts.list_all()?.into_iter().next();
    let (in_progress, flash) = {
        let mut mutable = state.mutable.lock().unwrap();
        (
            mutable.session.phase() == Phase::InProgress,
            mutable.flash.take(),
        )
    };
    let body = html! {
        h1 { "Tajweed Quiz" }
        section.card {
            h2 { "Trainee" }
            form action="/name" method="post" {
                label for="name" { "Your name, printed on reports" }
                input #name type="text" name="name" value=(name);
                input type="submit" value="Save";
            }
        }
        section.card {
            h2 { "Quiz" }
            @match &bank {
                None => {
                    p.loading { "Loading question bank…" }
                }
                Some(bank) => {
                    p { (bank.question_count()) " questions in the bank." }
                    @if in_progress {
                        p { a href="/quiz" { "Continue the current quiz" } }
                    }
                    form action="/quiz/start" method="post" {
                        label for="count" { "Number of questions" }
                        input #count type="number" name="count" min="1"
                            value=(state.config.default_question_count);
                        input type="submit" value="Start";
                    }
                }
            }
        }
        @if let Some(attempt) = latest {
            section.card {
                h2 { "Last result" }
                p {
                    (attempt.date.local_display()) ": "
                    strong { (attempt.score) "%" }
                    " (" (grade_label(attempt.score)) ") "
                    a href=(format!("/results/{}", attempt.id)) { "View" }
                }
            }
        }
    };
    Ok(page_template("Home", flash, body).into_string())
}

#[derive(Deserialize)]
pub struct NameForm {
    name: String,
}

pub async fn name_handler(State(state): State<ServerState>, Form(form): Form<NameForm>) -> Redirect {
    if let Err(e) = set_trainee_name(&state.db, &form.name) {
        log::error!("error: {e}");
    }
    Redirect::to("/")
}
