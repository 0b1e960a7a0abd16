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

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::html;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::error_page;
use crate::cmd::serve::template::page_template;
use crate::error::Fallible;
use crate::report::grade_label;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    match render_history(&state) {
        Ok(html) => (StatusCode::OK, Html(html)),
        Err(e) => error_page(e.to_string()),
    }
}

fn render_history(state: &ServerState) -> Fallible<String> {
    let attempts = state.attempts.list_all()?;
    let body = html! {
        h1 { "History" }
        @if attempts.is_empty() {
            p.empty { "No attempts yet." }
        } @else {
            table.history {
                thead {
                    tr {
                        th { "Date" }
                        th { "Score" }
                        th { "Correct" }
                        th {}
                    }
                }
                tbody {
                    @for attempt in &attempts {
                        tr {
                            td { (attempt.date.local_display()) }
                            td { (attempt.score) "% " span.grade { (grade_label(attempt.score)) } }
                            td { (attempt.correct_count) " / " (attempt.questions_count) }
                            td { a href=(format!("/results/{}", attempt.id)) { "Details" } }
                        }
                    }
                }
            }
        }
    };
    Ok(page_template("History", None, body).into_string())
}
