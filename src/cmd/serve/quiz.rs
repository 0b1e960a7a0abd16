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
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use maud::Markup;
use maud::PreEscaped;
use maud::html;
use serde::Deserialize;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::page_template;
use crate::error::Fallible;
use crate::error::fail;
use crate::normalize::normalize;
use crate::session::Phase;
use crate::session::QuizSession;
use crate::types::question::FlatQuestion;

#[derive(Deserialize)]
pub struct StartForm {
    count: Option<usize>,
}

pub async fn start_handler(
    State(state): State<ServerState>,
    Form(form): Form<StartForm>,
) -> Redirect {
    if let Err(e) = start_quiz(&state, form.count) {
        log::error!("error: {e}");
    }
    Redirect::to("/quiz")
}

/// Replace any current quiz with a freshly drawn one.
fn start_quiz(state: &ServerState, count: Option<usize>) -> Fallible<()> {
    let desired = match count {
        Some(0) | None => state.config.default_question_count,
        Some(n) => n,
    };
    let bank = state.bank_store.load().map(|bank| normalize(Some(&bank)));
    let mut session = QuizSession::new();
    session.start(bank.as_ref(), desired, &mut rand::thread_rng())?;
    let mut mutable = state.mutable.lock().unwrap();
    mutable.session = session;
    Ok(())
}

#[derive(Debug, Deserialize)]
enum Action {
    Answer,
    Next,
    End,
}

#[derive(Deserialize)]
pub struct QuizForm {
    action: Action,
    choice: Option<u8>,
    confirm: Option<String>,
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<QuizForm>,
) -> Redirect {
    match action_handler(&state, form) {
        Ok(target) => Redirect::to(&target),
        Err(e) => {
            log::error!("error: {e}");
            let mut mutable = state.mutable.lock().unwrap();
            mutable.flash = Some(e.to_string());
            Redirect::to("/quiz")
        }
    }
}

/// Apply the action and return where to go next.
fn action_handler(state: &ServerState, form: QuizForm) -> Fallible<String> {
    let mut mutable = state.mutable.lock().unwrap();
    let session = &mut mutable.session;
    match form.action {
        Action::Answer => match form.choice {
            Some(choice) => session.answer(choice)?,
            None => return fail("no option selected."),
        },
        Action::Next => {
            session.advance(&state.attempts)?;
        }
        Action::End => {
            if form.confirm.as_deref() != Some("yes") {
                return fail("tick the box to confirm ending the quiz.");
            }
            log::debug!("Quiz ended early");
            session.finish(&state.attempts)?;
        }
    }
    Ok(match session.phase() {
        Phase::Completed(id) => format!("/results/{id}"),
        _ => "/quiz".to_string(),
    })
}

pub async fn get_handler(State(state): State<ServerState>) -> Response {
    let mut mutable = state.mutable.lock().unwrap();
    let flash = mutable.flash.take();
    let session = &mutable.session;
    let body = match session.phase() {
        Phase::Completed(id) => {
            return Redirect::to(&format!("/results/{id}")).into_response();
        }
        Phase::NotStarted if state.bank_store.load().is_none() => html! {
            div.empty {
                p.loading { "Loading question bank…" }
            }
        },
        Phase::NotStarted => html! {
            div.empty {
                h1 { "No quiz in progress" }
                p { a href="/" { "Start one from the home page." } }
            }
        },
        Phase::InProgress => match session.current() {
            Some(question) => render_question(session, question),
            None => html! {
                div.empty {
                    h1 { "This quiz has no questions" }
                    form action="/quiz" method="post" {
                        input type="hidden" name="action" value="End";
                        input type="hidden" name="confirm" value="yes";
                        input type="submit" value="Finish";
                    }
                }
            },
        },
    };
    let html = page_template("Quiz", flash, body);
    (StatusCode::OK, Html(html.into_string())).into_response()
}

fn render_question(session: &QuizSession, flat: &FlatQuestion) -> Markup {
    let question = &flat.question;
    let total = session.questions().len();
    let progress = format!("{} / {}", session.index() + 1, total);
    let percent = session.index() * 100 / total.max(1);
    let chosen = session.current_answer();
    let options = html! {
        div.options {
            @for (i, option) in question.options.iter().enumerate() {
                @let choice = (i + 1) as u8;
                @if session.answer_shown() {
                    @let class = if choice == question.answer {
                        "option correct"
                    } else if Some(choice) == chosen {
                        "option wrong"
                    } else {
                        "option"
                    };
                    div class=(class) { (PreEscaped(option)) }
                } @else {
                    form action="/quiz" method="post" {
                        input type="hidden" name="action" value="Answer";
                        button.option type="submit" name="choice" value=(choice) {
                            (PreEscaped(option))
                        }
                    }
                }
            }
        }
    };
    html! {
        div.quiz {
            div.header {
                div.progress-bar {
                    div.progress-fill style=(format!("width: {percent}%;")) {}
                }
                div.progress { (progress) }
                div.section { (flat.section_title) " · " (flat.subsection_key) }
            }
            div.question.rich-text dir="auto" {
                (PreEscaped(&question.question))
            }
            (options)
            @if session.answer_shown() {
                div.explanation {
                    @if !question.target_word.is_empty() {
                        p.target-word dir="auto" { (question.target_word) }
                    }
                    @if !question.explain.is_empty() {
                        p dir="auto" { (PreEscaped(&question.explain)) }
                    }
                }
                form action="/quiz" method="post" {
                    input type="hidden" name="action" value="Next";
                    @if session.is_last() {
                        input #next type="submit" value="Finish";
                    } @else {
                        input #next type="submit" value="Next";
                    }
                }
            }
            form.end action="/quiz" method="post" {
                input type="hidden" name="action" value="End";
                label {
                    input type="checkbox" name="confirm" value="yes" required;
                    " I want to end the quiz now"
                }
                input #end type="submit" value="End quiz";
            }
        }
    }
}
