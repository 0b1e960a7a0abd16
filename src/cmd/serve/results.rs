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

use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use maud::Markup;
use maud::PreEscaped;
use maud::html;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::error_page;
use crate::cmd::serve::template::page_template;
use crate::error::Fallible;
use crate::profile::trainee_name;
use crate::report::cached_qr_payload;
use crate::report::grade_label;
use crate::report::qr_image_urls;
use crate::report::section_breakdown;
use crate::report::text_report;
use crate::types::attempt::QuizAttempt;

type TextResponse = (StatusCode, [(HeaderName, String); 2], String);

pub async fn get_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> (StatusCode, Html<String>) {
    match render_results(&state, &id, false) {
        Ok(html) => (StatusCode::OK, Html(html)),
        Err(e) => error_page(e.to_string()),
    }
}

pub async fn print_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> (StatusCode, Html<String>) {
    match render_results(&state, &id, true) {
        Ok(html) => (StatusCode::OK, Html(html)),
        Err(e) => error_page(e.to_string()),
    }
}

pub async fn report_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> TextResponse {
    match text_download(&state, &id, Download::Report) {
        Ok(response) => response,
        Err(e) => text_error(e.to_string()),
    }
}

pub async fn qr_handler(State(state): State<ServerState>, Path(id): Path<String>) -> TextResponse {
    match text_download(&state, &id, Download::QrText) {
        Ok(response) => response,
        Err(e) => text_error(e.to_string()),
    }
}

enum Download {
    Report,
    QrText,
}

fn text_download(state: &ServerState, id: &str, download: Download) -> Fallible<TextResponse> {
    let Some(attempt) = state.attempts.find_by_id(id)? else {
        return Ok((
            StatusCode::NOT_FOUND,
            [
                (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (CONTENT_DISPOSITION, "inline".to_string()),
            ],
            "No results found for this attempt.".to_string(),
        ));
    };
    let trainee = trainee_name(&state.db)?;
    let (filename, body) = match download {
        Download::Report => (
            format!("tajweed-report-{}.txt", attempt.id),
            text_report(&attempt, trainee.as_deref()),
        ),
        Download::QrText => (
            format!("tajweed-qr-{}.txt", attempt.id),
            cached_qr_payload(&state.db, &attempt, trainee.as_deref())?,
        ),
    };
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

fn text_error(message: String) -> TextResponse {
    log::error!("{message}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, "inline".to_string()),
        ],
        message,
    )
}

fn render_results(state: &ServerState, id: &str, printable: bool) -> Fallible<String> {
    let Some(attempt) = state.attempts.find_by_id(id)? else {
        let body = html! {
            div.empty {
                h1 { "No results" }
                p { "No results found for this attempt." }
                p { a href="/history" { "See all attempts" } }
            }
        };
        return Ok(page_template("Results", None, body).into_string());
    };
    let trainee = trainee_name(&state.db)?;
    let payload = cached_qr_payload(&state.db, &attempt, trainee.as_deref())?;
    let body = html! {
        div class=(if printable { "report printable" } else { "report" }) {
            h1 { "Quiz results" }
            (summary(&attempt, trainee.as_deref()))
            (qr_block(&payload))
            @if printable {
                button #print type="button" { "Print or save as PDF" }
            } @else {
                div.downloads {
                    a href=(format!("/results/{}/print", attempt.id)) { "Printable report" }
                    a href=(format!("/results/{}/report.txt", attempt.id)) { "Download report" }
                    a href=(format!("/results/{}/qr.txt", attempt.id)) { "Download QR text" }
                }
            }
            (answers_table(&attempt))
        }
    };
    Ok(page_template("Results", None, body).into_string())
}

fn summary(attempt: &QuizAttempt, trainee: Option<&str>) -> Markup {
    html! {
        div.summary {
            @if let Some(name) = trainee {
                p.trainee { "Trainee: " strong { (name) } }
            }
            p.date { "Date: " (attempt.date.local_display()) }
            p.score {
                span.percent { (attempt.score) "%" }
                " " (grade_label(attempt.score))
            }
            p { (attempt.correct_count) " of " (attempt.questions_count) " correct." }
            table.breakdown {
                thead {
                    tr { th { "Section" } th { "Correct" } }
                }
                tbody {
                    @for section in section_breakdown(attempt) {
                        tr {
                            td { (section.title) }
                            td { (section.correct) " / " (section.total) }
                        }
                    }
                }
            }
        }
    }
}

/// The QR image tries each provider in turn; the page script swaps in the
/// next one on error and shows the raw text once they are exhausted.
fn qr_block(payload: &str) -> Markup {
    let urls = qr_image_urls(payload);
    let (first, rest) = match urls.split_first() {
        Some((first, rest)) => (first.clone(), rest.join(" ")),
        None => (String::new(), String::new()),
    };
    html! {
        div.qr {
            img.qr-image src=(first) data-fallbacks=(rest) alt="QR code of the result" width="220" height="220";
            pre.qr-text hidden { (payload) }
            noscript { pre { (payload) } }
        }
    }
}

fn answers_table(attempt: &QuizAttempt) -> Markup {
    html! {
        ol.answers {
            @for (i, flat) in attempt.questions.iter().enumerate() {
                @let chosen = attempt.answers.get(i).copied().flatten();
                @let correct = flat.is_correct(chosen);
                li class=(if correct { "correct" } else { "wrong" }) {
                    div.question dir="auto" { (PreEscaped(&flat.question.question)) }
                    div.chosen dir="auto" {
                        "Your answer: "
                        (chosen.and_then(|c| flat.question.option(c)).unwrap_or("(no answer)"))
                    }
                    @if !correct {
                        div.expected dir="auto" {
                            "Correct answer: "
                            (flat.question.correct_option().unwrap_or("?"))
                        }
                    }
                    @if !flat.question.explain.is_empty() {
                        div.explain dir="auto" { (PreEscaped(&flat.question.explain)) }
                    }
                }
            }
        }
    }
}
