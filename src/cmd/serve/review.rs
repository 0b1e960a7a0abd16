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
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::response::Redirect;
use maud::Markup;
use maud::html;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::error_page;
use crate::cmd::serve::template::page_template;
use crate::editor::EditOp;
use crate::editor::QuestionEdit;
use crate::editor::ReviewEditor;
use crate::editor::Scope;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::question::FlatQuestion;
use crate::types::question::OPTION_COUNT;

#[derive(Default, Deserialize)]
pub struct FilterQuery {
    section: Option<String>,
    subsection: Option<String>,
}

impl FilterQuery {
    fn scope(&self) -> Scope {
        Scope::new(self.section.clone(), self.subsection.clone())
    }
}

/// Run `f` against the editor, loading it from the store on first use.
fn with_editor<T>(
    state: &ServerState,
    f: impl FnOnce(&mut ReviewEditor) -> Fallible<T>,
) -> Fallible<T> {
    let mut mutable = state.mutable.lock().unwrap();
    let editor = mutable
        .editor
        .get_or_insert_with(|| ReviewEditor::from_bank(state.bank_store.load().as_ref()));
    f(editor)
}

fn take_flash(state: &ServerState) -> Option<String> {
    let mut mutable = state.mutable.lock().unwrap();
    mutable.flash.take()
}

fn set_flash(state: &ServerState, message: String) {
    let mut mutable = state.mutable.lock().unwrap();
    mutable.flash = Some(message);
}

/// The review page URL for a scope, so edits keep the current filter.
fn review_url(scope: &Scope) -> String {
    let mut params = Vec::new();
    if let Some(section) = &scope.section {
        params.push(format!("section={}", utf8_percent_encode(section, NON_ALPHANUMERIC)));
    }
    if let Some(subsection) = &scope.subsection {
        params.push(format!(
            "subsection={}",
            utf8_percent_encode(subsection, NON_ALPHANUMERIC)
        ));
    }
    if params.is_empty() {
        "/review".to_string()
    } else {
        format!("/review?{}", params.join("&"))
    }
}

pub async fn get_handler(
    State(state): State<ServerState>,
    Query(query): Query<FilterQuery>,
) -> (StatusCode, Html<String>) {
    let flash = take_flash(&state);
    let scope = query.scope();
    match with_editor(&state, |editor| Ok(render_review(editor, &scope))) {
        Ok(body) => (
            StatusCode::OK,
            Html(page_template("Review", flash, body).into_string()),
        ),
        Err(e) => error_page(e.to_string()),
    }
}

fn render_review(editor: &ReviewEditor, scope: &Scope) -> Markup {
    let counts = editor.counts();
    let sections = editor.sections();
    let subsections: Vec<String> = sections
        .iter()
        .filter(|s| scope.section.as_ref().is_none_or(|key| *key == s.key))
        .flat_map(|s| s.subsections.iter().cloned())
        .collect();
    let visible = editor.filter(scope);
    let section = scope.section.clone().unwrap_or_default();
    let subsection = scope.subsection.clone().unwrap_or_default();
    html! {
        h1 { "Question bank review" }
        p.counts {
            (counts.total) " questions, "
            (counts.reviewed) " reviewed, "
            (counts.unreviewed) " unreviewed."
        }
        form.filter action="/review" method="get" {
            select name="section" {
                option value="" { "All sections" }
                @for meta in &sections {
                    option value=(meta.key) selected[meta.key == section] {
                        (meta.title) " (" (meta.key) ")"
                    }
                }
            }
            select name="subsection" {
                option value="" { "All parts" }
                @for key in &subsections {
                    option value=(key) selected[*key == subsection] { (key) }
                }
            }
            input type="submit" value="Filter";
        }
        div.tools {
            a href="/review/export.json" { "Export JSON" }
            form action="/review" method="post" {
                input type="hidden" name="action" value="Reset";
                input type="submit" value="Reset to bundled file"
                    data-confirm="Discard all edits and reload the bundled question file?";
            }
        }
        form.bulk action="/review" method="post" {
            input type="hidden" name="action" value="DeleteUnreviewed";
            input type="hidden" name="section" value=(section);
            input type="hidden" name="subsection" value=(subsection);
            label {
                input type="checkbox" name="confirm" value="yes" required;
                " Delete every unreviewed question shown below"
            }
            input type="submit" value="Delete unreviewed";
        }
        form.import action="/review/import" method="post" {
            label for="import-text" { "Import a question bank (JSON)" }
            textarea #import-text name="text" rows="4" {}
            input type="submit" value="Import"
                data-confirm="Replace the whole question bank with this document?";
        }
        @if visible.is_empty() {
            p.empty { "No questions match this filter." }
            @if editor.questions().is_empty() {
                form action="/review" method="post" {
                    input type="hidden" name="action" value="InsertAfter";
                    input type="hidden" name="index" value="0";
                    input type="submit" value="Add a question";
                }
            }
        }
        @for index in visible {
            (question_form(index, &editor.questions()[index], &section, &subsection))
        }
    }
}

fn question_form(index: usize, flat: &FlatQuestion, section: &str, subsection: &str) -> Markup {
    let question = &flat.question;
    let status = if question.reviewed { "reviewed" } else { "unreviewed" };
    html! {
        form class=(format!("question-editor {status}")) action="/review" method="post" {
            input type="hidden" name="index" value=(index);
            input type="hidden" name="section" value=(section);
            input type="hidden" name="subsection" value=(subsection);
            div.meta {
                span.position { "#" (index + 1) }
                span.id { (question.id) }
                span.location { (flat.section_title) " · " (flat.subsection_key) }
                span.status { (status) }
            }
            label { "Question" }
            textarea name="question" rows="2" dir="auto" { (question.question) }
            @for i in 0..OPTION_COUNT {
                @let value = question.options.get(i).map(String::as_str).unwrap_or("");
                label { "Option " (i + 1) }
                input type="text" name=(format!("option{}", i + 1)) value=(value) dir="auto";
            }
            label { "Correct option" }
            select name="answer" {
                @for choice in 1..=OPTION_COUNT {
                    option value=(choice) selected[usize::from(question.answer) == choice] {
                        (choice)
                    }
                }
            }
            label { "Explanation" }
            textarea name="explain" rows="2" dir="auto" { (question.explain) }
            label { "Target word" }
            input type="text" name="target_word" value=(question.target_word) dir="auto";
            div.buttons {
                button type="submit" name="action" value="Save" { "Save" }
                button type="submit" name="action" value="ToggleReviewed" {
                    @if question.reviewed { "Mark unreviewed" } @else { "Mark reviewed" }
                }
                button type="submit" name="action" value="InsertAfter" { "Insert after" }
                button type="submit" name="action" value="Delete"
                    data-confirm="Delete this question?" { "Delete" }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
enum ReviewAction {
    Save,
    ToggleReviewed,
    InsertAfter,
    Delete,
    DeleteUnreviewed,
    Reset,
}

#[derive(Deserialize)]
pub struct ReviewForm {
    action: ReviewAction,
    index: Option<usize>,
    #[serde(default)]
    question: String,
    #[serde(default)]
    option1: String,
    #[serde(default)]
    option2: String,
    #[serde(default)]
    option3: String,
    #[serde(default)]
    option4: String,
    answer: Option<u8>,
    #[serde(default)]
    explain: String,
    #[serde(default)]
    target_word: String,
    confirm: Option<String>,
    section: Option<String>,
    subsection: Option<String>,
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<ReviewForm>,
) -> Redirect {
    let scope = Scope::new(form.section.clone(), form.subsection.clone());
    if let Err(e) = review_action(&state, form) {
        log::error!("error: {e}");
        set_flash(&state, e.to_string());
    }
    Redirect::to(&review_url(&scope))
}

fn review_action(state: &ServerState, form: ReviewForm) -> Fallible<()> {
    let index = || match form.index {
        Some(index) => Ok(index),
        None => fail("no question selected."),
    };
    let op = match form.action {
        ReviewAction::Save => EditOp::Update {
            index: index()?,
            edit: QuestionEdit {
                question: form.question.clone(),
                options: vec![
                    form.option1.clone(),
                    form.option2.clone(),
                    form.option3.clone(),
                    form.option4.clone(),
                ],
                answer: form.answer.unwrap_or(0),
                explain: form.explain.clone(),
                target_word: form.target_word.clone(),
            },
        },
        ReviewAction::ToggleReviewed => EditOp::ToggleReviewed { index: index()? },
        ReviewAction::InsertAfter => EditOp::InsertAfter {
            index: form.index.unwrap_or(0),
        },
        ReviewAction::Delete => EditOp::Delete { index: index()? },
        ReviewAction::DeleteUnreviewed => EditOp::DeleteUnreviewed {
            scope: Scope::new(form.section.clone(), form.subsection.clone()),
            confirmed: form.confirm.as_deref() == Some("yes"),
        },
        ReviewAction::Reset => return reset_bank(state),
    };
    log::debug!("Applying review edit {:?}", form.action);
    with_editor(state, |editor| editor.apply(op, &state.bank_store))
}

fn reset_bank(state: &ServerState) -> Fallible<()> {
    let removed = state.bank_store.reset()?;
    let bank = state.bank_store.load();
    let mut mutable = state.mutable.lock().unwrap();
    mutable.editor = Some(ReviewEditor::from_bank(bank.as_ref()));
    mutable.flash = Some(if removed {
        "Question bank reset to the bundled file.".to_string()
    } else {
        "No edits to discard.".to_string()
    });
    Ok(())
}

#[derive(Deserialize)]
pub struct ImportForm {
    text: String,
}

pub async fn import_handler(
    State(state): State<ServerState>,
    Form(form): Form<ImportForm>,
) -> Redirect {
    let op = EditOp::Import { text: form.text };
    match with_editor(&state, |editor| editor.apply(op, &state.bank_store)) {
        Ok(()) => set_flash(&state, "Question bank imported.".to_string()),
        Err(e) => {
            log::error!("error: {e}");
            set_flash(&state, format!("Import failed: {e}"));
        }
    }
    Redirect::to("/review")
}

pub async fn export_handler(
    State(state): State<ServerState>,
) -> (StatusCode, [(HeaderName, &'static str); 2], String) {
    match with_editor(&state, |editor| editor.export_json()) {
        Ok(json) => (
            StatusCode::OK,
            [
                (CONTENT_TYPE, "application/json"),
                (CONTENT_DISPOSITION, "attachment; filename=\"questions.json\""),
            ],
            json,
        ),
        Err(e) => {
            log::error!("error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CONTENT_TYPE, "text/plain"), (CONTENT_DISPOSITION, "inline")],
                e.to_string(),
            )
        }
    }
}
