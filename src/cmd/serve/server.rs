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
use std::time::Duration;

use axum::Router;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::attempts::AttemptStore;
use crate::bank_store::QuestionBankStore;
use crate::cmd::serve::history;
use crate::cmd::serve::home;
use crate::cmd::serve::proxy;
use crate::cmd::serve::quiz;
use crate::cmd::serve::results;
use crate::cmd::serve::review;
use crate::cmd::serve::state::MutableState;
use crate::cmd::serve::state::ServerState;
use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::session::QuizSession;

pub async fn start_server(config: Config) -> Fallible<()> {
    let db = Database::new(&config.database_path()?)?;
    let bank_store = QuestionBankStore::new(db.clone(), config.bank_path.clone());
    match bank_store.load() {
        Some(bank) => log::debug!("Serving {} questions.", bank.question_count()),
        None => log::warn!("Question bank unavailable, quizzes cannot start."),
    }

    let state = ServerState {
        attempts: AttemptStore::new(db.clone()),
        bank_store,
        db,
        http: reqwest::Client::new(),
        mutable: Arc::new(Mutex::new(MutableState {
            session: QuizSession::new(),
            editor: None,
            flash: None,
        })),
        config: config.clone(),
    };
    let app = router(state);
    let bind = format!("127.0.0.1:{}", config.port);

    if config.open_browser {
        // Open the browser once the server accepts connections.
        let url = format!("http://{bind}/");
        let target = bind.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&target).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            let _ = open::that(url);
        });
    }

    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn router(state: ServerState) -> Router {
    let app = Router::new();
    let app = app.route("/", get(home::get_handler));
    let app = app.route("/name", post(home::name_handler));
    let app = app.route("/quiz", get(quiz::get_handler).post(quiz::post_handler));
    let app = app.route("/quiz/start", post(quiz::start_handler));
    let app = app.route("/results/{id}", get(results::get_handler));
    let app = app.route("/results/{id}/print", get(results::print_handler));
    let app = app.route("/results/{id}/report.txt", get(results::report_handler));
    let app = app.route("/results/{id}/qr.txt", get(results::qr_handler));
    let app = app.route("/history", get(history::get_handler));
    let app = app.route("/review", get(review::get_handler).post(review::post_handler));
    let app = app.route("/review/import", post(review::import_handler));
    let app = app.route("/review/export.json", get(review::export_handler));
    let app = app.route("/api/quran", get(proxy::proxy_handler));
    let app = app.route("/script.js", get(script));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::debug!("Shutting down.");
}

async fn script() -> (StatusCode, [(HeaderName, &'static str); 1], &'static str) {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/javascript")],
        include_str!("script.js"),
    )
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}
