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

use axum::http::StatusCode;
use axum::response::Html;
use maud::DOCTYPE;
use maud::Markup;
use maud::html;

pub fn page_template(title: &str, flash: Option<String>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · Tajweed Quiz" }
                link rel="stylesheet" href="/style.css";
            }
            body {
                nav.nav {
                    a href="/" { "Home" }
                    a href="/history" { "History" }
                    a href="/review" { "Review" }
                }
                @if let Some(message) = flash {
                    div.flash { (message) }
                }
                main.root {
                    (body)
                }
                script src="/script.js" {};
            }
        }
    }
}

/// The page shown when a handler fails unexpectedly.
pub fn error_page(message: String) -> (StatusCode, Html<String>) {
    log::error!("{message}");
    let body = html! {
        div.error {
            h1 { "Something went wrong" }
            p { (message) }
        }
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(page_template("Error", None, body).into_string()),
    )
}
