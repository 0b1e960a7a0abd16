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

//! A pass-through to the Quran text API, so pages can fetch verses without
//! running into CORS. Only paths on the configured upstream are forwarded.

use std::fmt::Display;
use std::fmt::Formatter;

use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use crate::cmd::serve::state::ServerState;

#[derive(Debug, PartialEq)]
pub enum ProxyError {
    MissingPath,
    InvalidPath,
    HostNotAllowed,
}

impl Display for ProxyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyError::MissingPath => write!(f, "missing_path"),
            ProxyError::InvalidPath => write!(f, "invalid_path"),
            ProxyError::HostNotAllowed => write!(f, "host_not_allowed"),
        }
    }
}

/// Resolve the requested path against the upstream. The path must be
/// absolute, and must still land on the upstream once resolved.
pub fn resolve_target(upstream: &Url, path: Option<&str>) -> Result<Url, ProxyError> {
    let path = match path.map(str::trim) {
        Some(path) if !path.is_empty() => path,
        _ => return Err(ProxyError::MissingPath),
    };
    if !path.starts_with('/') {
        return Err(ProxyError::InvalidPath);
    }
    let target = upstream.join(path).map_err(|_| ProxyError::InvalidPath)?;
    let same_origin = target.scheme() == upstream.scheme()
        && target.host_str() == upstream.host_str()
        && target.port_or_known_default() == upstream.port_or_known_default();
    if !same_origin {
        return Err(ProxyError::HostNotAllowed);
    }
    Ok(target)
}

#[derive(Deserialize)]
pub struct ProxyQuery {
    u: Option<String>,
}

pub async fn proxy_handler(
    State(state): State<ServerState>,
    Query(query): Query<ProxyQuery>,
) -> Response {
    let target = match resolve_target(&state.config.upstream, query.u.as_deref()) {
        Ok(target) => target,
        Err(e) => {
            log::debug!("Rejected proxy request for {:?}: {e}", query.u);
            return json_error(StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }));
        }
    };
    log::debug!("Proxying {target}");
    match forward(&state.http, target).await {
        Ok(response) => response,
        Err(e) => {
            log::warn!("Proxy request failed: {e}");
            json_error(
                StatusCode::BAD_GATEWAY,
                json!({ "error": "proxy_failed", "detail": e.to_string() }),
            )
        }
    }
}

async fn forward(http: &reqwest::Client, target: Url) -> Result<Response, reqwest::Error> {
    let upstream = http.get(target).send().await?;
    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let body = upstream.bytes().await?;
    Ok((status, headers(content_type), body.to_vec()).into_response())
}

fn json_error(status: StatusCode, body: serde_json::Value) -> Response {
    (status, headers("application/json".to_string()), body.to_string()).into_response()
}

fn headers(content_type: String) -> [(HeaderName, String); 3] {
    [
        (CONTENT_TYPE, content_type),
        (ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
        (CACHE_CONTROL, "no-store".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> Url {
        Url::parse("https://api.quran.com").unwrap()
    }

    #[test]
    fn test_path_is_resolved_against_upstream() {
        let target = resolve_target(&upstream(), Some("/v4/chapters")).unwrap();
        assert_eq!(target.as_str(), "https://api.quran.com/v4/chapters");
        let target = resolve_target(&upstream(), Some("/v4/verses/by_key/1:1?words=true")).unwrap();
        assert_eq!(target.query(), Some("words=true"));
    }

    #[test]
    fn test_absolute_urls_are_rejected() {
        assert_eq!(
            resolve_target(&upstream(), Some("https://api.quran.com/v4/chapters")),
            Err(ProxyError::InvalidPath)
        );
    }

    #[test]
    fn test_missing_path() {
        assert_eq!(resolve_target(&upstream(), None), Err(ProxyError::MissingPath));
        assert_eq!(resolve_target(&upstream(), Some("  ")), Err(ProxyError::MissingPath));
    }

    #[test]
    fn test_other_hosts_are_rejected() {
        assert_eq!(
            resolve_target(&upstream(), Some("http://evil.com")),
            Err(ProxyError::InvalidPath)
        );
        assert_eq!(
            resolve_target(&upstream(), Some("//evil.com/x")),
            Err(ProxyError::HostNotAllowed)
        );
    }
}
