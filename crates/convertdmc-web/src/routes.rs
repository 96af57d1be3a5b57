// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP routes: the upload page, the conversion endpoint and a health check.

use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use convertdmc_core::human_errors::{HumanError, humanize};
use convertdmc_core::{ErrorKind, Failure, Operation};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::page::{PageView, render};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "convertdmc_session";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/convert", post(convert_upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Existing session id from the cookie, or a fresh one added to the jar.
fn session(jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    {
        return (jar, id);
    }

    let id = Uuid::new_v4();
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (jar.add(cookie), id)
}

async fn index(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, id) = session(jar);
    let view = PageView {
        conversions: state.sessions.get(id),
        ..PageView::default()
    };
    (jar, Html(render(&view).into_string()))
}

async fn health() -> &'static str {
    "ok"
}

/// The two form fields of an upload.
#[derive(Debug, Default)]
struct Upload {
    option: Option<String>,
    file: Option<Vec<u8>>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, (StatusCode, String)> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| (err.status(), err.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("option") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| (err.status(), err.body_text()))?;
                upload.option = Some(text);
            }
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| (err.status(), err.body_text()))?;
                upload.file = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    Ok(upload)
}

async fn convert_upload(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let (jar, id) = session(jar);

    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err((status, detail)) => {
            warn!(%status, %detail, "Rejected upload");
            let error = client_error("The upload could not be read.", detail);
            return page_response(&state, jar, id, None, status, &error);
        }
    };

    let selected = upload
        .option
        .as_deref()
        .and_then(|option| option.parse::<Operation>().ok());

    let (option, data) = match (upload.option, upload.file) {
        (Some(option), Some(data)) if !data.is_empty() => (option, data),
        _ => {
            let error = client_error(
                "Choose an option and a file.",
                "both the option and the file are required".into(),
            );
            return page_response(&state, jar, id, selected, StatusCode::BAD_REQUEST, &error);
        }
    };

    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.convert(&option, &data))
        .await
        .unwrap_or_else(|err| {
            error!(error = %err, "Conversion task aborted");
            Err(Failure {
                kind: ErrorKind::Internal,
                message: format!("conversion task aborted: {err}"),
            })
        });

    match outcome {
        Ok(output) => {
            let conversions = state.sessions.increment(id);
            info!(
                filename = %output.filename,
                bytes = output.bytes.len(),
                conversions,
                "Serving conversion"
            );
            (
                jar,
                [
                    (CONTENT_TYPE, output.content_type),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", output.filename),
                    ),
                ],
                output.bytes,
            )
                .into_response()
        }
        Err(failure) => {
            let status = if failure.kind.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            page_response(&state, jar, id, selected, status, &humanize(&failure))
        }
    }
}

fn client_error(message: &str, detail: String) -> HumanError {
    HumanError {
        message: message.into(),
        suggestion: "Pick one of the options, attach a file and submit again.".into(),
        detail,
    }
}

fn page_response(
    state: &AppState,
    jar: CookieJar,
    id: Uuid,
    selected: Option<Operation>,
    status: StatusCode,
    error: &HumanError,
) -> Response {
    let view = PageView {
        conversions: state.sessions.get(id),
        selected,
        error: Some(error),
    };
    (status, jar, Html(render(&view).into_string())).into_response()
}
