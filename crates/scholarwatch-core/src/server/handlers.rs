use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::state::AppState;
use crate::render::{render_options_page, render_rss, render_status_page, Channel, OptionsView, StatusView};
use crate::storage::{KeywordRepository, SeenPaperRepository, MAX_FEED_LIMIT};
use crate::Result;

const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";
const OPTIONS_PATH: &str = "/options";

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub kw: Option<String>,
    /// Any integer; clamped to the feed bounds
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub term: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub id: i64,
}

/// Recent detections as RSS 2.0, optionally for one keyword
pub async fn feed(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Result<Response> {
    let keyword = query
        .kw
        .as_deref()
        .map(str::trim)
        .filter(|kw| !kw.is_empty());
    let limit = query
        .limit
        .unwrap_or_else(|| i64::from(state.config.server.rss_limit))
        .clamp(1, MAX_FEED_LIMIT);

    let items = SeenPaperRepository::new(&state.db).recent(keyword, limit).await?;
    let channel = Channel::new(&state.config.server.public_url, keyword);
    let body = render_rss(&channel, &items)?;

    Ok(([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], body).into_response())
}

pub async fn options(State(state): State<AppState>) -> Result<Html<String>> {
    let keywords = KeywordRepository::new(&state.db).list_all().await?;
    let config = &state.config;

    Ok(Html(render_options_page(&OptionsView {
        keywords: &keywords,
        schedule_minutes: config.watch.schedule_minutes,
        per_keyword_limit: config.watch.per_keyword_limit,
        source_name: &state.source_name,
        source_ready: config.source.is_ready(),
        discord_ready: config.notify.discord_enabled(),
    })))
}

pub async fn add_keyword(State(state): State<AppState>, Form(form): Form<AddForm>) -> Result<Redirect> {
    match KeywordRepository::new(&state.db).add(&form.term).await? {
        Some(keyword) => tracing::info!("Added keyword: {}", keyword.term),
        None => tracing::debug!("Ignored empty or duplicate keyword '{}'", form.term),
    }
    Ok(Redirect::to(OPTIONS_PATH))
}

pub async fn delete_keyword(
    State(state): State<AppState>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect> {
    if let Some(keyword) = KeywordRepository::new(&state.db).delete(form.id).await? {
        tracing::info!("Removed keyword: {}", keyword.term);
    }
    Ok(Redirect::to(OPTIONS_PATH))
}

/// Queue a cycle on the background watcher and return immediately
pub async fn run_now(State(state): State<AppState>) -> Redirect {
    tracing::info!("Manual cycle requested");
    state.watch.trigger();
    Redirect::to(OPTIONS_PATH)
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, String) {
    let checks = [
        ("discord", state.config.notify.discord_enabled()),
        (state.source_name.as_str(), state.config.source.is_ready()),
    ];
    let healthy = checks.iter().all(|(_, ok)| *ok);

    let mut body = String::from(if healthy { "OK" } else { "NOT OK" });
    for (name, ok) in checks {
        body.push('\n');
        body.push_str(name);
        body.push_str(if ok { ": ok" } else { ": missing" });
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, body)
}

pub async fn status(State(state): State<AppState>) -> Result<Html<String>> {
    let keywords = KeywordRepository::new(&state.db).count().await?;
    let seen_papers = SeenPaperRepository::new(&state.db).count().await?;
    let last_cycle = state.watch.last_report().await.map(|r| r.summary());

    Ok(Html(render_status_page(&StatusView {
        keywords,
        seen_papers,
        last_cycle,
    })))
}
