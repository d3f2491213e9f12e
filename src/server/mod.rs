//! HTTP server
//!
//! Serves the generated pages and implements the hosting contract around
//! them: every route carries a staleness budget (stale pages are served
//! as-is while a background rebuild runs), unknown article paths are built
//! on first request behind a loading placeholder, and preview mode renders
//! live against a pinned revision, bypassing the generated files entirely.

use anyhow::Result;
use axum::{
    extract::{Path as UrlPath, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use url::Url;

use crate::cache::RouteCache;
use crate::commands::generate;
use crate::content::Document;
use crate::generator::Generator;
use crate::prismic::Client;
use crate::App;

/// Cookie holding the preview revision ref
const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// Per-route generation state
#[derive(Debug, Clone)]
enum RouteState {
    /// A build is in flight; requests see the loading placeholder
    Building,
    /// A generated page exists on disk
    Built {
        generated_at: SystemTime,
        /// A stale-triggered rebuild is already running
        refreshing: bool,
    },
    /// The backend had no document for this route when last asked
    NotFound { checked_at: SystemTime },
}

/// Shared server state
struct ServerState {
    app: App,
    client: Client,
    generator: Generator,
    routes: Mutex<HashMap<String, RouteState>>,
}

impl ServerState {
    fn revalidate(&self) -> Duration {
        Duration::from_secs(self.app.config.revalidate)
    }
}

/// What the request handler decided under the routes lock
enum Decision {
    Serve,
    ServeStaleAndRefresh,
    Build,
    Placeholder,
    NotFound,
}

/// Start the server
pub async fn start(app: &App, ip: &str, port: u16) -> Result<()> {
    let client = app.client()?;
    let generator = Generator::new(&app.config, &app.public_dir)?;

    // Seed route freshness from the on-disk cache so the revalidation
    // window survives restarts
    let cache = RouteCache::load(&app.base_dir);
    let mut routes = HashMap::new();
    for (route, entry) in &cache.routes {
        routes.insert(
            route.clone(),
            RouteState::Built {
                generated_at: SystemTime::UNIX_EPOCH + Duration::from_secs(entry.generated_at),
                refreshing: false,
            },
        );
    }

    let state = Arc::new(ServerState {
        app: app.clone(),
        client,
        generator,
        routes: Mutex::new(routes),
    });

    let router = Router::new()
        .route("/", get(listing_handler))
        .route("/post/:uid", get(post_handler))
        .route("/api/posts", get(load_more_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback_service(ServeDir::new(&app.public_dir))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state);

    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

async fn listing_handler(State(state): State<Arc<ServerState>>) -> Response {
    serve_generated(state, "/".to_string()).await
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    UrlPath(uid): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    // Preview renders live against the pinned revision and is never cached
    if let Some(reference) = cookie_value(&headers, PREVIEW_COOKIE) {
        return render_preview(&state, &uid, &reference).await;
    }

    serve_generated(state, format!("/post/{}", uid)).await
}

/// Serve a generated route according to its freshness state
async fn serve_generated(state: Arc<ServerState>, route: String) -> Response {
    let decision = {
        let mut routes = state.routes.lock().await;
        match routes.get(&route).cloned() {
            None => {
                routes.insert(route.clone(), RouteState::Building);
                Decision::Build
            }
            Some(RouteState::Building) => Decision::Placeholder,
            Some(RouteState::NotFound { checked_at }) => {
                if is_stale(checked_at, state.revalidate()) {
                    routes.insert(route.clone(), RouteState::Building);
                    Decision::Build
                } else {
                    Decision::NotFound
                }
            }
            Some(RouteState::Built {
                generated_at,
                refreshing,
            }) => {
                if is_stale(generated_at, state.revalidate()) && !refreshing {
                    routes.insert(
                        route.clone(),
                        RouteState::Built {
                            generated_at,
                            refreshing: true,
                        },
                    );
                    Decision::ServeStaleAndRefresh
                } else {
                    Decision::Serve
                }
            }
        }
    };

    match decision {
        Decision::Serve => serve_file(&state, &route).await,
        Decision::ServeStaleAndRefresh => {
            spawn_build(state.clone(), route.clone());
            serve_file(&state, &route).await
        }
        Decision::Build => {
            spawn_build(state.clone(), route.clone());
            placeholder(&state)
        }
        Decision::Placeholder => placeholder(&state),
        Decision::NotFound => not_found(&state),
    }
}

/// Read a generated page off disk
async fn serve_file(state: &Arc<ServerState>, route: &str) -> Response {
    let relative = if route == "/" {
        "index.html".to_string()
    } else {
        format!("{}/index.html", route.trim_start_matches('/'))
    };
    let path = state.app.public_dir.join(relative);

    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Html(content).into_response(),
        Err(_) => {
            // The cache said built but the file is gone (e.g. a clean while
            // running): forget the route and build it again
            tracing::warn!("Generated file missing for {}, rebuilding", route);
            {
                let mut routes = state.routes.lock().await;
                routes.insert(route.to_string(), RouteState::Building);
            }
            spawn_build(state.clone(), route.to_string());
            placeholder(state)
        }
    }
}

/// Kick off a background build of one route
fn spawn_build(state: Arc<ServerState>, route: String) {
    tokio::spawn(async move {
        let result = build_route(&state, &route).await;

        let mut routes = state.routes.lock().await;
        match result {
            Ok(true) => {
                routes.insert(
                    route.clone(),
                    RouteState::Built {
                        generated_at: SystemTime::now(),
                        refreshing: false,
                    },
                );
                drop(routes);

                let mut cache = RouteCache::load(&state.app.base_dir);
                cache.mark(&route);
                if let Err(e) = cache.save(&state.app.base_dir) {
                    tracing::warn!("Failed to persist route cache: {}", e);
                }
                tracing::info!("Generated {}", route);
            }
            Ok(false) => {
                routes.insert(
                    route.clone(),
                    RouteState::NotFound {
                        checked_at: SystemTime::now(),
                    },
                );
                tracing::info!("No document behind {}", route);
            }
            Err(e) => {
                // Leave the route absent so the next request retries
                routes.remove(&route);
                tracing::error!("Generation failed for {}: {:#}", route, e);
            }
        }
    });
}

/// Generate one route; `false` means the backend has no such document
async fn build_route(state: &Arc<ServerState>, route: &str) -> Result<bool> {
    if route == "/" {
        let first = generate::query_posts_page(&state.client, &state.app.config, None).await?;
        let documents = generate::normalize_all(&first.results)?;
        state
            .generator
            .write_listing(&documents, first.next_page.as_ref())?;
        state.generator.write_assets()?;
        return Ok(true);
    }

    match route.strip_prefix("/post/") {
        Some(uid) => {
            generate::generate_post(&state.generator, &state.client, &state.app.config, uid, None)
                .await
        }
        None => Ok(false),
    }
}

// ---- load more ----

#[derive(Debug, Deserialize)]
struct LoadMoreParams {
    /// Opaque cursor URL captured from a previous page of results
    page: String,
}

#[derive(Debug, Serialize)]
struct LoadMoreItem {
    uid: String,
    title: String,
    subtitle: String,
    author: String,
    first_publication_date: String,
    /// Pre-rendered listing entry, ready to append
    html: String,
}

#[derive(Debug, Serialize)]
struct LoadMoreResponse {
    results: Vec<LoadMoreItem>,
    next_page: Option<Url>,
}

/// Fetch one more page of posts from a cursor held by the listing page
async fn load_more_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<LoadMoreParams>,
) -> Response {
    let Ok(url) = Url::parse(&params.page) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid cursor");
    };
    // Only follow cursors that point back at the configured repository
    if url.host_str() != state.client.api_url().host_str() {
        return error_response(StatusCode::BAD_REQUEST, "cursor does not match repository");
    }

    let response = match state.client.fetch_page(&url).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Load-more fetch failed: {:#}", e);
            return error_response(StatusCode::BAD_GATEWAY, "content backend unavailable");
        }
    };

    let documents = match generate::normalize_all(&response.results) {
        Ok(documents) => documents,
        Err(e) => {
            tracing::error!("Load-more payload rejected: {:#}", e);
            return error_response(StatusCode::BAD_GATEWAY, "malformed backend payload");
        }
    };

    let mut results = Vec::with_capacity(documents.len());
    for doc in &documents {
        match load_more_item(&state.generator, doc) {
            Ok(item) => results.push(item),
            Err(e) => {
                tracing::error!("Load-more render failed: {:#}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "render failed");
            }
        }
    }

    Json(LoadMoreResponse {
        results,
        next_page: response.next_page,
    })
    .into_response()
}

fn load_more_item(generator: &Generator, doc: &Document) -> Result<LoadMoreItem> {
    let item = generator.post_item(doc);
    let html = generator.render_post_item(doc)?;
    Ok(LoadMoreItem {
        uid: item.uid,
        title: item.title,
        subtitle: item.subtitle,
        author: item.author,
        first_publication_date: item.date,
        html,
    })
}

// ---- preview ----

#[derive(Debug, Deserialize)]
struct PreviewParams {
    /// Preview revision ref issued by the backend
    token: String,
    /// Document to land on; the listing when absent
    #[serde(default)]
    uid: Option<String>,
}

/// Enter preview mode: store the revision ref and redirect to the document
async fn preview_handler(Query(params): Query<PreviewParams>) -> Response {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        PREVIEW_COOKIE,
        utf8_percent_encode(&params.token, NON_ALPHANUMERIC)
    );
    let target = match &params.uid {
        Some(uid) => format!("/post/{}", uid),
        None => "/".to_string(),
    };

    ([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response()
}

/// Leave preview mode: clear the ref and go back to the listing
async fn exit_preview_handler() -> Response {
    let cookie = format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", PREVIEW_COOKIE);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

/// Render an article live against a preview revision
async fn render_preview(state: &Arc<ServerState>, uid: &str, reference: &str) -> Response {
    let config = &state.app.config;

    let raw = match state
        .client
        .get_by_uid(&config.document_type, uid, Some(reference))
        .await
    {
        Ok(Some(raw)) => raw,
        Ok(None) => return not_found(state),
        Err(e) => {
            tracing::error!("Preview fetch failed for {}: {:#}", uid, e);
            return error_response(StatusCode::BAD_GATEWAY, "content backend unavailable");
        }
    };

    let rendered = async {
        let doc = Document::from_raw(&raw)?;
        let (prev, next) =
            generate::resolve_neighbors(&state.client, config, &raw.id, Some(reference)).await?;
        state
            .generator
            .render_post(&doc, prev.as_ref(), next.as_ref(), true)
    }
    .await;

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Preview render failed for {}: {:#}", uid, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "render failed")
        }
    }
}

// ---- small responses ----

fn placeholder(state: &Arc<ServerState>) -> Response {
    let html = state
        .generator
        .render_fallback()
        .unwrap_or_else(|_| "Carregando...".to_string());
    Html(html).into_response()
}

fn not_found(state: &Arc<ServerState>) -> Response {
    let html = state
        .generator
        .render_not_found()
        .unwrap_or_else(|_| "404".to_string());
    (StatusCode::NOT_FOUND, Html(html)).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn is_stale(since: SystemTime, revalidate: Duration) -> bool {
    SystemTime::now()
        .duration_since(since)
        .map(|age| age >= revalidate)
        .unwrap_or(false)
}

/// Pull one cookie's value out of the request headers
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let Some((key, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if key == name && !value.is_empty() {
            return percent_decode_str(value)
                .decode_utf8()
                .ok()
                .map(|v| v.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("a=1; io.prismic.preview=abc%3Adef; b=2"),
        );
        assert_eq!(
            cookie_value(&headers, PREVIEW_COOKIE).as_deref(),
            Some("abc:def")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("io.prismic.preview="),
        );
        assert_eq!(cookie_value(&headers, PREVIEW_COOKIE), None);
    }

    #[test]
    fn test_is_stale() {
        let now = SystemTime::now();
        assert!(!is_stale(now, Duration::from_secs(1800)));
        assert!(is_stale(
            now - Duration::from_secs(3600),
            Duration::from_secs(1800)
        ));
    }
}
