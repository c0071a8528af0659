// Custom Connections – A word grouping game
// Copyright (C) 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! HTTP server for the static pages and the link shortener proxy.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Deserialize;
use thiserror::Error;

use super::share::{ShortenResponse, SHORTEN_PATH};

pub const DEFAULT_SHORTENER_ENDPOINT: &'static str =
    "https://tinyurl.com/api-create.php";

const SHORTENER_TIMEOUT: Duration = Duration::from_secs(10);

const CONTENT_SECURITY_POLICY: &'static str =
    "default-src 'self'; \
     script-src 'self' 'wasm-unsafe-eval'; \
     style-src 'self' 'unsafe-inline'; \
     connect-src 'self'; \
     img-src 'self' data:; \
     form-action 'self'; \
     base-uri 'none'; \
     object-src 'none'";

#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("request to link shortener failed")]
    Request(#[from] reqwest::Error),

    #[error("link shortener returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("link shortener returned an empty response")]
    Empty,
}

#[async_trait]
pub trait Shortener: Send + Sync {
    async fn shorten(&self, url: &str) -> Result<String, ShortenError>;
}

/// Shortener using a TinyURL-style API where the long URL is passed as
/// the `url` query parameter and the short URL comes back as plain text.
pub struct TinyUrl {
    client: reqwest::Client,
    endpoint: String,
}

impl TinyUrl {
    pub fn new(endpoint: impl Into<String>) -> Result<TinyUrl, ShortenError> {
        let client = reqwest::Client::builder()
            .timeout(SHORTENER_TIMEOUT)
            .build()?;

        Ok(TinyUrl {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Shortener for TinyUrl {
    async fn shorten(&self, url: &str) -> Result<String, ShortenError> {
        let response = self.client
            .get(&self.endpoint)
            .query(&[("url", url)])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            return Err(ShortenError::Status(status));
        }

        let body = response.text().await?;
        let short_url = body.trim();

        if short_url.is_empty() {
            Err(ShortenError::Empty)
        } else {
            Ok(short_url.to_string())
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    root: Arc<PathBuf>,
    shortener: Option<Arc<dyn Shortener>>,
}

impl AppState {
    /// Creates the state for a server that serves files from `root`.
    /// Without a shortener the shorten endpoint reports that it is
    /// disabled.
    pub fn new(
        root: impl Into<PathBuf>,
        shortener: Option<Arc<dyn Shortener>>,
    ) -> AppState {
        AppState {
            root: Arc::new(root.into()),
            shortener,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(SHORTEN_PATH, get(shorten))
        .fallback(serve_static)
        .layer(middleware::map_response(security_headers))
        .with_state(state)
}

async fn security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );

    response
}

#[derive(Deserialize)]
struct ShortenParams {
    url: Option<String>,
}

fn is_shareable_url(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https") && url.has_host()
        },
        Err(_) => false,
    }
}

async fn shorten(
    State(state): State<AppState>,
    Query(params): Query<ShortenParams>,
) -> (StatusCode, Json<ShortenResponse>) {
    let Some(url) = params.url.filter(|url| !url.trim().is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ShortenResponse::error("URL parameter is required", None)),
        );
    };

    if !is_shareable_url(&url) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ShortenResponse::error(
                "URL must be an absolute http(s) URL",
                None,
            )),
        );
    }

    let Some(shortener) = state.shortener.as_ref()
    else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ShortenResponse::error(
                "URL shortening is disabled",
                Some(&url),
            )),
        );
    };

    match shortener.shorten(&url).await {
        Ok(short_url) => {
            tracing::info!(%url, %short_url, "shortened link");
            (StatusCode::OK, Json(ShortenResponse::shortened(short_url)))
        },
        Err(e) => {
            tracing::warn!(%url, error = %e, "failed to shorten link");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ShortenResponse::error(
                    "Failed to shorten URL",
                    Some(&url),
                )),
            )
        },
    }
}

/// Maps the path of a request onto a file in the web root. Only
/// normal components are allowed so the result can’t escape the root.
fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut path = root.to_path_buf();
    let mut has_file = false;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                has_file = true;
            },
            Component::CurDir => (),
            Component::ParentDir
                | Component::RootDir
                | Component::Prefix(_) => return None,
        }
    }

    if !has_file {
        path.push("index.html");
    } else if path.extension().is_none() {
        path.set_extension("html");
    }

    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("wasm") => "application/wasm",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(path) = resolve_path(&state.root, uri.path())
    else {
        tracing::debug!(path = uri.path(), "rejected path");
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(contents) => (
            [(header::CONTENT_TYPE, content_type(&path))],
            contents,
        ).into_response(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "not found");
            StatusCode::NOT_FOUND.into_response()
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SHARE_URL: &'static str =
        "https://example.com/play?puzzle=abc";
    const ESCAPED_SHARE_URL: &'static str =
        "https%3A%2F%2Fexample.com%2Fplay%3Fpuzzle%3Dabc";

    struct FakeShortener(Option<&'static str>);

    #[async_trait]
    impl Shortener for FakeShortener {
        async fn shorten(&self, _url: &str) -> Result<String, ShortenError> {
            self.0.map(str::to_string).ok_or(ShortenError::Empty)
        }
    }

    fn make_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();

        std::fs::write(dir.path().join("index.html"), "creator").unwrap();
        std::fs::write(dir.path().join("play.html"), "play").unwrap();
        std::fs::write(dir.path().join("style.css"), "body {}").unwrap();
        std::fs::create_dir(dir.path().join("pkg")).unwrap();
        std::fs::write(
            dir.path().join("pkg").join("custom_connections_bg.wasm"),
            b"\0asm",
        ).unwrap();

        dir
    }

    fn make_app(
        root: &tempfile::TempDir,
        shortener: Option<&'static str>,
    ) -> Router {
        let shortener: Arc<dyn Shortener> =
            Arc::new(FakeShortener(shortener));
        app(AppState::new(root.path(), Some(shortener)))
    }

    async fn request(app: Router, uri: &str) -> (StatusCode, Response) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        (response.status(), response)
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, ShortenResponse) {
        let (status, response) = request(app, uri).await;
        let body = body_string(response).await;

        (status, serde_json::from_str(&body).unwrap())
    }

    #[test]
    fn paths() {
        let root = Path::new("/srv/www");

        assert_eq!(
            resolve_path(root, "/"),
            Some(PathBuf::from("/srv/www/index.html")),
        );
        assert_eq!(
            resolve_path(root, "/play"),
            Some(PathBuf::from("/srv/www/play.html")),
        );
        assert_eq!(
            resolve_path(root, "/pkg/app.js"),
            Some(PathBuf::from("/srv/www/pkg/app.js")),
        );
        assert_eq!(
            resolve_path(root, "/./style.css"),
            Some(PathBuf::from("/srv/www/style.css")),
        );
        assert_eq!(resolve_path(root, "/../etc/passwd"), None);
        assert_eq!(resolve_path(root, "/pkg/../../secret"), None);
    }

    #[test]
    fn shareable_url() {
        assert!(is_shareable_url(SHARE_URL));
        assert!(is_shareable_url("http://localhost:8080/play?puzzle=x"));
        assert!(!is_shareable_url("javascript:alert(1)"));
        assert!(!is_shareable_url("/play?puzzle=x"));
        assert!(!is_shareable_url("ftp://example.com/"));
    }

    #[tokio::test]
    async fn shorten_ok() {
        let root = make_root();
        let (status, response) = get_json(
            make_app(&root, Some("https://tinyurl.com/abc")),
            &format!("/api/shorten?url={}", ESCAPED_SHARE_URL),
        ).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response,
            ShortenResponse::shortened("https://tinyurl.com/abc".to_string()),
        );
    }

    #[tokio::test]
    async fn shorten_missing_url() {
        let root = make_root();

        for uri in ["/api/shorten", "/api/shorten?url="] {
            let (status, response) = get_json(
                make_app(&root, Some("https://tinyurl.com/abc")),
                uri,
            ).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                response.error.as_deref(),
                Some("URL parameter is required"),
            );
            assert_eq!(response.short_url, None);
        }
    }

    #[tokio::test]
    async fn shorten_bad_url() {
        let root = make_root();
        let (status, response) = get_json(
            make_app(&root, Some("https://tinyurl.com/abc")),
            "/api/shorten?url=javascript%3Aalert(1)",
        ).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.error.as_deref(),
            Some("URL must be an absolute http(s) URL"),
        );
    }

    #[tokio::test]
    async fn shorten_failure() {
        let root = make_root();
        let (status, response) = get_json(
            make_app(&root, None),
            &format!("/api/shorten?url={}", ESCAPED_SHARE_URL),
        ).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response,
            ShortenResponse::error("Failed to shorten URL", Some(SHARE_URL)),
        );
    }

    #[tokio::test]
    async fn shorten_disabled() {
        let root = make_root();
        let (status, response) = get_json(
            app(AppState::new(root.path(), None)),
            &format!("/api/shorten?url={}", ESCAPED_SHARE_URL),
        ).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.original_url.as_deref(), Some(SHARE_URL));
    }

    #[tokio::test]
    async fn static_files() {
        let root = make_root();

        let (status, response) = request(make_app(&root, None), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8",
        );
        assert_eq!(&body_string(response).await, "creator");

        let (status, response) =
            request(make_app(&root, None), "/play?puzzle=abc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body_string(response).await, "play");

        let (status, response) = request(
            make_app(&root, None),
            "/pkg/custom_connections_bg.wasm",
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/wasm",
        );

        let (status, _) = request(make_app(&root, None), "/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = request(make_app(&root, None), "/../play.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn headers() {
        let root = make_root();

        for uri in ["/", "/api/shorten", "/missing"] {
            let (_, response) = request(make_app(&root, None), uri).await;
            let headers = response.headers();

            assert_eq!(
                headers[header::CONTENT_SECURITY_POLICY],
                CONTENT_SECURITY_POLICY,
            );
            assert!(
                headers[header::CONTENT_SECURITY_POLICY]
                    .to_str()
                    .unwrap()
                    .contains("script-src 'self' 'wasm-unsafe-eval'"),
            );
            assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
            assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
            assert_eq!(
                headers[header::REFERRER_POLICY],
                "strict-origin-when-cross-origin",
            );
            assert_eq!(
                headers["permissions-policy"],
                "camera=(), microphone=(), geolocation=()",
            );
        }
    }

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{}/api-create.php", address)
    }

    #[tokio::test]
    async fn tiny_url() {
        #[derive(Deserialize)]
        struct Params {
            url: String,
        }

        let endpoint = spawn_upstream(Router::new().route(
            "/api-create.php",
            get(|Query(params): Query<Params>| async move {
                format!("https://tinyurl.com/{}\n", params.url.len())
            }),
        )).await;

        let shortener = TinyUrl::new(endpoint).unwrap();

        assert_eq!(
            shortener.shorten(SHARE_URL).await.unwrap(),
            format!("https://tinyurl.com/{}", SHARE_URL.len()),
        );
    }

    #[tokio::test]
    async fn tiny_url_failure() {
        let endpoint = spawn_upstream(
            Router::new()
                .route("/api-create.php", get(|| async { "  " }))
        ).await;
        let shortener = TinyUrl::new(endpoint).unwrap();
        assert!(matches!(
            shortener.shorten(SHARE_URL).await,
            Err(ShortenError::Empty),
        ));

        let endpoint = spawn_upstream(Router::new().route(
            "/api-create.php",
            get(|| async { (StatusCode::BAD_GATEWAY, "Error") }),
        )).await;
        let shortener = TinyUrl::new(endpoint).unwrap();
        assert!(matches!(
            shortener.shorten(SHARE_URL).await,
            Err(ShortenError::Status(status)) if status.as_u16() == 502,
        ));
    }
}
