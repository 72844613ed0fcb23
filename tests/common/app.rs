//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

use inkframe::models::AppConfig;
use inkframe::server::{build_router, create_app_state, AppState};

use super::fixtures::{multipart_body, BOUNDARY};

/// Test application with router and a private output directory
pub struct TestApp {
    router: axum::Router,
    output: TempDir,
}

impl TestApp {
    /// Create a new test application with default configuration
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test application, adjusting the configuration first
    pub fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let output = tempfile::tempdir().expect("Failed to create output dir");

        let mut config = AppConfig {
            output_dir: output.path().to_path_buf(),
            ..AppConfig::default()
        };
        configure(&mut config);

        // Create application state using shared server module
        let state = create_app_state(config).expect("Failed to create app state");

        // Build router using shared server module (same as production)
        let router = build_router(state);

        Self { router, output }
    }

    /// Create state for custom router configuration
    pub fn create_state(output_dir: &Path) -> AppState {
        let config = AppConfig {
            output_dir: output_dir.to_path_buf(),
            ..AppConfig::default()
        };
        create_app_state(config).expect("Failed to create app state")
    }

    /// Directory the pipeline publishes into
    pub fn output_dir(&self) -> &Path {
        self.output.path()
    }

    /// Path of a published artifact
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.output.path().join(name)
    }

    /// Names of all entries in the output directory, sorted
    pub fn output_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output.path())
            .expect("Failed to read output dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Upload file bytes under the given multipart field name
    pub async fn upload_field(&self, field: &str, filename: &str, bytes: &[u8]) -> TestResponse {
        let body = multipart_body(&[(field, Some(filename), bytes)]);
        self.post_multipart("/api/upload", body).await
    }

    /// Upload an image the way the web form does
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> TestResponse {
        self.upload_field("image", filename, bytes).await
    }

    /// POST a prebuilt multipart body
    pub async fn post_multipart(&self, path: &str, body: Vec<u8>) -> TestResponse {
        let request = Request::post(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.request(request).await
    }

    /// Send an arbitrary request to the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        self.request(request).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }
}
