//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert a successful upload response and return its JSON
pub fn assert_upload_success(response: &TestResponse) -> serde_json::Value {
    assert_ok(response);
    let json: serde_json::Value = response.json();
    assert_eq!(json["success"], true, "Upload failed: {json}");
    assert!(json["binary_path"].is_string(), "Missing binary_path: {json}");
    assert!(json["stats"].is_object(), "Missing stats: {json}");
    assert!(json.get("error").is_none(), "Unexpected error: {json}");
    json
}

/// Assert a failed upload with the given status; returns the error message
pub fn assert_upload_failure(response: &TestResponse, expected: StatusCode) -> String {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(json["success"], false, "Expected failure: {json}");
    json["error"]
        .as_str()
        .unwrap_or_else(|| panic!("Missing error message: {json}"))
        .to_string()
}

/// Assert statistics JSON is well formed: six colors sorted by index,
/// counts summing to the panel size and percentages to ~100
pub fn assert_valid_stats(stats: &serde_json::Value) {
    let colors = stats["colors"].as_array().expect("colors must be an array");
    let indices: Vec<u64> = colors.iter().map(|c| c["index"].as_u64().unwrap()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 5, 6]);

    let total: u64 = colors.iter().map(|c| c["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 384_000);
    assert_eq!(stats["total_pixels"], 384_000);

    let percent: f64 = colors
        .iter()
        .map(|c| c["percentage"].as_f64().unwrap())
        .sum();
    assert!((percent - 100.0).abs() < 0.1, "percentages sum to {percent}");
}
