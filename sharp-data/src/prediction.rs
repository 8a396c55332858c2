//! Response payloads of the prediction service and their boundary parsing.
//!
//! Bodies are validated into typed shapes here so nothing downstream ever
//! sees raw JSON. A success status with a body that does not fit is a
//! [`StudioError::MalformedResponse`]; a non-success status becomes a
//! [`StudioError::Transport`] carrying the service's `detail` when present.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StudioError, StudioResult, GENERIC_FAILURE};

/// One processed input image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputItem {
    pub name: String,
    pub preview: String,
    pub ply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_video: Option<String>,
}

impl OutputItem {
    fn normalize(mut self) -> Self {
        self.video = self.video.filter(|v| !v.is_empty());
        self.depth_video = self.depth_video.filter(|v| !v.is_empty());
        self
    }
}

/// Successful `POST /api/predict` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub device: String,
    pub render_enabled: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub bundle: String,
    pub outputs: Vec<OutputItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_requested: Option<bool>,
}

impl PredictionResult {
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

/// `GET /api/output-root` body.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OutputRootPath {
    pub path: String,
}

/// `POST /api/output-root/select` body.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OutputRootSelection {
    pub path: String,
    #[serde(default)]
    pub changed: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// The service's `detail` message, if the body carries a usable one.
///
/// Validation failures arrive with `detail` as a list of objects; those are
/// not shown verbatim and yield `None`.
pub fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

/// Map a non-success status into a transport error; success passes through.
pub fn check_status(status: u16, body: &str) -> StudioResult<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let message = error_detail(body).unwrap_or_else(|| GENERIC_FAILURE.to_string());
    Err(StudioError::transport(Some(status), message))
}

/// Validate status and body, then decode into `T`.
pub fn parse_json_body<T: DeserializeOwned>(status: u16, body: &str) -> StudioResult<T> {
    check_status(status, body)?;
    serde_json::from_str(body).map_err(|e| {
        log::warn!("Malformed response body ({} bytes): {}", body.len(), e);
        StudioError::MalformedResponse(format!(
            "The prediction service returned an unreadable response: {e}"
        ))
    })
}

/// Decode a predict response, normalizing empty optional media to absent.
pub fn parse_predict_response(status: u16, body: &str) -> StudioResult<PredictionResult> {
    let mut result: PredictionResult = parse_json_body(status, body)?;
    result.outputs = result.outputs.into_iter().map(OutputItem::normalize).collect();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_success() {
        let body = r#"{"device":"cpu","render_enabled":false,"warnings":[],"bundle":"/b.zip",
            "outputs":[{"name":"scene1","preview":"/p1.png","ply":"/p1.ply"}]}"#;
        let result = parse_predict_response(200, body).unwrap();
        assert_eq!(result.device, "cpu");
        assert_eq!(result.output_count(), 1);
        assert_eq!(result.outputs[0].video, None);
        assert_eq!(result.run_id, None);
    }

    #[test]
    fn test_parse_keeps_optional_media_and_run_id() {
        let body = r#"{"run_id":"20250101-000000-abcd1234","device":"cuda","render_enabled":true,
            "render_requested":true,"warnings":["w"],"bundle":"/b.zip",
            "outputs":[{"name":"a.png","preview":"/p","ply":"/a.ply","video":"/a.mp4","depth_video":""}]}"#;
        let result = parse_predict_response(200, body).unwrap();
        assert_eq!(result.outputs[0].video.as_deref(), Some("/a.mp4"));
        assert_eq!(result.outputs[0].depth_video, None);
        assert_eq!(result.run_id.as_deref(), Some("20250101-000000-abcd1234"));
        assert_eq!(result.render_requested, Some(true));
    }

    #[test]
    fn test_error_status_uses_detail() {
        let err = parse_predict_response(400, r#"{"detail":"Unsupported image format"}"#).unwrap_err();
        assert_eq!(
            err,
            StudioError::transport(Some(400), "Unsupported image format")
        );
    }

    #[test]
    fn test_error_status_without_detail_falls_back() {
        for body in ["", "not json", "{}", r#"{"detail":[{"loc":["body","images"]}]}"#] {
            let err = parse_predict_response(422, body).unwrap_err();
            assert_eq!(err, StudioError::transport(Some(422), GENERIC_FAILURE));
        }
    }

    #[test]
    fn test_success_with_bad_shape_is_malformed() {
        let err = parse_predict_response(200, r#"{"device":"cpu"}"#).unwrap_err();
        assert!(matches!(err, StudioError::MalformedResponse(_)));

        let err = parse_predict_response(200, "<html>").unwrap_err();
        assert!(matches!(err, StudioError::MalformedResponse(_)));
    }

    #[test]
    fn test_output_root_selection_defaults_changed() {
        let sel: OutputRootSelection = parse_json_body(200, r#"{"path":"/out"}"#).unwrap();
        assert!(!sel.changed);
    }
}
