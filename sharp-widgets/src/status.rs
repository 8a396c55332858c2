use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    Idle,
    Busy,
    Success,
    Error,
}

/// The page status area: a short state word plus an explanatory line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub state: String,
    pub detail: String,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::idle()
    }
}

impl StatusLine {
    pub fn new(kind: StatusKind, state: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            state: state.into(),
            detail: detail.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(StatusKind::Idle, "Ready", "Add images to get started.")
    }

    pub fn busy(state: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(StatusKind::Busy, state, detail)
    }

    pub fn success(state: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(StatusKind::Success, state, detail)
    }

    pub fn error(state: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, state, detail)
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_error_kind_is_error() {
        assert!(StatusLine::error("Error", "bad image").is_error());
        assert!(!StatusLine::busy("Running", "Uploading…").is_error());
        assert!(!StatusLine::default().is_error());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let value = serde_json::to_value(StatusLine::success("Done", "1 output(s) ready on cpu.")).unwrap();
        assert_eq!(value["kind"], "success");
        assert_eq!(value["state"], "Done");
    }
}
