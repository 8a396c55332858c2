//! Request-side types: user-supplied files, device choice and the predict
//! request that bundles them for the multipart upload.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::error::StudioError;

/// A user-supplied binary blob with a display name.
///
/// Cloning is cheap; the bytes are shared. Two files with the same name are
/// still distinct entries, identity is by position in the selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Read a file from disk, using its file name as display name.
    pub fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn to_part(&self) -> Part {
        Part::bytes(self.bytes.to_vec()).file_name(self.name.clone())
    }
}

/// Compute device requested from the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Let the service pick (cuda, then mps, then cpu).
    #[default]
    Default,
    Cpu,
    Cuda,
    Mps,
}

impl Device {
    pub const ALL: [Device; 4] = [Device::Default, Device::Cpu, Device::Cuda, Device::Mps];

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Default => "default",
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::Mps => "mps",
        }
    }
}

impl FromStr for Device {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Ok(Device::Default);
        }
        Device::ALL
            .into_iter()
            .find(|device| device.as_str() == name)
            .ok_or_else(|| {
                StudioError::validation(format!(
                    "Unknown device '{name}'. Device must be one of: cpu, cuda, mps, default"
                ))
            })
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that goes into one `POST /api/predict`.
#[derive(Clone, Debug)]
pub struct PredictRequest {
    pub images: Vec<InputFile>,
    pub device: Device,
    pub render: bool,
    pub unsafe_checkpoint: bool,
    pub checkpoint: Option<InputFile>,
}

impl PredictRequest {
    /// Scalar form fields in the order they are appended to the upload.
    pub fn scalar_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("device", self.device.as_str().to_string()),
            ("render", self.render.to_string()),
        ];
        if self.unsafe_checkpoint {
            fields.push(("unsafe_checkpoint", "true".to_string()));
        }
        fields
    }

    /// Build the multipart body: one repeated `images` part per file, the
    /// scalar fields, and the optional `checkpoint` part.
    pub fn to_form(&self) -> Form {
        let mut form = self
            .images
            .iter()
            .fold(Form::new(), |form, image| form.part("images", image.to_part()));

        for (key, value) in self.scalar_fields() {
            form = form.text(key, value);
        }

        if let Some(checkpoint) = &self.checkpoint {
            form = form.part("checkpoint", checkpoint.to_part());
        }
        form
    }
}
