use crate::view::ViewNode;
use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    /// Lower-cased, without the leading dot.
    pub required_extension: String,
    pub user_agent: String,
    pub download_dir: PathBuf,
}

/// Kind of a generated artifact, as reported in the registry's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Excel,
    Ppt,
    Other,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Excel => "excel",
            FileKind::Ppt => "ppt",
            FileKind::Other => "other",
        }
    }
}

// Unknown type strings decode as `Other` instead of failing the whole listing.
impl<'de> Deserialize<'de> for FileKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "excel" => FileKind::Excel,
            "ppt" => FileKind::Ppt,
            _ => FileKind::Other,
        })
    }
}

impl Serialize for FileKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OutputFileList {
    #[serde(default)]
    pub files: Vec<OutputFile>,
}

/// One selected file, held in memory until the upload settles.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .with_context(|| format!("invalid file name: {}", path.display()))?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        Ok(Self::new(name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub files: Vec<UploadFile>,
    pub generate_excel: bool,
    pub generate_ppt: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub files: Vec<OutputFile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Presentation events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum AppEvent {
    ListRendered(ViewNode),
    FilesChanged(Vec<OutputFile>),
    /// Blocking notification; the presenter must surface it until acknowledged.
    Alert(String),
    SubmitControl {
        enabled: bool,
    },
    Processing {
        visible: bool,
    },
    UploadCompleted(UploadResult),
    Info(String),
}
