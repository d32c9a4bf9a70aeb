//! Fetches the vocabulary and model artifacts from disk or over HTTP.

use std::fmt;
use std::path::{Path, PathBuf};

use spamlens_core::{ResourceLoadError, Vocabulary};
use tracing::info;

pub const MODEL_FILE: &str = "model.onnx";
pub const VOCAB_FILE: &str = "word_index.json";

/// Where an artifact lives: a local path or an `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    File(PathBuf),
    Url(String),
}

impl ArtifactSource {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    /// Child artifact under a directory or URL prefix.
    pub fn join(&self, name: &str) -> Self {
        match self {
            Self::File(dir) => Self::File(dir.join(name)),
            Self::Url(base) => Self::Url(format!("{}/{}", base.trim_end_matches('/'), name)),
        }
    }
}

impl From<PathBuf> for ArtifactSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for ArtifactSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Locations of both artifacts the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub model: ArtifactSource,
    pub vocabulary: ArtifactSource,
}

impl Artifacts {
    /// Standard layout: `<root>/model.onnx` and `<root>/word_index.json`.
    pub fn under(root: &ArtifactSource) -> Self {
        Self {
            model: root.join(MODEL_FILE),
            vocabulary: root.join(VOCAB_FILE),
        }
    }
}

/// Read an artifact's raw bytes.
pub async fn fetch_bytes(source: &ArtifactSource) -> Result<Vec<u8>, ResourceLoadError> {
    match source {
        ArtifactSource::File(path) => {
            if !tokio::fs::try_exists(path).await? {
                return Err(ResourceLoadError::NotFound(path.clone()));
            }
            Ok(tokio::fs::read(path).await?)
        }
        ArtifactSource::Url(url) => fetch_url(url).await,
    }
}

#[cfg(feature = "http")]
async fn fetch_url(url: &str) -> Result<Vec<u8>, ResourceLoadError> {
    info!(url = %url, "fetching artifact");
    let fetch_err = |e: reqwest::Error| ResourceLoadError::Fetch(e.to_string());

    let resp = reqwest::get(url).await.map_err(fetch_err)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ResourceLoadError::Fetch(format!(
            "{url}: server returned {}",
            status.as_u16()
        )));
    }
    let bytes = resp.bytes().await.map_err(fetch_err)?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "http"))]
async fn fetch_url(url: &str) -> Result<Vec<u8>, ResourceLoadError> {
    Err(ResourceLoadError::Fetch(format!(
        "{url}: built without the `http` feature"
    )))
}

/// Fetch and parse the word-index vocabulary.
pub async fn load_vocabulary(source: &ArtifactSource) -> Result<Vocabulary, ResourceLoadError> {
    let bytes = fetch_bytes(source).await?;
    let vocab = Vocabulary::from_json_slice(&bytes)?;
    info!(entries = vocab.len(), source = %source, "loaded vocabulary");
    Ok(vocab)
}

/// Load the vocabulary and the ONNX model concurrently.
#[cfg(feature = "onnx")]
pub async fn load_onnx(
    artifacts: &Artifacts,
) -> Result<(Vocabulary, crate::OnnxModel), ResourceLoadError> {
    tokio::try_join!(
        load_vocabulary(&artifacts.vocabulary),
        load_onnx_model(&artifacts.model)
    )
}

#[cfg(feature = "onnx")]
pub async fn load_onnx_model(
    source: &ArtifactSource,
) -> Result<crate::OnnxModel, ResourceLoadError> {
    use crate::OnnxModel;

    let model_err = |e: anyhow::Error| ResourceLoadError::Model(format!("{e:#}"));

    let loaded = match source {
        ArtifactSource::File(path) => {
            if !tokio::fs::try_exists(path).await? {
                return Err(ResourceLoadError::NotFound(path.clone()));
            }
            let path = path.clone();
            tokio::task::spawn_blocking(move || OnnxModel::from_file(&path)).await
        }
        ArtifactSource::Url(url) => {
            let bytes = fetch_bytes(source).await?;
            let name = url.clone();
            tokio::task::spawn_blocking(move || OnnxModel::from_bytes(&bytes, &name)).await
        }
    };

    loaded
        .map_err(|e| ResourceLoadError::Model(format!("model loading task failed: {e}")))?
        .map_err(model_err)
}
