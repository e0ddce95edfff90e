use flow_vision::utils::http::HttpFetch;
use flow_vision_types::{Bytes, anyhow};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};

/// Where a model comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ModelSource {
    /// `http://` or `https://` location, fetched through the injected [`HttpFetch`]
    Url(String),
    /// Local file
    Path(PathBuf),
    /// Name of a model the backend knows by itself, e.g. `lite_mobilenet_v2`
    Identifier(String),
}

const MODEL_FILE_EXTENSIONS: [&str; 5] = ["onnx", "json", "tflite", "pb", "bin"];

impl ModelSource {
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        let lower = source.to_ascii_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            return ModelSource::Url(source.to_string());
        }

        if let Some(path) = source.strip_prefix("file://") {
            return ModelSource::Path(PathBuf::from(path));
        }

        let path = PathBuf::from(source);
        let has_model_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| MODEL_FILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);

        if source.contains('/') || source.contains('\\') || has_model_extension {
            return ModelSource::Path(path);
        }

        ModelSource::Identifier(source.to_string())
    }

    /// Lowercased file extension of a URL or path, ignoring any query string.
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            ModelSource::Url(url) => {
                let url = url.split(['?', '#']).next().unwrap_or(url);
                url.rsplit('/').next().unwrap_or(url).to_string()
            }
            ModelSource::Path(path) => path.file_name()?.to_str()?.to_string(),
            ModelSource::Identifier(_) => return None,
        };
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Raw bytes behind a URL or path. Identifiers have no bytes to read.
    pub async fn read_bytes(&self, fetch: &dyn HttpFetch) -> flow_vision_types::Result<Bytes> {
        tracing::debug!(source = %self, "Reading model bytes");
        match self {
            ModelSource::Url(url) => fetch.fetch(url).await,
            ModelSource::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    anyhow!("Failed to read model file '{}': {}", path.display(), e)
                })?;
                Ok(Bytes::from(bytes))
            }
            ModelSource::Identifier(id) => Err(anyhow!(
                "'{}' is a model identifier, not a location that can be read",
                id
            )),
        }
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Url(url) => write!(f, "{}", url),
            ModelSource::Path(path) => write!(f, "{}", path.display()),
            ModelSource::Identifier(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_vision_types::async_trait;
    use std::io::Write;

    struct StaticFetch;

    #[async_trait]
    impl HttpFetch for StaticFetch {
        async fn fetch(&self, url: &str) -> flow_vision_types::Result<Bytes> {
            Ok(Bytes::from(format!("fetched {url}")))
        }
    }

    #[test]
    fn parse_sources() {
        assert_eq!(
            ModelSource::parse("https://storage.example.com/model.json"),
            ModelSource::Url("https://storage.example.com/model.json".into())
        );
        assert_eq!(
            ModelSource::parse("file:///opt/models/net.onnx"),
            ModelSource::Path(PathBuf::from("/opt/models/net.onnx"))
        );
        assert_eq!(
            ModelSource::parse("models/net.onnx"),
            ModelSource::Path(PathBuf::from("models/net.onnx"))
        );
        assert_eq!(
            ModelSource::parse("net.ONNX"),
            ModelSource::Path(PathBuf::from("net.ONNX"))
        );
        assert_eq!(
            ModelSource::parse(" lite_mobilenet_v2 "),
            ModelSource::Identifier("lite_mobilenet_v2".into())
        );
    }

    #[test]
    fn extensions_of_urls_and_paths() {
        let ext = |s: &str| ModelSource::parse(s).extension();
        assert_eq!(ext("https://example.com/models/net.ONNX?sig=abc"), Some("onnx".into()));
        assert_eq!(
            ext("https://storage.googleapis.com/tfjs-models/tfjs/mobilenet_v1_0.25_224/model.json"),
            Some("json".into())
        );
        assert_eq!(ext("https://example.com/models/"), None);
        assert_eq!(ext("models/net.onnx"), Some("onnx".into()));
        assert_eq!(ext("/opt/models/.hidden"), None);
        assert_eq!(ext("lite_mobilenet_v2"), None);
    }

    #[tokio::test]
    async fn urls_go_through_the_injected_fetch() {
        let source = ModelSource::parse("https://example.com/m.onnx");
        let bytes = source.read_bytes(&StaticFetch).await.unwrap();
        assert_eq!(&bytes[..], b"fetched https://example.com/m.onnx");
    }

    #[tokio::test]
    async fn paths_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.onnx");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"weights")
            .unwrap();

        let bytes = ModelSource::Path(path).read_bytes(&StaticFetch).await.unwrap();
        assert_eq!(&bytes[..], b"weights");
    }

    #[tokio::test]
    async fn missing_files_and_identifiers_fail() {
        let missing = ModelSource::Path(PathBuf::from("/definitely/not/here.onnx"));
        assert!(missing.read_bytes(&StaticFetch).await.is_err());

        let id = ModelSource::Identifier("posenet".into());
        assert!(id.read_bytes(&StaticFetch).await.is_err());
    }
}
