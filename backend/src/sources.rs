//! Loaders that materialise work items from local files.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use serde::Deserialize;

use crate::models::WorkItem;

/// Extensions accepted by [`load_image_dir`], compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid reviews file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One review in a reviews file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub subject_id: Option<String>,
}

/// Image files in `dir`, sorted by file name and base64-encoded.
///
/// Files that cannot be read are skipped with a warning.
pub fn load_image_dir(dir: &Path) -> Result<Vec<WorkItem>, SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    paths.sort();

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        match std::fs::read(&path) {
            Ok(bytes) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                items.push(WorkItem::image(filename, encoded));
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable image {}: {}", path.display(), e);
            }
        }
    }

    tracing::info!("Loaded {} images from {}", items.len(), dir.display());
    Ok(items)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Reviews from a JSON array of `{id, text, subjectId?}` objects.
pub fn load_reviews(path: &Path) -> Result<Vec<WorkItem>, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_reviews(&content)
}

pub fn parse_reviews(json: &str) -> Result<Vec<WorkItem>, SourceError> {
    let rows: Vec<ReviewRow> = serde_json::from_str(json)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let item = WorkItem::text(row.id, row.text);
            match row.subject_id {
                Some(subject) => item.with_subject(subject),
                None => item,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Payload;

    #[test]
    fn test_load_image_dir_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.PNG"), b"png-bytes").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"hello").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let items = load_image_dir(dir.path()).unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a.jpg", "b.PNG"]);
        assert_eq!(items[0].payload, Payload::Image("aGVsbG8=".to_string()));
    }

    #[test]
    fn test_load_image_dir_missing() {
        let err = load_image_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn test_parse_reviews() {
        let items = parse_reviews(
            r#"[{"id": "1", "text": "Great", "subjectId": "app-1"}, {"id": "2", "text": "Bad"}]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].subject_id.as_deref(), Some("app-1"));
        assert_eq!(items[1].text_payload(), Some("Bad"));
    }

    #[test]
    fn test_parse_reviews_rejects_garbage() {
        assert!(matches!(parse_reviews("{not json"), Err(SourceError::Parse(_))));
    }
}
