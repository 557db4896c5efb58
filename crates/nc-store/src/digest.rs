//! Content digests for hash-gated saves.
//!
//! Digests are order-independent where the payload has no meaningful order:
//! drawing elements are hashed sorted by id and embedded files by key, so
//! two scenes that differ only in construction order hash identically.

use crate::error::StoreResult;
use nc_core::format::{TextNoteFile, emit_drawing_document, emit_text_note};
use nc_core::model::DrawingScene;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix is enough to tell snapshots apart in logs.
        let hex = self.to_string();
        write!(f, "ContentDigest({})", &hex[..12])
    }
}

/// Something an editor hands to the save scheduler.
pub trait Snapshot: Clone + Send + Sync + 'static {
    /// Fingerprint used to skip redundant writes.
    fn digest(&self) -> ContentDigest;

    /// Bytes written to the backing file.
    fn encode(&self) -> StoreResult<Vec<u8>>;
}

/// Text note content: title line plus markdown body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSnapshot {
    pub title: String,
    pub body: String,
}

impl TextSnapshot {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    fn file(&self) -> TextNoteFile {
        TextNoteFile {
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }
}

impl From<TextNoteFile> for TextSnapshot {
    fn from(file: TextNoteFile) -> Self {
        Self {
            title: file.title,
            body: file.body,
        }
    }
}

impl Snapshot for TextSnapshot {
    fn digest(&self) -> ContentDigest {
        ContentDigest::of(emit_text_note(&self.file()).as_bytes())
    }

    fn encode(&self) -> StoreResult<Vec<u8>> {
        Ok(emit_text_note(&self.file()).into_bytes())
    }
}

impl Snapshot for DrawingScene {
    fn digest(&self) -> ContentDigest {
        // serde_json maps are key-ordered, so only the element list needs sorting.
        let canonical = json!({
            "elements": self.sorted_elements(),
            "appState": self.app_state,
            "files": self.files,
        });
        ContentDigest::of(&serde_json::to_vec(&canonical).unwrap_or_default())
    }

    fn encode(&self) -> StoreResult<Vec<u8>> {
        Ok(emit_drawing_document(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::{assert_eq, assert_ne};
    use serde_json::Value;

    fn scene(elements: Vec<Value>, files: &[(&str, Value)]) -> DrawingScene {
        DrawingScene {
            elements,
            files: files.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn drawing_digest_ignores_element_order() {
        let a = json!({"id": "a", "type": "rectangle", "x": 1});
        let b = json!({"id": "b", "type": "ellipse", "x": 2});
        let f = json!({"mimeType": "image/png", "dataURL": "data:,"});
        let one = scene(vec![a.clone(), b.clone()], &[("f1", f.clone()), ("f2", f.clone())]);
        let two = scene(vec![b, a], &[("f2", f.clone()), ("f1", f)]);
        assert_eq!(one.digest(), two.digest());
    }

    #[test]
    fn drawing_digest_sees_content_changes() {
        let one = scene(vec![json!({"id": "a", "x": 1})], &[]);
        let two = scene(vec![json!({"id": "a", "x": 2})], &[]);
        assert_ne!(one.digest(), two.digest());
    }

    #[test]
    fn text_digest_covers_title_and_body() {
        let base = TextSnapshot::new("Title", "body");
        assert_eq!(base.digest(), TextSnapshot::new("Title", "body").digest());
        assert_ne!(base.digest(), TextSnapshot::new("Title", "body!").digest());
        assert_ne!(base.digest(), TextSnapshot::new("Title!", "body").digest());
        assert_eq!(base.encode().unwrap(), b"Title\nbody");
    }

    #[test]
    fn digest_renders_as_hex() {
        let d = ContentDigest::of(b"");
        assert_eq!(
            d.to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
