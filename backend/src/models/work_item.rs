/// Input handed to inference.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    /// Base64-encoded image bytes.
    Image(String),
}

/// One unit of input data (a review, an image). Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub id: String,
    pub payload: Payload,
    pub subject_id: Option<String>,
    pub filename: Option<String>,
}

impl WorkItem {
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: Payload::Text(text.into()),
            subject_id: None,
            filename: None,
        }
    }

    pub fn image(filename: impl Into<String>, base64_image: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            id: filename.clone(),
            payload: Payload::Image(base64_image.into()),
            subject_id: None,
            filename: Some(filename),
        }
    }

    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// The text payload, if this is a text item.
    pub fn text_payload(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(text),
            Payload::Image(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_item_uses_filename_as_id() {
        let item = WorkItem::image("lion.jpg", "aW1n");
        assert_eq!(item.id, "lion.jpg");
        assert_eq!(item.filename.as_deref(), Some("lion.jpg"));
        assert!(item.text_payload().is_none());
    }

    #[test]
    fn test_text_item_with_subject() {
        let item = WorkItem::text("r1", "Fun game").with_subject("app-10");
        assert_eq!(item.text_payload(), Some("Fun game"));
        assert_eq!(item.subject_id.as_deref(), Some("app-10"));
    }
}
