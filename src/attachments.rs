//! Attachment queue for pending file uploads
//!
//! Files selected by the user wait here until a turn is submitted, at
//! which point they are consumed (uploaded) in order and the queue is
//! cleared on success. Validation happens at queue time; the remote
//! service's own size ceiling (2 GiB) is enforced by the transport, not
//! here.

use crate::error::{DocuchatError, Result};
use bytes::Bytes;
use std::path::Path;

/// File extensions accepted for upload
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "txt", "html", "htm", "jpg", "jpeg", "png", "gif", "bmp", "tiff",
];

/// A pending file attachment
///
/// Owns the raw bytes until the queue is consumed by a submitted turn.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Display name (file name, no directory components)
    pub name: String,
    /// MIME type inferred from the file extension
    pub mime_type: String,
    /// Raw file contents
    pub data: Bytes,
}

impl Attachment {
    /// Create an attachment from a name and raw bytes
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = mime_type_for(extension_of(&name).as_deref()).to_string();
        Self {
            name,
            mime_type,
            data: data.into(),
        }
    }

    /// Read an attachment from a file on disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                DocuchatError::Validation(format!("not a file path: {}", path.display()))
            })?;
        let data = std::fs::read(path)?;
        Ok(Self::new(name, data))
    }

    /// Size of the attachment in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the attachment has no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Extract the lowercase extension from a file name
fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Map an accepted extension to its MIME type
///
/// Unknown extensions map to `application/octet-stream`; they are rejected
/// at queue time anyway.
pub fn mime_type_for(extension: Option<&str>) -> &'static str {
    match extension {
        Some("pdf") => "application/pdf",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("txt") => "text/plain",
        Some("html") | Some("htm") => "text/html",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Queue of attachments awaiting transmission
#[derive(Debug, Clone, Default)]
pub struct AttachmentQueue {
    items: Vec<Attachment>,
}

impl AttachmentQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an attachment to the queue
    ///
    /// Rejects files whose extension is outside the allow-list. An
    /// attachment already queued with an identical (name, size) pair is
    /// silently skipped rather than re-added.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the attachment was queued, `Ok(false)` if it was a
    /// duplicate and skipped.
    ///
    /// # Errors
    ///
    /// Returns a validation error for disallowed file types; the queue is
    /// left unchanged.
    pub fn add(&mut self, attachment: Attachment) -> Result<bool> {
        let extension = extension_of(&attachment.name);
        let allowed = extension
            .as_deref()
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext))
            .unwrap_or(false);
        if !allowed {
            return Err(DocuchatError::Validation(format!(
                "unsupported file type: {}",
                attachment.name
            ))
            .into());
        }

        let duplicate = self
            .items
            .iter()
            .any(|queued| queued.name == attachment.name && queued.len() == attachment.len());
        if duplicate {
            tracing::debug!(file = %attachment.name, "skipping duplicate attachment");
            return Ok(false);
        }

        tracing::debug!(file = %attachment.name, size = attachment.len(), "queued attachment");
        self.items.push(attachment);
        Ok(true)
    }

    /// Remove one attachment by index
    ///
    /// # Returns
    ///
    /// The removed attachment, or `None` if the index is out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<Attachment> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Empty the queue
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate over queued attachments in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    /// Number of queued attachments
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(name: &str, size: usize) -> Attachment {
        Attachment::new(name, vec![0u8; size])
    }

    #[test]
    fn test_add_allowed_file() {
        let mut queue = AttachmentQueue::new();
        assert!(queue.add(attachment("report.pdf", 10)).unwrap());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_add_rejects_disallowed_extension() {
        let mut queue = AttachmentQueue::new();
        let result = queue.add(attachment("report.exe", 10));
        assert!(result.is_err());
        assert!(queue.is_empty());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("report.exe"));
    }

    #[test]
    fn test_add_rejects_missing_extension() {
        let mut queue = AttachmentQueue::new();
        assert!(queue.add(attachment("README", 10)).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let mut queue = AttachmentQueue::new();
        assert!(queue.add(attachment("SCAN.PDF", 10)).unwrap());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_duplicate_name_and_size_skipped() {
        let mut queue = AttachmentQueue::new();
        assert!(queue.add(attachment("a.txt", 5)).unwrap());
        assert!(!queue.add(attachment("a.txt", 5)).unwrap());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_same_name_different_size_is_not_duplicate() {
        let mut queue = AttachmentQueue::new();
        assert!(queue.add(attachment("a.txt", 5)).unwrap());
        assert!(queue.add(attachment("a.txt", 6)).unwrap());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_no_duplicates_across_many_adds() {
        let mut queue = AttachmentQueue::new();
        for _ in 0..4 {
            let _ = queue.add(attachment("a.txt", 5));
            let _ = queue.add(attachment("b.png", 7));
        }
        assert_eq!(queue.len(), 2);
        for item in queue.iter() {
            let ext = extension_of(&item.name).unwrap();
            assert!(ALLOWED_EXTENSIONS.contains(&ext.as_str()));
        }
    }

    #[test]
    fn test_remove_at() {
        let mut queue = AttachmentQueue::new();
        queue.add(attachment("a.txt", 1)).unwrap();
        queue.add(attachment("b.txt", 2)).unwrap();
        let removed = queue.remove_at(0).unwrap();
        assert_eq!(removed.name, "a.txt");
        assert_eq!(queue.len(), 1);
        assert!(queue.remove_at(5).is_none());
    }

    #[test]
    fn test_clear() {
        let mut queue = AttachmentQueue::new();
        queue.add(attachment("a.txt", 1)).unwrap();
        queue.add(attachment("b.txt", 2)).unwrap();
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_mime_inference() {
        assert_eq!(
            Attachment::new("x.pdf", vec![1]).mime_type,
            "application/pdf"
        );
        assert_eq!(Attachment::new("x.htm", vec![1]).mime_type, "text/html");
        assert_eq!(Attachment::new("x.jpeg", vec![1]).mime_type, "image/jpeg");
        assert_eq!(Attachment::new("x.TIFF", vec![1]).mime_type, "image/tiff");
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, b"hello").unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.name, "note.txt");
        assert_eq!(attachment.mime_type, "text/plain");
        assert_eq!(attachment.len(), 5);
    }
}
