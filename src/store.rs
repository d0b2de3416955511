// ==============================================================================
// store.rs - Message Metadata Lookup
// ==============================================================================
// Description: Resolves a message id to its metadata file and attachment refs
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================
// On-disk layout: <root>/<room>/<username>/<messageId>.xml
// Attachment refs: <fileUrl>/uploads/<room>/<username>/<file></fileUrl>
// ==============================================================================

use regex::Regex;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::DeletionError;

/// Primary metadata file of a message and the attachments it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub metadata_path: PathBuf,
    pub attachments: Vec<String>,
}

/// Lookup provided by the message persistence layer
pub trait MessageStore: Send + Sync {
    /// `Ok(None)` when the message has no metadata file
    fn lookup(
        &self,
        room: &str,
        message_id: &str,
        username: &str,
    ) -> Result<Option<MessageRecord>, DeletionError>;
}

/// Reads the per-message XML files written by the chat server
pub struct XmlMessageStore {
    root: PathBuf,
}

impl XmlMessageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn metadata_path(&self, room: &str, message_id: &str, username: &str) -> PathBuf {
        self.root
            .join(room)
            .join(username)
            .join(format!("{}.xml", message_id))
    }
}

impl MessageStore for XmlMessageStore {
    fn lookup(
        &self,
        room: &str,
        message_id: &str,
        username: &str,
    ) -> Result<Option<MessageRecord>, DeletionError> {
        let metadata_path = self.metadata_path(room, message_id, username);

        let content = match std::fs::read_to_string(&metadata_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(DeletionError::Lookup {
                    path: metadata_path,
                    source,
                })
            }
        };

        let attachments = extract_file_urls(&content);
        debug!("Found {} attachment refs in {:?}", attachments.len(), metadata_path);

        Ok(Some(MessageRecord {
            metadata_path,
            attachments,
        }))
    }
}

fn file_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"<fileUrl>(.*?)</fileUrl>").expect("fileUrl pattern is valid")
    })
}

/// Extract and unescape every `<fileUrl>` value
pub fn extract_file_urls(xml: &str) -> Vec<String> {
    file_url_pattern()
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| unescape_xml(m.as_str()))
        .filter(|url| !url.is_empty())
        .collect()
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
