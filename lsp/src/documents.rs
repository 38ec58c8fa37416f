//! Open-document store - tracks what the client has open (full sync).
//!
//! The checker reads files from disk, so the stored text is never linted.
//! The store exists so a configuration change can revalidate every open
//! document.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenDocument {
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

#[derive(Debug, Default)]
pub(crate) struct DocumentStore {
    docs: BTreeMap<String, OpenDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, uri: String, document: OpenDocument) {
        self.docs.insert(uri, document);
    }

    /// Apply a full-text change. Changes for unknown documents or with an
    /// older version than the stored one are ignored.
    pub fn change(&mut self, uri: &str, version: i32, text: String) -> bool {
        match self.docs.get_mut(uri) {
            Some(doc) if version >= doc.version => {
                doc.version = version;
                doc.text = text;
                true
            }
            Some(doc) => {
                tracing::debug!(uri, version, current = doc.version, "ignoring stale change");
                false
            }
            None => {
                tracing::debug!(uri, "change for a document that is not open");
                false
            }
        }
    }

    pub fn close(&mut self, uri: &str) -> Option<OpenDocument> {
        self.docs.remove(uri)
    }

    pub fn get(&self, uri: &str) -> Option<&OpenDocument> {
        self.docs.get(uri)
    }

    /// URIs of all open documents, in a stable order.
    pub fn uris(&self) -> Vec<String> {
        self.docs.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }
}
