//! Shared DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;

use core_kernel::{DocType, Document, FieldMap};
use domain_workflow::{ActionDescriptor, ArtifactRef};

/// A stored document as returned to the UI
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub doctype: DocType,
    pub name: String,
    pub version: u64,
    pub fields: FieldMap,
    pub modified: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            doctype: doc.doctype,
            name: doc.name,
            version: doc.version,
            fields: doc.fields,
            modified: doc.modified,
        }
    }
}

/// The document a server procedure created
#[derive(Debug, Serialize)]
pub struct ArtifactResponse {
    pub doctype: DocType,
    pub name: String,
    pub message: String,
}

impl ArtifactResponse {
    pub fn new(artifact: ArtifactRef, message: impl Into<String>) -> Self {
        Self {
            doctype: artifact.doctype,
            name: artifact.name,
            message: message.into(),
        }
    }
}

/// Actions the gate offers for a document
#[derive(Debug, Serialize)]
pub struct ActionsResponse {
    pub doctype: DocType,
    pub name: String,
    pub actions: Vec<ActionDescriptor>,
}
