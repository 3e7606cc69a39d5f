//! Collaborators the pipeline consumes. Implementations live outside the
//! core; `mock` provides in-memory ones for tests.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::extraction::types::{Classification, ExtractedData};
use super::retry::CorrectionHints;
use crate::models::enums::ClassifiedType;
use crate::models::tenant::TenantIdentity;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Document {document_id} not found for tenant {tenant_id}")]
    DocumentNotFound { tenant_id: Uuid, document_id: Uuid },

    #[error("Tenant not found: {0}")]
    TenantNotFound(Uuid),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Inference backend unavailable: {0}")]
    Unavailable(String),

    #[error("Model call timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Model gate closed")]
    GateClosed,
}

/// Raw document as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, tenant_id: Uuid, document_id: Uuid) -> Result<FetchedDocument, FetchError>;
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, bytes: &[u8], mime_type: &str) -> Result<Classification, ModelError>;
}

#[async_trait]
pub trait Extractor: Send + Sync {
    /// `hints` is only set on retries and carries the failing fields with
    /// their correction hints.
    async fn extract(
        &self,
        bytes: &[u8],
        mime_type: &str,
        document_type: ClassifiedType,
        hints: Option<&CorrectionHints>,
    ) -> Result<ExtractedData, ModelError>;
}

/// Read-only view of tenant identities.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn tenant(&self, tenant_id: Uuid) -> Result<TenantIdentity, FetchError>;
}
