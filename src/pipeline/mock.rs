//! In-memory collaborators for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::extraction::types::{Classification, ExtractedData};
use super::ports::{
    Classifier, DocumentSource, Extractor, FetchError, FetchedDocument, ModelError, TenantDirectory,
};
use super::retry::CorrectionHints;
use crate::models::enums::ClassifiedType;
use crate::models::tenant::TenantIdentity;

/// Classifier that always answers with the same classification.
pub struct FixedClassifier {
    result: Result<Classification, ModelError>,
}

impl FixedClassifier {
    pub fn new(document_type: ClassifiedType, confidence: f64) -> Self {
        Self {
            result: Ok(Classification {
                document_type,
                confidence,
                reasoning: format!("fixed {document_type}"),
            }),
        }
    }

    pub fn failing(error: ModelError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _bytes: &[u8], _mime_type: &str) -> Result<Classification, ModelError> {
        self.result.clone()
    }
}

/// Extractor that replays a script, one entry per call. Calls past the end
/// repeat the last entry. Records the hints it was given.
pub struct ScriptedExtractor {
    script: Vec<Result<ExtractedData, ModelError>>,
    call_count: AtomicUsize,
    seen_hints: Mutex<Vec<Option<CorrectionHints>>>,
}

impl ScriptedExtractor {
    pub fn new(script: Vec<Result<ExtractedData, ModelError>>) -> Self {
        Self {
            script,
            call_count: AtomicUsize::new(0),
            seen_hints: Mutex::new(Vec::new()),
        }
    }

    /// Every call returns `data`.
    pub fn always(data: ExtractedData) -> Self {
        Self::new(vec![Ok(data)])
    }

    /// Each call returns the next attempt in order.
    pub fn attempts(attempts: Vec<ExtractedData>) -> Self {
        Self::new(attempts.into_iter().map(Ok).collect())
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Hints received per call, in call order.
    pub fn seen_hints(&self) -> Vec<Option<CorrectionHints>> {
        self.seen_hints
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(
        &self,
        _bytes: &[u8],
        _mime_type: &str,
        _document_type: ClassifiedType,
        hints: Option<&CorrectionHints>,
    ) -> Result<ExtractedData, ModelError> {
        let index = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen_hints.lock() {
            seen.push(hints.cloned());
        }
        match self.script.get(index).or_else(|| self.script.last()) {
            Some(entry) => entry.clone(),
            None => Err(ModelError::MalformedResponse("empty extraction script".into())),
        }
    }
}

/// Tracks how many calls are in flight and the highest count observed.
#[derive(Debug, Clone, Default)]
pub struct PeakCounter {
    inner: Arc<(AtomicUsize, AtomicUsize)>,
}

impl PeakCounter {
    fn enter(&self) {
        let now = self.inner.0.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.1.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.inner.0.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.inner.1.load(Ordering::SeqCst)
    }
}

/// Classifier that takes `delay` per call; used to observe the model gate.
pub struct SlowClassifier {
    delay: Duration,
    in_flight: PeakCounter,
}

impl SlowClassifier {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: PeakCounter::default(),
        }
    }

    pub fn peak_counter(&self) -> PeakCounter {
        self.in_flight.clone()
    }
}

#[async_trait]
impl Classifier for SlowClassifier {
    async fn classify(&self, _bytes: &[u8], _mime_type: &str) -> Result<Classification, ModelError> {
        self.in_flight.enter();
        tokio::time::sleep(self.delay).await;
        self.in_flight.leave();
        Ok(Classification {
            document_type: ClassifiedType::Invoice,
            confidence: 0.9,
            reasoning: "slow".into(),
        })
    }
}

#[derive(Default)]
pub struct InMemoryDocumentSource {
    documents: HashMap<(Uuid, Uuid), FetchedDocument>,
}

impl InMemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, tenant_id: Uuid, document_id: Uuid, bytes: &[u8], mime_type: &str) -> Self {
        self.documents.insert(
            (tenant_id, document_id),
            FetchedDocument {
                bytes: bytes.to_vec(),
                mime_type: mime_type.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn fetch(&self, tenant_id: Uuid, document_id: Uuid) -> Result<FetchedDocument, FetchError> {
        self.documents
            .get(&(tenant_id, document_id))
            .cloned()
            .ok_or(FetchError::DocumentNotFound {
                tenant_id,
                document_id,
            })
    }
}

#[derive(Default)]
pub struct InMemoryTenantDirectory {
    tenants: HashMap<Uuid, TenantIdentity>,
}

impl InMemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant: TenantIdentity) -> Self {
        self.tenants.insert(tenant.tenant_id, tenant);
        self
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn tenant(&self, tenant_id: Uuid) -> Result<TenantIdentity, FetchError> {
        self.tenants
            .get(&tenant_id)
            .cloned()
            .ok_or(FetchError::TenantNotFound(tenant_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::types::fixtures;

    #[tokio::test]
    async fn scripted_extractor_repeats_last_entry() {
        let extractor = ScriptedExtractor::attempts(vec![
            ExtractedData::Invoice(fixtures::empty_invoice()),
            ExtractedData::Invoice(fixtures::invoice()),
        ]);
        for _ in 0..3 {
            extractor
                .extract(b"", "application/pdf", ClassifiedType::Invoice, None)
                .await
                .unwrap();
        }
        assert_eq!(extractor.calls(), 3);
        assert_eq!(extractor.seen_hints().len(), 3);
        let last = extractor
            .extract(b"", "application/pdf", ClassifiedType::Invoice, None)
            .await
            .unwrap();
        assert_eq!(last, ExtractedData::Invoice(fixtures::invoice()));
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let source = InMemoryDocumentSource::new();
        let err = source.fetch(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, FetchError::DocumentNotFound { .. }));
    }

    #[tokio::test]
    async fn tenant_directory_lookup() {
        let tenant = TenantIdentity::new("Acme BV");
        let id = tenant.tenant_id;
        let directory = InMemoryTenantDirectory::new().with_tenant(tenant);
        assert_eq!(directory.tenant(id).await.unwrap().legal_name, "Acme BV");
        assert!(directory.tenant(Uuid::new_v4()).await.is_err());
    }
}
