//! Document intake coordinator.
//!
//! Single entry point that drives one document through the pipeline:
//! classify → extract → validate → [retry] → resolve direction → gate.
//!
//! Every collaborator sits behind a port trait, so the coordinator is fully
//! testable with the in-memory doubles from `mock`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use super::direction::{resolve_direction, resolved_counterparty_vat, DirectionResolution};
use super::extraction::types::ExtractedData;
use super::gate::{CancellationFlag, Deadline, ModelGate};
use super::ports::{Classifier, DocumentSource, Extractor, FetchError, ModelError, TenantDirectory};
use super::retry::{RetryConfig, RetryOrchestrator, RetryResult};
use super::validation::audit::AuditSuite;
use super::validation::threshold::meets_minimal_threshold;
use crate::config::{ConfigError, PipelineSettings};
use crate::models::enums::ClassifiedType;
use crate::models::tenant::TenantIdentity;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Collaborator failures. Business-rule rejections are never errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Classification failed: {0}")]
    Classification(ModelError),

    #[error("Extraction failed: {0}")]
    Extraction(ModelError),

    #[error("Extractor returned a {actual} for a document classified as {expected}")]
    SchemaMismatch {
        expected: ClassifiedType,
        actual: &'static str,
    },

    #[error("Pipeline task aborted: {0}")]
    TaskAborted(String),
}

impl PipelineError {
    /// Whether retrying the same call at the transport level may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch(FetchError::Unavailable(_)) => true,
            Self::Classification(e) | Self::Extraction(e) => {
                matches!(e, ModelError::Unavailable(_) | ModelError::Timeout(_))
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Too little data to be worth a draft.
    BelowThreshold,
    UnknownType,
}

/// Terminal outcome of one pipeline run. Always returned, never panics.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Drafted {
        data: ExtractedData,
        direction: DirectionResolution,
        retry: RetryResult<ExtractedData>,
    },
    Rejected(RejectionReason),
    Failed(PipelineError),
}

impl PipelineOutcome {
    pub fn is_drafted(&self) -> bool {
        matches!(self, Self::Drafted { .. })
    }

    /// VAT number of the counterparty of a drafted document.
    pub fn counterparty_vat(&self) -> Option<&str> {
        match self {
            Self::Drafted {
                data, direction, ..
            } => resolved_counterparty_vat(data, direction.direction),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Drafted { .. } => "drafted",
            Self::Rejected(_) => "rejected",
            Self::Failed(_) => "failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Drives documents through classification, extraction, validation and the
/// draft decision. Holds no per-document state; one instance serves any
/// number of concurrent runs.
pub struct DocumentPipeline {
    classifier: Arc<dyn Classifier>,
    extractor: Arc<dyn Extractor>,
    suite: AuditSuite,
    document_timeout: Option<Duration>,
}

impl DocumentPipeline {
    pub fn new(classifier: Arc<dyn Classifier>, extractor: Arc<dyn Extractor>, suite: AuditSuite) -> Self {
        Self {
            classifier,
            extractor,
            suite,
            document_timeout: None,
        }
    }

    /// Build a pipeline from runtime settings. Both model ports go through
    /// the returned gate, which other model consumers may share.
    pub fn from_settings<C, X>(
        classifier: C,
        extractor: X,
        settings: &PipelineSettings,
    ) -> Result<(Self, ModelGate), ConfigError>
    where
        C: Classifier + 'static,
        X: Extractor + 'static,
    {
        let gate = ModelGate::new(settings.max_concurrent_model_calls);
        let suite = AuditSuite::new(settings.rate_tables()?);
        tracing::info!(
            max_model_calls = gate.limit(),
            default_jurisdiction = %suite.rate_tables().default_jurisdiction,
            timeout_secs = ?settings.document_timeout_secs,
            "Pipeline configured"
        );
        let pipeline = Self::throttled(classifier, extractor, &gate, suite)
            .with_document_timeout(settings.document_timeout());
        Ok((pipeline, gate))
    }

    /// Stop retrying a document once `timeout` has elapsed since it entered
    /// the pipeline. The best attempt so far is still gated and drafted.
    pub fn with_document_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.document_timeout = timeout;
        self
    }

    /// Route both model ports through one shared gate.
    pub fn throttled<C, X>(classifier: C, extractor: X, gate: &ModelGate, suite: AuditSuite) -> Self
    where
        C: Classifier + 'static,
        X: Extractor + 'static,
    {
        Self::new(
            Arc::new(gate.throttle(classifier)),
            Arc::new(gate.throttle(extractor)),
            suite,
        )
    }

    /// Run the pipeline on bytes already in hand.
    pub async fn run_pipeline(
        &self,
        document_id: Uuid,
        bytes: &[u8],
        mime_type: &str,
        tenant: &TenantIdentity,
        retry_config: RetryConfig,
        cancel: &CancellationFlag,
    ) -> PipelineOutcome {
        let span = tracing::info_span!(
            "run_pipeline",
            doc_id = %document_id,
            tenant_id = %tenant.tenant_id,
            mime_type
        );

        async {
            let deadline = self
                .document_timeout
                .map(|timeout| Deadline::start(cancel, timeout));
            let cancel = deadline.as_ref().map_or(cancel, Deadline::flag);

            let outcome = match self
                .try_run(bytes, mime_type, tenant, retry_config, cancel)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(error = %e, transient = e.is_transient(), "Pipeline failed");
                    PipelineOutcome::Failed(e)
                }
            };
            tracing::info!(outcome = outcome.label(), "Pipeline finished");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn try_run(
        &self,
        bytes: &[u8],
        mime_type: &str,
        tenant: &TenantIdentity,
        retry_config: RetryConfig,
        cancel: &CancellationFlag,
    ) -> Result<PipelineOutcome, PipelineError> {
        // Step 1: Classify
        let classification = self
            .classifier
            .classify(bytes, mime_type)
            .await
            .map_err(PipelineError::Classification)?;
        let document_type = classification.document_type;
        tracing::info!(
            document_type = %document_type,
            confidence = classification.confidence,
            "Document classified"
        );

        if document_type == ClassifiedType::Unknown {
            return Ok(PipelineOutcome::Rejected(RejectionReason::UnknownType));
        }

        // Step 2: Extract, then validate and retry with hints
        let extractor = self.extractor.as_ref();
        let first = extractor
            .extract(bytes, mime_type, document_type, None)
            .await
            .map_err(PipelineError::Extraction)?;
        let first = ensure_fits(document_type, first)?;

        let run = RetryOrchestrator::new(&self.suite, retry_config)
            .run(
                first,
                |hints| async move {
                    let data = extractor
                        .extract(bytes, mime_type, document_type, Some(&hints))
                        .await
                        .map_err(PipelineError::Extraction)?;
                    ensure_fits(document_type, data)
                },
                cancel,
            )
            .await?;

        // Step 3: Direction
        let direction = resolve_direction(&run.data, tenant);
        tracing::info!(
            direction = %direction.direction,
            source = %direction.source,
            confidence = direction.confidence,
            "Direction resolved"
        );

        // Step 4: Draft gate
        if !meets_minimal_threshold(document_type, &run.data) {
            tracing::info!(shape = run.data.shape_name(), "Below minimal threshold, no draft");
            return Ok(PipelineOutcome::Rejected(RejectionReason::BelowThreshold));
        }

        Ok(PipelineOutcome::Drafted {
            data: run.data,
            direction,
            retry: run.result,
        })
    }

    /// Fetch the document and tenant, then run the pipeline.
    pub async fn process_document(
        &self,
        source: &dyn DocumentSource,
        directory: &dyn TenantDirectory,
        tenant_id: Uuid,
        document_id: Uuid,
        retry_config: RetryConfig,
        cancel: &CancellationFlag,
    ) -> PipelineOutcome {
        let fetched = async {
            let tenant = directory.tenant(tenant_id).await?;
            let document = source.fetch(tenant_id, document_id).await?;
            Ok::<_, FetchError>((tenant, document))
        }
        .await;

        match fetched {
            Ok((tenant, document)) => {
                self.run_pipeline(
                    document_id,
                    &document.bytes,
                    &document.mime_type,
                    &tenant,
                    retry_config,
                    cancel,
                )
                .await
            }
            Err(e) => {
                tracing::warn!(doc_id = %document_id, error = %e, "Document fetch failed");
                PipelineOutcome::Failed(e.into())
            }
        }
    }

    /// Process many documents of one tenant concurrently. Model calls are
    /// still bounded by whatever gate wraps the ports. Outcomes come back in
    /// input order.
    pub async fn process_batch(
        self: &Arc<Self>,
        source: Arc<dyn DocumentSource>,
        directory: Arc<dyn TenantDirectory>,
        tenant_id: Uuid,
        document_ids: Vec<Uuid>,
        retry_config: RetryConfig,
        cancel: &CancellationFlag,
    ) -> Vec<(Uuid, PipelineOutcome)> {
        tracing::info!(tenant_id = %tenant_id, count = document_ids.len(), "Batch started");

        let handles: Vec<_> = document_ids
            .iter()
            .map(|&document_id| {
                let pipeline = Arc::clone(self);
                let source = Arc::clone(&source);
                let directory = Arc::clone(&directory);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    pipeline
                        .process_document(
                            source.as_ref(),
                            directory.as_ref(),
                            tenant_id,
                            document_id,
                            retry_config,
                            &cancel,
                        )
                        .await
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (document_id, handle) in document_ids.into_iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => PipelineOutcome::Failed(PipelineError::TaskAborted(e.to_string())),
            };
            outcomes.push((document_id, outcome));
        }

        let drafted = outcomes.iter().filter(|(_, o)| o.is_drafted()).count();
        tracing::info!(tenant_id = %tenant_id, drafted, total = outcomes.len(), "Batch finished");
        outcomes
    }
}

/// The extractor must answer with the shape the classification asked for.
fn ensure_fits(document_type: ClassifiedType, data: ExtractedData) -> Result<ExtractedData, PipelineError> {
    if data.fits(document_type) {
        Ok(data)
    } else {
        Err(PipelineError::SchemaMismatch {
            expected: document_type,
            actual: data.shape_name(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{AuditCheckType, Direction, DirectionSource};
    use crate::pipeline::extraction::types::fixtures;
    use crate::pipeline::mock::{
        FixedClassifier, InMemoryDocumentSource, InMemoryTenantDirectory, ScriptedExtractor,
        SlowClassifier,
    };

    const PDF: &str = "application/pdf";

    fn acme() -> TenantIdentity {
        TenantIdentity::new("Acme BV").with_vat_number("BE 0123.456.789")
    }

    fn pipeline(document_type: ClassifiedType, extractor: Arc<ScriptedExtractor>) -> DocumentPipeline {
        DocumentPipeline::new(
            Arc::new(FixedClassifier::new(document_type, 0.95)),
            extractor,
            AuditSuite::default(),
        )
    }

    async fn run(pipeline: &DocumentPipeline, tenant: &TenantIdentity) -> PipelineOutcome {
        pipeline
            .run_pipeline(
                Uuid::new_v4(),
                b"%PDF-1.7",
                PDF,
                tenant,
                RetryConfig::default(),
                &CancellationFlag::new(),
            )
            .await
    }

    #[tokio::test]
    async fn clean_invoice_is_drafted_without_retry() {
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(
            fixtures::invoice(),
        )));
        let outcome = run(&pipeline(ClassifiedType::Invoice, extractor.clone()), &acme()).await;

        match &outcome {
            PipelineOutcome::Drafted {
                data,
                direction,
                retry,
            } => {
                assert_eq!(data, &ExtractedData::Invoice(fixtures::invoice()));
                assert_eq!(retry, &RetryResult::NoRetryNeeded);
                assert_eq!(direction.direction, Direction::Outbound);
                assert_eq!(direction.source, DirectionSource::VatMatch);
                assert_eq!(direction.confidence, 1.0);
            }
            other => panic!("expected Drafted, got {other:?}"),
        }
        assert_eq!(outcome.counterparty_vat(), Some("BE0987654321"));
        assert_eq!(extractor.calls(), 1);
    }

    #[tokio::test]
    async fn name_match_when_tenant_has_no_vat() {
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(
            fixtures::invoice(),
        )));
        let tenant = TenantIdentity::new("globex nv");
        let outcome = run(&pipeline(ClassifiedType::Invoice, extractor), &tenant).await;
        match outcome {
            PipelineOutcome::Drafted { direction, .. } => {
                assert_eq!(direction.direction, Direction::Inbound);
                assert_eq!(direction.source, DirectionSource::NameMatch);
            }
            other => panic!("expected Drafted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_type_is_rejected_before_extraction() {
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(
            fixtures::invoice(),
        )));
        let outcome = run(&pipeline(ClassifiedType::Unknown, extractor.clone()), &acme()).await;
        assert!(matches!(
            outcome,
            PipelineOutcome::Rejected(RejectionReason::UnknownType)
        ));
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn thin_receipt_is_rejected_below_threshold() {
        let mut receipt = fixtures::receipt();
        receipt.merchant_name = None;
        receipt.transaction_date = None;
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Receipt(receipt)));

        let outcome = run(&pipeline(ClassifiedType::Receipt, extractor.clone()), &acme()).await;
        assert!(matches!(
            outcome,
            PipelineOutcome::Rejected(RejectionReason::BelowThreshold)
        ));
        // initial extraction plus the two default retries
        assert_eq!(extractor.calls(), 3);
    }

    #[tokio::test]
    async fn bad_totals_are_corrected_on_retry() {
        let mut wrong = fixtures::invoice();
        wrong.total_amount = Some("1100.00".into());
        wrong.confidence = 0.6;
        let extractor = Arc::new(ScriptedExtractor::attempts(vec![
            ExtractedData::Invoice(wrong),
            ExtractedData::Invoice(fixtures::invoice()),
        ]));

        let outcome = run(&pipeline(ClassifiedType::Invoice, extractor.clone()), &acme()).await;
        match outcome {
            PipelineOutcome::Drafted { retry, .. } => match retry {
                RetryResult::CorrectedOnRetry {
                    attempt,
                    corrected_fields,
                    original_failures,
                    ..
                } => {
                    assert_eq!(attempt, 1);
                    assert_eq!(corrected_fields, vec!["totalAmount"]);
                    assert_eq!(original_failures[0].check_type, AuditCheckType::Math);
                }
                other => panic!("expected CorrectedOnRetry, got {other:?}"),
            },
            other => panic!("expected Drafted, got {other:?}"),
        }

        let hints = extractor.seen_hints();
        assert!(hints[0].is_none());
        assert!(hints[1]
            .as_ref()
            .is_some_and(|h| h.field_names().contains(&"totalAmount")));
    }

    #[tokio::test]
    async fn exhausted_retries_still_draft_best_effort() {
        let mut wrong = fixtures::invoice();
        wrong.total_amount = Some("1100.00".into());
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(wrong)));

        let outcome = run(&pipeline(ClassifiedType::Invoice, extractor), &acme()).await;
        match outcome {
            PipelineOutcome::Drafted { retry, .. } => {
                assert!(!retry.is_success());
                assert!(matches!(retry, RetryResult::StillFailing { attempts: 2, .. }));
            }
            other => panic!("expected Drafted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_run_drafts_first_attempt() {
        let mut wrong = fixtures::invoice();
        wrong.total_amount = Some("1100.00".into());
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(wrong)));
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let outcome = pipeline(ClassifiedType::Invoice, extractor.clone())
            .run_pipeline(Uuid::new_v4(), b"", PDF, &acme(), RetryConfig::default(), &cancel)
            .await;
        assert!(matches!(
            outcome,
            PipelineOutcome::Drafted {
                retry: RetryResult::StillFailing { attempts: 0, .. },
                ..
            }
        ));
        assert_eq!(extractor.calls(), 1);
    }

    #[tokio::test]
    async fn document_timeout_skips_remaining_retries() {
        let mut wrong = fixtures::invoice();
        wrong.total_amount = Some("1100.00".into());
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(wrong)));
        let batch_flag = CancellationFlag::new();

        let outcome = DocumentPipeline::new(
            Arc::new(SlowClassifier::new(Duration::from_millis(50))),
            extractor.clone(),
            AuditSuite::default(),
        )
        .with_document_timeout(Some(Duration::from_millis(5)))
        .run_pipeline(Uuid::new_v4(), b"", PDF, &acme(), RetryConfig::default(), &batch_flag)
        .await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Drafted {
                retry: RetryResult::StillFailing { attempts: 0, .. },
                ..
            }
        ));
        assert_eq!(extractor.calls(), 1);
        assert!(!batch_flag.is_cancelled());
    }

    #[tokio::test]
    async fn pipeline_built_from_settings_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"max_concurrent_model_calls": 2, "default_jurisdiction": "NL", "document_timeout_secs": 30}}"#
        )
        .unwrap();
        let settings = PipelineSettings::load(file.path()).unwrap();

        let (pipeline, gate) = DocumentPipeline::from_settings(
            FixedClassifier::new(ClassifiedType::Invoice, 0.95),
            ScriptedExtractor::always(ExtractedData::Invoice(fixtures::invoice())),
            &settings,
        )
        .unwrap();
        assert_eq!(gate.limit(), 2);
        assert_eq!(pipeline.document_timeout, Some(Duration::from_secs(30)));
        assert_eq!(pipeline.suite.rate_tables().default_jurisdiction, "NL");

        let outcome = run(&pipeline, &acme()).await;
        assert!(outcome.is_drafted());
        assert_eq!(gate.available(), 2);
    }

    #[test]
    fn settings_with_unknown_jurisdiction_build_nothing() {
        let settings = PipelineSettings {
            default_jurisdiction: "XX".into(),
            ..PipelineSettings::default()
        };
        let result = DocumentPipeline::from_settings(
            FixedClassifier::new(ClassifiedType::Invoice, 0.95),
            ScriptedExtractor::always(ExtractedData::Invoice(fixtures::invoice())),
            &settings,
        );
        assert!(matches!(result, Err(ConfigError::UnknownJurisdiction(_))));
    }

    #[tokio::test]
    async fn pro_forma_uses_invoice_shape() {
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(
            fixtures::invoice(),
        )));
        let outcome = run(&pipeline(ClassifiedType::ProForma, extractor), &acme()).await;
        assert!(outcome.is_drafted());
    }

    #[tokio::test]
    async fn wrong_shape_is_a_collaborator_failure() {
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(
            fixtures::invoice(),
        )));
        let outcome = run(&pipeline(ClassifiedType::Bill, extractor), &acme()).await;
        match outcome {
            PipelineOutcome::Failed(e) => {
                assert!(matches!(e, PipelineError::SchemaMismatch { .. }));
                assert!(!e.is_transient());
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn classifier_failure_is_reported_not_retried() {
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(
            fixtures::invoice(),
        )));
        let pipeline = DocumentPipeline::new(
            Arc::new(FixedClassifier::failing(ModelError::Timeout(30))),
            extractor.clone(),
            AuditSuite::default(),
        );
        match run(&pipeline, &acme()).await {
            PipelineOutcome::Failed(e) => {
                assert_eq!(e, PipelineError::Classification(ModelError::Timeout(30)));
                assert!(e.is_transient());
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn extraction_failure_during_retry_fails_the_run() {
        let mut wrong = fixtures::invoice();
        wrong.total_amount = Some("1100.00".into());
        let extractor = Arc::new(ScriptedExtractor::new(vec![
            Ok(ExtractedData::Invoice(wrong)),
            Err(ModelError::Unavailable("connection refused".into())),
        ]));
        let outcome = run(&pipeline(ClassifiedType::Invoice, extractor), &acme()).await;
        assert!(matches!(
            outcome,
            PipelineOutcome::Failed(PipelineError::Extraction(ModelError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn process_document_fetches_first() {
        let tenant = acme();
        let tenant_id = tenant.tenant_id;
        let document_id = Uuid::new_v4();
        let source = InMemoryDocumentSource::new().with_document(tenant_id, document_id, b"%PDF", PDF);
        let directory = InMemoryTenantDirectory::new().with_tenant(tenant);
        let extractor = Arc::new(ScriptedExtractor::always(ExtractedData::Invoice(
            fixtures::invoice(),
        )));
        let pipeline = pipeline(ClassifiedType::Invoice, extractor);

        let outcome = pipeline
            .process_document(
                &source,
                &directory,
                tenant_id,
                document_id,
                RetryConfig::default(),
                &CancellationFlag::new(),
            )
            .await;
        assert!(outcome.is_drafted());

        let missing = pipeline
            .process_document(
                &source,
                &directory,
                tenant_id,
                Uuid::new_v4(),
                RetryConfig::default(),
                &CancellationFlag::new(),
            )
            .await;
        assert!(matches!(
            missing,
            PipelineOutcome::Failed(PipelineError::Fetch(FetchError::DocumentNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn batch_shares_one_gate_and_keeps_order() {
        let tenant = acme();
        let tenant_id = tenant.tenant_id;
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let source = ids.iter().fold(InMemoryDocumentSource::new(), |source, id| {
            source.with_document(tenant_id, *id, b"%PDF", PDF)
        });
        let directory = InMemoryTenantDirectory::new().with_tenant(tenant);

        let gate = ModelGate::new(1);
        let pipeline = Arc::new(DocumentPipeline::throttled(
            FixedClassifier::new(ClassifiedType::Invoice, 0.9),
            ScriptedExtractor::always(ExtractedData::Invoice(fixtures::invoice())),
            &gate,
            AuditSuite::default(),
        ));

        let mut requested = ids.clone();
        requested.push(Uuid::new_v4());
        let outcomes = pipeline
            .process_batch(
                Arc::new(source),
                Arc::new(directory),
                tenant_id,
                requested.clone(),
                RetryConfig::default(),
                &CancellationFlag::new(),
            )
            .await;

        let returned: Vec<Uuid> = outcomes.iter().map(|(id, _)| *id).collect();
        assert_eq!(returned, requested);
        assert!(outcomes[..4].iter().all(|(_, o)| o.is_drafted()));
        assert!(matches!(outcomes[4].1, PipelineOutcome::Failed(PipelineError::Fetch(_))));
        assert_eq!(gate.available(), 1);
    }
}
