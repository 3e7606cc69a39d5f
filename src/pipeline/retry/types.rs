use serde::{Deserialize, Serialize};

use crate::models::enums::{AuditCheckType, Severity};
use crate::pipeline::extraction::confidence::HasConfidence;
use crate::pipeline::extraction::types::ExtractedData;
use crate::pipeline::validation::audit::{AuditCheck, AuditSuite};
use crate::pipeline::validation::essential::{check_essential_fields, EssentialFieldsCheck};

/// How hard to push re-extraction. Immutable, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Treat failed Warning checks as blocking too.
    pub retry_on_warnings: bool,
    /// A retry is only accepted if its confidence beats the previous
    /// attempt's by at least this much.
    pub min_confidence_improvement: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_on_warnings: false,
            min_confidence_improvement: 0.0,
        }
    }
}

impl RetryConfig {
    pub fn aggressive() -> Self {
        Self {
            max_retries: 3,
            retry_on_warnings: true,
            min_confidence_improvement: 0.05,
        }
    }

    /// Lowest severity that blocks acceptance.
    pub fn blocking_severity(&self) -> Severity {
        if self.retry_on_warnings {
            Severity::Warning
        } else {
            Severity::Critical
        }
    }
}

/// Terminal result of the retry orchestrator for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetryResult<T> {
    /// The first extraction was accepted as-is.
    NoRetryNeeded,
    CorrectedOnRetry {
        data: T,
        /// Retry number that was accepted, 1-based.
        attempt: u32,
        corrected_fields: Vec<String>,
        original_failures: Vec<AuditCheck>,
    },
    /// Retries ran out (or were cancelled); `data` is the best attempt.
    StillFailing {
        data: T,
        attempts: u32,
        remaining_failures: Vec<AuditCheck>,
    },
}

impl<T> RetryResult<T> {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::StillFailing { .. })
    }

    /// Payload carried by the result; `NoRetryNeeded` has none.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::NoRetryNeeded => None,
            Self::CorrectedOnRetry { data, .. } | Self::StillFailing { data, .. } => Some(data),
        }
    }
}

/// Validation verdicts for one extraction attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptEvaluation {
    /// 0 for the initial extraction, n for retry n.
    pub attempt: u32,
    pub confidence: f64,
    pub essential: EssentialFieldsCheck,
    pub checks: Vec<AuditCheck>,
}

impl AttemptEvaluation {
    pub fn evaluate(attempt: u32, data: &ExtractedData, suite: &AuditSuite) -> Self {
        Self {
            attempt,
            confidence: data.confidence(),
            essential: check_essential_fields(data),
            checks: suite.run(data),
        }
    }

    /// Every failed verdict, missing essential fields first.
    pub fn failures(&self) -> Vec<AuditCheck> {
        self.essential
            .to_audit_check()
            .into_iter()
            .chain(self.checks.iter().filter(|c| !c.passed).cloned())
            .collect()
    }

    /// Essential fields complete and nothing failed at a blocking severity.
    pub fn passes(&self, config: &RetryConfig) -> bool {
        let blocking = config.blocking_severity();
        self.essential.has_all_fields && !self.checks.iter().any(|c| c.fails_at(blocking))
    }
}

/// Corrective guidance handed to the extractor on a retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionHints {
    /// Retry number these hints are for.
    pub attempt: u32,
    pub corrections: Vec<FieldCorrection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCorrection {
    pub check_type: AuditCheckType,
    pub fields: Vec<String>,
    pub message: String,
    pub hint: Option<String>,
}

impl CorrectionHints {
    pub fn from_failures(attempt: u32, failures: &[AuditCheck]) -> Self {
        Self {
            attempt,
            corrections: failures
                .iter()
                .map(|check| FieldCorrection {
                    check_type: check.check_type,
                    fields: check.fields.clone(),
                    message: check.message.clone(),
                    hint: check.hint.clone(),
                })
                .collect(),
        }
    }

    /// Distinct field names across all corrections, first mention first.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for field in self.corrections.iter().flat_map(|c| c.fields.iter()) {
            if !names.contains(&field.as_str()) {
                names.push(field);
            }
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }
}

/// Position of the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RetryState {
    Initial,
    Retrying { attempt: u32 },
    Accepted,
    Exhausted,
}

/// Pure transition of the retry loop.
///
/// `latest` is the evaluation of the attempt made in `state`; `previous`
/// is the attempt before it (absent in `Initial`). A retry must both pass
/// and improve on the previous confidence by the configured margin.
pub fn next_state(
    state: RetryState,
    previous: Option<&AttemptEvaluation>,
    latest: &AttemptEvaluation,
    config: &RetryConfig,
) -> RetryState {
    match state {
        RetryState::Initial => {
            if latest.passes(config) {
                RetryState::Accepted
            } else if config.max_retries == 0 {
                RetryState::Exhausted
            } else {
                RetryState::Retrying { attempt: 1 }
            }
        }
        RetryState::Retrying { attempt } => {
            let improved = previous.map_or(true, |prev| {
                latest.confidence - prev.confidence >= config.min_confidence_improvement
            });
            if latest.passes(config) && improved {
                RetryState::Accepted
            } else if attempt >= config.max_retries {
                RetryState::Exhausted
            } else {
                RetryState::Retrying {
                    attempt: attempt + 1,
                }
            }
        }
        terminal => terminal,
    }
}
