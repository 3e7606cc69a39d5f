use std::future::Future;

use super::types::{next_state, AttemptEvaluation, CorrectionHints, RetryConfig, RetryResult, RetryState};
use crate::pipeline::extraction::types::ExtractedData;
use crate::pipeline::gate::CancellationFlag;
use crate::pipeline::validation::audit::{AuditCheck, AuditSuite};

/// Final output of one retry loop.
#[derive(Debug, Clone)]
pub struct RetryRun {
    /// Data to draft from: the accepted attempt, or the best one.
    pub data: ExtractedData,
    pub result: RetryResult<ExtractedData>,
    /// Evaluation of every attempt made, in order.
    pub trail: Vec<AttemptEvaluation>,
    pub cancelled: bool,
}

/// Turns validation failures into bounded re-extraction attempts.
///
/// Attempts are strictly sequential. The decision logic is [`next_state`];
/// this type only performs the re-extraction side effect between states.
pub struct RetryOrchestrator<'a> {
    suite: &'a AuditSuite,
    config: RetryConfig,
}

struct Attempt {
    data: ExtractedData,
    evaluation: AttemptEvaluation,
}

impl<'a> RetryOrchestrator<'a> {
    pub fn new(suite: &'a AuditSuite, config: RetryConfig) -> Self {
        Self { suite, config }
    }

    /// Validate `first` and re-extract with correction hints until an
    /// attempt is accepted, retries run out, or `cancel` is set.
    ///
    /// An error from `reextract` aborts the loop and is returned as is.
    pub async fn run<F, Fut, E>(
        &self,
        first: ExtractedData,
        mut reextract: F,
        cancel: &CancellationFlag,
    ) -> Result<RetryRun, E>
    where
        F: FnMut(CorrectionHints) -> Fut,
        Fut: Future<Output = Result<ExtractedData, E>>,
    {
        let evaluation = AttemptEvaluation::evaluate(0, &first, self.suite);
        let original_failures = evaluation.failures();
        log_attempt(&evaluation, &original_failures);

        let mut state = next_state(RetryState::Initial, None, &evaluation, &self.config);
        let initial = Attempt {
            data: first,
            evaluation,
        };
        let mut retries: Vec<Attempt> = Vec::new();
        let mut corrected_fields: Vec<String> = Vec::new();
        let mut cancelled = false;

        while let RetryState::Retrying { attempt } = state {
            if cancel.is_cancelled() {
                tracing::warn!(attempt, "Retry loop cancelled, keeping best attempt so far");
                cancelled = true;
                break;
            }

            let previous = retries.last().unwrap_or(&initial);
            let hints = CorrectionHints::from_failures(attempt, &previous.evaluation.failures());
            if hints.is_empty() {
                tracing::info!(attempt, "Re-extracting for higher confidence, no check failed");
            } else {
                tracing::info!(
                    attempt,
                    fields = ?hints.field_names(),
                    "Re-extracting with correction hints"
                );
            }

            let data = reextract(hints).await?;
            let evaluation = AttemptEvaluation::evaluate(attempt, &data, self.suite);
            log_attempt(&evaluation, &evaluation.failures());

            for field in data.changed_fields(&previous.data) {
                if !corrected_fields.contains(&field) {
                    corrected_fields.push(field);
                }
            }

            state = next_state(state, Some(&previous.evaluation), &evaluation, &self.config);
            retries.push(Attempt { data, evaluation });
        }

        let trail: Vec<AttemptEvaluation> = std::iter::once(&initial)
            .chain(retries.iter())
            .map(|a| a.evaluation.clone())
            .collect();
        let attempts = retries.len() as u32;

        let (data, result) = match state {
            RetryState::Accepted => match retries.pop() {
                None => (initial.data, RetryResult::NoRetryNeeded),
                Some(accepted) => {
                    tracing::info!(attempt = attempts, corrected = ?corrected_fields, "Corrected on retry");
                    (
                        accepted.data.clone(),
                        RetryResult::CorrectedOnRetry {
                            data: accepted.data,
                            attempt: attempts,
                            corrected_fields,
                            original_failures,
                        },
                    )
                }
            },
            _ => {
                let best = best_attempt(initial, retries);
                let remaining_failures = best.evaluation.failures();
                tracing::warn!(
                    attempts,
                    best_attempt = best.evaluation.attempt,
                    remaining = remaining_failures.len(),
                    "Extraction still failing after retries"
                );
                (
                    best.data.clone(),
                    RetryResult::StillFailing {
                        data: best.data,
                        attempts,
                        remaining_failures,
                    },
                )
            }
        };

        Ok(RetryRun {
            data,
            result,
            trail,
            cancelled,
        })
    }
}

/// Highest confidence wins; ties go to the earliest attempt.
fn best_attempt(initial: Attempt, retries: Vec<Attempt>) -> Attempt {
    retries.into_iter().fold(initial, |best, candidate| {
        if candidate.evaluation.confidence > best.evaluation.confidence {
            candidate
        } else {
            best
        }
    })
}

fn log_attempt(evaluation: &AttemptEvaluation, failures: &[AuditCheck]) {
    if failures.is_empty() {
        tracing::debug!(
            attempt = evaluation.attempt,
            confidence = evaluation.confidence,
            "Extraction attempt passed all checks"
        );
        return;
    }
    for failure in failures {
        tracing::info!(
            attempt = evaluation.attempt,
            check = %failure.check_type,
            severity = %failure.severity,
            message = %failure.message,
            "Audit check failed"
        );
    }
}
