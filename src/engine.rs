//! Risk decision core: trusted-sender override, risk bucketing, and the
//! audit side effect around a raw text-scorer probability.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::audit::{AuditRecord, AuditSink};
use crate::domain_utils::DomainUtils;
use crate::scorer::TextScorer;
use crate::trust::TrustRegistry;

/// Dampening applied to the raw probability of a trusted sender.
/// Trusted senders are dampened, not zeroed; a residual score remains
/// in the result and the trail.
const TRUST_DAMPENING: f64 = 0.2;

const SCAM_LABEL_THRESHOLD: f64 = 0.5;
const HIGH_RISK_THRESHOLD: f64 = 0.8;
const MEDIUM_RISK_THRESHOLD: f64 = 0.6;

/// One inbound email to assess.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailSubmission {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Graded assessment returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringResult {
    pub scam_probability: f64,
    pub label: u8,
    pub risk_level: RiskLevel,
    pub sender_domain: String,
    pub trusted_sender: bool,
}

/// Failure taxonomy at the scan boundary. Audit append failures are not
/// here: they are warnings and never fail a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Model not loaded")]
    ModelUnavailable,
    #[error("Empty email text")]
    EmptyInput,
    #[error("Prediction failed: {0}")]
    Scoring(String),
}

/// Pure decision logic plus the best-effort audit append. Collaborators are
/// injected at construction; the engine itself holds no mutable state.
pub struct DecisionEngine {
    trust: TrustRegistry,
    scorer: Option<Arc<dyn TextScorer>>,
    audit: Arc<dyn AuditSink>,
}

impl DecisionEngine {
    pub fn new(
        trust: TrustRegistry,
        scorer: Option<Arc<dyn TextScorer>>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            trust,
            scorer,
            audit,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.scorer.is_some()
    }

    /// Pure decision step: label at the 0.5 threshold, trust override,
    /// risk bucketing on the post-override probability, output rounding.
    pub fn decide(&self, raw_probability: f64, sender: &str) -> ScoringResult {
        let raw = raw_probability.clamp(0.0, 1.0);
        let mut label: u8 = if raw >= SCAM_LABEL_THRESHOLD { 1 } else { 0 };

        let sender_domain = DomainUtils::extract_domain(sender).unwrap_or_default();
        let trusted_sender = self.trust.is_trusted(&sender_domain);

        let probability = if trusted_sender {
            label = 0;
            raw * TRUST_DAMPENING
        } else {
            raw
        };

        // Bucketing uses the unrounded value; rounding is output-only
        let risk_level = if probability >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        ScoringResult {
            scam_probability: round3(probability),
            label,
            risk_level,
            sender_domain,
            trusted_sender,
        }
    }

    /// Scan boundary: classify failures, score, decide, then append the
    /// audit record as a separate best-effort step.
    pub fn scan(&self, submission: &EmailSubmission) -> Result<ScoringResult, ScanError> {
        let text = format!("{} {}", submission.subject, submission.body);
        if text.trim().is_empty() {
            return Err(ScanError::EmptyInput);
        }

        let scorer = self.scorer.as_ref().ok_or(ScanError::ModelUnavailable)?;
        let raw_probability = scorer
            .score(&text)
            .map_err(|e| ScanError::Scoring(format!("{e:#}")))?;

        let result = self.decide(raw_probability, &submission.sender);

        let record = AuditRecord {
            timestamp: Utc::now(),
            sender: submission.sender.clone(),
            subject: submission.subject.clone(),
            scam_probability: result.scam_probability,
            risk_level: result.risk_level,
        };
        if let Err(e) = self.audit.append(&record) {
            log::warn!("Failed to append audit record: {e:#}");
        }

        Ok(result)
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
