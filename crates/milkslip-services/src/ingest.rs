//! The receipt ingestion flow as an explicit finite-state sequence.
//!
//! One owned session struct carries a single receipt from capture through
//! extraction, review, validation, and persistence. Async steps are chained
//! strictly sequentially; a generation counter guards against a late-arriving
//! extraction or save result being applied after the user has reset the flow.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use milkslip_core::{
    reconcile, AppError, Extraction, ExtractionFields, ReceiptDraft,
};
use milkslip_db::{ReceiptImage, ReceiptRepository};
use milkslip_processing::{ImageNormalizer, NormalizedImage};
use milkslip_vision::VisionExtractor;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Idle,
    Capturing,
    Extracting,
    Reviewing,
    Validating,
    Saving,
    Saved,
    Failed,
}

/// Result of applying an async step's outcome to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The outcome belonged to the current attempt and was applied.
    Applied,
    /// The flow was reset while the call was in flight; the outcome was
    /// discarded rather than applied to stale state.
    Stale,
}

/// One user session's ingestion context.
///
/// Holds everything a single receipt needs between user events. On failure
/// the captured image and draft are preserved so the user resumes from an
/// actionable state instead of recapturing.
pub struct IngestSession {
    owner_id: Uuid,
    stage: IngestStage,
    generation: u64,
    capture: Option<NormalizedImage>,
    taken_at: Option<DateTime<Utc>>,
    extraction: Option<Extraction>,
    overrides: ExtractionFields,
    draft: Option<ReceiptDraft>,
    saved_id: Option<Uuid>,
    last_error: Option<String>,
}

impl IngestSession {
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            stage: IngestStage::Idle,
            generation: 0,
            capture: None,
            taken_at: None,
            extraction: None,
            overrides: ExtractionFields::default(),
            draft: None,
            saved_id: None,
            last_error: None,
        }
    }

    pub fn stage(&self) -> IngestStage {
        self.stage
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn draft(&self) -> Option<&ReceiptDraft> {
        self.draft.as_ref()
    }

    pub fn saved_id(&self) -> Option<Uuid> {
        self.saved_id
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Abandon the in-progress receipt and return to Idle.
    ///
    /// Pending network calls are not cancelled; bumping the generation makes
    /// their eventual results stale so they can never overwrite a newer
    /// capture.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.stage = IngestStage::Idle;
        self.capture = None;
        self.taken_at = None;
        self.extraction = None;
        self.overrides = ExtractionFields::default();
        self.draft = None;
        self.saved_id = None;
        self.last_error = None;
    }

    /// Start a new camera capture.
    pub fn begin_capture(&mut self) {
        self.reset();
        self.stage = IngestStage::Capturing;
    }

    /// Normalize the captured photo and move on to extraction.
    pub fn attach_capture(
        &mut self,
        normalizer: &ImageNormalizer,
        data: &[u8],
        taken_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.expect_stage(IngestStage::Capturing)?;

        match normalizer.normalize(data, self.owner_id, Utc::now()) {
            Ok(normalized) => {
                self.capture = Some(normalized);
                self.taken_at = Some(taken_at);
                self.stage = IngestStage::Extracting;
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Hand out the bytes for an extraction attempt together with the
    /// generation it runs under.
    pub fn begin_extraction(&self) -> Result<(u64, Bytes), AppError> {
        self.expect_stage(IngestStage::Extracting)?;
        let capture = self
            .capture
            .as_ref()
            .ok_or_else(|| AppError::Internal("Extracting stage without a capture".to_string()))?;
        Ok((self.generation, capture.bytes.clone()))
    }

    /// Apply a successful extraction, unless the flow moved on meanwhile.
    pub fn apply_extraction(&mut self, generation: u64, fields: ExtractionFields) -> ApplyOutcome {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "Discarding extraction result from an abandoned attempt"
            );
            return ApplyOutcome::Stale;
        }

        let taken_at = self.taken_at.unwrap_or_else(Utc::now);
        let extraction = Extraction::from_camera(fields, taken_at);
        self.draft = Some(reconcile(&extraction, &self.overrides));
        self.extraction = Some(extraction);
        self.stage = IngestStage::Reviewing;
        ApplyOutcome::Applied
    }

    /// Record a failed extraction, unless the flow moved on meanwhile.
    pub fn fail_extraction(&mut self, generation: u64, error: &AppError) -> ApplyOutcome {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "Discarding extraction failure from an abandoned attempt"
            );
            return ApplyOutcome::Stale;
        }
        self.fail(error);
        ApplyOutcome::Applied
    }

    /// Run one extraction attempt end to end.
    pub async fn run_extraction(&mut self, extractor: &VisionExtractor) -> Result<(), AppError> {
        let (generation, bytes) = self.begin_extraction()?;
        match extractor.extract(&bytes).await {
            Ok(fields) => {
                self.apply_extraction(generation, fields);
                Ok(())
            }
            Err(e) => {
                self.fail_extraction(generation, &e);
                Err(e)
            }
        }
    }

    /// Enter the flow through the manual-entry path: same shape, no photo.
    pub fn begin_manual_entry(&mut self, fields: ExtractionFields) {
        self.reset();
        let extraction = Extraction::from_manual(fields);
        self.draft = Some(reconcile(&extraction, &self.overrides));
        self.extraction = Some(extraction);
        self.stage = IngestStage::Reviewing;
    }

    /// Apply user edits during review. Each provided value completely
    /// replaces the corresponding extracted value.
    pub fn apply_overrides(&mut self, overrides: ExtractionFields) -> Result<(), AppError> {
        if !matches!(self.stage, IngestStage::Reviewing | IngestStage::Validating) {
            return Err(self.wrong_stage("apply_overrides"));
        }

        merge_overrides(&mut self.overrides, overrides);
        let extraction = self
            .extraction
            .as_ref()
            .ok_or_else(|| AppError::Internal("Reviewing stage without an extraction".to_string()))?;
        self.draft = Some(reconcile(extraction, &self.overrides));
        self.stage = IngestStage::Reviewing;
        Ok(())
    }

    /// Validate the draft ahead of persistence. On success the session is
    /// ready to save; on violation it returns to review with the field
    /// messages for inline display.
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.expect_stage(IngestStage::Reviewing)?;
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| AppError::Internal("Reviewing stage without a draft".to_string()))?;

        match milkslip_core::validate_draft(draft, milkslip_core::EntryMode::of(draft)) {
            Ok(()) => {
                self.stage = IngestStage::Validating;
                Ok(())
            }
            Err(violations) => Err(AppError::Validation(violations)),
        }
    }

    /// Persist the validated draft.
    ///
    /// A rejection is terminal for this attempt: the session moves to Failed
    /// but keeps the draft and captured image so nothing has to be redone
    /// except the save decision.
    pub async fn save(&mut self, repository: &ReceiptRepository) -> Result<Uuid, AppError> {
        self.expect_stage(IngestStage::Validating)?;
        let generation = self.generation;
        let draft = self
            .draft
            .clone()
            .ok_or_else(|| AppError::Internal("Validating stage without a draft".to_string()))?;

        let image = self.capture.as_ref().map(|capture| ReceiptImage {
            key: capture.key.clone(),
            bytes: capture.bytes.to_vec(),
            content_type: capture.content_type.to_string(),
        });

        self.stage = IngestStage::Saving;
        let result = repository.save(self.owner_id, &draft, image).await;

        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "Discarding save result from an abandoned attempt"
            );
            return result;
        }

        match result {
            Ok(id) => {
                self.saved_id = Some(id);
                self.stage = IngestStage::Saved;
                Ok(id)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn fail(&mut self, error: &AppError) {
        self.last_error = Some(error.client_message());
        self.stage = IngestStage::Failed;
    }

    fn expect_stage(&self, expected: IngestStage) -> Result<(), AppError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(self.wrong_stage("operation"))
        }
    }

    fn wrong_stage(&self, operation: &str) -> AppError {
        AppError::Internal(format!(
            "{} is not valid in stage {:?}",
            operation, self.stage
        ))
    }
}

fn merge_overrides(current: &mut ExtractionFields, incoming: ExtractionFields) {
    let merge = |slot: &mut Option<String>, value: Option<String>| {
        if value.is_some() {
            *slot = value;
        }
    };
    merge(&mut current.date, incoming.date);
    merge(&mut current.quantity, incoming.quantity);
    merge(&mut current.fat, incoming.fat);
    merge(&mut current.clr, incoming.clr);
    merge(&mut current.fat_kg, incoming.fat_kg);
    merge(&mut current.snf_kg, incoming.snf_kg);
    merge(&mut current.base_rate, incoming.base_rate);
    merge(&mut current.rate, incoming.rate);
    merge(&mut current.amount, incoming.amount);
}
