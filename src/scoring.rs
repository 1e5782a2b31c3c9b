//! Tenant-owner compatibility scoring pipeline.
//!
//! The flow is strictly linear: fetch the tenant and owner-preference
//! records, render a deterministic prompt, make one chat-completion call,
//! extract score/pros/cons from the free-form response, range-check the
//! score and persist the triple. Any failure aborts the remaining steps;
//! nothing is ever partially persisted.

use crate::errors::AppError;
use crate::models::{OwnerPreferences, TenantProfile};
use crate::record_text::render_record;
use async_trait::async_trait;
use regex::Regex;
use uuid::Uuid;

/// System role sent alongside every scoring prompt.
pub const SCORING_SYSTEM_ROLE: &str =
    "You are a compatibility scoring agent for rental housing.";

/// Store operations the pipeline needs. `TenantStorage` is the production
/// implementation; tests substitute an in-memory fake.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn fetch_tenant(&self, tenant_id: Uuid) -> Result<Option<TenantProfile>, AppError>;

    /// Fetches the single owner-preference row. The deployment assumes one
    /// owner, so the lookup takes the first row without a filter.
    async fn fetch_owner_preferences(&self) -> Result<Option<OwnerPreferences>, AppError>;

    /// Writes score, pros and cons onto the tenant record in one update.
    async fn persist_scoring(
        &self,
        tenant_id: Uuid,
        score: i32,
        pros: &str,
        cons: &str,
    ) -> Result<(), AppError>;

    /// Clears score, pros and cons in one update - the triple always moves
    /// together.
    async fn reset_scoring(&self, tenant_id: Uuid) -> Result<(), AppError>;
}

/// Chat-completion seam. The production implementation is `OpenAiClient`;
/// tests substitute a scripted fake or a wiremock-backed client.
#[async_trait]
pub trait ScoringModel: Send + Sync {
    async fn chat_completion(&self, system: &str, user: &str) -> Result<String, AppError>;
}

// Blanket delegations through `Arc` so callers can share a handle to a
// store or model and still pass it where the trait is required.
#[async_trait]
impl<S: ScoreStore + ?Sized> ScoreStore for std::sync::Arc<S> {
    async fn fetch_tenant(&self, tenant_id: Uuid) -> Result<Option<TenantProfile>, AppError> {
        (**self).fetch_tenant(tenant_id).await
    }

    async fn fetch_owner_preferences(&self) -> Result<Option<OwnerPreferences>, AppError> {
        (**self).fetch_owner_preferences().await
    }

    async fn persist_scoring(
        &self,
        tenant_id: Uuid,
        score: i32,
        pros: &str,
        cons: &str,
    ) -> Result<(), AppError> {
        (**self).persist_scoring(tenant_id, score, pros, cons).await
    }

    async fn reset_scoring(&self, tenant_id: Uuid) -> Result<(), AppError> {
        (**self).reset_scoring(tenant_id).await
    }
}

#[async_trait]
impl<M: ScoringModel + ?Sized> ScoringModel for std::sync::Arc<M> {
    async fn chat_completion(&self, system: &str, user: &str) -> Result<String, AppError> {
        (**self).chat_completion(system, user).await
    }
}

/// Result of pattern-matching a raw model response.
///
/// `score` is `None` when no score pattern matched. `pros`/`cons` are the
/// raw bullet blocks (markers included); missing markers yield empty
/// strings, not errors. Splitting into individual bullets is left to
/// display-layer consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScore {
    pub score: Option<i32>,
    pub pros: String,
    pub cons: String,
}

/// Validated outcome of a scoring run.
#[derive(Debug, Clone)]
pub struct ScoringOutcome {
    pub score: i32,
    pub pros: String,
    pub cons: String,
}

/// Builds the scoring prompt from the two records.
///
/// Pure and deterministic: identical inputs render byte-identical text.
/// Both records are embedded losslessly as `field: value` lines so the
/// model sees everything the store knows.
pub fn build_scoring_prompt(tenant: &TenantProfile, prefs: &OwnerPreferences) -> String {
    let lines = [
        SCORING_SYSTEM_ROLE.to_string(),
        "Here is the tenant profile:".to_string(),
        render_record(tenant),
        String::new(),
        "Here are the owner preferences:".to_string(),
        render_record(prefs),
        String::new(),
        "Instructions:".to_string(),
        "- Heavily penalize the score if the tenant does not match the owner's expectations or hits a dealbreaker (see the dealbreakers list in the owner preferences).".to_string(),
        "- Produce a compatibility score out of 100 (whole number).".to_string(),
        "- Also give 3 positive points (Pros) and 3 negative points (Cons) about the compatibility, as bullet points.".to_string(),
        "- Important: if one of the documents is not valid, the score must be 0 even if everything else is good; this condition takes priority over all the others. Document validity is in the tenant_document_id_valid and tenant_document_income_valid fields. Note that the previous rental document is not important, it is informational only.".to_string(),
        "- Important: if the income is very high, the score should also be very high (if the income is above 5000, the score should be 90; if the income is at 8000 or more, the score should be close to 100).".to_string(),
        "Expected response format:".to_string(),
        "Score: <number between 0 and 100>".to_string(),
        "Pros:".to_string(),
        "- ...".to_string(),
        "- ...".to_string(),
        "- ...".to_string(),
        "Cons:".to_string(),
        "- ...".to_string(),
        "- ...".to_string(),
        "- ...".to_string(),
    ];
    lines.join("\n")
}

/// Extracts score, pros and cons from a raw model response.
///
/// Three independent case-insensitive matches over the same text, tolerant
/// of extra prose around the markers. The score pattern is intentionally
/// strict about digit count (1-3) so unrelated numbers are not picked up.
pub fn parse_score_response(raw: &str) -> ParsedScore {
    let score_re = Regex::new(r"(?i)score\s*:\s*([0-9]{1,3})").unwrap();
    let pros_re = Regex::new(r"(?is)pros\s*:?\s*(.*?)(?:cons\s*:?|$)").unwrap();
    let cons_re = Regex::new(r"(?is)cons\s*:?\s*(.*)").unwrap();

    let score = score_re
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<i32>().ok());

    let pros = pros_re
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let cons = cons_re
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    ParsedScore { score, pros, cons }
}

/// Range-checks a parsed score.
///
/// This is the entire validation: an integer in [0, 100] or the run fails
/// with the raw model text attached. Document-validity logic lives in the
/// prompt instructions, not here - the model is trusted to apply the
/// override, and whatever integer it returns is accepted if in range.
pub fn validate_score(parsed: &ParsedScore, raw: &str) -> Result<i32, AppError> {
    match parsed.score {
        Some(score) if (0..=100).contains(&score) => Ok(score),
        _ => Err(AppError::InvalidModelOutput(raw.to_string())),
    }
}

/// Orchestrates the scoring pipeline over a store and a model client.
pub struct ScoringService<S, M> {
    store: S,
    model: M,
}

impl<S: ScoreStore, M: ScoringModel> ScoringService<S, M> {
    pub fn new(store: S, model: M) -> Self {
        Self { store, model }
    }

    /// Runs the full pipeline for one tenant.
    ///
    /// Fails fast before the model call if either record is missing. On
    /// success the persisted state and the returned outcome are the same
    /// triple; on any failure nothing has been written.
    pub async fn score_tenant(&self, tenant_id: Uuid) -> Result<ScoringOutcome, AppError> {
        let tenant = self
            .store
            .fetch_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;

        let prefs = self
            .store
            .fetch_owner_preferences()
            .await?
            .ok_or_else(|| AppError::NotFound("Owner preferences not found".to_string()))?;

        tracing::debug!(
            "Scoring tenant {} ({} {})",
            tenant_id,
            tenant.first_name,
            tenant.last_name
        );

        let prompt = build_scoring_prompt(&tenant, &prefs);
        let raw = self
            .model
            .chat_completion(SCORING_SYSTEM_ROLE, &prompt)
            .await?;

        let parsed = parse_score_response(&raw);
        tracing::debug!("Model response parsed: score={:?}", parsed.score);

        let score = validate_score(&parsed, &raw)?;

        self.store
            .persist_scoring(tenant_id, score, &parsed.pros, &parsed.cons)
            .await?;

        tracing::info!("Tenant {} scored {}", tenant_id, score);

        Ok(ScoringOutcome {
            score,
            pros: parsed.pros,
            cons: parsed.cons,
        })
    }

    /// Clears a previous scoring result. Score, pros and cons are reset in a
    /// single update so the record never ends up partially cleared.
    pub async fn reset_scoring(&self, tenant_id: Uuid) -> Result<(), AppError> {
        self.store.reset_scoring(tenant_id).await?;
        tracing::info!("Scoring reset for tenant {}", tenant_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_extraction_with_surrounding_prose() {
        let parsed = parse_score_response("blah blah Score: 73 more text");
        assert_eq!(parsed.score, Some(73));
    }

    #[test]
    fn test_score_extraction_case_insensitive_leading_zero() {
        let parsed = parse_score_response("SCORE:07");
        assert_eq!(parsed.score, Some(7));
    }

    #[test]
    fn test_score_out_of_range_parses_but_fails_validation() {
        let raw = "Score: 150";
        let parsed = parse_score_response(raw);
        assert_eq!(parsed.score, Some(150));
        assert!(matches!(
            validate_score(&parsed, raw),
            Err(AppError::InvalidModelOutput(_))
        ));
    }

    #[test]
    fn test_missing_score_token_is_unparseable() {
        let raw = "The tenant looks fine to me.";
        let parsed = parse_score_response(raw);
        assert_eq!(parsed.score, None);
        assert!(validate_score(&parsed, raw).is_err());
    }

    #[test]
    fn test_pros_cons_segmentation() {
        let parsed =
            parse_score_response("Score: 80\nPros:\n- A\n- B\n- C\nCons:\n- X\n- Y\n- Z");
        assert_eq!(parsed.score, Some(80));
        assert_eq!(parsed.pros, "- A\n- B\n- C");
        assert_eq!(parsed.cons, "- X\n- Y\n- Z");
    }

    #[test]
    fn test_missing_cons_marker() {
        let parsed = parse_score_response("Score: 60\nPros:\n- solid income\n- quiet");
        assert_eq!(parsed.pros, "- solid income\n- quiet");
        assert_eq!(parsed.cons, "");
    }

    #[test]
    fn test_missing_pros_marker() {
        let parsed = parse_score_response("Score: 42\nCons:\n- no guarantor");
        assert_eq!(parsed.pros, "");
        assert_eq!(parsed.cons, "- no guarantor");
    }

    #[test]
    fn test_marker_without_colon_accepted() {
        let parsed = parse_score_response("Score: 55\nPros\n- a\nCons\n- b");
        assert_eq!(parsed.pros, "- a");
        assert_eq!(parsed.cons, "- b");
    }

    #[test]
    fn test_validator_boundaries() {
        for score in [0, 100] {
            let parsed = ParsedScore {
                score: Some(score),
                pros: String::new(),
                cons: String::new(),
            };
            assert_eq!(validate_score(&parsed, "").unwrap(), score);
        }
        let parsed = ParsedScore {
            score: Some(101),
            pros: String::new(),
            cons: String::new(),
        };
        assert!(validate_score(&parsed, "Score: 101").is_err());
    }

    #[test]
    fn test_invalid_output_carries_raw_text() {
        let raw = "I refuse to score this applicant.";
        let parsed = parse_score_response(raw);
        match validate_score(&parsed, raw) {
            Err(AppError::InvalidModelOutput(text)) => assert_eq!(text, raw),
            other => panic!("expected InvalidModelOutput, got {:?}", other),
        }
    }
}
