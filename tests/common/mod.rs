//! Shared fixtures for integration tests: sample records plus in-memory
//! fakes for the scoring store and the model client.
#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tenant_match_api::errors::AppError;
use tenant_match_api::models::{OwnerPreferences, TenantProfile};
use tenant_match_api::scoring::{ScoreStore, ScoringModel};
use uuid::Uuid;

pub fn sample_tenant(id: Uuid) -> TenantProfile {
    let created = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
    TenantProfile {
        id,
        first_name: "Marie".to_string(),
        last_name: "Dubois".to_string(),
        email: "marie.dubois@example.com".to_string(),
        phone: Some("+33612345678".to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(1999, 3, 15),
        profession: Some("Software Engineer".to_string()),
        employment_type: Some("CDI".to_string()),
        company_name: Some("Tech Corp".to_string()),
        monthly_income: Some(BigDecimal::from(4200)),
        income_interview: Some("4200 stated in interview".to_string()),
        income_documents: Some("4100 per payslips".to_string()),
        guarantor_type: Some("Parents".to_string()),
        guarantor_income: Some(BigDecimal::from(8500)),
        smoking_status: Some("Non-smoker".to_string()),
        pets: Some(vec![]),
        lifestyle_description: Some("Quiet, enjoys reading and cooking.".to_string()),
        guest_frequency: Some("Occasionally".to_string()),
        noise_tolerance: Some("Quiet".to_string()),
        previous_rental_document: Some(true),
        previous_rental_paying: Some(true),
        reason_for_moving: Some("Job relocation".to_string()),
        application_status: Some("pending".to_string()),
        application_date: Some(created),
        languages: Some(vec!["French".to_string(), "English".to_string()]),
        matched_preferences: None,
        compatibility_reasons: None,
        last_contact_date: None,
        communication_preference: None,
        scheduling_link_sent: Some(false),
        scheduling_link_sent_date: None,
        tenant_document_id_valid: Some(true),
        tenant_document_income_valid: Some(true),
        tenant_document_tax_valid: Some(false),
        tenant_document_receipt_valid: Some(false),
        score: None,
        pros: None,
        cons: None,
        created_at: created,
        updated_at: None,
    }
}

pub fn sample_prefs() -> OwnerPreferences {
    let created = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
    OwnerPreferences {
        id: Uuid::new_v4(),
        priorities: vec![
            "Financial stability".to_string(),
            "Quiet lifestyle".to_string(),
        ],
        tenant_category: Some("professional".to_string()),
        student_field: None,
        student_field_preference: None,
        professional_sector: Some("Tech".to_string()),
        professional_sector_preference: Some("preferred".to_string()),
        min_financial_requirement: Some("3x rent".to_string()),
        financial_requirements: vec!["Guarantor required".to_string()],
        lease_type: Some("Long-term".to_string()),
        min_stay: Some("12 months".to_string()),
        acceptances: vec!["Non-smoker".to_string()],
        lifestyle_matters: vec!["Quiet".to_string()],
        relationship_management: Some("Formal".to_string()),
        dealbreakers: vec![
            "Smoking indoors".to_string(),
            "No proof of income".to_string(),
        ],
        created_at: created,
        updated_at: None,
    }
}

/// In-memory `ScoreStore` holding at most one tenant and one preference row.
pub struct InMemoryStore {
    pub tenant: Mutex<Option<TenantProfile>>,
    pub prefs: Mutex<Option<OwnerPreferences>>,
}

impl InMemoryStore {
    pub fn with(tenant: Option<TenantProfile>, prefs: Option<OwnerPreferences>) -> Self {
        Self {
            tenant: Mutex::new(tenant),
            prefs: Mutex::new(prefs),
        }
    }

    pub fn stored_tenant(&self) -> Option<TenantProfile> {
        self.tenant.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoreStore for InMemoryStore {
    async fn fetch_tenant(&self, tenant_id: Uuid) -> Result<Option<TenantProfile>, AppError> {
        Ok(self
            .tenant
            .lock()
            .unwrap()
            .clone()
            .filter(|t| t.id == tenant_id))
    }

    async fn fetch_owner_preferences(&self) -> Result<Option<OwnerPreferences>, AppError> {
        Ok(self.prefs.lock().unwrap().clone())
    }

    async fn persist_scoring(
        &self,
        tenant_id: Uuid,
        score: i32,
        pros: &str,
        cons: &str,
    ) -> Result<(), AppError> {
        let mut guard = self.tenant.lock().unwrap();
        match guard.as_mut().filter(|t| t.id == tenant_id) {
            Some(tenant) => {
                tenant.score = Some(score);
                tenant.pros = Some(pros.to_string());
                tenant.cons = Some(cons.to_string());
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Tenant {} not found at score write time",
                tenant_id
            ))),
        }
    }

    async fn reset_scoring(&self, tenant_id: Uuid) -> Result<(), AppError> {
        let mut guard = self.tenant.lock().unwrap();
        match guard.as_mut().filter(|t| t.id == tenant_id) {
            Some(tenant) => {
                tenant.score = None;
                tenant.pros = None;
                tenant.cons = None;
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Tenant {} not found", tenant_id))),
        }
    }
}

/// Scripted `ScoringModel` returning queued responses and counting calls.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    pub calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoringModel for ScriptedModel {
    async fn chat_completion(&self, _system: &str, _user: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::ExternalApiError("No scripted response left".to_string()))
    }
}

// Arc delegations so tests can hand the service a handle and still inspect
// the fakes afterwards are provided as blanket impls in the library crate
// (`tenant_match_api::scoring`); the orphan rule forbids defining them here.
