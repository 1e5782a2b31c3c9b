use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============ Database Models ============

/// Represents a tenant applicant profile.
///
/// This is the central entity of the system: the application data submitted
/// by a prospective tenant, the document verification flags maintained by the
/// owner, and the compatibility scoring outputs.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TenantProfile {
    /// Unique identifier for the profile.
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub profession: Option<String>,
    /// Employment type (e.g., "CDI", "Freelance", "Student").
    pub employment_type: Option<String>,
    pub company_name: Option<String>,
    /// Flat monthly income figure from the application form.
    pub monthly_income: Option<BigDecimal>,
    /// Income as stated during the interview (free text).
    pub income_interview: Option<String>,
    /// Income as derived from submitted documents (free text).
    pub income_documents: Option<String>,
    /// Guarantor type (e.g., "Parents", "Bank", "Employment").
    pub guarantor_type: Option<String>,
    pub guarantor_income: Option<BigDecimal>,
    pub smoking_status: Option<String>,
    pub pets: Option<Vec<String>>,
    pub lifestyle_description: Option<String>,
    pub guest_frequency: Option<String>,
    pub noise_tolerance: Option<String>,
    /// Whether a previous rental reference document was provided.
    /// Informational only - explicitly excluded from scoring.
    pub previous_rental_document: Option<bool>,
    pub previous_rental_paying: Option<bool>,
    pub reason_for_moving: Option<String>,
    /// Workflow status (e.g., "pending", "reviewing", "approved").
    pub application_status: Option<String>,
    pub application_date: Option<DateTime<Utc>>,
    pub languages: Option<Vec<String>>,
    pub matched_preferences: Option<Vec<String>>,
    pub compatibility_reasons: Option<Vec<String>>,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub communication_preference: Option<String>,
    pub scheduling_link_sent: Option<bool>,
    pub scheduling_link_sent_date: Option<DateTime<Utc>>,
    /// Whether the identity document has been verified.
    pub tenant_document_id_valid: Option<bool>,
    /// Whether the income proof has been verified.
    pub tenant_document_income_valid: Option<bool>,
    /// Whether the tax notice has been verified.
    pub tenant_document_tax_valid: Option<bool>,
    /// Whether the rent-receipt history has been verified.
    pub tenant_document_receipt_valid: Option<bool>,
    /// Compatibility score (0-100). Set and cleared together with `pros` and
    /// `cons`, never partially.
    pub score: Option<i32>,
    /// Positive points from the last scoring run (raw bullet text).
    pub pros: Option<String>,
    /// Negative points from the last scoring run (raw bullet text).
    pub cons: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Represents the property owner's matching preferences.
///
/// A single logical row per deployment: the store holds at most one owner's
/// questionnaire answers and lookups take the first row without a filter.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OwnerPreferences {
    /// Unique identifier for the preference row.
    pub id: Uuid,
    /// Ranked selection priorities.
    pub priorities: Vec<String>,
    /// Preferred tenant category (e.g., "student", "professional").
    pub tenant_category: Option<String>,
    pub student_field: Option<String>,
    pub student_field_preference: Option<String>,
    pub professional_sector: Option<String>,
    pub professional_sector_preference: Option<String>,
    /// Minimum financial bar (free text, e.g., "3x rent").
    pub min_financial_requirement: Option<String>,
    pub financial_requirements: Vec<String>,
    pub lease_type: Option<String>,
    pub min_stay: Option<String>,
    pub acceptances: Vec<String>,
    pub lifestyle_matters: Vec<String>,
    pub relationship_management: Option<String>,
    /// Conditions that should zero out or heavily penalize compatibility.
    /// Consumed by the scoring prompt, never parsed structurally.
    pub dealbreakers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Represents a classifieds listing extracted by the scraping actor or the
/// LLM fallback.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PropertyListing {
    pub id: Uuid,
    /// Listing identifier on the source site.
    pub list_id: Option<i64>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub category_name: Option<String>,
    pub ad_type: Option<String>,
    pub url: Option<String>,
    pub price: Option<BigDecimal>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub region_name: Option<String>,
    pub status: Option<String>,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub images: Option<serde_json::Value>,
    pub nb_images: Option<i32>,
    pub thumb_image: Option<String>,
    /// Source-specific attribute key/values, kept as-is.
    pub attributes: Option<serde_json::Value>,
    /// Advertiser block from the source, kept as-is.
    pub owner_data: Option<serde_json::Value>,
    /// Extraction source ("apify" or "llm_fallback").
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ============ API Request/Response Models ============

/// Payload for a rental application submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub profession: Option<String>,
    pub employment_type: Option<String>,
    pub company_name: Option<String>,
    pub monthly_income: Option<f64>,
    pub income_interview: Option<String>,
    pub income_documents: Option<String>,
    pub guarantor_type: Option<String>,
    pub guarantor_income: Option<f64>,
    pub smoking_status: Option<String>,
    #[serde(default)]
    pub pets: Vec<String>,
    pub lifestyle_description: Option<String>,
    pub guest_frequency: Option<String>,
    pub noise_tolerance: Option<String>,
    pub previous_rental_document: Option<bool>,
    pub previous_rental_paying: Option<bool>,
    pub reason_for_moving: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub communication_preference: Option<String>,
}

/// Response for a successful application submission.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub success: bool,
    pub tenant_id: Uuid,
}

/// Response for a successful scoring run.
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub success: bool,
    pub score: i32,
    pub pros: String,
    pub cons: String,
}

/// Generic success/failure response body.
#[derive(Debug, Serialize)]
pub struct SimpleResponse {
    pub success: bool,
}

/// Response for the scheduling-link operation.
#[derive(Debug, Serialize)]
pub struct SchedulingLinkResponse {
    pub success: bool,
    /// Whether the webhook GET actually went out (false when no webhook is
    /// configured or the call failed; the stored flags are set regardless).
    pub webhook_delivered: bool,
}

/// Payload for updating a tenant's application status.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Payload for the owner questionnaire upsert.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerPreferencesRequest {
    #[serde(default)]
    pub priorities: Vec<String>,
    pub tenant_category: Option<String>,
    pub student_field: Option<String>,
    pub student_field_preference: Option<String>,
    pub professional_sector: Option<String>,
    pub professional_sector_preference: Option<String>,
    pub min_financial_requirement: Option<String>,
    #[serde(default)]
    pub financial_requirements: Vec<String>,
    pub lease_type: Option<String>,
    pub min_stay: Option<String>,
    #[serde(default)]
    pub acceptances: Vec<String>,
    #[serde(default)]
    pub lifestyle_matters: Vec<String>,
    pub relationship_management: Option<String>,
    #[serde(default)]
    pub dealbreakers: Vec<String>,
}

/// Payload for listing extraction.
#[derive(Debug, Deserialize)]
pub struct ExtractPropertyRequest {
    pub url: String,
}

/// Response for a successful listing extraction.
#[derive(Debug, Serialize)]
pub struct ExtractPropertyResponse {
    pub success: bool,
    pub property: PropertyListing,
}
