use crate::errors::{AppError, ResultExt};
use crate::models::{
    ApplicationRequest, OwnerPreferences, OwnerPreferencesRequest, PropertyListing, TenantProfile,
};
use crate::scoring::ScoreStore;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

/// Database storage service for tenant profiles, owner preferences and
/// extracted listings.
pub struct TenantStorage {
    pool: PgPool,
}

impl TenantStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ============ Tenant profiles ============

    /// Insert a new tenant profile from a validated application.
    ///
    /// The profile starts in "pending" status with all document flags unset
    /// and the scoring fields NULL.
    pub async fn insert_application(
        &self,
        req: &ApplicationRequest,
        normalized_phone: Option<&str>,
    ) -> Result<Uuid, AppError> {
        let monthly_income = req
            .monthly_income
            .and_then(|income| BigDecimal::from_str(&income.to_string()).ok());
        let guarantor_income = req
            .guarantor_income
            .and_then(|income| BigDecimal::from_str(&income.to_string()).ok());

        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO tenant_profiles (
                first_name, last_name, email, phone, date_of_birth,
                profession, employment_type, company_name,
                monthly_income, income_interview, income_documents,
                guarantor_type, guarantor_income,
                smoking_status, pets, lifestyle_description,
                guest_frequency, noise_tolerance,
                previous_rental_document, previous_rental_paying,
                reason_for_moving, languages, communication_preference,
                application_status, application_date,
                tenant_document_id_valid, tenant_document_income_valid,
                tenant_document_tax_valid, tenant_document_receipt_valid
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23,
                'pending', now(), false, false, false, false
            )
            RETURNING id
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(req.email.to_lowercase())
        .bind(normalized_phone)
        .bind(req.date_of_birth)
        .bind(&req.profession)
        .bind(&req.employment_type)
        .bind(&req.company_name)
        .bind(monthly_income)
        .bind(&req.income_interview)
        .bind(&req.income_documents)
        .bind(&req.guarantor_type)
        .bind(guarantor_income)
        .bind(&req.smoking_status)
        .bind(&req.pets)
        .bind(&req.lifestyle_description)
        .bind(&req.guest_frequency)
        .bind(&req.noise_tolerance)
        .bind(req.previous_rental_document)
        .bind(req.previous_rental_paying)
        .bind(&req.reason_for_moving)
        .bind(&req.languages)
        .bind(&req.communication_preference)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert tenant application")?;

        tracing::info!("Stored application for {} {} ({})", req.first_name, req.last_name, row.0);
        Ok(row.0)
    }

    pub async fn list_tenants(&self) -> Result<Vec<TenantProfile>, AppError> {
        let tenants = sqlx::query_as::<_, TenantProfile>(
            "SELECT * FROM tenant_profiles ORDER BY application_date DESC NULLS LAST",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    pub async fn update_application_status(
        &self,
        tenant_id: Uuid,
        status: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE tenant_profiles SET application_status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(tenant_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Tenant {} not found",
                tenant_id
            )));
        }

        Ok(())
    }

    /// Marks the scheduling link as sent. The flag, its timestamp and the
    /// last-contact date move in one update.
    pub async fn mark_scheduling_link_sent(&self, tenant_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tenant_profiles
            SET scheduling_link_sent = true,
                scheduling_link_sent_date = now(),
                last_contact_date = now(),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Tenant {} not found",
                tenant_id
            )));
        }

        Ok(())
    }

    // ============ Owner preferences ============

    /// Update the single owner-preference row if one exists, insert the
    /// first otherwise.
    pub async fn upsert_owner_preferences(
        &self,
        req: &OwnerPreferencesRequest,
    ) -> Result<OwnerPreferences, AppError> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM owner_preferences LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        let prefs = match existing {
            Some((id,)) => {
                sqlx::query_as::<_, OwnerPreferences>(
                    r#"
                    UPDATE owner_preferences
                    SET priorities = $2,
                        tenant_category = $3,
                        student_field = $4,
                        student_field_preference = $5,
                        professional_sector = $6,
                        professional_sector_preference = $7,
                        min_financial_requirement = $8,
                        financial_requirements = $9,
                        lease_type = $10,
                        min_stay = $11,
                        acceptances = $12,
                        lifestyle_matters = $13,
                        relationship_management = $14,
                        dealbreakers = $15,
                        updated_at = now()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(&req.priorities)
                .bind(&req.tenant_category)
                .bind(&req.student_field)
                .bind(&req.student_field_preference)
                .bind(&req.professional_sector)
                .bind(&req.professional_sector_preference)
                .bind(&req.min_financial_requirement)
                .bind(&req.financial_requirements)
                .bind(&req.lease_type)
                .bind(&req.min_stay)
                .bind(&req.acceptances)
                .bind(&req.lifestyle_matters)
                .bind(&req.relationship_management)
                .bind(&req.dealbreakers)
                .fetch_one(&self.pool)
                .await
                .context("Failed to update owner preferences")?
            }
            None => {
                sqlx::query_as::<_, OwnerPreferences>(
                    r#"
                    INSERT INTO owner_preferences (
                        priorities, tenant_category, student_field,
                        student_field_preference, professional_sector,
                        professional_sector_preference, min_financial_requirement,
                        financial_requirements, lease_type, min_stay,
                        acceptances, lifestyle_matters, relationship_management,
                        dealbreakers
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                    RETURNING *
                    "#,
                )
                .bind(&req.priorities)
                .bind(&req.tenant_category)
                .bind(&req.student_field)
                .bind(&req.student_field_preference)
                .bind(&req.professional_sector)
                .bind(&req.professional_sector_preference)
                .bind(&req.min_financial_requirement)
                .bind(&req.financial_requirements)
                .bind(&req.lease_type)
                .bind(&req.min_stay)
                .bind(&req.acceptances)
                .bind(&req.lifestyle_matters)
                .bind(&req.relationship_management)
                .bind(&req.dealbreakers)
                .fetch_one(&self.pool)
                .await
                .context("Failed to insert owner preferences")?
            }
        };

        tracing::info!("Owner preferences saved ({})", prefs.id);
        Ok(prefs)
    }

    // ============ Extracted listings ============

    /// Store a listing extracted by the scraping actor or the LLM fallback.
    ///
    /// Fields are pulled out of the raw item defensively; anything the
    /// source did not provide stays NULL. The advertiser block and the
    /// attribute map are kept verbatim as JSONB.
    pub async fn store_extracted_listing(
        &self,
        listing_url: &str,
        source: &str,
        item: &Value,
    ) -> Result<PropertyListing, AppError> {
        let list_id = item.get("list_id").and_then(|v| v.as_i64());
        let subject = item.get("subject").and_then(|v| v.as_str());
        let body = item.get("body").and_then(|v| v.as_str());
        let category_name = item.get("category_name").and_then(|v| v.as_str());
        let ad_type = item.get("ad_type").and_then(|v| v.as_str());
        let url = item
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or(listing_url);
        let status = item.get("status").and_then(|v| v.as_str());
        let city = item
            .get("city")
            .or_else(|| item.get("city_label"))
            .and_then(|v| v.as_str());
        let zipcode = item.get("zipcode").and_then(|v| v.as_str());
        let region_name = item.get("region_name").and_then(|v| v.as_str());
        let thumb_image = item.get("thumb_image").and_then(|v| v.as_str());

        let price = item.get("price").and_then(parse_listing_price);
        let first_publication_date = item
            .get("first_publication_date")
            .and_then(parse_listing_date);
        let expiration_date = item.get("expiration_date").and_then(parse_listing_date);

        let lat = item.get("lat").and_then(|v| v.as_f64());
        let lng = item.get("lng").and_then(|v| v.as_f64());
        let nb_images = item
            .get("nb_images")
            .and_then(|v| v.as_i64())
            .map(|n| n as i32);

        let listing = sqlx::query_as::<_, PropertyListing>(
            r#"
            INSERT INTO properties (
                list_id, subject, body, category_name, ad_type, url, price,
                city, zipcode, region_name, status,
                first_publication_date, expiration_date,
                lat, lng, images, nb_images, thumb_image,
                attributes, owner_data, source
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            RETURNING *
            "#,
        )
        .bind(list_id)
        .bind(subject)
        .bind(body)
        .bind(category_name)
        .bind(ad_type)
        .bind(url)
        .bind(price)
        .bind(city)
        .bind(zipcode)
        .bind(region_name)
        .bind(status)
        .bind(first_publication_date)
        .bind(expiration_date)
        .bind(lat)
        .bind(lng)
        .bind(item.get("images").cloned())
        .bind(nb_images)
        .bind(thumb_image)
        .bind(item.get("attributes").cloned())
        .bind(item.get("owner").cloned())
        .bind(source)
        .fetch_one(&self.pool)
        .await
        .context("Failed to store extracted listing")?;

        tracing::info!(
            "Stored extracted listing {} (source: {})",
            listing.id,
            source
        );
        Ok(listing)
    }

    pub async fn list_properties(&self) -> Result<Vec<PropertyListing>, AppError> {
        let listings = sqlx::query_as::<_, PropertyListing>(
            "SELECT * FROM properties ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    pub async fn delete_property(&self, property_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(property_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Property {} not found",
                property_id
            )));
        }

        Ok(())
    }

    pub async fn delete_all_properties(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM properties")
            .execute(&self.pool)
            .await?;

        tracing::info!("Purged {} propertie(s)", result.rows_affected());
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ScoreStore for TenantStorage {
    async fn fetch_tenant(&self, tenant_id: Uuid) -> Result<Option<TenantProfile>, AppError> {
        let tenant =
            sqlx::query_as::<_, TenantProfile>("SELECT * FROM tenant_profiles WHERE id = $1")
                .bind(tenant_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(tenant)
    }

    async fn fetch_owner_preferences(&self) -> Result<Option<OwnerPreferences>, AppError> {
        // Single-owner deployment: the first row is the owner's row.
        let prefs =
            sqlx::query_as::<_, OwnerPreferences>("SELECT * FROM owner_preferences LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(prefs)
    }

    async fn persist_scoring(
        &self,
        tenant_id: Uuid,
        score: i32,
        pros: &str,
        cons: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tenant_profiles
            SET score = $2, pros = $3, cons = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .bind(score)
        .bind(pros)
        .bind(cons)
        .execute(&self.pool)
        .await?;

        // 0 rows means the tenant vanished between fetch and write
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Tenant {} not found at score write time",
                tenant_id
            )));
        }

        Ok(())
    }

    async fn reset_scoring(&self, tenant_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tenant_profiles
            SET score = NULL, pros = NULL, cons = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Tenant {} not found",
                tenant_id
            )));
        }

        Ok(())
    }
}

/// Parse a listing price from either a JSON number or a numeric string.
fn parse_listing_price(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        // Some sources send price as [amount]
        Value::Array(items) => items.first().and_then(parse_listing_price),
        _ => None,
    }
}

/// Parse a listing timestamp from an RFC 3339 string, the source's
/// "YYYY-MM-DD HH:MM:SS" format, or epoch seconds.
fn parse_listing_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .map(|naive| naive.and_utc())
                    .ok()
            }),
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_listing_price_variants() {
        assert_eq!(
            parse_listing_price(&json!(1250)),
            BigDecimal::from_str("1250").ok()
        );
        assert_eq!(
            parse_listing_price(&json!("980.50")),
            BigDecimal::from_str("980.50").ok()
        );
        assert_eq!(
            parse_listing_price(&json!([700])),
            BigDecimal::from_str("700").ok()
        );
        assert_eq!(parse_listing_price(&json!("n/a")), None);
        assert_eq!(parse_listing_price(&json!(null)), None);
    }

    #[test]
    fn test_parse_listing_date_variants() {
        let rfc = parse_listing_date(&json!("2024-01-15T10:00:00Z")).unwrap();
        assert_eq!(rfc.to_rfc3339(), "2024-01-15T10:00:00+00:00");

        let plain = parse_listing_date(&json!("2024-01-15 10:00:00")).unwrap();
        assert_eq!(plain, rfc);

        let epoch = parse_listing_date(&json!(1705312800)).unwrap();
        assert_eq!(epoch, rfc);

        assert_eq!(parse_listing_date(&json!("soon")), None);
    }
}
