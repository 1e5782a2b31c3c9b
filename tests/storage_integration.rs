use std::env;
use uuid::Uuid;

use tenant_match_api::data::db_storage::TenantStorage;
use tenant_match_api::db::Database;
use tenant_match_api::models::ApplicationRequest;
use tenant_match_api::scoring::ScoreStore;

/// Integration smoke test for the application -> score -> reset cycle.
/// Marked ignored to avoid running against production by accident; set
/// TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn score_write_and_reset_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    let storage = TenantStorage::new(db.pool.clone());

    // Unique email to avoid conflicts on repeated runs
    let email = format!("smoke+{}@example.com", Uuid::new_v4());
    let application = ApplicationRequest {
        first_name: "Smoke".to_string(),
        last_name: "Test".to_string(),
        email,
        phone: None,
        date_of_birth: None,
        profession: Some("QA".to_string()),
        employment_type: Some("CDI".to_string()),
        company_name: None,
        monthly_income: Some(3000.0),
        income_interview: None,
        income_documents: None,
        guarantor_type: None,
        guarantor_income: None,
        smoking_status: None,
        pets: vec![],
        lifestyle_description: None,
        guest_frequency: None,
        noise_tolerance: None,
        previous_rental_document: None,
        previous_rental_paying: None,
        reason_for_moving: None,
        languages: vec![],
        communication_preference: None,
    };

    let tenant_id = storage
        .insert_application(&application, None)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_ne!(tenant_id, Uuid::nil());

    storage
        .persist_scoring(tenant_id, 77, "- pro", "- con")
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let scored = storage
        .fetch_tenant(tenant_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .expect("tenant should exist after insert");
    assert_eq!(scored.score, Some(77));
    assert_eq!(scored.pros.as_deref(), Some("- pro"));
    assert_eq!(scored.cons.as_deref(), Some("- con"));

    storage
        .reset_scoring(tenant_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    // All three fields clear together, never a mix
    let reset = storage
        .fetch_tenant(tenant_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .expect("tenant should still exist after reset");
    assert_eq!(reset.score, None);
    assert_eq!(reset.pros, None);
    assert_eq!(reset.cons, None);

    Ok(())
}
