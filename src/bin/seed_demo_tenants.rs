//! Seeds a fresh environment with demo tenant applications.
//!
//! Useful for exercising the dashboard and the scoring pipeline before any
//! real application has been submitted.

use dotenvy::dotenv;
use std::env;
use tenant_match_api::applications::submit_application;
use tenant_match_api::models::ApplicationRequest;
use tenant_match_api::db::Database;

fn demo_applications() -> Vec<ApplicationRequest> {
    vec![
        ApplicationRequest {
            first_name: "Marie".to_string(),
            last_name: "Dubois".to_string(),
            email: "marie.dubois@example.com".to_string(),
            phone: Some("+33612345678".to_string()),
            date_of_birth: "1999-03-15".parse().ok(),
            profession: Some("Software Engineer".to_string()),
            employment_type: Some("CDI".to_string()),
            company_name: Some("Tech Corp".to_string()),
            monthly_income: Some(4200.0),
            income_interview: None,
            income_documents: None,
            guarantor_type: Some("Parents".to_string()),
            guarantor_income: Some(8500.0),
            smoking_status: Some("Non-smoker".to_string()),
            pets: vec![],
            lifestyle_description: Some(
                "Quiet, enjoys reading and cooking. Works regular hours.".to_string(),
            ),
            guest_frequency: Some("Occasionally".to_string()),
            noise_tolerance: Some("Quiet".to_string()),
            previous_rental_document: Some(true),
            previous_rental_paying: Some(true),
            reason_for_moving: Some("Job relocation".to_string()),
            languages: vec![
                "French".to_string(),
                "English".to_string(),
                "Spanish".to_string(),
            ],
            communication_preference: None,
        },
        ApplicationRequest {
            first_name: "Thomas".to_string(),
            last_name: "Martin".to_string(),
            email: "thomas.martin@example.com".to_string(),
            phone: Some("+33623456789".to_string()),
            date_of_birth: "1995-07-22".parse().ok(),
            profession: Some("Marketing Manager".to_string()),
            employment_type: Some("CDI".to_string()),
            company_name: Some("Creative Agency".to_string()),
            monthly_income: Some(3800.0),
            income_interview: None,
            income_documents: None,
            guarantor_type: Some("Bank".to_string()),
            guarantor_income: None,
            smoking_status: Some("Non-smoker".to_string()),
            pets: vec!["Cat".to_string()],
            lifestyle_description: Some(
                "Social and active, enjoys photography and travel.".to_string(),
            ),
            guest_frequency: Some("Frequently".to_string()),
            noise_tolerance: Some("Moderate".to_string()),
            previous_rental_document: Some(true),
            previous_rental_paying: Some(true),
            reason_for_moving: Some("Apartment too small".to_string()),
            languages: vec!["French".to_string(), "English".to_string()],
            communication_preference: None,
        },
        ApplicationRequest {
            first_name: "Sophie".to_string(),
            last_name: "Chen".to_string(),
            email: "sophie.chen@example.com".to_string(),
            phone: Some("+33634567890".to_string()),
            date_of_birth: "2001-11-08".parse().ok(),
            profession: Some("Master's Student".to_string()),
            employment_type: Some("Student".to_string()),
            company_name: Some("Business School".to_string()),
            monthly_income: Some(2100.0),
            income_interview: None,
            income_documents: None,
            guarantor_type: Some("Parents".to_string()),
            guarantor_income: Some(6500.0),
            smoking_status: Some("Non-smoker".to_string()),
            pets: vec![],
            lifestyle_description: Some(
                "Studious and organized, enjoys piano and art.".to_string(),
            ),
            guest_frequency: Some("Rarely".to_string()),
            noise_tolerance: Some("Quiet".to_string()),
            previous_rental_document: Some(true),
            previous_rental_paying: Some(true),
            reason_for_moving: Some("Student housing expired".to_string()),
            languages: vec![
                "Chinese".to_string(),
                "French".to_string(),
                "English".to_string(),
            ],
            communication_preference: None,
        },
        ApplicationRequest {
            first_name: "Lucas".to_string(),
            last_name: "Petit".to_string(),
            email: "lucas.petit@example.com".to_string(),
            phone: Some("+33645678901".to_string()),
            date_of_birth: "1997-05-12".parse().ok(),
            profession: Some("Graphic Designer".to_string()),
            employment_type: Some("Freelance".to_string()),
            company_name: Some("Freelance".to_string()),
            monthly_income: Some(2800.0),
            income_interview: None,
            income_documents: None,
            guarantor_type: Some("Bank".to_string()),
            guarantor_income: None,
            smoking_status: Some("Occasional".to_string()),
            pets: vec![],
            lifestyle_description: Some(
                "Creative and flexible, works from home often.".to_string(),
            ),
            guest_frequency: Some("Occasionally".to_string()),
            noise_tolerance: Some("Flexible".to_string()),
            previous_rental_document: Some(true),
            previous_rental_paying: Some(true),
            reason_for_moving: Some("Seeking better workspace".to_string()),
            languages: vec![
                "French".to_string(),
                "English".to_string(),
                "Italian".to_string(),
            ],
            communication_preference: None,
        },
        ApplicationRequest {
            first_name: "Emma".to_string(),
            last_name: "Rodriguez".to_string(),
            email: "emma.rodriguez@example.com".to_string(),
            phone: Some("+33656789012".to_string()),
            date_of_birth: "1993-09-03".parse().ok(),
            profession: Some("Civil Servant".to_string()),
            employment_type: Some("CDI".to_string()),
            company_name: Some("Ministry of Education".to_string()),
            monthly_income: Some(3600.0),
            income_interview: None,
            income_documents: None,
            guarantor_type: Some("Employment".to_string()),
            guarantor_income: None,
            smoking_status: Some("Non-smoker".to_string()),
            pets: vec![],
            lifestyle_description: Some(
                "Stable and quiet, enjoys gardening and hiking.".to_string(),
            ),
            guest_frequency: Some("Rarely".to_string()),
            noise_tolerance: Some("Quiet".to_string()),
            previous_rental_document: Some(true),
            previous_rental_paying: Some(true),
            reason_for_moving: Some("Moving closer to work".to_string()),
            languages: vec![
                "Spanish".to_string(),
                "French".to_string(),
                "English".to_string(),
            ],
            communication_preference: None,
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::new(&database_url).await?;

    for application in demo_applications() {
        let name = format!("{} {}", application.first_name, application.last_name);
        match submit_application(&db.pool, &application).await {
            Ok(tenant_id) => println!("Seeded {} ({})", name, tenant_id),
            Err(e) => eprintln!("Failed to seed {}: {}", name, e),
        }
    }

    Ok(())
}
