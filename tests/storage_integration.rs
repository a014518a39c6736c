use std::env;
use uuid::Uuid;

use gauge_api::db::Database;
use gauge_api::db_storage::{CandidateStorage, CompanyDataCache};
use gauge_api::mock_data::{self, SequenceEntropy};
use gauge_api::models::{CacheKey, CandidateData, CompanyDataType, EmploymentStatus};
use serde_json::json;

async fn test_pool() -> anyhow::Result<sqlx::PgPool> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;
    let db = Database::new(&db_url).await?;
    sqlx::raw_sql(include_str!("../schema.sql"))
        .execute(&db.pool)
        .await?;
    Ok(db.pool)
}

fn candidate(id: &str, role: &str) -> CandidateData {
    let mut entropy = SequenceEntropy::new(vec![0.25, 0.75]);
    CandidateData {
        id: id.to_string(),
        name: "Storage Test".to_string(),
        current_company: "Acme".to_string(),
        linkedin_url: format!("https://linkedin.com/in/{}", id),
        current_role: role.to_string(),
        location: "Lisbon".to_string(),
        years_experience: 7,
        school: "Unknown".to_string(),
        prior_experience: "No prior experience".to_string(),
        company_when_joined: mock_data::company_metrics_when_joined(&mut entropy),
        company_today: mock_data::company_metrics_today(&mut entropy),
        notable_investors: mock_data::notable_investors(&mut entropy),
        senior_leadership: mock_data::senior_leadership(&mut entropy),
        email: None,
        employment_status: EmploymentStatus::Past,
    }
}

/// Candidate upsert against a real Postgres.
/// Marked ignored so it never runs against a shared database by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn candidate_upsert_replaces_existing_row() -> anyhow::Result<()> {
    let storage = CandidateStorage::new(test_pool().await?);
    let id = format!("test-{}", Uuid::new_v4().simple());

    storage.upsert_candidate(&candidate(&id, "Engineer")).await?;
    let first = storage
        .get_candidate(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("candidate {} was not stored", id))?;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    storage.upsert_candidate(&candidate(&id, "Staff Engineer")).await?;

    let row = storage
        .get_candidate(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("candidate {} was not stored", id))?;
    assert_eq!(row.created_at, first.created_at);
    assert_eq!(row.role, "Staff Engineer");
    assert_eq!(row.company, "Acme");
    assert_eq!(row.years_experience, 7);
    assert_eq!(row.employment_status, "past");

    assert!(storage.get_candidate("no-such-candidate").await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn company_cache_is_scoped_by_candidate() -> anyhow::Result<()> {
    let cache = CompanyDataCache::new(test_pool().await?);
    let company = format!("Acme {}", Uuid::new_v4().simple());

    let company_key = CacheKey::company(&company, CompanyDataType::CompanyToday);
    assert!(cache.get(&company_key).await?.is_none());

    cache
        .store(&company_key, &json!({ "size": 10, "stage": "Seed", "funding": 1 }))
        .await?;
    cache
        .store(&company_key, &json!({ "size": 20, "stage": "Series A", "funding": 5 }))
        .await?;

    let row = cache
        .get(&company_key)
        .await?
        .ok_or_else(|| anyhow::anyhow!("cache row missing"))?;
    assert_eq!(row.data["size"], 20);
    assert_eq!(row.candidate_id, "");

    let joined_key = CacheKey::for_candidate(
        &company,
        CompanyDataType::CompanyWhenJoined,
        Some("42"),
        Some("CTO"),
    );
    cache
        .store(&joined_key, &json!({ "size": 5, "stage": "Seed", "funding": 1 }))
        .await?;

    let other_role = CacheKey::for_candidate(
        &company,
        CompanyDataType::CompanyWhenJoined,
        Some("42"),
        Some("CEO"),
    );
    assert!(cache.get(&other_role).await?.is_none());
    assert!(cache.get(&joined_key).await?.is_some());
    Ok(())
}
