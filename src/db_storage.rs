use crate::errors::{AppError, ResultExt};
use crate::models::{CacheKey, CachedCompanyData, CandidateData, CandidateRow};
use serde_json::Value;
use sqlx::PgPool;

/// Storage for candidates returned by searches.
#[derive(Clone)]
pub struct CandidateStorage {
    pool: PgPool,
}

impl CandidateStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a candidate or refreshes the stored row with the same vendor ID.
    ///
    /// A refresh keeps the row's original `created_at`.
    pub async fn upsert_candidate(&self, candidate: &CandidateData) -> Result<(), AppError> {
        let row = CandidateRow::from(candidate);

        sqlx::query(
            r#"
            INSERT INTO candidates (
                id, name, company, role, location, linkedin_url, years_experience,
                school, prior_experience, email, employment_status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                company = EXCLUDED.company,
                role = EXCLUDED.role,
                location = EXCLUDED.location,
                linkedin_url = EXCLUDED.linkedin_url,
                years_experience = EXCLUDED.years_experience,
                school = EXCLUDED.school,
                prior_experience = EXCLUDED.prior_experience,
                email = EXCLUDED.email,
                employment_status = EXCLUDED.employment_status
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.company)
        .bind(&row.role)
        .bind(&row.location)
        .bind(&row.linkedin_url)
        .bind(row.years_experience)
        .bind(&row.school)
        .bind(&row.prior_experience)
        .bind(&row.email)
        .bind(&row.employment_status)
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert candidate {}", row.id))?;

        tracing::debug!("Candidate {} saved", row.id);
        Ok(())
    }

    pub async fn get_candidate(&self, id: &str) -> Result<Option<CandidateRow>, AppError> {
        let row = sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

/// Postgres side of the enrichment cache.
///
/// Rows are unique on `(company_name, data_type, candidate_id, candidate_role)`
/// with empty strings standing in for "not candidate specific".
#[derive(Clone)]
pub struct CompanyDataCache {
    pool: PgPool,
}

impl CompanyDataCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &CacheKey) -> Result<Option<CachedCompanyData>, AppError> {
        let row = sqlx::query_as::<_, CachedCompanyData>(
            r#"
            SELECT * FROM company_data_cache
            WHERE company_name = $1
              AND data_type = $2
              AND candidate_id = $3
              AND candidate_role = $4
            LIMIT 1
            "#,
        )
        .bind(&key.company_name)
        .bind(key.data_type.as_str())
        .bind(key.candidate_id.as_deref().unwrap_or(""))
        .bind(key.candidate_role.as_deref().unwrap_or(""))
        .fetch_optional(&self.pool)
        .await
        .with_context(|| {
            format!(
                "Failed to read {} cache for {}",
                key.data_type, key.company_name
            )
        })?;

        Ok(row)
    }

    /// Inserts or replaces the cached value for a key.
    pub async fn store(&self, key: &CacheKey, data: &Value) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO company_data_cache (
                company_name, data_type, data, candidate_id, candidate_role, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (company_name, data_type, candidate_id, candidate_role) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = NOW()
            "#,
        )
        .bind(&key.company_name)
        .bind(key.data_type.as_str())
        .bind(data)
        .bind(key.candidate_id.as_deref().unwrap_or(""))
        .bind(key.candidate_role.as_deref().unwrap_or(""))
        .execute(&self.pool)
        .await
        .with_context(|| {
            format!(
                "Failed to store {} cache for {}",
                key.data_type, key.company_name
            )
        })?;

        tracing::info!("Stored {} data for {} in cache", key.data_type, key.company_name);
        Ok(())
    }
}
