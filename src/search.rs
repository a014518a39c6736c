//! Candidate search over the people-data vendor.
//!
//! Every company search is three sequential steps:
//! 1. Company feature for the requested employment status
//! 2. Person IDs in that feature's segment
//! 3. Full profile per person, one at a time
//!
//! Failures in steps 1 and 2 abort the request; a failing profile in step 3
//! is skipped. Mapped candidates are upserted into `candidates`, and storage
//! failures never fail the search.

use crate::candidate_mapper::{self, SearchFilters};
use crate::db_storage::CandidateStorage;
use crate::errors::{AppError, ResultExt};
use crate::mixrank_client::MixrankClient;
use crate::mock_data::UuidEntropy;
use crate::models::{
    AdvancedSearchRequest, AdvancedSearchResponse, CandidateData, CompanyCandidatesRequest,
    CompanyCandidatesResponse, EmploymentStatus, SearchDebug,
};
use serde_json::Value;

/// Profiles fetched per company by the simple search.
pub const COMPANY_SEARCH_LIMIT: u32 = 5;
/// Default profiles fetched per company by the advanced search.
pub const ADVANCED_SEARCH_LIMIT: u32 = 50;

/// Current (or past, or all) employees of one company.
pub async fn company_candidates(
    mixrank: &MixrankClient,
    storage: Option<&CandidateStorage>,
    request: &CompanyCandidatesRequest,
) -> Result<CompanyCandidatesResponse, AppError> {
    let company_name = request
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("Company name is required".to_string()))?;
    let status = request.employment_status;

    let profiles = company_profiles(mixrank, company_name, status, COMPANY_SEARCH_LIMIT).await?;

    let current_year = candidate_mapper::current_year();
    let mut entropy = UuidEntropy;
    let mut candidates = Vec::with_capacity(profiles.len());

    for (person_id, profile) in &profiles {
        let candidate = candidate_mapper::map_profile(
            profile,
            person_id,
            company_name,
            status,
            current_year,
            &mut entropy,
        );
        save_candidate(storage, &candidate).await;
        candidates.push(candidate);
    }

    if candidates.is_empty() {
        return Err(AppError::NotFound(
            "Could not retrieve any valid profiles".to_string(),
        ));
    }

    tracing::info!(
        "Found {} {} candidates at {}",
        candidates.len(),
        status,
        company_name
    );

    Ok(CompanyCandidatesResponse {
        candidates,
        company: company_name.to_string(),
        employment_status: status,
    })
}

/// Employees of several companies, filtered after fetching.
pub async fn advanced_search(
    mixrank: &MixrankClient,
    storage: Option<&CandidateStorage>,
    request: &AdvancedSearchRequest,
) -> Result<AdvancedSearchResponse, AppError> {
    let company_names: Vec<&str> = request
        .company_names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if company_names.is_empty() {
        return Err(AppError::BadRequest(
            "At least one company name is required".to_string(),
        ));
    }

    let status = request.employment_status;
    let limit = request.limit.unwrap_or(ADVANCED_SEARCH_LIMIT);
    let filters = SearchFilters::from(request);
    let current_year = candidate_mapper::current_year();
    let mut entropy = UuidEntropy;

    let mut candidates = Vec::new();
    let mut total_profiles = 0;

    for company_name in &company_names {
        tracing::info!("[STEP 1-3] Searching {} employees at {}", status, company_name);
        let profiles = company_profiles(mixrank, company_name, status, limit)
            .await
            .with_context(|| format!("Search failed for company {}", company_name))?;
        total_profiles += profiles.len();

        let before = candidates.len();
        for (person_id, profile) in &profiles {
            let candidate = candidate_mapper::map_profile(
                profile,
                person_id,
                company_name,
                status,
                current_year,
                &mut entropy,
            );
            if !filters.matches(&candidate) {
                tracing::debug!("Candidate {} filtered out", candidate.id);
                continue;
            }
            save_candidate(storage, &candidate).await;
            candidates.push(candidate);
        }

        tracing::info!(
            "[SUMMARY] {} of {} profiles at {} match all filters",
            candidates.len() - before,
            profiles.len(),
            company_name
        );
    }

    let count = candidates.len();
    Ok(AdvancedSearchResponse {
        candidates,
        count,
        company: company_names.join(", "),
        employment_status: status,
        debug: SearchDebug {
            total_profiles_processed: total_profiles,
            matching_candidates: count,
            filters_summary: request.clone(),
        },
    })
}

/// Profile behind a LinkedIn URL.
pub async fn match_candidate(
    mixrank: &MixrankClient,
    linkedin_url: Option<&str>,
) -> Result<CandidateData, AppError> {
    let linkedin_url = linkedin_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| AppError::BadRequest("LinkedIn URL is required".to_string()))?;

    let response = mixrank.match_person(linkedin_url).await?;
    candidate_mapper::map_match(
        &response,
        EmploymentStatus::Present,
        candidate_mapper::current_year(),
        &mut UuidEntropy,
    )
}

/// Steps 1-3 for one company: `(person_id, profile)` pairs.
async fn company_profiles(
    mixrank: &MixrankClient,
    company_name: &str,
    status: EmploymentStatus,
    limit: u32,
) -> Result<Vec<(String, Value)>, AppError> {
    let feature_id = mixrank.feature_id(company_name, status).await?;
    tracing::info!(
        "Found feature {} for {} employees at {}",
        feature_id,
        status,
        company_name
    );

    let person_ids = mixrank.segment_preview(&feature_id, limit).await?;
    if person_ids.is_empty() {
        return Err(AppError::NotFound(
            "No candidates found for this company".to_string(),
        ));
    }
    tracing::info!("Found {} person IDs for {}", person_ids.len(), company_name);

    let mut profiles = Vec::with_capacity(person_ids.len());
    for person_id in person_ids {
        match mixrank.person(&person_id).await {
            Ok(profile) if !profile.is_null() => profiles.push((person_id, profile)),
            Ok(_) => tracing::warn!("Skipping profile {}: empty response", person_id),
            Err(e) => tracing::warn!("Skipping profile {} due to error: {}", person_id, e),
        }
    }

    Ok(profiles)
}

async fn save_candidate(storage: Option<&CandidateStorage>, candidate: &CandidateData) {
    let Some(storage) = storage else {
        return;
    };
    if let Err(e) = storage.upsert_candidate(candidate).await {
        tracing::error!("Error saving candidate {}: {}", candidate.id, e);
    }
}
