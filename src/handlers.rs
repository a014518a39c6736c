use crate::analytics::{self, FunnelReport, FunnelRequest};
use crate::companies::{self, LayoffCompany};
use crate::config::Config;
use crate::db_storage::{CandidateStorage, CompanyDataCache};
use crate::enrichment::EnrichmentService;
use crate::errors::AppError;
use crate::llm_json::{self, Extraction};
use crate::mixrank_client::MixrankClient;
use crate::models::*;
use crate::perplexity_client::PerplexityClient;
use crate::search;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use moka::future::Cache;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// People-data vendor client.
    pub mixrank: MixrankClient,
    /// LLM client, also used directly by the raw proxy endpoint.
    pub perplexity: PerplexityClient,
    /// Cache-first company enrichment.
    pub enrichment: EnrichmentService,
    /// Upserts searched candidates.
    pub candidates: CandidateStorage,
}

impl AppState {
    /// Builds the vendor clients and the in-process enrichment cache.
    ///
    /// The pool backs both the candidate table and the company cache.
    pub fn new(config: &Config, db: PgPool) -> Result<Self, AppError> {
        let mixrank = MixrankClient::new(
            config.mixrank_api_url.clone(),
            config.mixrank_api_key.clone(),
        )?;
        let perplexity = PerplexityClient::new(
            config.perplexity_api_url.clone(),
            config.perplexity_api_key.clone(),
            config.perplexity_model.clone(),
        )?;

        // In front of company_data_cache
        let memory = Cache::builder()
            .time_to_live(Duration::from_secs(config.enrichment_cache_ttl_secs))
            .max_capacity(10_000)
            .build();
        tracing::info!(
            "Enrichment cache initialized ({}s TTL, 10k capacity)",
            config.enrichment_cache_ttl_secs
        );

        let enrichment = EnrichmentService::new(
            perplexity.clone(),
            Some(CompanyDataCache::new(db.clone())),
            memory,
        );

        Ok(Self {
            candidates: CandidateStorage::new(db),
            mixrank,
            perplexity,
            enrichment,
        })
    }
}

/// Every `/api/v1` route; callers add middleware and state.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/companies", get(list_companies))
        .route("/api/v1/candidates/match", post(match_candidate))
        .route("/api/v1/candidates/:id", get(get_candidate))
        .route("/api/v1/company-candidates", post(company_candidates))
        .route("/api/v1/advanced-candidates", post(advanced_candidates))
        .route("/api/v1/perplexity", post(perplexity_proxy))
        .route(
            "/api/v1/enrichment/company-when-joined",
            post(company_when_joined),
        )
        .route("/api/v1/enrichment/company-today", get(company_today))
        .route("/api/v1/enrichment/investors", get(notable_investors))
        .route("/api/v1/enrichment/leadership", get(senior_leadership))
        .route("/api/v1/enrichment/candidate", post(enrich_candidate))
        .route("/api/v1/extract", post(extract_json))
        .route("/api/v1/analytics/funnel", post(funnel))
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "gauge-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/companies
///
/// Companies affected by layoffs, optionally filtered by `?search=`.
pub async fn list_companies(
    Query(params): Query<CompanySearchQuery>,
) -> Json<Vec<&'static LayoffCompany>> {
    Json(companies::search_companies(params.search.as_deref()))
}

/// POST /api/v1/candidates/match
///
/// Looks up the candidate behind a LinkedIn profile URL.
pub async fn match_candidate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MatchCandidateRequest>,
) -> Result<Json<CandidateData>, AppError> {
    tracing::info!("POST /candidates/match - url: {:?}", payload.linkedin_url);
    let candidate = search::match_candidate(&state.mixrank, payload.linkedin_url.as_deref()).await?;
    Ok(Json(candidate))
}

/// GET /api/v1/candidates/:id
///
/// A candidate previously stored by a search.
pub async fn get_candidate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CandidateRow>, AppError> {
    tracing::info!("GET /candidates/{}", id);
    let candidate = state
        .candidates
        .get_candidate(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {} not found", id)))?;
    Ok(Json(candidate))
}

/// POST /api/v1/company-candidates
///
/// Up to five employees of one company, by employment status.
pub async fn company_candidates(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CompanyCandidatesRequest>,
) -> Result<Json<CompanyCandidatesResponse>, AppError> {
    tracing::info!(
        "POST /company-candidates - company: {:?}, status: {}",
        payload.company_name,
        payload.employment_status
    );
    let response =
        search::company_candidates(&state.mixrank, Some(&state.candidates), &payload).await?;
    Ok(Json(response))
}

/// POST /api/v1/advanced-candidates
///
/// Employees of several companies narrowed by experience, location, school
/// and role.
pub async fn advanced_candidates(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdvancedSearchRequest>,
) -> Result<Json<AdvancedSearchResponse>, AppError> {
    tracing::info!("POST /advanced-candidates - params: {:?}", payload);
    let response =
        search::advanced_search(&state.mixrank, Some(&state.candidates), &payload).await?;
    Ok(Json(response))
}

/// POST /api/v1/perplexity
///
/// Forwards a query to the LLM and returns the raw completion.
pub async fn perplexity_proxy(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PerplexityProxyRequest>,
) -> Result<Json<Value>, AppError> {
    let (query, data_type) = match (payload.query.as_deref(), payload.data_type.as_deref()) {
        (Some(q), Some(d)) if !q.trim().is_empty() && !d.trim().is_empty() => (q, d),
        _ => {
            return Err(AppError::BadRequest(
                "Query and dataType are required".to_string(),
            ))
        }
    };

    tracing::info!("[PERPLEXITY] Fetching {} data", data_type);
    let response = state.perplexity.chat(query).await?;
    tracing::info!("[PERPLEXITY] Successfully received {} data", data_type);

    Ok(Json(json!({
        "dataType": data_type,
        "response": response
    })))
}

/// POST /api/v1/enrichment/company-when-joined
///
/// Company metrics around the time the candidate joined.
pub async fn company_when_joined(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CompanyWhenJoinedRequest>,
) -> Result<Json<Enriched<CompanyMetrics>>, AppError> {
    if payload.company_name.trim().is_empty() {
        return Err(AppError::BadRequest("companyName is required".to_string()));
    }
    Ok(Json(state.enrichment.company_when_joined(&payload).await))
}

/// GET /api/v1/enrichment/company-today?company=
pub async fn company_today(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompanyQuery>,
) -> Result<Json<Enriched<CompanyMetrics>>, AppError> {
    let company = required_company(&params)?;
    Ok(Json(state.enrichment.company_today(company).await))
}

/// GET /api/v1/enrichment/investors?company=
pub async fn notable_investors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompanyQuery>,
) -> Result<Json<Enriched<Vec<InvestorRound>>>, AppError> {
    let company = required_company(&params)?;
    Ok(Json(state.enrichment.notable_investors(company).await))
}

/// GET /api/v1/enrichment/leadership?company=
pub async fn senior_leadership(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompanyQuery>,
) -> Result<Json<Enriched<Vec<LeadershipProfile>>>, AppError> {
    let company = required_company(&params)?;
    Ok(Json(state.enrichment.senior_leadership(company).await))
}

/// POST /api/v1/enrichment/candidate
///
/// All four enrichment lookups for one candidate. Lookups that fell back to
/// placeholder data are listed under `failed`.
pub async fn enrich_candidate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CandidateEnrichmentRequest>,
) -> Result<Json<CandidateEnrichment>, AppError> {
    if payload.current_company.trim().is_empty() {
        return Err(AppError::BadRequest(
            "currentCompany is required".to_string(),
        ));
    }
    Ok(Json(state.enrichment.enrich_candidate(&payload).await))
}

/// POST /api/v1/extract
///
/// Runs the LLM JSON extractor on arbitrary text.
pub async fn extract_json(Json(payload): Json<ExtractRequest>) -> Result<Json<Extraction>, AppError> {
    let extraction = llm_json::extract(&payload.text)?;
    Ok(Json(extraction))
}

/// POST /api/v1/analytics/funnel
pub async fn funnel(Json(payload): Json<FunnelRequest>) -> Json<FunnelReport> {
    tracing::debug!("Computing funnel for {} records", payload.records.len());
    Json(analytics::compute_funnel(&payload.records))
}

fn required_company(params: &CompanyQuery) -> Result<&str, AppError> {
    params
        .company
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("company query parameter is required".to_string()))
}
