//! Company enrichment backed by the LLM.
//!
//! Each lookup follows the same flow:
//! 1. In-process cache, then the `company_data_cache` table
//! 2. LLM query and best-effort JSON extraction
//! 3. Field-by-field normalization into the typed shape
//! 4. Store in both caches (never for placeholder extractions)
//!
//! Any failure along the way yields a typed fallback tagged
//! [`DataOrigin::Fallback`] instead of an error.
use crate::db_storage::CompanyDataCache;
use crate::llm_json::{self, Confidence};
use crate::models::{
    CacheKey, CandidateEnrichment, CandidateEnrichmentRequest, CompanyDataType, CompanyMetrics,
    CompanyWhenJoinedRequest, DataOrigin, Enriched, InvestorRound, LeadershipProfile,
};
use crate::perplexity_client::{self, PerplexityClient};
use moka::future::Cache;
use serde::Serialize;
use serde_json::{Map, Value};

/// Most funding rounds kept per company.
pub const MAX_INVESTOR_ROUNDS: usize = 3;
/// Most leaders kept per company.
pub const MAX_LEADERS: usize = 4;

#[derive(Clone)]
pub struct EnrichmentService {
    llm: PerplexityClient,
    store: Option<CompanyDataCache>,
    memory: Cache<String, Value>,
}

impl EnrichmentService {
    /// `store` is optional so the service can run without Postgres; the
    /// in-process cache still applies.
    pub fn new(
        llm: PerplexityClient,
        store: Option<CompanyDataCache>,
        memory: Cache<String, Value>,
    ) -> Self {
        Self { llm, store, memory }
    }

    /// Company metrics at the time a candidate joined.
    ///
    /// Only cached when the candidate ID is known, scoped by ID and role.
    pub async fn company_when_joined(
        &self,
        request: &CompanyWhenJoinedRequest,
    ) -> Enriched<CompanyMetrics> {
        let key = request
            .candidate_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| {
                CacheKey::for_candidate(
                    &request.company_name,
                    CompanyDataType::CompanyWhenJoined,
                    Some(id),
                    Some(request.current_role.as_str()),
                )
            });
        let query = perplexity_client::company_when_joined_query(
            &request.company_name,
            &request.candidate_name,
            &request.current_role,
            request.linkedin_url.as_deref(),
        );

        self.lookup(key, &query, normalize_metrics, CompanyMetrics::unknown)
            .await
    }

    pub async fn company_today(&self, company_name: &str) -> Enriched<CompanyMetrics> {
        let key = CacheKey::company(company_name, CompanyDataType::CompanyToday);
        let query = perplexity_client::company_today_query(company_name);
        self.lookup(Some(key), &query, normalize_metrics, CompanyMetrics::unknown)
            .await
    }

    pub async fn notable_investors(&self, company_name: &str) -> Enriched<Vec<InvestorRound>> {
        let key = CacheKey::company(company_name, CompanyDataType::NotableInvestors);
        let query = perplexity_client::notable_investors_query(company_name);
        self.lookup(Some(key), &query, normalize_investors, investors_fallback)
            .await
    }

    pub async fn senior_leadership(&self, company_name: &str) -> Enriched<Vec<LeadershipProfile>> {
        let key = CacheKey::company(company_name, CompanyDataType::SeniorLeadership);
        let query = perplexity_client::senior_leadership_query(company_name);
        self.lookup(Some(key), &query, normalize_leadership, leadership_fallback)
            .await
    }

    /// Runs all four lookups for one candidate, one after the other.
    pub async fn enrich_candidate(&self, request: &CandidateEnrichmentRequest) -> CandidateEnrichment {
        tracing::info!(
            "Enriching candidate {} at {}",
            request.name,
            request.current_company
        );

        let when_joined = CompanyWhenJoinedRequest {
            company_name: request.current_company.clone(),
            candidate_name: request.name.clone(),
            current_role: request.current_role.clone(),
            linkedin_url: request.linkedin_url.clone(),
            candidate_id: request.id.clone(),
        };

        let company_when_joined = self.company_when_joined(&when_joined).await;
        let company_today = self.company_today(&request.current_company).await;
        let notable_investors = self.notable_investors(&request.current_company).await;
        let senior_leadership = self.senior_leadership(&request.current_company).await;

        let failed = [
            (CompanyDataType::CompanyWhenJoined, company_when_joined.origin),
            (CompanyDataType::CompanyToday, company_today.origin),
            (CompanyDataType::NotableInvestors, notable_investors.origin),
            (CompanyDataType::SeniorLeadership, senior_leadership.origin),
        ]
        .into_iter()
        .filter(|(_, origin)| *origin == DataOrigin::Fallback)
        .map(|(data_type, _)| data_type)
        .collect::<Vec<_>>();

        if !failed.is_empty() {
            tracing::warn!("Enrichment fell back for {:?}", failed);
        }

        CandidateEnrichment {
            company_when_joined,
            company_today,
            notable_investors,
            senior_leadership,
            failed,
        }
    }

    async fn lookup<T: Serialize>(
        &self,
        key: Option<CacheKey>,
        query: &str,
        normalize: fn(&Value) -> Option<T>,
        fallback: fn() -> T,
    ) -> Enriched<T> {
        if let Some(key) = &key {
            if let Some(data) = self.cached(key).await.as_ref().and_then(normalize) {
                tracing::info!("Using cached {} for {}", key.data_type, key.company_name);
                return Enriched {
                    data,
                    origin: DataOrigin::Cache,
                };
            }
        }

        let data = match self.fetch_live(query, normalize).await {
            Some(data) => data,
            None => {
                return Enriched {
                    data: fallback(),
                    origin: DataOrigin::Fallback,
                }
            }
        };

        if let Some(key) = &key {
            self.remember(key, &data).await;
        }

        Enriched {
            data,
            origin: DataOrigin::Live,
        }
    }

    async fn cached(&self, key: &CacheKey) -> Option<Value> {
        let memory_key = key.cache_string();
        if let Some(value) = self.memory.get(&memory_key).await {
            return Some(value);
        }

        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(Some(row)) => {
                self.memory.insert(memory_key, row.data.clone()).await;
                Some(row.data)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Cache lookup failed, querying LLM instead: {}", e);
                None
            }
        }
    }

    async fn fetch_live<T>(&self, query: &str, normalize: fn(&Value) -> Option<T>) -> Option<T> {
        let content = match self.llm.ask(query).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("LLM lookup failed: {}", e);
                return None;
            }
        };
        tracing::debug!("LLM raw response: {}", content);

        let extraction = match llm_json::extract(&content) {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::error!("{}", e);
                return None;
            }
        };

        if extraction.confidence == Confidence::Placeholder {
            tracing::warn!("LLM response held no usable data");
            return None;
        }
        if extraction.confidence == Confidence::Heuristic {
            tracing::warn!(
                strategy = extraction.strategy,
                "LLM response was scraped from prose"
            );
        }

        let data = normalize(&extraction.value);
        if data.is_none() {
            tracing::error!("LLM response has an unexpected shape: {}", extraction.value);
        }
        data
    }

    async fn remember<T: Serialize>(&self, key: &CacheKey, data: &T) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize {} for cache: {}", key.data_type, e);
                return;
            }
        };

        self.memory.insert(key.cache_string(), value.clone()).await;

        if let Some(store) = &self.store {
            if let Err(e) = store.store(key, &value).await {
                tracing::error!("Error storing company data in cache: {}", e);
            }
        }
    }
}

// ============ Normalization ============

/// Coerces any JSON value into metrics; never fails.
///
/// Numbers may arrive as strings with thousands separators. Negative values
/// are clamped to zero.
pub fn normalize_metrics(value: &Value) -> Option<CompanyMetrics> {
    let size = value.get("size").and_then(number).unwrap_or(0.0);
    let funding = value.get("funding").and_then(number).unwrap_or(0.0);

    Some(CompanyMetrics {
        size: size.max(0.0).floor() as i64,
        stage: text(value.get("stage"))
            .unwrap_or("Unknown")
            .to_string(),
        funding: funding.max(0.0),
    })
}

/// Accepts an array of rounds, an object with numeric keys, or one round.
pub fn normalize_investors(value: &Value) -> Option<Vec<InvestorRound>> {
    let rounds = records(value, "round")?
        .into_iter()
        .take(MAX_INVESTOR_ROUNDS)
        .map(|round| InvestorRound {
            round: text(round.get("round"))
                .unwrap_or("Unknown Round")
                .to_string(),
            investors: match round.get("investors") {
                Some(Value::Array(investors)) => investors.iter().map(display).collect(),
                other => vec![text(other).unwrap_or("Unknown").to_string()],
            },
        })
        .collect();
    Some(rounds)
}

/// Accepts an array of leaders, an object with numeric keys, or one leader.
pub fn normalize_leadership(value: &Value) -> Option<Vec<LeadershipProfile>> {
    let leaders = records(value, "name")?
        .into_iter()
        .take(MAX_LEADERS)
        .map(|leader| LeadershipProfile {
            name: text(leader.get("name")).unwrap_or("Unknown").to_string(),
            role: text(leader.get("role"))
                .unwrap_or("Unknown position")
                .to_string(),
            background: text(leader.get("background"))
                .unwrap_or("Information unavailable")
                .to_string(),
        })
        .collect();
    Some(leaders)
}

pub fn investors_fallback() -> Vec<InvestorRound> {
    vec![InvestorRound {
        round: "Unknown".to_string(),
        investors: vec!["Information unavailable".to_string()],
    }]
}

pub fn leadership_fallback() -> Vec<LeadershipProfile> {
    vec![LeadershipProfile {
        name: "Information unavailable".to_string(),
        role: "Unknown position".to_string(),
        background: "Could not retrieve leadership data".to_string(),
    }]
}

/// List-shaped LLM output as a list of records.
///
/// `{ "0": {...}, "1": {...} }` is read in key order; a single object counts
/// as a one-element list when it has `identifying_field`.
fn records<'a>(value: &'a Value, identifying_field: &str) -> Option<Vec<&'a Value>> {
    match value {
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(map) => {
            let numbered = numbered_entries(map);
            if !numbered.is_empty() {
                Some(numbered)
            } else if text(map.get(identifying_field)).is_some() {
                Some(vec![value])
            } else {
                None
            }
        }
        _ => None,
    }
}

fn numbered_entries(map: &Map<String, Value>) -> Vec<&Value> {
    let mut entries: Vec<(u64, &Value)> = map
        .iter()
        .filter_map(|(key, value)| key.trim().parse::<u64>().ok().map(|n| (n, value)))
        .collect();
    entries.sort_by_key(|(n, _)| *n);
    entries.into_iter().map(|(_, value)| value).collect()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Non-empty string field.
fn text(value: Option<&Value>) -> Option<&str> {
    value?.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
