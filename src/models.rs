use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::fmt;

// ============ Candidate Models ============

/// Company size, funding stage and total funding (millions USD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetrics {
    /// Approximate employee count.
    pub size: i64,
    /// Funding stage, e.g. "Seed", "Series B", "Public".
    pub stage: String,
    /// Funding raised to date, in millions of USD.
    pub funding: f64,
}

impl CompanyMetrics {
    /// Value used when no metrics could be obtained.
    pub fn unknown() -> Self {
        Self {
            size: 0,
            stage: "Unknown".to_string(),
            funding: 0.0,
        }
    }
}

/// A funding round and the investors that took part in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorRound {
    pub round: String,
    pub investors: Vec<String>,
}

/// A member of a company's senior leadership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadershipProfile {
    pub name: String,
    pub role: String,
    pub background: String,
}

/// Which employees of a company a search targets.
///
/// Matches the `mod` field of the vendor's segment features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentStatus {
    #[default]
    Present,
    Past,
    Ever,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Present => "present",
            EmploymentStatus::Past => "past",
            EmploymentStatus::Ever => "ever",
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate profile as rendered by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateData {
    /// Vendor person ID.
    pub id: String,
    pub name: String,
    pub current_company: String,
    pub linkedin_url: String,
    pub current_role: String,
    pub location: String,
    pub years_experience: u32,
    pub school: String,
    pub prior_experience: String,
    pub company_when_joined: CompanyMetrics,
    pub company_today: CompanyMetrics,
    pub notable_investors: Vec<InvestorRound>,
    pub senior_leadership: Vec<LeadershipProfile>,
    pub email: Option<String>,
    #[serde(default)]
    pub employment_status: EmploymentStatus,
}

/// Row of the `candidates` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CandidateRow {
    pub id: String,
    pub name: String,
    pub company: String,
    pub role: String,
    pub location: String,
    pub linkedin_url: String,
    pub years_experience: i32,
    pub school: String,
    pub prior_experience: String,
    pub email: Option<String>,
    pub employment_status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&CandidateData> for CandidateRow {
    fn from(candidate: &CandidateData) -> Self {
        Self {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            company: candidate.current_company.clone(),
            role: candidate.current_role.clone(),
            location: candidate.location.clone(),
            linkedin_url: candidate.linkedin_url.clone(),
            years_experience: i32::try_from(candidate.years_experience).unwrap_or(i32::MAX),
            school: candidate.school.clone(),
            prior_experience: candidate.prior_experience.clone(),
            email: candidate.email.clone(),
            employment_status: candidate.employment_status.to_string(),
            created_at: Utc::now(),
        }
    }
}

// ============ Enrichment Cache Models ============

/// Kind of enrichment stored in the company data cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompanyDataType {
    CompanyWhenJoined,
    CompanyToday,
    NotableInvestors,
    SeniorLeadership,
}

impl CompanyDataType {
    /// Name stored in the `data_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyDataType::CompanyWhenJoined => "companyWhenJoined",
            CompanyDataType::CompanyToday => "companyToday",
            CompanyDataType::NotableInvestors => "notableInvestors",
            CompanyDataType::SeniorLeadership => "seniorLeadership",
        }
    }
}

impl fmt::Display for CompanyDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of the `company_data_cache` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CachedCompanyData {
    pub id: i64,
    pub company_name: String,
    pub data_type: String,
    pub data: Value,
    /// Empty unless the row is specific to one candidate.
    pub candidate_id: String,
    pub candidate_role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cache identity of an enrichment lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub company_name: String,
    pub data_type: CompanyDataType,
    pub candidate_id: Option<String>,
    pub candidate_role: Option<String>,
}

impl CacheKey {
    pub fn company(company_name: &str, data_type: CompanyDataType) -> Self {
        Self {
            company_name: company_name.to_string(),
            data_type,
            candidate_id: None,
            candidate_role: None,
        }
    }

    /// Key for a lookup scoped to one candidate.
    ///
    /// Candidate scoping only applies to `companyWhenJoined` and only when both
    /// the candidate ID and role are known.
    pub fn for_candidate(
        company_name: &str,
        data_type: CompanyDataType,
        candidate_id: Option<&str>,
        candidate_role: Option<&str>,
    ) -> Self {
        match (data_type, candidate_id, candidate_role) {
            (CompanyDataType::CompanyWhenJoined, Some(id), Some(role))
                if !id.is_empty() && !role.is_empty() =>
            {
                Self {
                    company_name: company_name.to_string(),
                    data_type,
                    candidate_id: Some(id.to_string()),
                    candidate_role: Some(role.to_string()),
                }
            }
            _ => Self::company(company_name, data_type),
        }
    }

    /// String form used by the in-process cache.
    pub fn cache_string(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.data_type,
            self.company_name.to_lowercase(),
            self.candidate_id.as_deref().unwrap_or(""),
            self.candidate_role.as_deref().unwrap_or("")
        )
    }
}

/// Where an enrichment value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    /// Served from the in-process or Postgres cache.
    Cache,
    /// Freshly obtained from the LLM.
    Live,
    /// Synthetic placeholder; the lookup failed.
    Fallback,
}

/// Enrichment value tagged with its origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enriched<T> {
    pub data: T,
    pub origin: DataOrigin,
}

// ============ Request / Response Models ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidateRequest {
    #[serde(alias = "linkedInUrl")]
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCandidatesRequest {
    pub company_name: Option<String>,
    #[serde(default)]
    pub employment_status: EmploymentStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCandidatesResponse {
    pub candidates: Vec<CandidateData>,
    pub company: String,
    pub employment_status: EmploymentStatus,
}

/// Filters of the multi-company search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSearchRequest {
    #[serde(default)]
    pub company_names: Vec<String>,
    pub years_experience: Option<u32>,
    pub max_years_experience: Option<u32>,
    pub location: Option<String>,
    pub school: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub employment_status: EmploymentStatus,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDebug {
    pub total_profiles_processed: usize,
    pub matching_candidates: usize,
    pub filters_summary: AdvancedSearchRequest,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSearchResponse {
    pub candidates: Vec<CandidateData>,
    pub count: usize,
    pub company: String,
    pub employment_status: EmploymentStatus,
    pub debug: SearchDebug,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerplexityProxyRequest {
    pub query: Option<String>,
    pub data_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompanyQuery {
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyWhenJoinedRequest {
    pub company_name: String,
    pub candidate_name: String,
    pub current_role: String,
    pub linkedin_url: Option<String>,
    pub candidate_id: Option<String>,
}

/// Candidate fields needed to run every enrichment lookup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEnrichmentRequest {
    pub id: Option<String>,
    pub name: String,
    pub current_company: String,
    pub current_role: String,
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEnrichment {
    pub company_when_joined: Enriched<CompanyMetrics>,
    pub company_today: Enriched<CompanyMetrics>,
    pub notable_investors: Enriched<Vec<InvestorRound>>,
    pub senior_leadership: Enriched<Vec<LeadershipProfile>>,
    /// Lookups that fell back to placeholder data.
    pub failed: Vec<CompanyDataType>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CompanySearchQuery {
    pub search: Option<String>,
}
