//! Vendor profile JSON to [`CandidateData`].
//!
//! Profiles are read field by field with explicit fallbacks; nothing in them
//! is trusted to be present or well typed.

use crate::errors::AppError;
use crate::mock_data::{self, Entropy};
use crate::models::{AdvancedSearchRequest, CandidateData, EmploymentStatus};
use chrono::Datelike;
use serde_json::Value;

/// Cap on computed years of experience.
const MAX_YEARS_EXPERIENCE: u32 = 50;

pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Maps a full profile fetched by person ID.
///
/// `company_name` is the company the search ran for, not the profile's own.
pub fn map_profile(
    profile: &Value,
    person_id: &str,
    company_name: &str,
    employment_status: EmploymentStatus,
    current_year: i32,
    entropy: &mut impl Entropy,
) -> CandidateData {
    let positions = positions(profile);

    let name = text_at(profile, "/name")
        .or_else(|| text_at(profile, "/name/full"))
        .or_else(|| text_at(profile, "/linkedin/name/full"))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown Person ({})", person_id));

    let current_role = text_at(profile, "/linkedin/positions/0/title")
        .or_else(|| text_at(profile, "/title"))
        .unwrap_or("Unknown Role")
        .to_string();

    CandidateData {
        id: person_id.to_string(),
        name,
        current_company: company_name.to_string(),
        linkedin_url: non_empty_at(profile, "/linkedin/url")
            .unwrap_or_default()
            .to_string(),
        current_role,
        location: location(profile),
        years_experience: years_experience(positions, current_year),
        school: school(profile),
        prior_experience: prior_experience(positions),
        company_when_joined: mock_data::company_metrics_when_joined(entropy),
        company_today: mock_data::company_metrics_today(entropy),
        notable_investors: mock_data::notable_investors(entropy),
        senior_leadership: mock_data::senior_leadership(entropy),
        email: non_empty_at(profile, "/emails/0/email").map(str::to_string),
        employment_status,
    }
}

/// Maps the first result of a match-by-URL response.
///
/// `NotFound` when there are no results; an error when the result carries no
/// LinkedIn positions.
pub fn map_match(
    response: &Value,
    employment_status: EmploymentStatus,
    current_year: i32,
    entropy: &mut impl Entropy,
) -> Result<CandidateData, AppError> {
    let result = response
        .get("results")
        .and_then(|results| results.get(0))
        .ok_or_else(|| {
            AppError::NotFound("No profile data found for this LinkedIn URL".to_string())
        })?;

    let positions = result
        .pointer("/linkedin/positions")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AppError::InternalError(
                "Profile data is incomplete or in an unexpected format".to_string(),
            )
        })?;

    let current = positions
        .iter()
        .find(|position| is_current(position))
        .or_else(|| positions.first());

    let id = result
        .get("id")
        .and_then(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(mock_data::random_id);

    let current_company = current
        .and_then(|p| non_empty_at(p, "/company_name"))
        .unwrap_or("Unknown Company")
        .to_string();
    let current_role = current
        .and_then(|p| non_empty_at(p, "/title"))
        .unwrap_or("Unknown Role")
        .to_string();

    Ok(CandidateData {
        name: non_empty_at(result, "/linkedin/name/full")
            .unwrap_or("Unknown Name")
            .to_string(),
        current_company,
        linkedin_url: non_empty_at(result, "/linkedin/url")
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://linkedin.com/in/unknown-{}", id)),
        current_role,
        location: location(result),
        years_experience: years_experience(positions, current_year),
        school: school(result),
        prior_experience: prior_experience(positions),
        company_when_joined: mock_data::company_metrics_when_joined(entropy),
        company_today: mock_data::company_metrics_today(entropy),
        notable_investors: mock_data::notable_investors(entropy),
        senior_leadership: mock_data::senior_leadership(entropy),
        email: non_empty_at(result, "/emails/0/email").map(str::to_string),
        employment_status,
        id,
    })
}

/// Maps one line of a flat profile export (`experience`, `locality`,
/// `person_emails`), as read by the `search_profiles` tool.
pub fn map_export_profile(
    profile: &Value,
    current_year: i32,
    entropy: &mut impl Entropy,
) -> CandidateData {
    let positions = profile
        .get("experience")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let current = positions
        .iter()
        .find(|position| is_current(position))
        .or_else(|| positions.first());

    let id = id_at(profile, "person_id")
        .or_else(|| id_at(profile, "profile_id"))
        .unwrap_or_else(mock_data::random_id);

    CandidateData {
        id,
        name: non_empty_at(profile, "/name")
            .unwrap_or("Unknown Name")
            .to_string(),
        current_company: current
            .and_then(|position| non_empty_at(position, "/company_name"))
            .unwrap_or("Unknown Company")
            .to_string(),
        linkedin_url: non_empty_at(profile, "/url").unwrap_or_default().to_string(),
        current_role: current
            .and_then(|position| non_empty_at(position, "/title"))
            .unwrap_or("Unknown Role")
            .to_string(),
        location: non_empty_at(profile, "/locality")
            .unwrap_or("Unknown Location")
            .to_string(),
        years_experience: years_experience(positions, current_year),
        school: non_empty_at(profile, "/education/0/school/name")
            .unwrap_or("Unknown")
            .to_string(),
        prior_experience: prior_experience(positions),
        company_when_joined: mock_data::company_metrics_when_joined(entropy),
        company_today: mock_data::company_metrics_today(entropy),
        notable_investors: mock_data::notable_investors(entropy),
        senior_leadership: mock_data::senior_leadership(entropy),
        email: non_empty_at(profile, "/person_emails/0").map(str::to_string),
        employment_status: EmploymentStatus::Present,
    }
}

fn id_at(profile: &Value, key: &str) -> Option<String> {
    match profile.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Years since the earliest position start before `current_year`, capped at 50.
///
/// Zero when no position has a usable numeric `start_date_year`.
pub fn years_experience(positions: &[Value], current_year: i32) -> u32 {
    let current = f64::from(current_year);
    positions
        .iter()
        .filter_map(|position| position.get("start_date_year")?.as_f64())
        .filter(|year| *year != 0.0 && *year < current)
        .min_by(|a, b| a.total_cmp(b))
        .map(|earliest| ((current - earliest).floor() as u32).min(MAX_YEARS_EXPERIENCE))
        .unwrap_or(0)
}

/// Up to two non-current positions as `"{title} at {company}"`, comma-joined.
pub fn prior_experience(positions: &[Value]) -> String {
    const NONE: &str = "No prior experience";
    if positions.len() <= 1 {
        return NONE.to_string();
    }

    let prior: Vec<String> = positions
        .iter()
        .filter(|position| position.is_object() && !is_current(position))
        .take(2)
        .map(|position| {
            format!(
                "{} at {}",
                non_empty_at(position, "/title").unwrap_or("Unknown role"),
                non_empty_at(position, "/company_name").unwrap_or("Unknown company")
            )
        })
        .collect();

    if prior.is_empty() {
        NONE.to_string()
    } else {
        prior.join(", ")
    }
}

/// Post-fetch filters of the advanced search.
///
/// Year bounds are loosened by one on each side; text filters are
/// case-insensitive substring matches and blank ones are ignored.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub company: Option<String>,
    pub min_years: Option<u32>,
    pub max_years: Option<u32>,
    pub location: Option<String>,
    pub school: Option<String>,
    pub role: Option<String>,
}

impl SearchFilters {
    pub fn matches(&self, candidate: &CandidateData) -> bool {
        let years = candidate.years_experience;
        self.min_years.map_or(true, |min| years >= min.saturating_sub(1))
            && self.max_years.map_or(true, |max| years <= max.saturating_add(1))
            && contains_filter(&candidate.current_company, self.company.as_deref())
            && contains_filter(&candidate.location, self.location.as_deref())
            && contains_filter(&candidate.school, self.school.as_deref())
            && contains_filter(&candidate.current_role, self.role.as_deref())
    }
}

impl From<&AdvancedSearchRequest> for SearchFilters {
    fn from(request: &AdvancedSearchRequest) -> Self {
        Self {
            company: None,
            min_years: request.years_experience,
            max_years: request.max_years_experience,
            location: request.location.clone(),
            school: request.school.clone(),
            role: request.role.clone(),
        }
    }
}

fn contains_filter(value: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim) {
        None | Some("") => true,
        Some(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
    }
}

fn positions(profile: &Value) -> &[Value] {
    profile
        .pointer("/linkedin/positions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn is_current(position: &Value) -> bool {
    match position.get("is_current") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

fn location(profile: &Value) -> String {
    text_at(profile, "/linkedin/location/text")
        .unwrap_or("Unknown location")
        .to_string()
}

fn school(profile: &Value) -> String {
    non_empty_at(profile, "/linkedin/education/0/school_name")
        .unwrap_or("Unknown")
        .to_string()
}

/// String at a JSON pointer, empty strings included.
fn text_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer)?.as_str()
}

/// String at a JSON pointer, empty strings treated as missing.
fn non_empty_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    text_at(value, pointer).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_data::SequenceEntropy;
    use serde_json::json;

    fn profile() -> Value {
        json!({
            "name": { "full": "Ana Lima" },
            "emails": [{ "email": "ana@example.com" }],
            "linkedin": {
                "url": "https://linkedin.com/in/ana",
                "location": { "text": "Lisbon, Portugal" },
                "education": [{ "school_name": "University of Porto" }],
                "positions": [
                    { "title": "Staff Engineer", "company_name": "Acme", "is_current": true, "start_date_year": 2021 },
                    { "title": "Senior Engineer", "company_name": "Globex", "start_date_year": 2017 },
                    { "title": "Engineer", "company_name": "Initech", "start_date_year": 2014 },
                    { "company_name": "Hooli", "start_date_year": 2012 }
                ]
            }
        })
    }

    #[test]
    fn maps_full_profile() {
        let mut entropy = SequenceEntropy::new(vec![0.3]);
        let candidate = map_profile(
            &profile(),
            "4242",
            "Acme Corp",
            EmploymentStatus::Past,
            2025,
            &mut entropy,
        );

        assert_eq!(candidate.id, "4242");
        assert_eq!(candidate.name, "Ana Lima");
        assert_eq!(candidate.current_company, "Acme Corp");
        assert_eq!(candidate.current_role, "Staff Engineer");
        assert_eq!(candidate.location, "Lisbon, Portugal");
        assert_eq!(candidate.school, "University of Porto");
        assert_eq!(candidate.years_experience, 13);
        assert_eq!(
            candidate.prior_experience,
            "Senior Engineer at Globex, Engineer at Initech"
        );
        assert_eq!(candidate.email.as_deref(), Some("ana@example.com"));
        assert_eq!(candidate.employment_status, EmploymentStatus::Past);
    }

    #[test]
    fn sparse_profile_falls_back_everywhere() {
        let mut entropy = SequenceEntropy::new(vec![0.5]);
        let candidate = map_profile(
            &json!({ "linkedin": { "url": "" } }),
            "7",
            "Acme",
            EmploymentStatus::Present,
            2025,
            &mut entropy,
        );

        assert_eq!(candidate.name, "Unknown Person (7)");
        assert_eq!(candidate.current_role, "Unknown Role");
        assert_eq!(candidate.location, "Unknown location");
        assert_eq!(candidate.school, "Unknown");
        assert_eq!(candidate.linkedin_url, "");
        assert_eq!(candidate.years_experience, 0);
        assert_eq!(candidate.prior_experience, "No prior experience");
        assert!(candidate.email.is_none());
    }

    #[test]
    fn string_name_and_top_level_title_are_used() {
        let mut entropy = SequenceEntropy::new(vec![0.5]);
        let candidate = map_profile(
            &json!({ "name": "Bo Chen", "title": "Recruiter" }),
            "8",
            "Acme",
            EmploymentStatus::Present,
            2025,
            &mut entropy,
        );
        assert_eq!(candidate.name, "Bo Chen");
        assert_eq!(candidate.current_role, "Recruiter");
    }

    #[test]
    fn years_ignore_current_and_future_starts() {
        let positions = vec![
            json!({ "start_date_year": 2025 }),
            json!({ "start_date_year": 2031 }),
            json!({ "start_date_year": "2001" }),
            json!({ "start_date_year": 0 }),
        ];
        assert_eq!(years_experience(&positions, 2025), 0);

        let positions = vec![json!({ "start_date_year": 1950 })];
        assert_eq!(years_experience(&positions, 2025), 50);
    }

    #[test]
    fn prior_experience_needs_non_current_positions() {
        let positions = vec![
            json!({ "title": "CTO", "is_current": true }),
            json!({ "title": "CEO", "is_current": true }),
        ];
        assert_eq!(prior_experience(&positions), "No prior experience");

        let positions = vec![json!({ "title": "CTO" }), json!("garbage")];
        assert_eq!(prior_experience(&positions), "CTO at Unknown company");
    }

    #[test]
    fn match_uses_current_position() {
        let response = json!({
            "results": [{
                "id": 99,
                "linkedin": {
                    "name": { "full": "Kim Park" },
                    "positions": [
                        { "title": "Advisor", "company_name": "Old Co" },
                        { "title": "VP Sales", "company_name": "New Co", "is_current": true, "start_date_year": 2015 }
                    ]
                }
            }]
        });
        let mut entropy = SequenceEntropy::new(vec![0.1]);
        let candidate =
            map_match(&response, EmploymentStatus::Present, 2025, &mut entropy).unwrap();

        assert_eq!(candidate.id, "99");
        assert_eq!(candidate.name, "Kim Park");
        assert_eq!(candidate.current_company, "New Co");
        assert_eq!(candidate.current_role, "VP Sales");
        assert_eq!(candidate.linkedin_url, "https://linkedin.com/in/unknown-99");
        assert_eq!(candidate.years_experience, 10);
        assert_eq!(candidate.prior_experience, "Advisor at Old Co");
    }

    #[test]
    fn match_rejects_empty_and_incomplete_results() {
        let mut entropy = SequenceEntropy::new(vec![0.1]);
        let err = map_match(&json!({ "results": [] }), EmploymentStatus::Present, 2025, &mut entropy)
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = map_match(
            &json!({ "results": [{ "linkedin": {} }] }),
            EmploymentStatus::Present,
            2025,
            &mut entropy,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[test]
    fn filters_loosen_year_bounds_and_ignore_blanks() {
        let mut entropy = SequenceEntropy::new(vec![0.5]);
        let candidate = map_profile(&profile(), "1", "Acme", EmploymentStatus::Present, 2025, &mut entropy);

        let filters = SearchFilters {
            company: None,
            min_years: Some(14),
            max_years: Some(12),
            location: Some("lisbon".to_string()),
            school: Some("   ".to_string()),
            role: Some("ENGINEER".to_string()),
        };
        assert!(filters.matches(&candidate));

        let filters = SearchFilters {
            min_years: Some(15),
            ..SearchFilters::default()
        };
        assert!(!filters.matches(&candidate));

        let filters = SearchFilters {
            location: Some("Berlin".to_string()),
            ..SearchFilters::default()
        };
        assert!(!filters.matches(&candidate));
    }

    #[test]
    fn export_profile_uses_flat_fields() {
        let line = json!({
            "person_id": 31337,
            "name": "Rui Costa",
            "url": "https://linkedin.com/in/rui",
            "locality": "Porto",
            "person_emails": ["rui@example.com"],
            "education": [{ "school": { "name": "IST" } }],
            "experience": [
                { "title": "Analyst", "company_name": "Bank", "start_date_year": 2016 },
                { "title": "Lead", "company_name": "FinEdge", "is_current": true, "start_date_year": 2020 }
            ]
        });
        let mut entropy = SequenceEntropy::new(vec![0.4]);
        let candidate = map_export_profile(&line, 2025, &mut entropy);

        assert_eq!(candidate.id, "31337");
        assert_eq!(candidate.current_company, "FinEdge");
        assert_eq!(candidate.current_role, "Lead");
        assert_eq!(candidate.location, "Porto");
        assert_eq!(candidate.school, "IST");
        assert_eq!(candidate.years_experience, 9);
        assert_eq!(candidate.prior_experience, "Analyst at Bank");
        assert_eq!(candidate.email.as_deref(), Some("rui@example.com"));

        let filters = SearchFilters {
            company: Some("finedge".to_string()),
            min_years: Some(10),
            ..SearchFilters::default()
        };
        assert!(filters.matches(&candidate));
    }

    #[test]
    fn export_profile_without_ids_gets_random_one() {
        let mut entropy = SequenceEntropy::new(vec![0.4]);
        let candidate = map_export_profile(&json!({}), 2025, &mut entropy);
        assert_eq!(candidate.id.len(), 7);
        assert_eq!(candidate.name, "Unknown Name");
        assert_eq!(candidate.current_company, "Unknown Company");
        assert_eq!(candidate.location, "Unknown Location");
    }
}
