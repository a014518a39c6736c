use crate::errors::AppError;
use crate::models::EmploymentStatus;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;

/// Client for the Mixrank people-data API.
///
/// Every endpoint lives under `{base_url}/v2/json/{api_key}/`, so the key is
/// part of the path and must never reach the logs.
#[derive(Clone)]
pub struct MixrankClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MixrankClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Mixrank client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, AppError> {
        let raw = format!("{}/v2/json/{}/{}", self.base_url, self.api_key, path);
        Url::parse_with_params(&raw, params)
            .map_err(|e| AppError::ExternalApiError(format!("Failed to build Mixrank URL: {}", e)))
    }

    /// Loggable form of an endpoint, with the key replaced.
    fn redacted(&self, path: &str) -> String {
        format!("{}/v2/json/[REDACTED]/{}", self.base_url, path)
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
        step: &str,
    ) -> Result<Value, AppError> {
        let url = self.endpoint(path, params)?;
        tracing::debug!("Mixrank request: {}", self.redacted(path));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Mixrank request failed: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Mixrank returned {} while {}: {}", status, step, error_text);
            return Err(AppError::upstream(
                status,
                format!("Error {}: {}", step, status.as_u16()),
                error_text,
            ));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!(
                "Failed to parse Mixrank response: {}",
                e.without_url()
            ))
        })
    }

    /// Company features (current, past and all-time employees) matching a name.
    pub async fn segment_features(&self, company_name: &str) -> Result<Value, AppError> {
        tracing::info!("Fetching Mixrank segment features for company: {}", company_name);
        self.get_json(
            "segment-features/persons",
            &[("type", "company"), ("search", company_name)],
            "fetching feature IDs",
        )
        .await
    }

    /// ID of the feature whose `mod` equals the employment status.
    ///
    /// `NotFound` when the company has no such feature.
    pub async fn feature_id(
        &self,
        company_name: &str,
        status: EmploymentStatus,
    ) -> Result<String, AppError> {
        let features = self.segment_features(company_name).await?;
        select_feature(&features, status).ok_or_else(|| {
            AppError::NotFound(format!(
                "No {} employees feature found for this company",
                status
            ))
        })
    }

    /// Person IDs in a feature's segment, at most `limit`.
    pub async fn segment_preview(
        &self,
        feature_id: &str,
        limit: u32,
    ) -> Result<Vec<String>, AppError> {
        tracing::info!(
            "Fetching up to {} person IDs for feature {}",
            limit,
            feature_id
        );
        let limit = limit.to_string();
        let data = self
            .get_json(
                "person/segment-preview",
                &[("query", feature_id), ("limit", limit.as_str())],
                "fetching person IDs",
            )
            .await?;
        Ok(person_ids(&data))
    }

    /// Full profile of one person.
    pub async fn person(&self, person_id: &str) -> Result<Value, AppError> {
        tracing::debug!("Fetching Mixrank profile {}", person_id);
        self.get_json(&format!("person/{}", person_id), &[], "fetching profile")
            .await
    }

    /// Profiles matching a social URL; the vendor answers `{results: [...]}`.
    pub async fn match_person(&self, linkedin_url: &str) -> Result<Value, AppError> {
        tracing::info!("Matching Mixrank profile by LinkedIn URL: {}", linkedin_url);
        self.get_json("person/match", &[("social_url", linkedin_url)], "fetching data")
            .await
    }
}

/// Picks the feature whose `mod` equals the employment status.
pub fn select_feature(features: &Value, status: EmploymentStatus) -> Option<String> {
    features
        .get("results")?
        .as_array()?
        .iter()
        .find(|feature| feature.get("mod").and_then(Value::as_str) == Some(status.as_str()))
        .and_then(|feature| feature.get("id"))
        .and_then(id_string)
}

/// `results` of a segment preview as string IDs; numeric IDs are accepted.
pub fn person_ids(preview: &Value) -> Vec<String> {
    preview
        .get("results")
        .and_then(Value::as_array)
        .map(|results| results.iter().filter_map(id_string).collect())
        .unwrap_or_default()
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl std::fmt::Debug for MixrankClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixrankClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
