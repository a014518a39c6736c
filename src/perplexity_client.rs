use crate::errors::AppError;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Instructs the model to answer with bare JSON.
pub const SYSTEM_PROMPT: &str = "You are a research assistant specialized in providing accurate company information. CRITICAL INSTRUCTION: Your response MUST be PURE, VALID JSON ONLY with no explanations or comments before or after. Your entire response should be valid when passed directly to JSON.parse() without any processing. DO NOT include phrases like 'Based on' or 'Here is'. DO NOT use markdown formatting. DO NOT wrap JSON in code blocks. JSON ONLY. If you're providing an array of objects, make sure it's a proper array structure with square brackets. If you're providing a single object, make sure it has proper curly braces and quotes. Every field must use double quotes. Be as accurate as possible with the company information while strictly conforming to valid JSON syntax.";

/// Client for the Perplexity chat-completions API.
#[derive(Clone)]
pub struct PerplexityClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl PerplexityClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Perplexity client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    /// Sends one user query and returns the raw completion body.
    pub async fn chat(&self, query: &str) -> Result<Value, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": query }
            ]
        });

        tracing::debug!("Querying Perplexity ({} chars, model {})", query.len(), self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Perplexity request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Perplexity API error ({}): {}", status, error_text);
            return Err(AppError::upstream(
                status,
                format!("Error querying Perplexity: {}", status.as_u16()),
                error_text,
            ));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Perplexity response: {}", e))
        })
    }

    /// Sends one user query and returns the assistant's text.
    pub async fn ask(&self, query: &str) -> Result<String, AppError> {
        let completion = self.chat(query).await?;
        content(&completion)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::ExternalApiError(
                    "Perplexity response has no choices[0].message.content".to_string(),
                )
            })
    }
}

impl std::fmt::Debug for PerplexityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// `choices[0].message.content` of a completion.
pub fn content(completion: &Value) -> Option<&str> {
    completion
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

// ============ Query Templates ============

pub fn company_when_joined_query(
    company_name: &str,
    candidate_name: &str,
    current_role: &str,
    linkedin_url: Option<&str>,
) -> String {
    let profile = linkedin_url
        .filter(|url| !url.trim().is_empty())
        .map(|url| format!("The candidate's LinkedIn profile is {}.", url))
        .unwrap_or_default();

    format!(
        r#"Find information about the company {company_name} from when {candidate_name} likely joined as {current_role}.
{profile}
I need to know:
1. The approximate number of employees at that time
2. The funding stage the company was in (Seed, Series A, B, C, etc.)
3. The total funding amount in millions USD the company had raised up to that point

Return only a JSON object with these fields:
{{
  "size": [employee count as a number],
  "stage": [funding stage as a string],
  "funding": [funding amount in millions as a number]
}}"#
    )
}

pub fn company_today_query(company_name: &str) -> String {
    format!(
        r#"Find the most recent information about {company_name}.
I need to know:
1. The current approximate number of employees
2. The current funding stage (Seed, Series A, B, C, Public, etc.)
3. The total funding amount in millions USD raised to date

Return only a JSON object with these fields:
{{
  "size": [current employee count as a number],
  "stage": [current funding stage as a string],
  "funding": [total funding amount in millions as a number]
}}"#
    )
}

pub fn notable_investors_query(company_name: &str) -> String {
    format!(
        r#"Find information about the notable investors and funding rounds for {company_name}.
I need to know:
1. The funding rounds (Seed, Series A, B, C, etc.)
2. The investors who participated in each round

Return only a JSON array with up to 3 of the most significant funding rounds:
[
  {{
    "round": [name of funding round],
    "investors": [array of investor names who participated]
  }},
  ...
]"#
    )
}

pub fn senior_leadership_query(company_name: &str) -> String {
    format!(
        r#"Find information about the current senior leadership team at {company_name}.

Return ONLY a JSON array with the following format for up to 4 key leaders (CEO, CTO, etc.):
[
  {{
    "name": "John Doe",
    "role": "CEO & Co-founder",
    "background": "Previously VP at Google"
  }},
  {{
    "name": "Jane Smith",
    "role": "CTO",
    "background": "Previously Engineering Director at Meta"
  }}
]

IMPORTANT: Your entire response must be ONLY the JSON array and nothing else. No explanations, no markdown, just pure, valid JSON that can be parsed with JSON.parse()."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_reads_first_choice() {
        let completion = json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"size\": 3}" } }]
        });
        assert_eq!(content(&completion), Some("{\"size\": 3}"));
        assert_eq!(content(&json!({ "choices": [] })), None);
    }

    #[test]
    fn when_joined_query_mentions_profile_only_when_given() {
        let with = company_when_joined_query("Acme", "Ana", "CTO", Some("https://linkedin.com/in/ana"));
        assert!(with.contains("The candidate's LinkedIn profile is https://linkedin.com/in/ana."));
        assert!(with.contains("from when Ana likely joined as CTO"));

        let without = company_when_joined_query("Acme", "Ana", "CTO", None);
        assert!(!without.contains("LinkedIn"));
    }

    #[test]
    fn list_queries_carry_their_limits() {
        assert!(notable_investors_query("Acme").contains("up to 3"));
        assert!(senior_leadership_query("Acme").contains("up to 4 key leaders"));
        assert!(company_today_query("Acme").starts_with("Find the most recent information about Acme."));
    }
}
