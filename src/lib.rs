//! Gauge recruiting API library
//!
//! Backend of a recruiting dashboard: searches candidates through the Mixrank
//! people-data API, enriches their companies through the Perplexity LLM API,
//! caches enrichment in Postgres and computes outreach funnel analytics.
//!
//! # Modules
//!
//! - `analytics`: Outreach funnel arithmetic.
//! - `candidate_mapper`: Vendor profile JSON to candidate records.
//! - `companies`: Catalogue of companies affected by layoffs.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Candidate and enrichment cache storage.
//! - `enrichment`: Cache-first LLM enrichment with typed fallbacks.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and routes.
//! - `llm_json`: Best-effort JSON extraction from LLM text.
//! - `mixrank_client`: People-data vendor client.
//! - `mock_data`: Randomized placeholder enrichment.
//! - `models`: Core data models.
//! - `perplexity_client`: LLM client and query templates.
//! - `search`: Candidate search workflows.

pub mod analytics;
pub mod candidate_mapper;
pub mod companies;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod enrichment;
pub mod errors;
pub mod handlers;
pub mod llm_json;
pub mod mixrank_client;
pub mod mock_data;
pub mod models;
pub mod perplexity_client;
pub mod search;
