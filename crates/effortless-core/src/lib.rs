//! Effortless Core Library
//!
//! Shared functionality for the Effortless rewards dashboard:
//! - Domain models and the repository abstraction over flat-file tables
//! - Transaction enrichment and reward matching
//! - Aggregation engine for per-user dashboard summaries
//! - Insight assembler with generative and templated fallback modes
//! - Pluggable text-generation backends (Ollama, OpenAI-compatible, mock)
//! - Prompt library for customizable prompts
//! - Seeded demo-data generator

pub mod aggregate;
pub mod ai;
pub mod config;
pub mod dashboard;
pub mod enrich;
pub mod error;
pub mod insights;
pub mod matching;
pub mod models;
pub mod prompts;
pub mod seed;
pub mod store;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{
    aggregate, AggregateOptions, CategorySavings, CategorySpending, DashboardSummary, MissReason,
    MissedReward, RewardActivity, SavingsChannel,
};
pub use ai::{
    AIBackend, AIClient, GenerateRequest, GeneratedInsights, MockBackend, OllamaBackend,
    OpenAICompatibleBackend,
};
pub use config::{AppConfig, DataConfig, InsightsConfig, ServerSettings};
pub use enrich::Enricher;
pub use error::{Error, Result};
pub use insights::{InsightAssembler, InsightBundle, InsightMode, InsightRequest, Recommendations};
pub use models::{GeoScope, Preferences, PreferencesUpdate, Reward, RewardType, Transaction, User};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use store::{MemoryStore, Repository, RewardFilter, Tables, TransactionFilter};
