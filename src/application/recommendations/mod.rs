//! Recommendation client: prompts, generator port, parsing, caching and
//! the rule-based fallback.

pub mod cache;
pub mod client;
pub mod fallback;
pub mod generator;
pub mod parser;
pub mod prompt;
pub mod service;

pub use cache::RecommendationCache;
pub use client::{ClientSettings, RecommendationClient, RecommendationOutcome, RecommendationSource};
pub use generator::{ServiceUnavailable, TextGenerator};
pub use parser::parse_recommendations;
pub use prompt::{Prompt, PromptKind};
pub use service::{
    AnalysisPeriod, ComparisonInsights, DeviceTips, EfficiencyAnalysis, EnergyAnalysis,
    RecommendationService, RecommendationStatus, UserRecommendations,
};
