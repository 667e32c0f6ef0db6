use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};

use crate::error::SummaryError;

/// A single ingested news item. Created once by the ingestion path and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewsItem {
    /// Feed source name, matched case-insensitively against `RankConfig::source_weights`
    pub source: String,
    /// Canonical absolute URL; the join key for citations and caches
    pub url: String,
    /// Publication timestamp (UTC)
    pub published_at: DateTime<Utc>,
    pub title: String,
    /// Free text the summary must be grounded in. May be empty.
    #[serde(default)]
    pub evidence: String,
}

/// Which item fields are searched for topics and keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Evidence,
}

/// Ranking configuration. Pure data: built once, then only ever borrowed by scoring calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RankConfig {
    /// Each topic found in the search text adds 1.0 to relevance
    pub topics: Vec<String>,
    /// Keyword → boost added to relevance when the keyword is found
    pub keyword_boosts: BTreeMap<String, f64>,
    /// Lowercase source → multiplier (1.0 for unlisted sources)
    pub source_weights: BTreeMap<String, f64>,
    pub search_fields: Vec<SearchField>,
    /// Age at which the recency multiplier is exactly 0.5. Values <= 0 mean 24.0.
    pub recency_half_life_hours: f64,
    /// Weight of the external similarity signal, blended additively
    pub ai_score_alpha: f64,
}

pub const DEFAULT_HALF_LIFE_HOURS: f64 = 24.0;

impl Default for RankConfig {
    fn default() -> Self {
        let topics = [
            "AI",
            "artificial intelligence",
            "machine learning",
            "startup",
            "funding",
            "raised",
            "cloud",
            "AWS",
            "Azure",
            "Google Cloud",
            "security",
            "cybersecurity",
            "breach",
            "open source",
            "GitHub",
        ];
        let keyword_boosts = [
            ("million", 0.5),
            ("billion", 0.5),
            ("acquisition", 0.5),
            ("acquired", 0.5),
            ("breakthrough", 0.5),
            ("launches", 0.3),
            ("announces", 0.3),
        ];
        let source_weights = [
            ("techcrunch", 1.2),
            ("hackernews", 1.1),
            ("arstechnica", 1.1),
            ("theverge", 1.0),
            ("wired", 1.0),
        ];

        Self {
            topics: topics.iter().map(|t| t.to_string()).collect(),
            keyword_boosts: keyword_boosts
                .iter()
                .map(|(k, b)| (k.to_string(), *b))
                .collect(),
            source_weights: source_weights
                .iter()
                .map(|(s, w)| (s.to_string(), *w))
                .collect(),
            search_fields: vec![SearchField::Title, SearchField::Evidence],
            recency_half_life_hours: DEFAULT_HALF_LIFE_HOURS,
            ai_score_alpha: 0.0,
        }
    }
}

impl RankConfig {
    /// A config with no topics, keywords or source weights. Ranking under it is pure recency.
    pub fn empty() -> Self {
        Self {
            topics: Vec::new(),
            keyword_boosts: BTreeMap::new(),
            source_weights: BTreeMap::new(),
            ..Self::default()
        }
    }

    pub fn with_topics<S: Into<String>>(mut self, topics: impl IntoIterator<Item = S>) -> Self {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keyword_boosts<S: Into<String>>(
        mut self,
        boosts: impl IntoIterator<Item = (S, f64)>,
    ) -> Self {
        self.keyword_boosts = boosts.into_iter().map(|(k, b)| (k.into(), b)).collect();
        self
    }

    pub fn with_source_weights<S: Into<String>>(
        mut self,
        weights: impl IntoIterator<Item = (S, f64)>,
    ) -> Self {
        self.source_weights = weights.into_iter().map(|(s, w)| (s.into(), w)).collect();
        self
    }

    pub fn with_search_fields(mut self, fields: impl IntoIterator<Item = SearchField>) -> Self {
        self.search_fields = fields.into_iter().collect();
        self
    }

    pub fn with_half_life_hours(mut self, hours: f64) -> Self {
        self.recency_half_life_hours = hours;
        self
    }

    pub fn with_ai_score_alpha(mut self, alpha: f64) -> Self {
        self.ai_score_alpha = alpha;
        self
    }

    /// Fill in weights for sources this config does not already pin.
    pub fn with_default_source_weights(mut self, weights: &BTreeMap<String, f64>) -> Self {
        for (source, weight) in weights {
            self.source_weights
                .entry(source.to_lowercase())
                .or_insert(*weight);
        }
        self
    }

    pub fn effective_half_life_hours(&self) -> f64 {
        if self.recency_half_life_hours > 0.0 {
            self.recency_half_life_hours
        } else {
            DEFAULT_HALF_LIFE_HOURS
        }
    }

    pub fn source_weight(&self, source: &str) -> f64 {
        self.source_weights
            .get(&source.to_lowercase())
            .copied()
            .unwrap_or(1.0)
    }

    pub fn searches(&self, field: SearchField) -> bool {
        self.search_fields.contains(&field)
    }
}

/// A grounded reference to source material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Citation {
    pub source_url: String,
    /// Must be an exact, case-sensitive substring of the evidence supplied for summarization
    pub evidence_snippet: String,
}

impl Citation {
    pub fn new(source_url: impl Into<String>, evidence_snippet: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            evidence_snippet: evidence_snippet.into(),
        }
    }
}

/// The summary shape of a `SummaryResult`: non-empty text backed by at least one citation.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    text: String,
    tags: Vec<String>,
    citations: Vec<Citation>,
    confidence: Option<f64>,
}

impl Summary {
    pub fn new(
        text: impl Into<String>,
        tags: Vec<String>,
        citations: Vec<Citation>,
        confidence: Option<f64>,
    ) -> Result<Self, SummaryError> {
        let text = text.into();
        if text.is_empty() {
            return Err(SummaryError::NeitherSummaryNorRefusal);
        }
        if citations.is_empty() {
            return Err(SummaryError::MissingCitations);
        }
        Ok(Self {
            text,
            tags,
            citations,
            confidence,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    /// Model-reported self-assessment. Uncalibrated; advisory only.
    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }
}

/// LLM adapter output contract: either a grounded summary or a refusal, never both, never
/// neither. Deserialization goes through the flat wire shape and rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSummaryResult", into = "RawSummaryResult")]
pub enum SummaryResult {
    Summary(Summary),
    /// Reason code. Usually one of `codes::VALID_REFUSAL_CODES`, but upstream may send
    /// anything; the summary-quality checks flag unknown codes.
    Refusal(String),
}

impl SummaryResult {
    pub fn summary(
        text: impl Into<String>,
        tags: Vec<String>,
        citations: Vec<Citation>,
        confidence: Option<f64>,
    ) -> Result<Self, SummaryError> {
        Summary::new(text, tags, citations, confidence).map(Self::Summary)
    }

    pub fn refusal(code: impl Into<String>) -> Self {
        Self::Refusal(code.into())
    }

    /// Build from the flat field set an LLM or a caller supplies.
    pub fn from_parts(
        summary: Option<String>,
        tags: Vec<String>,
        citations: Vec<Citation>,
        confidence: Option<f64>,
        refusal: Option<String>,
    ) -> Result<Self, SummaryError> {
        let summary = summary.filter(|s| !s.is_empty());
        let refusal = refusal.filter(|r| !r.is_empty());

        match (summary, refusal) {
            (Some(_), Some(_)) => Err(SummaryError::BothSummaryAndRefusal),
            (None, None) => Err(SummaryError::NeitherSummaryNorRefusal),
            (None, Some(code)) => Ok(Self::Refusal(code)),
            (Some(text), None) => Self::summary(text, tags, citations, confidence),
        }
    }

    pub fn refusal_code(&self) -> Option<&str> {
        match self {
            Self::Refusal(code) => Some(code),
            Self::Summary(_) => None,
        }
    }

    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::Refusal(_))
    }

    pub fn citations(&self) -> &[Citation] {
        match self {
            Self::Summary(s) => s.citations(),
            Self::Refusal(_) => &[],
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Self::Summary(s) => s.tags(),
            Self::Refusal(_) => &[],
        }
    }

    pub fn summary_text(&self) -> Option<&str> {
        match self {
            Self::Summary(s) => Some(s.text()),
            Self::Refusal(_) => None,
        }
    }
}

/// Flat wire shape of `SummaryResult`, as produced by the LLM adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawSummaryResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
}

impl TryFrom<RawSummaryResult> for SummaryResult {
    type Error = SummaryError;

    fn try_from(raw: RawSummaryResult) -> Result<Self, Self::Error> {
        Self::from_parts(raw.summary, raw.tags, raw.citations, raw.confidence, raw.refusal)
    }
}

impl From<SummaryResult> for RawSummaryResult {
    fn from(result: SummaryResult) -> Self {
        match result {
            SummaryResult::Summary(s) => Self {
                summary: Some(s.text),
                tags: s.tags,
                citations: s.citations,
                confidence: s.confidence,
                refusal: None,
            },
            SummaryResult::Refusal(code) => Self {
                refusal: Some(code),
                ..Self::default()
            },
        }
    }
}

impl JsonSchema for SummaryResult {
    fn schema_name() -> Cow<'static, str> {
        "SummaryResult".into()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        RawSummaryResult::json_schema(generator)
    }
}
