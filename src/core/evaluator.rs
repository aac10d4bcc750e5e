//! Rule-based response evaluation and ranking
//!
//! Scores every provider response against a weighted five-criterion rubric
//! (completeness, accuracy, relevance, clarity, structure) and ranks them.
//! Evaluation is pure: identical inputs always produce identical output.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EnsembleError, EnsembleResult};
use crate::types::{LlmResponse, ProviderId};

/// Consensus threshold used by the standalone `consensus` helper. The
/// orchestrator applies its own, lower floor for the CONSENSUS strategy.
pub const DEFAULT_CONSENSUS_THRESHOLD: f64 = 70.0;

/// The five rubric criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    Completeness,
    Accuracy,
    Relevance,
    Clarity,
    Structure,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Completeness => "completeness",
            Criterion::Accuracy => "accuracy",
            Criterion::Relevance => "relevance",
            Criterion::Clarity => "clarity",
            Criterion::Structure => "structure",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-criterion weights; must sum to 1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluationWeights {
    pub completeness: f64,
    pub accuracy: f64,
    pub relevance: f64,
    pub clarity: f64,
    pub structure: f64,
}

impl Default for EvaluationWeights {
    fn default() -> Self {
        Self {
            completeness: 0.25,
            accuracy: 0.25,
            relevance: 0.20,
            clarity: 0.15,
            structure: 0.15,
        }
    }
}

impl EvaluationWeights {
    fn sum(&self) -> f64 {
        self.completeness + self.accuracy + self.relevance + self.clarity + self.structure
    }

    fn validate(&self) -> EnsembleResult<()> {
        let sum = self.sum();
        if (sum - 1.0).abs() > 0.01 {
            return Err(EnsembleError::ConfigError {
                message: format!("evaluation weights sum to {sum:.3}, but should sum to 1.0"),
            });
        }
        Ok(())
    }

    fn for_criterion(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Completeness => self.completeness,
            Criterion::Accuracy => self.accuracy,
            Criterion::Relevance => self.relevance,
            Criterion::Clarity => self.clarity,
            Criterion::Structure => self.structure,
        }
    }
}

/// Evaluation outcome for one response
///
/// A failed envelope always scores exactly 0 with a weakness naming the
/// provider error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub provider: ProviderId,
    pub total_score: f64,
    pub criteria_scores: HashMap<Criterion, f64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendation: String,
}

struct CriterionLabels {
    strength: &'static str,
    weakness: &'static str,
}

const fn labels(criterion: Criterion) -> CriterionLabels {
    match criterion {
        Criterion::Completeness => CriterionLabels {
            strength: "detailed answer that fully covers the question",
            weakness: "answer is incomplete or too short",
        },
        Criterion::Accuracy => CriterionLabels {
            strength: "includes concrete domain facts and figures",
            weakness: "lacks concrete domain information",
        },
        Criterion::Relevance => CriterionLabels {
            strength: "highly relevant to the question",
            weakness: "low relevance to the question",
        },
        Criterion::Clarity => CriterionLabels {
            strength: "clear, easy-to-read sentences",
            weakness: "sentences are convoluted or unclear",
        },
        Criterion::Structure => CriterionLabels {
            strength: "well-structured formatting (tables, lists)",
            weakness: "poor structure hurts readability",
        },
    }
}

/// Common English stopwords excluded from relevance matching
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "of", "to", "in", "on", "at", "for",
    "and", "or", "it", "its", "this", "that", "with", "as", "by", "do", "does", "did", "can",
    "what", "which", "who", "when", "how", "why",
];

/// Rule-based evaluator for provider responses
///
/// Regexes are compiled once at construction; `evaluate_all` has no side
/// effects and is deterministic for identical input.
pub struct ResponseEvaluator {
    weights: EvaluationWeights,
    keywords: Vec<String>,

    word_re: Regex,
    number_re: Regex,
    url_re: Regex,
    phone_re: Regex,
    table_re: Regex,
    bullet_re: Regex,
    numbered_re: Regex,
    header_re: Regex,
    link_re: Regex,
}

impl Default for ResponseEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseEvaluator {
    /// Create an evaluator with default weights and domain keywords
    pub fn new() -> Self {
        Self::build(EvaluationWeights::default())
    }

    /// Create an evaluator with custom weights; fails unless they sum to 1.0
    pub fn with_weights(weights: EvaluationWeights) -> EnsembleResult<Self> {
        weights.validate()?;
        Ok(Self::build(weights))
    }

    /// Replace the domain keyword list used for accuracy scoring
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords.into_iter().map(|k| k.to_lowercase()).collect();
        self
    }

    fn build(weights: EvaluationWeights) -> Self {
        let keywords = [
            "support",
            "program",
            "policy",
            "eligibility",
            "apply",
            "application",
            "deadline",
            "benefit",
            "income",
            "amount",
            "requirement",
            "period",
            "document",
            "contact",
            "website",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            weights,
            keywords,
            word_re: Regex::new(r"\w+").unwrap(),
            number_re: Regex::new(r"\d+(?:,\d{3})*(?:\.\d+)?").unwrap(),
            url_re: Regex::new(r"https?://|www\.|\.go\.kr|\.or\.kr").unwrap(),
            phone_re: Regex::new(r"\d{2,4}[-\s]?\d{3,4}[-\s]?\d{4}").unwrap(),
            table_re: Regex::new(r"\|.*\|.*\|").unwrap(),
            bullet_re: Regex::new(r"(?m)^[-*•]\s").unwrap(),
            numbered_re: Regex::new(r"(?m)^\d+[.)]\s").unwrap(),
            header_re: Regex::new(r"(?m)^#+\s|^\*\*.*\*\*").unwrap(),
            link_re: Regex::new(r"\[.*\]\(.*\)").unwrap(),
        }
    }

    /// Evaluate every response against the rubric and rank the results
    ///
    /// Output is sorted descending by composite score; the sort is stable,
    /// so ties keep input order. Failed envelopes score exactly 0.
    pub fn evaluate_all(
        &self,
        responses: &[LlmResponse],
        query: &str,
        _context: Option<&str>,
    ) -> Vec<EvaluationResult> {
        let mut results: Vec<EvaluationResult> = responses
            .iter()
            .map(|response| {
                if response.success {
                    self.evaluate_single(response, query)
                } else {
                    EvaluationResult {
                        provider: response.provider,
                        total_score: 0.0,
                        criteria_scores: HashMap::new(),
                        strengths: Vec::new(),
                        weaknesses: vec![format!(
                            "provider call failed: {}",
                            response.error.as_deref().unwrap_or("unknown error")
                        )],
                        recommendation: String::new(),
                    }
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(Ordering::Equal)
        });

        results
    }

    fn evaluate_single(&self, response: &LlmResponse, query: &str) -> EvaluationResult {
        let content = &response.content;
        let mut criteria_scores = HashMap::new();
        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();

        let scored = [
            (Criterion::Completeness, self.score_completeness(content)),
            (Criterion::Accuracy, self.score_accuracy(content)),
            (Criterion::Relevance, self.score_relevance(content, query)),
            (Criterion::Clarity, self.score_clarity(content)),
            (Criterion::Structure, self.score_structure(content)),
        ];

        let mut total = 0.0;
        for (criterion, score) in scored {
            criteria_scores.insert(criterion, score);
            total += score * self.weights.for_criterion(criterion);

            let labels = labels(criterion);
            if score >= 80.0 {
                strengths.push(labels.strength.to_string());
            } else if score < 50.0 {
                weaknesses.push(labels.weakness.to_string());
            }
        }

        let total_score = round2(total);
        let recommendation =
            self.recommendation(response.provider, total_score, &strengths, &weaknesses);

        debug!(provider = %response.provider, score = total_score, "response evaluated");

        EvaluationResult {
            provider: response.provider,
            total_score,
            criteria_scores,
            strengths,
            weaknesses,
            recommendation,
        }
    }

    /// Length and sentence-count heuristic
    fn score_completeness(&self, content: &str) -> f64 {
        let length = content.chars().count();
        let mut score: f64 = match length {
            0..=99 => 20.0,
            100..=299 => 40.0,
            300..=499 => 60.0,
            500..=1499 => 80.0,
            // Overly long answers lose points
            _ => 70.0,
        };

        let sentences = content
            .chars()
            .filter(|c| matches!(c, '.' | '!' | '?'))
            .count();
        if sentences >= 5 {
            score += 20.0;
        } else if sentences >= 3 {
            score += 10.0;
        }

        score.min(100.0)
    }

    /// Domain-signal density: keywords, numbers, URLs, phone numbers
    fn score_accuracy(&self, content: &str) -> f64 {
        let mut score = 0.0;
        let content_lower = content.to_lowercase();

        let keyword_hits = self
            .keywords
            .iter()
            .filter(|keyword| content_lower.contains(keyword.as_str()))
            .count();
        score += (keyword_hits as f64 * 5.0).min(40.0);

        let numbers = self.number_re.find_iter(content).count();
        if numbers >= 3 {
            score += 30.0;
        } else if numbers >= 1 {
            score += 15.0;
        }

        if self.url_re.is_match(content) {
            score += 15.0;
        }
        if self.phone_re.is_match(content) {
            score += 15.0;
        }

        score.min(100.0)
    }

    /// Fraction of distinct non-stopword query terms present in the content
    fn score_relevance(&self, content: &str, query: &str) -> f64 {
        let query_lower = query.to_lowercase();
        let mut terms: Vec<&str> = self
            .word_re
            .find_iter(&query_lower)
            .map(|m| m.as_str())
            .filter(|term| !STOPWORDS.contains(term))
            .collect();
        terms.sort_unstable();
        terms.dedup();

        if terms.is_empty() {
            return 50.0;
        }

        let content_lower = content.to_lowercase();
        let matched = terms
            .iter()
            .filter(|term| content_lower.contains(**term))
            .count();

        ((matched as f64 / terms.len() as f64) * 100.0).min(100.0)
    }

    /// Sentence-length and symbol-density heuristic
    fn score_clarity(&self, content: &str) -> f64 {
        let mut score: f64 = 70.0;

        let sentences: Vec<&str> = content
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if sentences.is_empty() {
            return 30.0;
        }

        let total_chars: usize = sentences.iter().map(|s| s.chars().count()).sum();
        let avg_length = total_chars as f64 / sentences.len() as f64;

        if (20.0..=50.0).contains(&avg_length) {
            score += 20.0;
        } else if avg_length < 20.0 {
            score += 10.0;
        } else if avg_length > 100.0 {
            score -= 20.0;
        }

        let length = content.chars().count().max(1);
        let special = content
            .chars()
            .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
            .count();
        if special as f64 / length as f64 > 0.1 {
            score -= 10.0;
        }

        score.clamp(0.0, 100.0)
    }

    /// Markdown formatting heuristic: tables, lists, headers, links, paragraphs
    fn score_structure(&self, content: &str) -> f64 {
        let mut score: f64 = 40.0;

        if self.table_re.is_match(content) {
            score += 25.0;
        }
        if self.bullet_re.is_match(content) {
            score += 15.0;
        }
        if self.numbered_re.is_match(content) {
            score += 15.0;
        }
        if self.header_re.is_match(content) {
            score += 10.0;
        }
        if self.link_re.is_match(content) {
            score += 10.0;
        }

        if content.split("\n\n").count() >= 3 {
            score += 10.0;
        }

        score.min(100.0)
    }

    fn recommendation(
        &self,
        provider: ProviderId,
        score: f64,
        strengths: &[String],
        weaknesses: &[String],
    ) -> String {
        let quality = if score >= 80.0 {
            "very good"
        } else if score >= 60.0 {
            "good"
        } else if score >= 40.0 {
            "fair"
        } else {
            "poor"
        };

        let mut recommendation = format!("The {provider} response quality is {quality}.");

        if !strengths.is_empty() {
            let shown = strengths.iter().take(2).cloned().collect::<Vec<_>>();
            recommendation.push_str(&format!(" Strengths: {}.", shown.join(", ")));
        }

        if !weaknesses.is_empty() && score < 60.0 {
            recommendation.push_str(&format!(" Needs improvement: {}.", weaknesses[0]));
        }

        recommendation
    }

    /// Highest-scoring result, or None when the list is empty
    pub fn select_best<'a>(&self, results: &'a [EvaluationResult]) -> Option<&'a EvaluationResult> {
        results.first()
    }

    /// All results at or above the threshold, in ranked order
    pub fn consensus<'a>(
        &self,
        results: &'a [EvaluationResult],
        threshold: f64,
    ) -> Vec<&'a EvaluationResult> {
        results
            .iter()
            .filter(|r| r.total_score >= threshold)
            .collect()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
