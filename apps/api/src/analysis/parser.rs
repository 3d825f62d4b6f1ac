//! Best-effort extraction of a `ResumeAnalysis` from free-form model output.
//!
//! Order of attempts:
//! 1. the interior of a ```` ```json ```` fence, else of a bare ```` ``` ```` fence
//! 2. the whole text
//!
//! Anything that does not deserialize into the six-field schema is replaced by
//! [`fallback_analysis`] and reported through `ParsedAnalysis::fallback_used`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::models::analysis::{KeywordAnalysis, RecommendedRole, ResumeAnalysis};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedAnalysis {
    pub analysis: ResumeAnalysis,
    pub fallback_used: bool,
}

fn json_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid fence regex"))
}

fn bare_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```\s*(.*?)\s*```").expect("valid fence regex"))
}

/// Returns the interior of the first fenced block, or the text unchanged.
pub fn extract_json_payload(text: &str) -> &str {
    json_fence()
        .captures(text)
        .or_else(|| bare_fence().captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
}

pub fn parse_analysis(text: &str) -> ParsedAnalysis {
    let payload = extract_json_payload(text);
    match serde_json::from_str::<ResumeAnalysis>(payload) {
        Ok(analysis) => ParsedAnalysis {
            analysis,
            fallback_used: false,
        },
        Err(e) => {
            warn!("Failed to parse AI response ({e}), using fallback analysis: {text}");
            ParsedAnalysis {
                analysis: fallback_analysis(),
                fallback_used: true,
            }
        }
    }
}

/// Fixed analysis stored when the model output cannot be parsed.
pub fn fallback_analysis() -> ResumeAnalysis {
    ResumeAnalysis {
        overall_score: 70,
        strengths: strings(&[
            "Resume uploaded successfully",
            "Professional presentation",
            "Clear structure visible",
        ]),
        weaknesses: strings(&[
            "Consider adding more quantifiable achievements",
            "Expand on technical skills",
            "Include more action verbs",
        ]),
        recommended_roles: vec![RecommendedRole {
            title: "Professional Role".to_string(),
            match_score: 75,
            reason: "Based on your background and experience".to_string(),
        }],
        skill_suggestions: strings(&[
            "Project Management",
            "Communication",
            "Technical Writing",
            "Data Analysis",
            "Leadership",
        ]),
        keyword_analysis: KeywordAnalysis {
            present: strings(&["Professional", "Experience", "Skills"]),
            missing: strings(&["Achievements", "Metrics", "Results"]),
        },
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
