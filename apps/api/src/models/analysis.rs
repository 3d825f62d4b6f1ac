use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// A job title the model suggests, with its 0–100 match score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedRole {
    pub title: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub match_score: i32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

/// The six-field analysis object the model is asked to return.
///
/// Scores are documented as 0–100 but are stored as received, apart from
/// rounding a fractional value to the nearest integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    #[serde(deserialize_with = "deserialize_score")]
    pub overall_score: i32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommended_roles: Vec<RecommendedRole>,
    pub skill_suggestions: Vec<String>,
    pub keyword_analysis: KeywordAnalysis,
}

/// Accepts any JSON number; `85` and `85.0` both become 85, `72.5` rounds to 73.
fn deserialize_score<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(de::Error::custom(format!("score {value} is not representable")));
    }
    Ok(value.round() as i32)
}

/// Persisted analysis. Inserted once per successful run and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub user_id: Uuid,
    pub overall_score: i32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommended_roles: Json<Vec<RecommendedRole>>,
    pub skill_suggestions: Vec<String>,
    pub keyword_analysis: Json<KeywordAnalysis>,
    pub sections_analysis: Value,
    pub fallback_used: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
impl AnalysisRow {
    pub fn analysis(&self) -> ResumeAnalysis {
        ResumeAnalysis {
            overall_score: self.overall_score,
            strengths: self.strengths.clone(),
            weaknesses: self.weaknesses.clone(),
            recommended_roles: self.recommended_roles.0.clone(),
            skill_suggestions: self.skill_suggestions.clone(),
            keyword_analysis: self.keyword_analysis.0.clone(),
        }
    }
}
