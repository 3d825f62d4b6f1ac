// Analysis prompt templates.

/// Number of base64 characters of the file that are sent to the model.
///
/// A multi-page PDF encodes to far more than this, so the model only ever sees
/// the first few hundred bytes of the document. The cut is a known fidelity
/// gap, logged on every truncated call rather than silently widened.
pub const BASE64_PREVIEW_CHARS: usize = 1000;

pub const ANALYSIS_USER_PREFIX: &str = "Please analyze this resume PDF (base64 encoded): ";

pub const ANALYSIS_SYSTEM: &str = r#"You are an expert resume analyzer and career advisor. Analyze resumes comprehensively and provide detailed insights. Your analysis should include:
1. Overall score (0-100) based on formatting, content quality, clarity, and ATS compatibility
2. List of strengths (3-5 key strong points)
3. List of weaknesses or areas for improvement (3-5 points)
4. Recommended job roles with match scores and reasoning (3-5 roles)
5. Skill suggestions to improve the resume (5-7 skills)
6. Keyword analysis showing present and missing important keywords

Respond ONLY with valid JSON in this exact format:
{
  "overall_score": <number 0-100>,
  "strengths": [<array of strings>],
  "weaknesses": [<array of strings>],
  "recommended_roles": [
    {"title": "<string>", "match_score": <number 0-100>, "reason": "<string>"}
  ],
  "skill_suggestions": [<array of strings>],
  "keyword_analysis": {
    "present": [<array of strings>],
    "missing": [<array of strings>]
  }
}"#;

/// The user message plus whether the encoded payload had to be cut.
pub struct UserPrompt {
    pub text: String,
    pub truncated: bool,
}

pub fn build_user_prompt(encoded: &str) -> UserPrompt {
    // base64 is ASCII, so a byte index is a char index
    let preview = encoded.get(..BASE64_PREVIEW_CHARS).unwrap_or(encoded);
    UserPrompt {
        text: format!("{ANALYSIS_USER_PREFIX}{preview}..."),
        truncated: preview.len() < encoded.len(),
    }
}
