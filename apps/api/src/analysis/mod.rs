// Resume analysis: prompt construction, response parsing and the
// download → AI → persist pipeline behind POST /api/v1/analyze-resume.
// All AI calls go through llm_client.

pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;
