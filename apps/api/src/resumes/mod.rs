// Resume upload, history and results. Analysis itself lives in crate::analysis.

pub mod handlers;
pub mod upload;
