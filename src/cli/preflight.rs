//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{ItineraError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Planning needs the model key; the search key is optional.
    Plan,
    /// Document chat needs the model key.
    Docs,
}

/// Run pre-flight checks for the given operation.
///
/// Returns warnings for optional requirements that are missing, or an error
/// describing what is required.
pub fn check(operation: Operation, settings: &Settings) -> Result<Vec<String>> {
    check_api_key(settings)?;

    let mut warnings = Vec::new();
    if let Operation::Plan = operation {
        if settings.search.api_key().is_none() {
            warnings.push(format!(
                "{} is not set. The reviewer will not be able to search the web.",
                settings.search.api_key_env
            ));
        }
    }
    Ok(warnings)
}

/// Check if an OpenAI API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    match settings.openai.api_key() {
        Some(_) => Ok(()),
        None => Err(ItineraError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
