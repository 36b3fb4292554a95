use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::GeminiError;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?").expect("valid regex"));

/// Remove markdown code fences the model sometimes wraps its JSON in.
pub(crate) fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_owned()
}

/// Parse model output as JSON after stripping code fences.
pub(crate) fn parse_model_json<T: DeserializeOwned>(
    text: &str,
    context: &str,
) -> Result<T, GeminiError> {
    serde_json::from_str(&strip_code_fences(text)).map_err(|source| GeminiError::Deserialize {
        context: context.to_owned(),
        source,
    })
}
