use crate::PipelineError;

/// Normalized text obtained from one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFragment {
    pub source_url: String,
    pub text: String,
    pub ok: bool,
}

impl ContentFragment {
    pub fn fetched(source_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            text: text.into(),
            ok: true,
        }
    }

    pub fn failed(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            text: String::new(),
            ok: false,
        }
    }
}

/// Concatenates successful fragments in the given order, each under a
/// `From <url>:` header. Fails when no fragment succeeded.
pub fn aggregate(fragments: &[ContentFragment]) -> Result<String, PipelineError> {
    let combined: String = fragments
        .iter()
        .filter(|fragment| fragment.ok)
        .map(|fragment| format!("\n\nFrom {}:\n{}", fragment.source_url, fragment.text))
        .collect();
    if combined.is_empty() {
        return Err(PipelineError::NoContent);
    }
    Ok(combined)
}
