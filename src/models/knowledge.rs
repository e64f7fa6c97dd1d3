use std::fmt;

/// Canonical, pretty-printed JSON text of the knowledge base, or nothing.
///
/// Values only come from a successful ingestion or from a persisted value
/// that still parses as JSON, so holders can rely on it being valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeText(String);

impl KnowledgeText {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps text the ingestion pipeline has just produced.
    pub(crate) fn from_canonical(text: String) -> Self {
        Self(text)
    }

    /// Re-wraps a previously persisted value. Blank text is the empty
    /// knowledge base; anything else must parse as JSON.
    pub fn from_persisted(text: String) -> Result<Self, serde_json::Error> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        serde_json::from_str::<serde_json::Value>(&text)?;
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for KnowledgeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
