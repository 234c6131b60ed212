use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{SourceId, UtcDateTime, ValidationError};

pub const SCHEMA_VERSION: &str = "v1.0.0";

/// Standard response wrapper for every `TariffService` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

impl<T> Envelope<T> {
    pub fn success(meta: EnvelopeMeta, data: T) -> Self {
        Self {
            meta,
            data,
            errors: Vec::new(),
        }
    }

    pub fn push_error(&mut self, error: EnvelopeError) -> Result<(), ValidationError> {
        error.validate()?;
        self.errors.push(error);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub request_id: Uuid,
    pub schema_version: String,
    pub generated_at: UtcDateTime,
    /// Sources that contributed data to this response.
    pub sources: Vec<SourceId>,
    pub latency_ms: u64,
    pub cache_hit: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(sources: Vec<SourceId>, latency_ms: u64, cache_hit: bool) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            schema_version: String::from(SCHEMA_VERSION),
            generated_at: UtcDateTime::now(),
            sources,
            latency_ms,
            cache_hit,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Structured notice about a source that could not contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceId>,
}

impl EnvelopeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Result<Self, ValidationError> {
        let error = Self {
            code: code.into(),
            message: message.into(),
            source: None,
        };
        error.validate()?;
        Ok(error)
    }

    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::EmptyErrorCode);
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::EmptyErrorMessage);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_carries_fresh_request_ids() {
        let first = EnvelopeMeta::new(vec![SourceId::WorldBank], 12, false);
        let second = EnvelopeMeta::new(Vec::new(), 0, true);

        assert_ne!(first.request_id, second.request_id);
        assert_eq!(first.request_id.get_version_num(), 4);
        assert_eq!(first.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn rejects_empty_error_code() {
        let err = EnvelopeError::new(" ", "message").expect_err("must fail");
        assert!(matches!(err, ValidationError::EmptyErrorCode));
    }

    #[test]
    fn serializes_without_empty_collections() {
        let envelope = Envelope::success(EnvelopeMeta::new(Vec::new(), 1, false), 5_u8);
        let json = serde_json::to_value(&envelope).expect("serializable");

        assert!(json.get("errors").is_none());
        assert!(json["meta"].get("warnings").is_none());
        assert_eq!(json["data"], 5);
    }
}
