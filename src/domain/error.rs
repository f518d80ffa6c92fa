// Domain errors - only raised at parsing boundaries, never on record data
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} token: {token}")]
pub struct UnknownToken {
    pub kind: &'static str,
    pub token: String,
}

impl UnknownToken {
    pub fn new(kind: &'static str, token: &str) -> Self {
        Self {
            kind,
            token: token.to_string(),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid {widget_type} settings: {source}")]
pub struct InvalidSettings {
    pub widget_type: String,
    #[source]
    pub source: serde_json::Error,
}
