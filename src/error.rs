use thiserror::Error;

/// Errors raised while building or configuring a collator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollationError {
    #[error("rule syntax error at offset {offset}: {reason} (after \"{context}\")")]
    RuleSyntax {
        offset: usize,
        reason: String,
        context: String,
    },

    #[error("unsupported attribute: {0}")]
    UnsupportedAttribute(String),

    #[error("cannot allocate {count} weights between {lower:#x} and {upper:#x}")]
    AllocationExhausted { count: usize, lower: u32, upper: u32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("attempt to modify a frozen collator")]
    FrozenMutation,
}

impl CollationError {
    pub(crate) fn syntax(offset: usize, reason: impl Into<String>) -> Self {
        Self::RuleSyntax {
            offset,
            reason: reason.into(),
            context: String::new(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Attaches up to 16 chars of rule text preceding the error offset.
    pub(crate) fn with_context(self, rules: &[char]) -> Self {
        match self {
            Self::RuleSyntax { offset, reason, .. } => {
                let end = offset.min(rules.len());
                let start = end.saturating_sub(16);
                Self::RuleSyntax {
                    offset,
                    reason,
                    context: rules[start..end].iter().collect(),
                }
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CollationError>;
