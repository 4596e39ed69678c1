/// Errors raised by the pure rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// A hand slot outside `0..=3` was named.
    #[error("invalid card index: {0}")]
    InvalidCardIndex(i64),
}
