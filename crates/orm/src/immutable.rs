//! Immutability gate
//!
//! Every mutation-shaped entry point on records, collections and pivots
//! ends here. Hydration and relation assignment use crate-private setters
//! and never pass through the gate.

use crate::error::{ModelError, ModelResult};

/// Refuse `action` on `target`
pub(crate) fn deny<T>(target: &str, action: &str) -> ModelResult<T> {
    tracing::warn!("Blocked {} on immutable {}", action, target);
    Err(ModelError::Immutable(format!("cannot {} on {}", action, target)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deny_is_uniform() {
        let err = deny::<()>("User", "set attribute 'name'").unwrap_err();
        assert!(err.is_violation());
        assert_eq!(err.to_string(), "Immutability violation: cannot set attribute 'name' on User");
    }
}
