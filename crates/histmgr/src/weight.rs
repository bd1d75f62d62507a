//! Weight fallback for fills and content increments.

/// Weight applied to one fill or increment: the explicit weight if given,
/// else the manager's default weight, else 1.
#[inline]
pub fn resolve_weight(explicit: Option<f64>, default: Option<f64>) -> f64 {
    explicit.or(default).unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn three_tiers() {
        assert_eq!(resolve_weight(None, None), 1.0);
        assert_eq!(resolve_weight(None, Some(2.0)), 2.0);
        assert_eq!(resolve_weight(Some(0.5), Some(2.0)), 0.5);
        assert_eq!(resolve_weight(Some(0.0), None), 0.0);
    }

    proptest! {
        #[test]
        fn explicit_always_wins(w in -1e6f64..1e6, d in proptest::option::of(-1e6f64..1e6)) {
            prop_assert_eq!(resolve_weight(Some(w), d), w);
        }
    }
}
