//! Retry block <-> retry policy payload.

use crate::job::{FixedRetry, RetrySpec};
use crate::remote::{RetryPolicy, RetryType};

/// Absent retry becomes an explicit `None` policy.
///
/// The interval is passed through as written; a malformed duration is only
/// caught (or silently ignored) by the service.
pub fn encode(retry: &RetrySpec) -> RetryPolicy {
    match retry {
        RetrySpec::None => RetryPolicy {
            retry_type: Some(RetryType::None),
            ..RetryPolicy::default()
        },
        RetrySpec::Fixed(f) => RetryPolicy {
            retry_type: Some(RetryType::Fixed),
            retry_interval: Some(f.interval.clone()).filter(|s| !s.is_empty()),
            retry_count: Some(f.count),
        },
    }
}

/// Only a `Fixed` policy comes back as a retry block.
pub fn decode(policy: &RetryPolicy) -> RetrySpec {
    match policy.retry_type {
        Some(RetryType::Fixed) => RetrySpec::Fixed(FixedRetry {
            interval: policy.retry_interval.clone().unwrap_or_default(),
            count: policy.retry_count.unwrap_or_default(),
        }),
        Some(RetryType::None | RetryType::Other(_)) | None => RetrySpec::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_encodes_to_none_discriminant() {
        let p = encode(&RetrySpec::None);
        assert_eq!(p.retry_type, Some(RetryType::None));
        assert_eq!(p.retry_interval, None);
        assert_eq!(p.retry_count, None);
    }

    #[test]
    fn fixed_round_trips() {
        let fixed = RetrySpec::Fixed(FixedRetry { interval: "00:01:00".into(), count: 5 });
        assert_eq!(decode(&encode(&fixed)), fixed);
    }

    #[test]
    fn other_discriminants_collapse_to_absent() {
        for t in [None, Some(RetryType::None), Some(RetryType::Other("Exponential".into()))] {
            let p = RetryPolicy {
                retry_type: t,
                retry_interval: Some("00:00:10".into()),
                retry_count: Some(3),
            };
            assert_eq!(decode(&p), RetrySpec::None);
        }
    }

    #[test]
    fn malformed_interval_is_passed_through() {
        let p = encode(&RetrySpec::Fixed(FixedRetry { interval: "soon".into(), count: 2 }));
        assert_eq!(p.retry_interval.as_deref(), Some("soon"));
    }
}
