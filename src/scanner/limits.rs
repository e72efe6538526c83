//! File-descriptor budgeting for the connection pool.
//!
//! Every in-flight connect holds a socket, and every host being scanned holds
//! two checkpoint files. The pool capacity must fit under the process's
//! RLIMIT_NOFILE soft limit or connects start failing with EMFILE.

use crate::types::Subnet;

/// Descriptors kept free for stdio, the runtime and ping children.
pub const BASE_RESERVE: u64 = 64;

/// Descriptors reserved for checkpoint files when every candidate is alive.
pub const CHECKPOINT_RESERVE: u64 = 2 * Subnet::HOST_COUNT as u64;

/// Pool capacity that fits under `limit`, never below one.
pub fn clamp_to_limit(requested: usize, limit: Option<u64>) -> usize {
    let requested = requested.max(1);
    match limit {
        Some(limit) => {
            let available = limit.saturating_sub(BASE_RESERVE + CHECKPOINT_RESERVE);
            let available = usize::try_from(available).unwrap_or(usize::MAX);
            requested.min(available).max(1)
        }
        None => requested,
    }
}

/// Raise the soft descriptor limit toward what `requested` needs and return
/// the capacity the pool can safely use.
pub fn effective_concurrency(requested: usize) -> usize {
    let wanted = requested as u64 + BASE_RESERVE + CHECKPOINT_RESERVE;
    let limit = raise_descriptor_limit(wanted);
    let effective = clamp_to_limit(requested, limit);

    if effective < requested {
        tracing::warn!(
            requested,
            effective,
            limit = ?limit,
            "descriptor limit too low, reducing scan concurrency"
        );
    }
    effective
}

/// Soft limit to request so that `wanted` descriptors fit, capped by the hard
/// limit. `None` when no change is needed or possible.
#[cfg_attr(not(unix), allow(dead_code))]
fn raised_soft_limit(wanted: u64, soft: u64, hard: u64) -> Option<u64> {
    let target = wanted.min(hard);
    (target > soft).then_some(target)
}

/// Try to lift the soft RLIMIT_NOFILE to `wanted` (capped by the hard limit).
///
/// Returns the soft limit in force afterwards, or `None` if unknown.
#[cfg(unix)]
fn raise_descriptor_limit(wanted: u64) -> Option<u64> {
    use rlimit::Resource;

    let (soft, hard) = match Resource::NOFILE.get() {
        Ok(limits) => limits,
        Err(e) => {
            tracing::debug!(error = %e, "could not read descriptor limit");
            return None;
        }
    };

    match raised_soft_limit(wanted, soft, hard) {
        Some(target) => match Resource::NOFILE.set(target, hard) {
            Ok(()) => {
                tracing::debug!(from = soft, to = target, "raised descriptor limit");
                Some(target)
            }
            Err(e) => {
                tracing::debug!(error = %e, "could not raise descriptor limit");
                Some(soft)
            }
        },
        None => Some(soft),
    }
}

#[cfg(not(unix))]
fn raise_descriptor_limit(_wanted: u64) -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_limit_keeps_request() {
        assert_eq!(clamp_to_limit(500, None), 500);
        assert_eq!(clamp_to_limit(0, None), 1);
    }

    #[test]
    fn test_clamps_under_soft_limit() {
        let reserve = BASE_RESERVE + CHECKPOINT_RESERVE;
        assert_eq!(clamp_to_limit(500, Some(reserve + 100)), 100);
        assert_eq!(clamp_to_limit(500, Some(reserve + 10_000)), 500);
    }

    #[test]
    fn test_tiny_limit_still_allows_one() {
        assert_eq!(clamp_to_limit(500, Some(16)), 1);
    }

    #[test]
    fn test_raise_is_capped_by_hard_limit() {
        assert_eq!(raised_soft_limit(4096, 1024, 2048), Some(2048));
        assert_eq!(raised_soft_limit(4096, 1024, 8192), Some(4096));
        assert_eq!(raised_soft_limit(512, 1024, 8192), None);
        assert_eq!(raised_soft_limit(4096, 4096, 4096), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_reported_limit_matches_process_limit() {
        let (soft, _) = rlimit::Resource::NOFILE.get().unwrap();
        let reported = raise_descriptor_limit(soft).unwrap();
        assert!(reported >= soft);
    }

    #[test]
    fn test_effective_concurrency_is_positive() {
        let effective = effective_concurrency(8);
        assert!(effective >= 1 && effective <= 8);
    }
}
