//! Cache validity decision
//!
//! Classifies the cache once per build. Nothing here touches the store: a
//! stale cache is left in place until the next save clears it, so a build
//! that fails after a version change still leaves the old cache for a retry.

use crate::cache::signature::Signature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Usability of the cache for the current build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStatus {
    /// Store populated and produced by the current signature
    Valid,
    /// Store empty or never populated
    NoCache,
    /// Store populated by a different signature
    NewVersion,
    /// Caller forced invalidation (flag, disabled cache, format bump)
    Invalidated,
}

impl CacheStatus {
    /// Whether restore should run
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Label used in logs and machine-readable output
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::NoCache => "no-cache",
            Self::NewVersion => "new-version",
            Self::Invalidated => "invalidated",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Why the caller asked for the cache to be ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Explicit operator request for this build
    Requested,
    /// Caching turned off in configuration
    Disabled,
    /// Stored cache-format marker differs from the configured one
    FormatChanged {
        stored: Option<u32>,
        current: u32,
    },
}

impl fmt::Display for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => write!(f, "cache invalidation requested"),
            Self::Disabled => write!(f, "caching is disabled in configuration"),
            Self::FormatChanged {
                stored: Some(stored),
                current,
            } => write!(f, "cache format changed from {} to {}", stored, current),
            Self::FormatChanged {
                stored: None,
                current,
            } => write!(f, "unreadable cache format marker (expected {})", current),
        }
    }
}

/// Status plus a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheReport {
    pub status: CacheStatus,
    pub reason: String,
}

/// Everything the validity decision depends on
#[derive(Debug, Clone)]
pub struct ValidationInputs<'a> {
    /// Signature of the current build environment
    pub current: &'a Signature,
    /// Signature persisted with the cache, if any
    pub stored: Option<&'a Signature>,
    /// Whether the store holds at least one entry
    pub store_populated: bool,
    /// Forced invalidation, if any
    pub invalidation: Option<Invalidation>,
}

/// Decide whether the cache may be restored
pub fn evaluate(inputs: &ValidationInputs<'_>) -> CacheReport {
    if let Some(invalidation) = &inputs.invalidation {
        return CacheReport {
            status: CacheStatus::Invalidated,
            reason: invalidation.to_string(),
        };
    }

    if !inputs.store_populated {
        return CacheReport {
            status: CacheStatus::NoCache,
            reason: "no cache found".to_string(),
        };
    }

    match inputs.stored {
        Some(stored) if stored == inputs.current => CacheReport {
            status: CacheStatus::Valid,
            reason: format!("cache produced by {}", stored),
        },
        Some(stored) => CacheReport {
            status: CacheStatus::NewVersion,
            reason: format!("signature changed from {} to {}", stored, inputs.current),
        },
        None => CacheReport {
            status: CacheStatus::NewVersion,
            reason: format!("cache has no signature (current {})", inputs.current),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(s: &str) -> Signature {
        Signature::new(s).unwrap()
    }

    #[test]
    fn empty_store_is_no_cache_regardless_of_signature() {
        let current = sig("v1");
        for stored in [None, Some(&current)] {
            let report = evaluate(&ValidationInputs {
                current: &current,
                stored,
                store_populated: false,
                invalidation: None,
            });
            assert_eq!(report.status, CacheStatus::NoCache);
        }
    }

    #[test]
    fn matching_signature_is_valid() {
        let current = sig("v1");
        let stored = sig("v1");
        let report = evaluate(&ValidationInputs {
            current: &current,
            stored: Some(&stored),
            store_populated: true,
            invalidation: None,
        });
        assert_eq!(report.status, CacheStatus::Valid);
        assert!(report.status.is_valid());
    }

    #[test]
    fn mismatched_signature_is_new_version() {
        let current = sig("v2");
        let stored = sig("v1");
        let report = evaluate(&ValidationInputs {
            current: &current,
            stored: Some(&stored),
            store_populated: true,
            invalidation: None,
        });
        assert_eq!(report.status, CacheStatus::NewVersion);
        assert_eq!(report.reason, "signature changed from v1 to v2");
    }

    #[test]
    fn missing_signature_with_entries_is_new_version() {
        let current = sig("v1");
        let report = evaluate(&ValidationInputs {
            current: &current,
            stored: None,
            store_populated: true,
            invalidation: None,
        });
        assert_eq!(report.status, CacheStatus::NewVersion);
    }

    #[test]
    fn invalidation_short_circuits() {
        let current = sig("v1");
        let report = evaluate(&ValidationInputs {
            current: &current,
            stored: Some(&current),
            store_populated: true,
            invalidation: Some(Invalidation::FormatChanged {
                stored: Some(1),
                current: 2,
            }),
        });
        assert_eq!(report.status, CacheStatus::Invalidated);
        assert_eq!(report.reason, "cache format changed from 1 to 2");
        assert!(!report.status.is_valid());

        let report = evaluate(&ValidationInputs {
            current: &current,
            stored: None,
            store_populated: false,
            invalidation: Some(Invalidation::Requested),
        });
        assert_eq!(report.status, CacheStatus::Invalidated);
    }

    #[test]
    fn status_labels() {
        assert_eq!(CacheStatus::NoCache.to_string(), "no-cache");
        assert_eq!(CacheStatus::NewVersion.to_string(), "new-version");
        assert_eq!(
            serde_json::to_string(&CacheStatus::Invalidated).unwrap(),
            "\"invalidated\""
        );
    }
}
