//! Run statistics.

use serde::Serialize;

/// Counters describing one resolution run.
///
/// `cache_hits + fresh == modules`; `fresh` equals the number of transform
/// chain invocations the run performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// Records emitted.
    pub modules: usize,
    /// Modules reused verbatim from the cache.
    pub cache_hits: usize,
    /// Modules loaded, transformed, and re-extracted this run.
    pub fresh: usize,
}

impl ResolveStats {
    /// Fraction of modules served from cache, 0.0 on an empty run.
    pub fn hit_rate(&self) -> f64 {
        if self.modules == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.modules as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_handles_empty_run() {
        assert_eq!(ResolveStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_is_hits_over_modules() {
        let stats = ResolveStats {
            modules: 4,
            cache_hits: 3,
            fresh: 1,
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
