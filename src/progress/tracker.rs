// Iteration progress tracking

use crate::analysis::CategorizedErrors;

/// Decides whether consecutive iterations are still making headway, based on
/// how far the critical and high error counts moved in either direction.
#[derive(Debug, Clone, Copy)]
pub struct ProgressTracker {
    /// Absolute critical-count change at or below this means a plateau
    critical_delta: i64,
    /// Absolute high-count change at or below this means a plateau
    high_delta: i64,
}

impl ProgressTracker {
    pub fn new(critical_delta: i64, high_delta: i64) -> Self {
        Self {
            critical_delta,
            high_delta,
        }
    }

    /// True when the error counts barely moved since the previous iteration,
    /// in either direction. A large swing, improvement or regression, means
    /// the patches are still having an effect. The first iteration has
    /// nothing to compare against and is never stagnant.
    pub fn is_stagnant(
        &self,
        previous: Option<&CategorizedErrors>,
        current: &CategorizedErrors,
    ) -> bool {
        let Some(previous) = previous else {
            return false;
        };

        let critical_change =
            (previous.critical.len() as i64 - current.critical.len() as i64).abs();
        let high_change = (previous.high.len() as i64 - current.high.len() as i64).abs();

        let stagnant = critical_change <= self.critical_delta && high_change <= self.high_delta;
        if stagnant {
            tracing::warn!(
                "No significant progress: critical {} -> {}, high {} -> {}",
                previous.critical.len(),
                current.critical.len(),
                previous.high.len(),
                current.high.len()
            );
        }
        stagnant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(critical: usize, high: usize) -> CategorizedErrors {
        CategorizedErrors {
            critical: vec!["c".to_string(); critical],
            high: vec!["h".to_string(); high],
            ..Default::default()
        }
    }

    #[test]
    fn test_first_iteration_is_never_stagnant() {
        let tracker = ProgressTracker::new(0, 2);
        assert!(!tracker.is_stagnant(None, &errors(10, 10)));
    }

    #[test]
    fn test_unchanged_counts_are_stagnant() {
        let tracker = ProgressTracker::new(0, 2);
        assert!(tracker.is_stagnant(Some(&errors(3, 5)), &errors(3, 5)));
    }

    #[test]
    fn test_critical_reduction_is_progress() {
        let tracker = ProgressTracker::new(0, 2);
        assert!(!tracker.is_stagnant(Some(&errors(3, 5)), &errors(2, 5)));
    }

    #[test]
    fn test_small_high_reduction_alone_is_stagnant() {
        let tracker = ProgressTracker::new(0, 2);
        assert!(tracker.is_stagnant(Some(&errors(3, 5)), &errors(3, 3)));
    }

    #[test]
    fn test_large_high_reduction_is_progress() {
        let tracker = ProgressTracker::new(0, 2);
        assert!(!tracker.is_stagnant(Some(&errors(3, 8)), &errors(3, 5)));
    }

    #[test]
    fn test_small_high_increase_is_stagnant() {
        let tracker = ProgressTracker::new(0, 2);
        assert!(tracker.is_stagnant(Some(&errors(3, 5)), &errors(3, 6)));
    }

    #[test]
    fn test_large_high_increase_is_not_stagnant() {
        let tracker = ProgressTracker::new(0, 2);
        assert!(!tracker.is_stagnant(Some(&errors(3, 5)), &errors(3, 9)));
    }

    #[test]
    fn test_large_regression_is_not_stagnant() {
        // the counts swung hard, so the patches are still doing something
        let tracker = ProgressTracker::new(0, 2);
        assert!(!tracker.is_stagnant(Some(&errors(1, 2)), &errors(4, 6)));
    }

    #[test]
    fn test_thresholds_are_tunable() {
        let tracker = ProgressTracker::new(1, 0);
        // one fewer critical error no longer counts as progress
        assert!(tracker.is_stagnant(Some(&errors(3, 5)), &errors(2, 5)));
    }
}
