use bytes::Bytes;

use super::profile::QualityProfile;

/// Fractional size reduction of an output relative to the original.
///
/// Clamped to >= 0: expansion is never reported because the adapters fall
/// back to the original bytes when recompression would grow the file.
pub fn compression_ratio(original_size: u64, output_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (1.0 - output_size as f64 / original_size as f64).max(0.0)
}

/// Result of running one quality profile against one source document.
#[derive(Debug, Clone)]
pub enum CompressionOutcome {
    Success {
        data: Bytes,
        size: u64,
        compression_ratio: f64,
    },
    Failure {
        reason: String,
    },
}

impl CompressionOutcome {
    pub fn success(data: Bytes, original_size: u64) -> Self {
        let size = data.len() as u64;
        CompressionOutcome::Success {
            data,
            size,
            compression_ratio: compression_ratio(original_size, size),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        CompressionOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CompressionOutcome::Success { .. })
    }
}

/// Exactly one outcome per profile; the orchestrator always fills all three
/// slots, success or failure.
#[derive(Debug, Clone)]
pub struct ProfileOutcomes {
    pub extreme: CompressionOutcome,
    pub medium: CompressionOutcome,
    pub basic: CompressionOutcome,
}

impl ProfileOutcomes {
    pub fn get(&self, profile: QualityProfile) -> &CompressionOutcome {
        match profile {
            QualityProfile::Extreme => &self.extreme,
            QualityProfile::Medium => &self.medium,
            QualityProfile::Basic => &self.basic,
        }
    }

    pub fn set(&mut self, profile: QualityProfile, outcome: CompressionOutcome) {
        match profile {
            QualityProfile::Extreme => self.extreme = outcome,
            QualityProfile::Medium => self.medium = outcome,
            QualityProfile::Basic => self.basic = outcome,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (QualityProfile, &CompressionOutcome)> {
        QualityProfile::ALL.iter().map(move |&p| (p, self.get(p)))
    }

    pub fn all_failed(&self) -> bool {
        self.iter().all(|(_, outcome)| !outcome.is_success())
    }
}

impl Default for ProfileOutcomes {
    fn default() -> Self {
        Self {
            extreme: CompressionOutcome::failure("not yet processed"),
            medium: CompressionOutcome::failure("not yet processed"),
            basic: CompressionOutcome::failure("not yet processed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_basic() {
        assert!((compression_ratio(100, 20) - 0.8).abs() < 1e-9);
        assert!((compression_ratio(100, 100) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_never_negative() {
        assert_eq!(compression_ratio(100, 150), 0.0);
        assert_eq!(compression_ratio(0, 10), 0.0);
    }

    #[test]
    fn test_success_outcome_carries_ratio() {
        let outcome = CompressionOutcome::success(Bytes::from(vec![0u8; 25]), 100);
        match outcome {
            CompressionOutcome::Success {
                size,
                compression_ratio,
                ..
            } => {
                assert_eq!(size, 25);
                assert!((compression_ratio - 0.75).abs() < 1e-9);
            }
            CompressionOutcome::Failure { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn test_outcomes_slot_access() {
        let mut outcomes = ProfileOutcomes::default();
        assert!(outcomes.all_failed());

        outcomes.set(
            QualityProfile::Medium,
            CompressionOutcome::success(Bytes::from_static(b"x"), 10),
        );
        assert!(outcomes.get(QualityProfile::Medium).is_success());
        assert!(!outcomes.get(QualityProfile::Extreme).is_success());
        assert!(!outcomes.all_failed());
    }

    #[test]
    fn test_iter_yields_all_profiles_in_order() {
        let outcomes = ProfileOutcomes::default();
        let profiles: Vec<QualityProfile> = outcomes.iter().map(|(p, _)| p).collect();
        assert_eq!(
            profiles,
            vec![
                QualityProfile::Extreme,
                QualityProfile::Medium,
                QualityProfile::Basic
            ]
        );
    }
}
