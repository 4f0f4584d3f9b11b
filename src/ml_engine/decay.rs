//! Time-decay of reward effectiveness.
//!
//! A reward promised far ahead of the event motivates less than the same
//! reward close to it. The model sees `reward * exp(-lambda * date_gap)`
//! next to the nominal amount; `lambda` is chosen by cross-validation.

/// Effective (time-decayed) reward.
///
/// Domain: `reward >= 0`, `date_gap >= 0`, `lambda >= 0`. Identity when
/// `lambda == 0` or `date_gap == 0`; non-increasing in `date_gap` otherwise.
#[inline]
pub fn effective_reward(reward: f64, date_gap: f64, lambda: f64) -> f64 {
    reward * (-lambda * date_gap).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_without_decay() {
        assert_eq!(effective_reward(3000.0, 12.0, 0.0), 3000.0);
        assert_eq!(effective_reward(3000.0, 0.0, 0.08), 3000.0);
    }

    #[test]
    fn test_never_exceeds_nominal() {
        for &lambda in &[0.0, 0.01, 0.03, 0.05, 0.08, 1.5] {
            for gap in 0..60 {
                for &reward in &[0.0, 1.0, 500.0, 8000.0, 1e7] {
                    let eff = effective_reward(reward, f64::from(gap), lambda);
                    assert!(eff <= reward, "eff {eff} > reward {reward}");
                    let equal = lambda == 0.0 || gap == 0 || reward == 0.0;
                    assert_eq!(eff == reward, equal, "lambda {lambda} gap {gap} reward {reward}");
                }
            }
        }
    }

    #[test]
    fn test_monotone_in_gap() {
        let mut prev = f64::INFINITY;
        for gap in 0..40 {
            let eff = effective_reward(1000.0, f64::from(gap), 0.05);
            assert!(eff < prev);
            prev = eff;
        }
        assert!((effective_reward(1000.0, 20.0, 0.05) - 1000.0 * (-1.0f64).exp()).abs() < 1e-9);
    }
}
