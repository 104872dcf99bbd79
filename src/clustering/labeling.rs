//! Rule-based naming of climate regimes from their feature signature.

use super::tricluster::{Direction, SignatureEntry};

pub const STABLE_CLOUDY: &str = "Stable cloudy-like regime";
pub const DRY_HEAT: &str = "Dry heat regime";
pub const VOLATILE: &str = "Transition / volatile regime";
pub const COOL_SEASON: &str = "Cool season regime";
pub const SEASONAL: &str = "Seasonal regime";

/// Label a regime from its top-ranked signature; the first matching rule
/// wins. Features absent from the signature match neither direction.
pub fn label_regime(signature: &[SignatureEntry]) -> &'static str {
    let is = |feature: &str, direction: Direction| {
        signature
            .iter()
            .any(|e| e.feature == feature && e.direction == direction)
    };
    let high = |f: &str| is(f, Direction::High);
    let low = |f: &str| is(f, Direction::Low);

    if low("diurnal_mean") && low("tavg_std") && low("roll_std_mean") {
        STABLE_CLOUDY
    } else if high("tavg_mean") && high("diurnal_mean") {
        DRY_HEAT
    } else if high("delta_1_mean") || high("roll_std_mean") || high("tavg_std") {
        VOLATILE
    } else if low("tavg_mean") {
        COOL_SEASON
    } else {
        SEASONAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(entries: &[(&str, f64)]) -> Vec<SignatureEntry> {
        entries
            .iter()
            .map(|&(f, z)| SignatureEntry::new(f, z))
            .collect()
    }

    #[test]
    fn rules_apply_in_order() {
        let calm = sig(&[
            ("diurnal_mean", -1.0),
            ("tavg_std", -0.5),
            ("roll_std_mean", -0.2),
            ("tavg_mean", 2.0),
        ]);
        assert_eq!(label_regime(&calm), STABLE_CLOUDY);

        let hot = sig(&[("tavg_mean", 1.5), ("diurnal_mean", 0.3), ("tavg_std", 0.9)]);
        assert_eq!(label_regime(&hot), DRY_HEAT);

        let jumpy = sig(&[("tavg_mean", 1.5), ("delta_1_mean", 0.1)]);
        assert_eq!(label_regime(&jumpy), VOLATILE);

        let cold = sig(&[("tavg_mean", -1.2), ("anomaly_mean", 0.4)]);
        assert_eq!(label_regime(&cold), COOL_SEASON);

        assert_eq!(label_regime(&sig(&[("anomaly_mean", 0.4)])), SEASONAL);
        assert_eq!(label_regime(&[]), SEASONAL);
    }

    #[test]
    fn zero_score_counts_as_high() {
        let flat = sig(&[("tavg_std", 0.0)]);
        assert_eq!(label_regime(&flat), VOLATILE);
    }
}
