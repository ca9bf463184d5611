//! Maintenance recommendations keyed by health state and dominant cause.

use crate::types::{FaultType, HealthState};

pub const NOMINAL: &str = "Operating within normal parameters. No action required.";
pub const BEARING_WEAR: &str =
    "Bearing race spalling suspected. Replace the drive-end bearing and inspect lubrication.";
pub const ROTOR_UNBALANCE: &str =
    "Rotor unbalance suspected. Clean fan blades of debris and check balance weights.";
pub const UNATTRIBUTED: &str =
    "Elevated vibration without a clear signature. Check for loose mounting: tighten foundation bolts and inspect isolation pads.";
pub const CRITICAL_PREFIX: &str = "IMMEDIATE ACTION REQUIRED.";

/// Repair guidance for a verdict.
pub fn recommend(state: HealthState, cause: Option<FaultType>) -> String {
    let body = match (state, cause) {
        (HealthState::Nominal, _) => return NOMINAL.to_string(),
        (_, Some(FaultType::BearingWear)) => BEARING_WEAR,
        (_, Some(FaultType::RotorUnbalance)) => ROTOR_UNBALANCE,
        (_, Some(FaultType::None)) | (_, None) => UNATTRIBUTED,
    };
    match state {
        HealthState::Critical => format!("{} {}", CRITICAL_PREFIX, body),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendations() {
        assert_eq!(recommend(HealthState::Nominal, Some(FaultType::BearingWear)), NOMINAL);
        assert_eq!(recommend(HealthState::Warning, Some(FaultType::RotorUnbalance)), ROTOR_UNBALANCE);
        assert_eq!(recommend(HealthState::Warning, None), UNATTRIBUTED);

        let critical = recommend(HealthState::Critical, Some(FaultType::BearingWear));
        assert!(critical.starts_with(CRITICAL_PREFIX));
        assert!(critical.contains("drive-end bearing"));
    }
}
