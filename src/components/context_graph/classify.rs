//! Risk level and drift derivation for one raw trace node.

use serde_json::Value;

use super::fields::{first_bool, first_f64, first_str};
use super::types::{Drift, RiskLevel};

const RISK_KEYS: &[&str] = &["risk_level", "risk", "level", "severity"];
const RISK_BEFORE_KEYS: &[&str] = &["risk_before", "previous_risk"];
const RISK_AFTER_KEYS: &[&str] = &["risk_after", "current_risk"];
const DRIFT_SCORE_KEYS: &[&str] = &["drift_score"];
const CHANGED_KEYS: &[&str] = &["changed", "has_changed"];

/// Derive the discrete risk level and drift verdict for a raw node.
///
/// Total over any JSON value: missing or malformed fields degrade to
/// [`RiskLevel::Safe`] and "no drift" instead of erroring. Drift is detected
/// when a positive `drift_score` is present, an explicit changed flag is
/// set, or a before/after risk pair resolves to two different levels.
pub fn classify(raw: &Value) -> (RiskLevel, Drift) {
	let risk = first_str(raw, RISK_KEYS)
		.map(RiskLevel::parse)
		.unwrap_or(RiskLevel::Safe);

	let magnitude = first_f64(raw, DRIFT_SCORE_KEYS);
	let flagged = first_bool(raw, CHANGED_KEYS).unwrap_or(false);
	let from = first_str(raw, RISK_BEFORE_KEYS).map(RiskLevel::parse);
	let to = first_str(raw, RISK_AFTER_KEYS).map(RiskLevel::parse);
	let transitioned = matches!((from, to), (Some(f), Some(t)) if f != t);

	let detected = magnitude.is_some_and(|m| m > 0.0) || flagged || transitioned;
	(
		risk,
		Drift {
			detected,
			magnitude,
			from,
			to,
		},
	)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn empty_object_is_safe_with_no_drift() {
		let (risk, drift) = classify(&json!({}));
		assert_eq!(risk, RiskLevel::Safe);
		assert!(!drift.detected);
		assert_eq!(drift.magnitude, None);
	}

	#[test]
	fn non_object_input_degrades_the_same_way() {
		for raw in [json!(null), json!(42), json!("high"), json!([1])] {
			let (risk, drift) = classify(&raw);
			assert_eq!(risk, RiskLevel::Safe);
			assert!(!drift.detected);
		}
	}

	#[test]
	fn risk_resolution_order() {
		let raw = json!({ "risk_level": "critical", "risk": "low", "severity": "medium" });
		assert_eq!(classify(&raw).0, RiskLevel::Critical);
		let raw = json!({ "level": "medium", "severity": "high" });
		assert_eq!(classify(&raw).0, RiskLevel::Medium);
	}

	#[test]
	fn severity_alone_resolves_case_insensitively() {
		let (risk, _) = classify(&json!({ "severity": "High" }));
		assert_eq!(risk, RiskLevel::High);
	}

	#[test]
	fn unknown_risk_string_maps_to_safe() {
		assert_eq!(classify(&json!({ "risk": "catastrophic" })).0, RiskLevel::Safe);
	}

	#[test]
	fn drift_from_before_after_transition() {
		let (_, drift) = classify(&json!({ "risk_before": "low", "risk_after": "high" }));
		assert!(drift.detected);
		assert_eq!(drift.from, Some(RiskLevel::Low));
		assert_eq!(drift.to, Some(RiskLevel::High));
		assert_eq!(drift.magnitude, None);
	}

	#[test]
	fn equal_before_after_is_not_drift() {
		let (_, drift) = classify(&json!({ "previous_risk": "low", "current_risk": "low" }));
		assert!(!drift.detected);
	}

	#[test]
	fn only_one_side_of_the_pair_is_not_drift() {
		let (_, drift) = classify(&json!({ "risk_before": "low" }));
		assert!(!drift.detected);
	}

	#[test]
	fn drift_from_positive_score() {
		let (_, drift) = classify(&json!({ "drift_score": 0.4 }));
		assert!(drift.detected);
		assert_eq!(drift.magnitude, Some(0.4));
	}

	#[test]
	fn zero_score_is_not_drift_but_keeps_magnitude() {
		let (_, drift) = classify(&json!({ "drift_score": 0.0 }));
		assert!(!drift.detected);
		assert_eq!(drift.magnitude, Some(0.0));
	}

	#[test]
	fn drift_from_changed_flag() {
		assert!(classify(&json!({ "changed": true })).1.detected);
		assert!(classify(&json!({ "has_changed": true })).1.detected);
		assert!(!classify(&json!({ "changed": false })).1.detected);
	}
}
