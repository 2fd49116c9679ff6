//! Flow Feature Extraction
//!
//! Maps one flow record (controller flow entry or prediction request) onto
//! the loaded feature layout. All default substitution happens here:
//!
//! - duration: `life` if present and non-zero, else `durationSeconds`, else 0
//! - duration <= 0 (or non-finite) behaves exactly like 0
//! - rates are 0.0 when duration is 0, never a division by zero
//! - all traffic counts as forward; backward counts are always 0.0, the
//!   controller flow table carries no reverse-direction pairing
//! - missing packet/byte counts are 0.0

use super::layout::{FeatureSchema, FlowFeature};
use super::vector::FeatureVector;

/// Raw, unresolved traffic counters of one flow
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowObservation {
    pub life: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub packets: Option<f64>,
    pub bytes: Option<f64>,
}

/// Anything that can be turned into a feature vector
pub trait FlowRecord {
    fn observation(&self) -> FlowObservation;
}

impl FlowRecord for FlowObservation {
    fn observation(&self) -> FlowObservation {
        *self
    }
}

/// Resolved per-flow quantities, before layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowStats {
    pub duration: f64,
    pub packets: f64,
    pub bytes: f64,
}

impl FlowStats {
    pub fn resolve(obs: &FlowObservation) -> Self {
        let duration = obs
            .life
            .filter(|life| *life != 0.0)
            .or(obs.duration_seconds)
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(0.0);

        Self {
            duration,
            packets: finite_or_zero(obs.packets),
            bytes: finite_or_zero(obs.bytes),
        }
    }

    pub fn packets_per_second(&self) -> f64 {
        if self.duration > 0.0 {
            self.packets / self.duration
        } else {
            0.0
        }
    }

    pub fn bytes_per_second(&self) -> f64 {
        if self.duration > 0.0 {
            self.bytes / self.duration
        } else {
            0.0
        }
    }

    pub fn value(&self, feature: FlowFeature) -> f64 {
        match feature {
            FlowFeature::Duration => self.duration,
            FlowFeature::FwdPackets => self.packets,
            FlowFeature::BwdPackets => 0.0,
            FlowFeature::FwdBytes => self.bytes,
            FlowFeature::BwdBytes => 0.0,
            FlowFeature::BytesPerSecond => self.bytes_per_second(),
            FlowFeature::PacketsPerSecond => self.packets_per_second(),
        }
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Builds vectors in the layout the model was trained on
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    schema: FeatureSchema,
}

impl FeatureExtractor {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn extract<R: FlowRecord + ?Sized>(&self, record: &R) -> FeatureVector {
        let stats = FlowStats::resolve(&record.observation());
        let values = self
            .schema
            .features()
            .iter()
            .map(|feature| stats.value(*feature))
            .collect();

        FeatureVector::with_schema(&self.schema, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::layout::*;

    fn obs(duration: Option<f64>, packets: Option<f64>, bytes: Option<f64>) -> FlowObservation {
        FlowObservation {
            life: None,
            duration_seconds: duration,
            packets,
            bytes,
        }
    }

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(FeatureSchema::canonical())
    }

    #[test]
    fn test_zero_duration_passes_counts_through() {
        let v = extractor().extract(&obs(Some(0.0), Some(500.0), Some(50000.0)));
        assert_eq!(v.get(FLOW_PKTS_S), Some(0.0));
        assert_eq!(v.get(FLOW_BYTS_S), Some(0.0));
        assert_eq!(v.get(TOT_FWD_PKTS), Some(500.0));
        assert_eq!(v.get(TOTLEN_FWD_PKTS), Some(50000.0));
        assert_eq!(v.get(FLOW_DURATION), Some(0.0));
    }

    #[test]
    fn test_rates_over_positive_duration() {
        let v = extractor().extract(&obs(Some(10.0), Some(100.0), Some(1000.0)));
        assert_eq!(v.get(FLOW_PKTS_S), Some(10.0));
        assert_eq!(v.get(FLOW_BYTS_S), Some(100.0));
        assert_eq!(v.get(FLOW_DURATION), Some(10.0));
    }

    #[test]
    fn test_non_positive_durations_give_zero_rates() {
        let durations = [0.0, -0.0, -1.0, -1e9, f64::NEG_INFINITY, f64::NAN, f64::INFINITY];
        for d in durations {
            let v = extractor().extract(&obs(Some(d), Some(42.0), Some(4200.0)));
            for value in v.values() {
                assert!(value.is_finite(), "duration {} produced {}", d, value);
            }
            assert_eq!(v.get(FLOW_PKTS_S), Some(0.0), "duration {}", d);
            assert_eq!(v.get(FLOW_BYTS_S), Some(0.0), "duration {}", d);
            assert_eq!(v.get(FLOW_DURATION), Some(0.0), "duration {}", d);
        }
    }

    #[test]
    fn test_backward_direction_always_zero() {
        let v = extractor().extract(&obs(Some(3.0), Some(9.0), Some(900.0)));
        assert_eq!(v.get(TOT_BWD_PKTS), Some(0.0));
        assert_eq!(v.get(TOTLEN_BWD_PKTS), Some(0.0));
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let v = extractor().extract(&FlowObservation::default());
        assert!(v.values().iter().all(|value| *value == 0.0));
        assert_eq!(v.len(), KNOWN_FEATURES.len());
    }

    #[test]
    fn test_life_preferred_over_duration_seconds() {
        let record = FlowObservation {
            life: Some(4.0),
            duration_seconds: Some(8.0),
            packets: Some(40.0),
            bytes: None,
        };
        let v = extractor().extract(&record);
        assert_eq!(v.get(FLOW_DURATION), Some(4.0));
        assert_eq!(v.get(FLOW_PKTS_S), Some(10.0));
    }

    #[test]
    fn test_zero_life_falls_back_to_duration_seconds() {
        let record = FlowObservation {
            life: Some(0.0),
            duration_seconds: Some(5.0),
            packets: Some(50.0),
            bytes: Some(500.0),
        };
        let v = extractor().extract(&record);
        assert_eq!(v.get(FLOW_DURATION), Some(5.0));
        assert_eq!(v.get(FLOW_BYTS_S), Some(100.0));
    }

    #[test]
    fn test_keys_follow_loaded_schema_order() {
        let order = [FLOW_PKTS_S, TOT_BWD_PKTS, FLOW_DURATION, TOTLEN_FWD_PKTS];
        let schema = FeatureSchema::new(order.iter().map(|s| s.to_string()).collect()).unwrap();
        let extractor = FeatureExtractor::new(schema.clone());

        let inputs = [
            obs(None, None, None),
            obs(Some(2.0), Some(10.0), Some(100.0)),
            obs(Some(-5.0), Some(1.0), None),
        ];
        for input in inputs {
            let v = extractor.extract(&input);
            assert_eq!(v.names(), schema.names());
            assert_eq!(v.layout_hash(), schema.hash());
        }

        let v = extractor.extract(&obs(Some(2.0), Some(10.0), Some(100.0)));
        assert_eq!(v.values(), &[5.0, 0.0, 2.0, 100.0]);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let record = obs(Some(7.0), Some(70.0), Some(7000.0));
        assert_eq!(extractor().extract(&record), extractor().extract(&record));
    }
}
