//! Controller flow entry model

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::logic::features::{FlowObservation, FlowRecord};

/// One entry of the controller's `/flows` list.
///
/// Every field is optional; absence is resolved by the feature extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFlow {
    #[serde(default, deserialize_with = "deserialize_flow_id")]
    pub id: Option<String>,
    pub device_id: Option<String>,
    /// Seconds since install (newer controllers)
    pub life: Option<f64>,
    /// Seconds since install (older controllers)
    pub duration_seconds: Option<f64>,
    pub packets: Option<f64>,
    pub bytes: Option<f64>,
    /// Match detail only; an unreadable selector is dropped, not the flow
    #[serde(default, deserialize_with = "lenient")]
    pub selector: Option<TrafficSelector>,
}

/// Match part of a flow rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrafficSelector {
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

/// One match criterion, e.g. `{"type": "IPV4_SRC", "ip": "10.0.0.1/32"}`.
///
/// Fields that fail to parse come out as `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tcp_port: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    pub udp_port: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    pub sctp_port: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    pub protocol: Option<u8>,
}

/// Addresses, ports and protocol of a flow, as far as the selector tells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowTuple {
    pub src_addr: Option<String>,
    pub dst_addr: Option<String>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub protocol: Option<u8>,
}

impl RawFlow {
    fn criterion(&self, kinds: &[&str]) -> Option<&Criterion> {
        self.selector
            .as_ref()?
            .criteria
            .iter()
            .find(|c| kinds.contains(&c.kind.as_str()))
    }

    pub fn src_addr(&self) -> Option<&str> {
        self.criterion(&["IPV4_SRC", "IPV6_SRC"])?.ip.as_deref()
    }

    pub fn dst_addr(&self) -> Option<&str> {
        self.criterion(&["IPV4_DST", "IPV6_DST"])?.ip.as_deref()
    }

    pub fn src_port(&self) -> Option<u16> {
        let c = self.criterion(&["TCP_SRC", "UDP_SRC", "SCTP_SRC"])?;
        c.tcp_port.or(c.udp_port).or(c.sctp_port)
    }

    pub fn dst_port(&self) -> Option<u16> {
        let c = self.criterion(&["TCP_DST", "UDP_DST", "SCTP_DST"])?;
        c.tcp_port.or(c.udp_port).or(c.sctp_port)
    }

    pub fn protocol(&self) -> Option<u8> {
        self.criterion(&["IP_PROTO"])?.protocol
    }

    pub fn tuple(&self) -> FlowTuple {
        FlowTuple {
            src_addr: self.src_addr().map(str::to_string),
            dst_addr: self.dst_addr().map(str::to_string),
            src_port: self.src_port(),
            dst_port: self.dst_port(),
            protocol: self.protocol(),
        }
    }
}

impl FlowRecord for RawFlow {
    fn observation(&self) -> FlowObservation {
        FlowObservation {
            life: self.life,
            duration_seconds: self.duration_seconds,
            packets: self.packets,
            bytes: self.bytes,
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlowIdRepr {
    Text(String),
    Number(serde_json::Number),
}

/// Flow ids arrive as JSON strings from the REST API and as numbers from
/// controller-side apps; both become strings.
pub(crate) fn deserialize_flow_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<FlowIdRepr>::deserialize(deserializer)?;
    Ok(id.map(|repr| match repr {
        FlowIdRepr::Text(s) => s,
        FlowIdRepr::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_onos_flow() {
        let flow: RawFlow = serde_json::from_value(json!({
            "id": "54043195528453770",
            "deviceId": "of:0000000000000001",
            "life": 12,
            "packets": 120,
            "bytes": 9000,
            "priority": 40000,
            "selector": {"criteria": [
                {"type": "ETH_TYPE", "ethType": "0x800"},
                {"type": "IPV4_SRC", "ip": "10.0.0.1/32"},
                {"type": "IPV4_DST", "ip": "10.0.0.2/32"},
                {"type": "IP_PROTO", "protocol": 6},
                {"type": "TCP_DST", "tcpPort": 80}
            ]}
        }))
        .unwrap();

        assert_eq!(flow.id.as_deref(), Some("54043195528453770"));
        assert_eq!(flow.device_id.as_deref(), Some("of:0000000000000001"));
        assert_eq!(flow.src_addr(), Some("10.0.0.1/32"));
        assert_eq!(flow.dst_addr(), Some("10.0.0.2/32"));
        assert_eq!(flow.protocol(), Some(6));
        assert_eq!(flow.dst_port(), Some(80));
        assert_eq!(flow.src_port(), None);

        let obs = flow.observation();
        assert_eq!(obs.life, Some(12.0));
        assert_eq!(obs.packets, Some(120.0));
    }

    #[test]
    fn test_numeric_flow_id() {
        let flow: RawFlow = serde_json::from_value(json!({"id": 281475001385337u64})).unwrap();
        assert_eq!(flow.id.as_deref(), Some("281475001385337"));
    }

    #[test]
    fn test_all_fields_optional() {
        let flow: RawFlow = serde_json::from_value(json!({})).unwrap();
        assert!(flow.id.is_none());
        assert_eq!(flow.observation(), FlowObservation::default());
        assert_eq!(flow.src_addr(), None);

        let flow: RawFlow = serde_json::from_value(json!({"life": null, "packets": null})).unwrap();
        assert!(flow.life.is_none());
    }

    #[test]
    fn test_bad_criterion_keeps_flow_stats() {
        let flow: RawFlow = serde_json::from_value(json!({
            "id": "9",
            "life": 4,
            "packets": 40,
            "bytes": 4000,
            "selector": {"criteria": [
                {"type": "IP_PROTO", "protocol": 300},
                {"type": "IPV4_DST", "ip": "10.0.0.9/32"},
                {"tcpPort": 22}
            ]}
        }))
        .unwrap();

        assert_eq!(flow.packets, Some(40.0));
        assert_eq!(flow.protocol(), None);
        assert_eq!(flow.dst_addr(), Some("10.0.0.9/32"));

        let flow: RawFlow = serde_json::from_value(json!({
            "packets": 3,
            "selector": {"criteria": "none"}
        }))
        .unwrap();
        assert!(flow.selector.is_none());
        assert_eq!(flow.packets, Some(3.0));
    }

    #[test]
    fn test_tuple_from_selector() {
        let flow: RawFlow = serde_json::from_value(json!({
            "selector": {"criteria": [
                {"type": "IPV4_SRC", "ip": "10.0.0.1/32"},
                {"type": "IPV4_DST", "ip": "10.0.0.2/32"},
                {"type": "IP_PROTO", "protocol": 17},
                {"type": "UDP_SRC", "udpPort": 5353},
                {"type": "UDP_DST", "udpPort": 53}
            ]}
        }))
        .unwrap();

        assert_eq!(
            flow.tuple(),
            FlowTuple {
                src_addr: Some("10.0.0.1/32".to_string()),
                dst_addr: Some("10.0.0.2/32".to_string()),
                src_port: Some(5353),
                dst_port: Some(53),
                protocol: Some(17),
            }
        );
        assert_eq!(RawFlow::default().tuple(), FlowTuple::default());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let result = serde_json::from_value::<RawFlow>(json!({"packets": "many"}));
        assert!(result.is_err());
    }
}
