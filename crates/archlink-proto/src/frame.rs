//! JSON array framing.
//!
//! A frame is one WebSocket text message holding a JSON array of packet
//! objects. Outbound, several packets may share a frame; the server processes
//! them in array order, which is what makes `[Sync, LocationChecks]` an
//! ordered pair.
//!
//! Inbound decoding is two-stage: the frame must parse as an array, then each
//! element is decoded on its own. Elements that carry a known `cmd` but a
//! malformed body are surfaced as [`InboundPacket::Malformed`] rather than
//! dropped silently, since a malformed `Connected` or `ConnectionRefused`
//! still terminates a handshake.

use serde_json::Value;

use crate::{
    errors::{ProtocolError, Result},
    packet::{ClientPacket, ServerPacket},
};

/// A packet that carried a `cmd` this client knows but failed to decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedPacket {
    /// The packet's `cmd`, empty if absent.
    pub cmd: String,
    /// Decoder error text.
    pub reason: String,
}

/// One decoded element of an inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundPacket {
    /// Successfully decoded packet (possibly [`ServerPacket::Unknown`]).
    Packet(ServerPacket),
    /// Known kind with an undecodable body.
    Malformed(MalformedPacket),
}

/// Serialize outbound packets into a single frame.
///
/// # Errors
///
/// - `ProtocolError::Encode` if serialization fails
pub fn encode_frame(packets: &[ClientPacket]) -> Result<String> {
    serde_json::to_string(packets).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decode an inbound frame into its packets, in frame order.
///
/// # Errors
///
/// - `ProtocolError::InvalidJson` if the text is not JSON
/// - `ProtocolError::NotAnArray` if the JSON is not an array
pub fn decode_frame(text: &str) -> Result<Vec<InboundPacket>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let Value::Array(elements) = value else {
        return Err(ProtocolError::NotAnArray { found: json_type_name(&value) });
    };

    Ok(elements.into_iter().map(decode_packet).collect())
}

fn decode_packet(element: Value) -> InboundPacket {
    let cmd = element.get("cmd").and_then(Value::as_str).unwrap_or_default().to_string();

    match serde_json::from_value::<ServerPacket>(element) {
        Ok(packet) => InboundPacket::Packet(packet),
        Err(e) => {
            tracing::debug!(%cmd, error = %e, "dropping malformed packet");
            InboundPacket::Malformed(MalformedPacket { cmd, reason: e.to_string() })
        },
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ItemId, LocationId, SlotId};

    #[test]
    fn decodes_packets_in_frame_order() {
        let text = r#"[
            {"cmd":"ReceivedItems","index":0,"items":[{"item":10,"location":20,"player":1,"flags":0}]},
            {"cmd":"Print","text":"hello"}
        ]"#;

        let packets = decode_frame(text).unwrap();
        assert_eq!(packets.len(), 2);

        match &packets[0] {
            InboundPacket::Packet(ServerPacket::ReceivedItems { index, items }) => {
                assert_eq!(*index, 0);
                assert_eq!(items[0].item, ItemId(10));
                assert_eq!(items[0].location, LocationId(20));
                assert_eq!(items[0].player, SlotId(1));
            },
            other => panic!("expected ReceivedItems, got {other:?}"),
        }
        assert!(matches!(
            &packets[1],
            InboundPacket::Packet(ServerPacket::Print { text: Some(t) }) if t == "hello"
        ));
    }

    #[test]
    fn malformed_packet_does_not_poison_frame() {
        let text = r#"[{"cmd":"Connected","slot":"not a number"},{"cmd":"Print","text":"ok"}]"#;

        let packets = decode_frame(text).unwrap();
        assert_eq!(packets.len(), 2);
        assert!(matches!(&packets[0], InboundPacket::Malformed(m) if m.cmd == "Connected"));
        assert!(matches!(&packets[1], InboundPacket::Packet(ServerPacket::Print { .. })));
    }

    #[test]
    fn rejects_non_array_frame() {
        let err = decode_frame(r#"{"cmd":"Print"}"#).unwrap_err();
        assert_eq!(err, ProtocolError::NotAnArray { found: "object" });
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(decode_frame("[{"), Err(ProtocolError::InvalidJson(_))));
    }

    #[test]
    fn encodes_ordered_pair() {
        let text = encode_frame(&[
            ClientPacket::Sync,
            ClientPacket::LocationChecks { locations: vec![LocationId(5), LocationId(7)] },
        ])
        .unwrap();
        assert_eq!(text, r#"[{"cmd":"Sync"},{"cmd":"LocationChecks","locations":[5,7]}]"#);
    }
}
