//! Inbound window manager messages.
//!
//! GlazeWM pushes JSON over the WebSocket. Only the `tilingSize` of the
//! managed window is of interest; everything else (message type, window
//! ids, subscription acknowledgements) is ignored.

use serde::Deserialize;

/// A message pushed by the window manager.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default, rename = "managedWindow")]
    pub managed_window: ManagedWindow,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManagedWindow {
    /// Fraction of the tiling slot occupied by the window, when reported
    #[serde(default, rename = "tilingSize")]
    pub tiling_size: Option<f64>,
}

impl Event {
    /// Decode a raw payload. Text and binary frames are decoded the same way.
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    pub fn tiling_size(&self) -> Option<f64> {
        self.data.managed_window.tiling_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tiling_size() {
        let event = Event::decode(br#"{"data":{"managedWindow":{"tilingSize":0.25}}}"#).unwrap();
        assert_eq!(event.tiling_size(), Some(0.25));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let raw = br#"{
            "messageType": "event_subscription",
            "clientMessage": "sub -e window_managed",
            "data": {
                "eventType": "window_managed",
                "managedWindow": {
                    "id": "0b1c3f0e",
                    "type": "window",
                    "state": {"type": "tiling"},
                    "tilingSize": 0.5,
                    "width": 952
                }
            },
            "error": null,
            "success": true
        }"#;
        let event = Event::decode(raw).unwrap();
        assert_eq!(event.tiling_size(), Some(0.5));
    }

    #[test]
    fn test_missing_or_null_tiling_size() {
        for raw in [
            &br#"{"data":{"managedWindow":{}}}"#[..],
            br#"{"data":{"managedWindow":{"tilingSize":null}}}"#,
            br#"{"data":{}}"#,
            br#"{}"#,
            br#"{"messageType":"client_response","data":{"subscriptionId":"abc"}}"#,
        ] {
            let event = Event::decode(raw).unwrap();
            assert_eq!(event.tiling_size(), None, "payload: {}", String::from_utf8_lossy(raw));
        }
    }

    #[test]
    fn test_malformed_payloads_fail() {
        for raw in [
            &b"not-json"[..],
            b"",
            b"[1, 2, 3]",
            br#"{"data":{"managedWindow":{"tilingSize":"half"}}}"#,
        ] {
            assert!(Event::decode(raw).is_err(), "payload: {}", String::from_utf8_lossy(raw));
        }
    }
}
