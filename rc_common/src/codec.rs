//! Command codec: `ControlCommand` ⇄ packet bytes.
//!
//! Three wire schemas share the link. There is no version byte, so decode
//! dispatches on syntax first and length second:
//!
//! ```text
//! ┌──────────────┬──────────┬─────────────────────────────────────────────┐
//! │ Schema       │ Length   │ Layout                                      │
//! ├──────────────┼──────────┼─────────────────────────────────────────────┤
//! │ Structured   │ any      │ JSON object {throttle,brake,steering,       │
//! │              │          │              led,shutdown}                  │
//! │ Binary       │ 12 bytes │ f32 LE throttle | f32 LE brake | f32 LE     │
//! │              │          │ steering                                    │
//! │ Drive        │ 9 bytes  │ f32 LE speed | f32 LE steering | u8 button  │
//! └──────────────┴──────────┴─────────────────────────────────────────────┘
//! ```
//!
//! A payload that parses as a JSON object is always structured. Everything
//! else must be exactly 12 or 9 bytes or it is rejected.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use thiserror::Error;

use crate::command::{AuxFlags, ControlCommand};
use crate::consts::{PERCENT_MAX, RADIO_MAX_PAYLOAD, SIGNED_PERCENT_MIN};

/// Length of the binary throttle/brake/steering record [bytes].
pub const BINARY_TRIPLE_LEN: usize = 12;

/// Length of the drive-style speed/steering/button record [bytes].
pub const DRIVE_RECORD_LEN: usize = 9;

/// Offset of the button byte inside a drive record.
pub const DRIVE_BUTTON_OFFSET: usize = 8;

const_assert!(BINARY_TRIPLE_LEN <= RADIO_MAX_PAYLOAD);
const_assert!(DRIVE_RECORD_LEN <= RADIO_MAX_PAYLOAD);
const_assert!(DRIVE_BUTTON_OFFSET < DRIVE_RECORD_LEN);

/// Wire schema selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WireSchema {
    /// 12-byte float triple.
    #[default]
    Binary,
    /// 9-byte speed/steering/button record.
    Drive,
    /// JSON key/value map.
    Structured,
}

/// Decode failure. The payload is dropped as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload matches no schema, or carries values no schema allows.
    #[error("malformed packet ({len} bytes): {reason}")]
    MalformedPacket {
        /// Payload length.
        len: usize,
        /// What was wrong with it.
        reason: &'static str,
    },
}

impl DecodeError {
    const fn malformed(len: usize, reason: &'static str) -> Self {
        Self::MalformedPacket { len, reason }
    }
}

/// Structured representation as sent.
#[derive(Debug, Serialize)]
struct StructuredPacket {
    throttle: f32,
    brake: f32,
    steering: f32,
    led: bool,
    shutdown: bool,
}

/// Structured representation as received. Numbers are read at full JSON
/// precision so huge values clamp instead of overflowing. Missing keys take
/// the defaults, unknown keys are skipped by serde.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StructuredFields {
    throttle: f64,
    brake: f64,
    steering: f64,
    led: bool,
    shutdown: bool,
}

/// Encode as the binary float triple.
pub fn encode(cmd: &ControlCommand) -> Vec<u8> {
    encode_as(cmd, WireSchema::Binary)
}

/// Encode using the given schema.
///
/// The drive schema folds throttle and brake into one signed speed and
/// carries only the LED flag in its button byte.
pub fn encode_as(cmd: &ControlCommand, schema: WireSchema) -> Vec<u8> {
    match schema {
        WireSchema::Binary => {
            let mut out = Vec::with_capacity(BINARY_TRIPLE_LEN);
            out.extend_from_slice(&cmd.throttle_percent().to_le_bytes());
            out.extend_from_slice(&cmd.brake_percent().to_le_bytes());
            out.extend_from_slice(&cmd.steering_percent().to_le_bytes());
            out
        }
        WireSchema::Drive => {
            let mut out = Vec::with_capacity(DRIVE_RECORD_LEN);
            out.extend_from_slice(&cmd.drive_percent().to_le_bytes());
            out.extend_from_slice(&cmd.steering_percent().to_le_bytes());
            out.push(u8::from(cmd.led()));
            out
        }
        WireSchema::Structured => {
            let packet = StructuredPacket {
                throttle: cmd.throttle_percent(),
                brake: cmd.brake_percent(),
                steering: cmd.steering_percent(),
                led: cmd.led(),
                shutdown: cmd.shutdown_requested(),
            };
            // Plain struct of finite floats and bools; serialization cannot fail.
            // An empty object still decodes to the neutral command.
            serde_json::to_vec(&packet).unwrap_or_else(|_| b"{}".to_vec())
        }
    }
}

/// Decode a payload into a command.
pub fn decode(payload: &[u8]) -> Result<ControlCommand, DecodeError> {
    decode_packet(payload).map(|(cmd, _)| cmd)
}

/// Decode a payload and report which schema matched.
pub fn decode_packet(payload: &[u8]) -> Result<(ControlCommand, WireSchema), DecodeError> {
    if let Ok(map) = serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(payload)
    {
        return decode_structured(map, payload.len()).map(|cmd| (cmd, WireSchema::Structured));
    }

    match payload.len() {
        BINARY_TRIPLE_LEN => {
            let throttle = read_f32(payload, 0);
            let brake = read_f32(payload, 4);
            let steering = read_f32(payload, 8);
            ensure_finite(&[throttle, brake, steering], payload.len())?;
            Ok((ControlCommand::new(throttle, brake, steering), WireSchema::Binary))
        }
        DRIVE_RECORD_LEN => {
            let speed = read_f32(payload, 0);
            let steering = read_f32(payload, 4);
            ensure_finite(&[speed, steering], payload.len())?;
            let aux = if payload[DRIVE_BUTTON_OFFSET] != 0 {
                AuxFlags::LED
            } else {
                AuxFlags::empty()
            };
            Ok((
                ControlCommand::from_drive(speed, steering).with_aux(aux),
                WireSchema::Drive,
            ))
        }
        len => Err(DecodeError::malformed(len, "not structured and not 12 or 9 bytes")),
    }
}

fn decode_structured(
    map: serde_json::Map<String, serde_json::Value>,
    len: usize,
) -> Result<ControlCommand, DecodeError> {
    let fields: StructuredFields = serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|_| DecodeError::malformed(len, "structured field has wrong type"))?;

    let mut aux = AuxFlags::empty();
    aux.set(AuxFlags::LED, fields.led);
    aux.set(AuxFlags::SHUTDOWN, fields.shutdown);
    Ok(ControlCommand::new(
        narrow(fields.throttle),
        narrow(fields.brake),
        narrow(fields.steering),
    )
    .with_aux(aux))
}

/// Bring a JSON number into f32 range; `ControlCommand::new` clamps per field.
#[inline]
fn narrow(value: f64) -> f32 {
    value.clamp(f64::from(SIGNED_PERCENT_MIN), f64::from(PERCENT_MAX)) as f32
}

#[inline]
fn read_f32(payload: &[u8], offset: usize) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&payload[offset..offset + 4]);
    f32::from_le_bytes(raw)
}

fn ensure_finite(values: &[f32], len: usize) -> Result<(), DecodeError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(DecodeError::malformed(len, "non-finite value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(t: f32, b: f32, s: f32) -> Vec<u8> {
        [t, b, s].iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn binary_layout_is_little_endian_triple() {
        let bytes = encode(&ControlCommand::new(80.0, 30.0, -45.5));
        assert_eq!(bytes.len(), BINARY_TRIPLE_LEN);
        assert_eq!(&bytes[0..4], &80.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &30.0f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(-45.5f32).to_le_bytes());
    }

    #[test]
    fn decode_binary_clamps_out_of_range() {
        let cmd = decode(&triple(250.0, -4.0, 180.0)).unwrap();
        assert_eq!(cmd, ControlCommand::new(100.0, 0.0, 100.0));
    }

    #[test]
    fn decode_binary_rejects_nan() {
        let err = decode(&triple(f32::NAN, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPacket { len: 12, .. }));
    }

    #[test]
    fn decode_drive_record() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-40.0f32).to_le_bytes());
        bytes.extend_from_slice(&25.0f32.to_le_bytes());
        bytes.push(1);

        let (cmd, schema) = decode_packet(&bytes).unwrap();
        assert_eq!(schema, WireSchema::Drive);
        assert_eq!(cmd.throttle_percent(), 0.0);
        assert_eq!(cmd.brake_percent(), 40.0);
        assert_eq!(cmd.steering_percent(), 25.0);
        assert!(cmd.led());
    }

    #[test]
    fn encode_drive_folds_speed() {
        let cmd = ControlCommand::new(70.0, 20.0, -10.0).with_aux(AuxFlags::LED);
        let bytes = encode_as(&cmd, WireSchema::Drive);
        assert_eq!(bytes.len(), DRIVE_RECORD_LEN);
        assert_eq!(bytes[DRIVE_BUTTON_OFFSET], 1);

        let back = decode(&bytes).unwrap();
        assert_eq!(back.throttle_percent(), 50.0);
        assert_eq!(back.brake_percent(), 0.0);
        assert_eq!(back.steering_percent(), -10.0);
    }

    #[test]
    fn structured_missing_keys_default() {
        let cmd = decode(br#"{"throttle":40}"#).unwrap();
        assert_eq!(cmd.throttle_percent(), 40.0);
        assert_eq!(cmd.brake_percent(), 0.0);
        assert_eq!(cmd.steering_percent(), 0.0);
        assert!(!cmd.led());
        assert!(!cmd.shutdown_requested());
    }

    #[test]
    fn structured_unknown_keys_ignored() {
        let cmd = decode(br#"{"steering":-20.5,"horn":true,"led":true}"#).unwrap();
        assert_eq!(cmd.steering_percent(), -20.5);
        assert!(cmd.led());
    }

    #[test]
    fn structured_huge_values_clamp() {
        let cmd = decode(br#"{"throttle":1e39,"brake":-1e300,"steering":-4e38}"#).unwrap();
        assert_eq!(cmd, ControlCommand::new(100.0, 0.0, -100.0));
    }

    #[test]
    fn structured_wrong_type_is_malformed() {
        let err = decode(br#"{"throttle":"fast"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPacket { .. }));
    }

    #[test]
    fn structured_takes_precedence_over_length() {
        // 12 bytes that are also a JSON object.
        let payload = br#"{"brake":10}"#;
        assert_eq!(payload.len(), BINARY_TRIPLE_LEN);
        let (cmd, schema) = decode_packet(payload).unwrap();
        assert_eq!(schema, WireSchema::Structured);
        assert_eq!(cmd.brake_percent(), 10.0);
    }

    #[test]
    fn structured_round_trip() {
        let cmd = ControlCommand::new(12.5, 3.0, -99.0).with_aux(AuxFlags::LED | AuxFlags::SHUTDOWN);
        let bytes = encode_as(&cmd, WireSchema::Structured);
        assert_eq!(decode(&bytes).unwrap(), cmd);
    }

    #[test]
    fn seven_random_bytes_are_malformed() {
        let err = decode(&[0x13, 0xff, 0x00, 0x42, 0x99, 0x01, 0x7f]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedPacket {
                len: 7,
                reason: "not structured and not 12 or 9 bytes"
            }
        );
    }

    #[test]
    fn empty_payload_is_malformed() {
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn schema_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            schema: WireSchema,
        }
        let w: Wrapper = toml::from_str("schema = \"structured\"").unwrap();
        assert_eq!(w.schema, WireSchema::Structured);
    }
}
