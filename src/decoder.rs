use crate::protocol::{device_source_name, STATUS_CHUNK_LEN};
use crate::types::{DeviceStatus, NativeVolume, SourceIndex};

/// Value part of a line reply such as `Main.Volume=-48`
///
/// Everything after the first `=`, trimmed. `None` when there is no value.
pub fn reply_value(reply: &str) -> Option<&str> {
    let (_, value) = reply.split_once('=')?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// On/Off value (power, mute); any value other than `On` reads as off
pub fn decode_switch(reply: Option<&str>) -> Option<bool> {
    reply.and_then(reply_value).map(|value| value == "On")
}

/// Volume in dB
pub fn decode_volume(reply: Option<&str>) -> Option<f64> {
    reply
        .and_then(reply_value)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Source index
pub fn decode_source(reply: Option<&str>) -> Option<SourceIndex> {
    reply
        .and_then(reply_value)
        .and_then(|value| value.parse::<SourceIndex>().ok())
}

/// Status reply of the TCP protocol
///
/// The reply is hex, one 10-digit chunk per polled value in the order
/// volume, power, mute, source. The last byte of each chunk is the value.
pub fn decode_status(reply_hex: &str) -> Option<DeviceStatus> {
    let reply = reply_hex.trim();
    if !reply.is_ascii() || reply.len() < 4 * STATUS_CHUNK_LEN {
        return None;
    }

    let last_byte = |chunk: usize| {
        let end = (chunk + 1) * STATUS_CHUNK_LEN;
        &reply[end - 2..end]
    };

    let volume = u8::from_str_radix(last_byte(0), 16).ok()?;
    let power = last_byte(1) == "01";
    let muted = last_byte(2) == "01";
    let source = device_source_name(last_byte(3)).map(str::to_string);

    Some(DeviceStatus {
        power,
        volume: NativeVolume::from(volume),
        muted,
        source,
    })
}
