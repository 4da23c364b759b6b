use crate::config::SourceTable;
use crate::protocol::{device_source_code, opcode, Frame, Function, LineCommand, Operator};
use crate::types::{NativeVolume, Zone};
use crate::volume::DEVICE_SCALE_MAX;

fn on_off(on: bool) -> &'static str {
    if on {
        "On"
    } else {
        "Off"
    }
}

/// Encoder for the line protocol (RS232/Telnet)
///
/// Holds no transport state; it only turns operations into [`LineCommand`]s.
pub struct LineEncoder;

impl LineEncoder {
    /// Query the current value of a function
    pub fn query(zone: Zone, function: Function) -> LineCommand {
        LineCommand::query(zone, function)
    }

    pub fn power(zone: Zone, on: bool) -> LineCommand {
        LineCommand::new(zone, Function::Power, Operator::Set).with_value(on_off(on))
    }

    /// Step the volume up by the receiver's own step
    pub fn volume_up(zone: Zone) -> LineCommand {
        LineCommand::new(zone, Function::Volume, Operator::Increment)
    }

    /// Step the volume down by the receiver's own step
    pub fn volume_down(zone: Zone) -> LineCommand {
        LineCommand::new(zone, Function::Volume, Operator::Decrement)
    }

    /// Set an absolute volume in dB
    pub fn set_volume(zone: Zone, db: NativeVolume) -> LineCommand {
        LineCommand::new(zone, Function::Volume, Operator::Set).with_value(db.to_string())
    }

    pub fn mute(zone: Zone, muted: bool) -> LineCommand {
        LineCommand::new(zone, Function::Mute, Operator::Set).with_value(on_off(muted))
    }

    /// Select a source by display name
    ///
    /// A name missing from the table yields a command with an empty argument.
    pub fn select_source(zone: Zone, sources: &SourceTable, name: &str) -> LineCommand {
        let command = LineCommand::new(zone, Function::Source, Operator::Set);
        match sources.index(name) {
            Some(index) => command.with_value(index.to_string()),
            None => command,
        }
    }
}

/// Encoder for the binary TCP protocol
pub struct FrameEncoder;

impl FrameEncoder {
    /// Power on or off; the powersave opcode always goes first
    pub fn power(on: bool) -> Frame {
        let state = if on { opcode::ON } else { opcode::OFF };
        Frame::concat(&[opcode::POWERSAVE, state])
    }

    /// Absolute volume on the 0-200 scale, `None` outside that scale
    pub fn set_volume(volume: NativeVolume) -> Option<Frame> {
        if !(0..=DEVICE_SCALE_MAX).contains(&volume) {
            return None;
        }
        Some(Frame::new(format!("{}{:02x}", opcode::VOLUME, volume)))
    }

    /// Step from a known volume by `step_db` decibels (two scale units each)
    ///
    /// `None` when the target leaves the 0-200 scale, overflow included.
    pub fn volume_step(current: NativeVolume, step_db: i32, up: bool) -> Option<Frame> {
        let delta = step_db.checked_mul(2)?;
        let target = if up {
            current.checked_add(delta)?
        } else {
            current.checked_sub(delta)?
        };
        Self::set_volume(target)
    }

    pub fn mute(muted: bool) -> Frame {
        let value = if muted { "01" } else { "00" };
        Frame::concat(&[opcode::MUTE, value])
    }

    /// Select a device source by name, `None` for an unknown name
    pub fn select_source(name: &str) -> Option<Frame> {
        device_source_code(name).map(|code| Frame::concat(&[opcode::SOURCE, code]).with_reply())
    }

    /// One request polling volume, power, mute and source in that order
    pub fn status_request() -> Frame {
        Frame::concat(&[
            opcode::POLL_VOLUME,
            opcode::POLL_POWER,
            opcode::POLL_MUTED,
            opcode::POLL_SOURCE,
        ])
        .with_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReceiverConfig;

    fn table() -> SourceTable {
        ReceiverConfig::default()
            .with_sources([(1, "Tuner"), (3, "CD")])
            .source_table()
            .unwrap()
    }

    #[test]
    fn line_commands_per_zone() {
        assert_eq!(LineEncoder::power(Zone::Main, true).to_wire(), "Main.Power=On");
        assert_eq!(LineEncoder::power(Zone::Zone3, false).to_wire(), "Zone3.Power=Off");
        assert_eq!(LineEncoder::volume_up(Zone::Zone2).to_wire(), "Zone2.Volume+");
        assert_eq!(LineEncoder::volume_down(Zone::Main).to_wire(), "Main.Volume-");
        assert_eq!(LineEncoder::set_volume(Zone::Zone2, -48).to_wire(), "Zone2.Volume=-48");
        assert_eq!(LineEncoder::mute(Zone::Zone3, true).to_wire(), "Zone3.Mute=On");
        assert_eq!(LineEncoder::mute(Zone::Main, false).to_wire(), "Main.Mute=Off");
        assert_eq!(
            LineEncoder::query(Zone::Zone2, Function::Power).to_wire(),
            "Zone2.Power?"
        );
    }

    #[test]
    fn source_select_resolves_display_name() {
        let cmd = LineEncoder::select_source(Zone::Main, &table(), "CD");
        assert_eq!(cmd.value.as_deref(), Some("3"));
        assert_eq!(cmd.to_wire(), "Main.Source=3");
    }

    #[test]
    fn unknown_source_forwards_no_value() {
        let cmd = LineEncoder::select_source(Zone::Main, &table(), "Phono");
        assert_eq!(cmd.value, None);
        assert_eq!(cmd.to_wire(), "Main.Source=");
    }

    #[test]
    fn frame_power_includes_powersave() {
        assert_eq!(FrameEncoder::power(true).hex(), "000102070001020901");
        assert_eq!(FrameEncoder::power(false).hex(), "000102070001020900");
    }

    #[test]
    fn frame_volume_bounds() {
        assert_eq!(FrameEncoder::set_volume(0).unwrap().hex(), "0001020400");
        assert_eq!(FrameEncoder::set_volume(200).unwrap().hex(), "00010204c8");
        assert!(FrameEncoder::set_volume(201).is_none());
        assert!(FrameEncoder::set_volume(-1).is_none());
    }

    #[test]
    fn frame_volume_step_uses_two_units_per_db() {
        assert_eq!(FrameEncoder::volume_step(100, 4, true).unwrap().hex(), "000102046c");
        assert_eq!(FrameEncoder::volume_step(100, 4, false).unwrap().hex(), "000102045c");
        assert!(FrameEncoder::volume_step(198, 4, true).is_none());
    }

    #[test]
    fn frame_volume_step_overflow_yields_nothing() {
        assert!(FrameEncoder::volume_step(100, 2_000_000_000, true).is_none());
        assert!(FrameEncoder::volume_step(100, 2_000_000_000, false).is_none());
        assert!(FrameEncoder::volume_step(i32::MAX, 1, true).is_none());
        assert!(FrameEncoder::volume_step(i32::MIN, 1, false).is_none());
    }

    #[test]
    fn frame_mute_and_source() {
        assert_eq!(FrameEncoder::mute(true).hex(), "0001020a01");
        assert_eq!(FrameEncoder::mute(false).hex(), "0001020a00");

        let frame = FrameEncoder::select_source("Computer").unwrap();
        assert_eq!(frame.hex(), "0001020304");
        assert!(frame.expects_reply());
        assert!(FrameEncoder::select_source("Phono").is_none());
    }

    #[test]
    fn status_request_polls_in_order() {
        let frame = FrameEncoder::status_request();
        assert_eq!(frame.hex(), "00010202040001020209000102020a0001020203");
        assert!(frame.expects_reply());
    }
}
