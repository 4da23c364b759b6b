#![allow(dead_code)]

use async_trait::async_trait;
use nad_control::{
    DeviceStatus, Frame, LineCommand, LineTransport, NadError, ReceiverConfig, Result,
    StatusTransport,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Line transport answering queries from a table of canned replies
#[derive(Default)]
pub struct ScriptedLine {
    replies: Mutex<HashMap<String, String>>,
    queried: Mutex<Vec<String>>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` (e.g. `Main.Power?`) with `reply`
    pub fn reply(&self, query: &str, reply: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(query.to_string(), reply.to_string());
    }

    /// Stop answering every query
    pub fn go_silent(&self) {
        self.replies.lock().unwrap().clear();
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear_log(&self) {
        self.queried.lock().unwrap().clear();
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl LineTransport for ScriptedLine {
    async fn send_and_receive(&self, command: &LineCommand) -> Result<Option<String>> {
        let wire = command.to_wire();
        self.queried.lock().unwrap().push(wire.clone());
        Ok(self.replies.lock().unwrap().get(&wire).cloned())
    }

    async fn send(&self, command: &LineCommand) -> Result<()> {
        self.sent.lock().unwrap().push(command.to_wire());
        Ok(())
    }
}

/// What the scripted TCP receiver answers to a status request
#[derive(Clone)]
pub enum StatusScript {
    Reply(DeviceStatus),
    Garbage,
    Unreachable,
}

/// Status transport with a settable answer
pub struct ScriptedStatus {
    script: Mutex<StatusScript>,
    frames: Mutex<Vec<String>>,
}

impl ScriptedStatus {
    pub fn new(script: StatusScript) -> Self {
        Self {
            script: Mutex::new(script),
            frames: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, script: StatusScript) {
        *self.script.lock().unwrap() = script;
    }

    /// Hex of every frame sent other than status requests
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusTransport for ScriptedStatus {
    async fn send_and_receive(&self, frame: &Frame) -> Result<Option<String>> {
        self.frames.lock().unwrap().push(frame.hex().to_string());
        Ok(None)
    }

    async fn status(&self) -> Result<Option<DeviceStatus>> {
        match self.script.lock().unwrap().clone() {
            StatusScript::Reply(status) => Ok(Some(status)),
            StatusScript::Garbage => Ok(None),
            StatusScript::Unreachable => Err(NadError::Unreachable {
                host: "10.0.0.2:50001".to_string(),
                attempts: 3,
            }),
        }
    }
}

pub fn status(power: bool, volume: i32, muted: bool, source: &str) -> DeviceStatus {
    DeviceStatus {
        power,
        volume,
        muted,
        source: Some(source.to_string()),
    }
}

/// RS232 configuration with the default -92..-20 dB range
pub fn legacy_config() -> ReceiverConfig {
    ReceiverConfig::rs232("/dev/ttyUSB0").with_sources([(1, "Tuner"), (3, "CD"), (5, "Aux")])
}

/// TCP configuration for -80..-20 dB, which is 20..140 on the device scale
pub fn tcp_config() -> ReceiverConfig {
    ReceiverConfig::tcp("10.0.0.2").with_volume_bounds(-80, -20)
}

/// Script a fully powered main zone at -56 dB on source 3
pub fn script_main_on(line: &ScriptedLine) {
    line.reply("Main.Power?", "Main.Power=On");
    line.reply("Main.Mute?", "Main.Mute=On");
    line.reply("Main.Volume?", "Main.Volume=-56");
    line.reply("Main.Source?", "Main.Source=3");
}
