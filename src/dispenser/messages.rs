//! Rig wire message types.
//!
//! Outbound commands and inbound status frames exchanged with the rig
//! bridge as JSON text frames. The bridge forwards commands to the
//! physical controller over its newline-delimited serial link.

use serde::{Deserialize, Serialize};

use crate::catalog::PigmentMix;

/// Pump counts per physical valve.
///
/// Valve assignment on the rig: valve1 dispenses purple, valve2 oros,
/// valve3 red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValveTimings {
    pub valve1: u32,
    pub valve2: u32,
    pub valve3: u32,
}

impl From<&PigmentMix> for ValveTimings {
    fn from(mix: &PigmentMix) -> Self {
        Self {
            valve1: mix.purple,
            valve2: mix.oros,
            valve3: mix.red,
        }
    }
}

/// Outbound command to the rig. One in flight at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RigCommand {
    /// Run a blend sequence for the named shade.
    Move {
        lipstick: String,
        #[serde(rename = "valveTimings")]
        valve_timings: ValveTimings,
    },
    /// Return the rig to its home position.
    Home,
}

impl RigCommand {
    /// Build the blend command for a shade.
    pub fn move_for(lipstick: impl Into<String>, mix: &PigmentMix) -> Self {
        RigCommand::Move {
            lipstick: lipstick.into(),
            valve_timings: mix.into(),
        }
    }
}

/// Inbound status event from the rig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RigStatus {
    /// The rig is moving to sequence step `n` (1-based on the wire).
    Moving(u32),
    /// The blend sequence finished.
    SequenceComplete,
    /// The rig reached its home position.
    HomeReached,
    /// A home command arrived while already at home.
    AlreadyHome,
    /// The rig or bridge reported an error.
    Error(String),
    /// A status string this version does not interpret; forwarded opaque.
    Other(String),
}

/// Raw inbound frame. The bridge emits either `{"status": ...}` (with an
/// optional `message` when status is `"error"`) or `{"error": ...}`.
#[derive(Debug, Deserialize)]
struct StatusFrame {
    status: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl RigStatus {
    /// Parse one inbound JSON text frame. Returns None for frames that
    /// are not valid status objects.
    pub fn parse(text: &str) -> Option<RigStatus> {
        let frame: StatusFrame = serde_json::from_str(text).ok()?;
        if let Some(error) = frame.error {
            return Some(RigStatus::Error(error));
        }
        let status = frame.status?;
        Some(match status.as_str() {
            "sequence_complete" => RigStatus::SequenceComplete,
            "home_reached" => RigStatus::HomeReached,
            "already_home" => RigStatus::AlreadyHome,
            "error" => RigStatus::Error(frame.message.unwrap_or_else(|| "error".to_string())),
            _ => match status.strip_prefix("moving_").and_then(|n| n.parse().ok()) {
                Some(n) => RigStatus::Moving(n),
                None => RigStatus::Other(status),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_command_serializes_to_wire_format() {
        let command = RigCommand::move_for(
            "Valencia",
            &PigmentMix {
                purple: 1,
                red: 7,
                oros: 2,
            },
        );
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(
            json,
            r#"{"action":"move","lipstick":"Valencia","valveTimings":{"valve1":1,"valve2":2,"valve3":7}}"#
        );
    }

    #[test]
    fn home_command_serializes_to_wire_format() {
        let json = serde_json::to_string(&RigCommand::Home).unwrap();
        assert_eq!(json, r#"{"action":"home"}"#);
    }

    #[test]
    fn valve_assignment_is_purple_oros_red() {
        let timings: ValveTimings = (&PigmentMix {
            purple: 3,
            red: 6,
            oros: 1,
        })
            .into();
        assert_eq!(timings.valve1, 3);
        assert_eq!(timings.valve2, 1);
        assert_eq!(timings.valve3, 6);
    }

    #[test]
    fn moving_status_parses_step_number() {
        assert_eq!(
            RigStatus::parse(r#"{"status":"moving_1"}"#),
            Some(RigStatus::Moving(1))
        );
        assert_eq!(
            RigStatus::parse(r#"{"status":"moving_3"}"#),
            Some(RigStatus::Moving(3))
        );
    }

    #[test]
    fn terminal_statuses_parse() {
        assert_eq!(
            RigStatus::parse(r#"{"status":"sequence_complete"}"#),
            Some(RigStatus::SequenceComplete)
        );
        assert_eq!(
            RigStatus::parse(r#"{"status":"home_reached"}"#),
            Some(RigStatus::HomeReached)
        );
        assert_eq!(
            RigStatus::parse(r#"{"status":"already_home"}"#),
            Some(RigStatus::AlreadyHome)
        );
    }

    #[test]
    fn error_frames_parse_both_shapes() {
        assert_eq!(
            RigStatus::parse(r#"{"error":"valve jammed"}"#),
            Some(RigStatus::Error("valve jammed".to_string()))
        );
        assert_eq!(
            RigStatus::parse(r#"{"status":"error","message":"Pico not connected"}"#),
            Some(RigStatus::Error("Pico not connected".to_string()))
        );
    }

    #[test]
    fn unknown_statuses_are_forwarded_opaque() {
        assert_eq!(
            RigStatus::parse(r#"{"status":"reached_2"}"#),
            Some(RigStatus::Other("reached_2".to_string()))
        );
        assert_eq!(
            RigStatus::parse(r#"{"status":"moving_x"}"#),
            Some(RigStatus::Other("moving_x".to_string()))
        );
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert_eq!(RigStatus::parse("not json"), None);
        assert_eq!(RigStatus::parse(r#"{"position": 2}"#), None);
    }

    #[test]
    fn commands_round_trip_through_json() {
        for command in [
            RigCommand::move_for(
                "Viola",
                &PigmentMix {
                    purple: 6,
                    red: 2,
                    oros: 2,
                },
            ),
            RigCommand::Home,
        ] {
            let json = serde_json::to_string(&command).unwrap();
            let back: RigCommand = serde_json::from_str(&json).unwrap();
            assert_eq!(back, command);
        }
    }
}
