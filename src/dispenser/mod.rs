//! Rig dispensing control.
//!
//! Command and status wire types, the persistent duplex channel to the
//! rig bridge, and the state machine sequencing one dispense at a time.

mod channel;
mod messages;
mod sequencer;

pub use channel::{ChannelError, CommandChannel};
pub use messages::{RigCommand, RigStatus, ValveTimings};
pub use sequencer::{
    DispenseError, DispenseSequencer, DispenseSession, DispenseState, SessionStatus,
    DEFAULT_SETTLE_DELAY,
};
