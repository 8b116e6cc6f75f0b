//! Built-in listener catalog
//!
//! Scenario files refer to listeners by name. Free functions subscribe without
//! an owner; methods are bound to a named `Subscriber`.

use crate::state::{self, Invocation, Reading, Subscriber};
use event_channel::EventChannel;
use std::fmt;
use std::rc::Rc;

/// Channel carrying a reading's source name and value
pub type ReadingChannel = EventChannel<(String, i64)>;

/// Listeners that subscribe as free functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeListener {
    /// Logs every reading
    LogReading,
    /// Warns about negative readings
    FlagNegative,
    /// Zero-argument listener; ignores the reading
    Heartbeat,
}

/// Listeners that subscribe as methods of a `Subscriber`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodListener {
    /// `Subscriber::record`
    Record,
    /// `Subscriber::bump`, zero-argument; ignores the reading
    Bump,
}

/// A catalog entry resolved from its scenario name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Free(FreeListener),
    Method(MethodListener),
}

impl ListenerKind {
    /// Every listener in the catalog
    pub const ALL: [ListenerKind; 5] = [
        ListenerKind::Free(FreeListener::LogReading),
        ListenerKind::Free(FreeListener::FlagNegative),
        ListenerKind::Free(FreeListener::Heartbeat),
        ListenerKind::Method(MethodListener::Record),
        ListenerKind::Method(MethodListener::Bump),
    ];

    /// Look up a listener by the name used in scenario files
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ListenerKind::Free(listener) => listener.name(),
            ListenerKind::Method(listener) => listener.name(),
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FreeListener {
    pub fn name(&self) -> &'static str {
        match self {
            FreeListener::LogReading => "log_reading",
            FreeListener::FlagNegative => "flag_negative",
            FreeListener::Heartbeat => "heartbeat",
        }
    }

    pub fn subscribe(self, channel: &mut ReadingChannel) {
        match self {
            FreeListener::LogReading => channel.subscribe(log_reading),
            FreeListener::FlagNegative => channel.subscribe(flag_negative),
            FreeListener::Heartbeat => channel.subscribe_ignoring_args(heartbeat),
        }
    }

    pub fn unsubscribe(self, channel: &mut ReadingChannel) {
        match self {
            FreeListener::LogReading => channel.unsubscribe(log_reading),
            FreeListener::FlagNegative => channel.unsubscribe(flag_negative),
            FreeListener::Heartbeat => channel.unsubscribe_ignoring_args(heartbeat),
        }
    }
}

impl MethodListener {
    pub fn name(&self) -> &'static str {
        match self {
            MethodListener::Record => "record",
            MethodListener::Bump => "bump",
        }
    }

    pub fn subscribe(self, channel: &mut ReadingChannel, owner: &Rc<Subscriber>) {
        match self {
            MethodListener::Record => channel.subscribe_method(owner, Subscriber::record),
            MethodListener::Bump => channel.subscribe_method_ignoring_args(owner, Subscriber::bump),
        }
    }

    pub fn unsubscribe(self, channel: &mut ReadingChannel, owner: &Rc<Subscriber>) {
        match self {
            MethodListener::Record => channel.unsubscribe_method(owner, Subscriber::record),
            MethodListener::Bump => channel.unsubscribe_method_ignoring_args(owner, Subscriber::bump),
        }
    }
}

pub fn log_reading(source: String, value: i64) {
    log::info!("Reading {} = {}", source, value);
    state::record(Invocation {
        listener: "log_reading",
        owner: None,
        reading: Some(Reading { source, value }),
    });
}

pub fn flag_negative(source: String, value: i64) {
    if value < 0 {
        log::warn!("Negative reading from {}: {}", source, value);
    }
    state::record(Invocation {
        listener: "flag_negative",
        owner: None,
        reading: Some(Reading { source, value }),
    });
}

pub fn heartbeat() {
    log::debug!("Heartbeat");
    state::record(Invocation {
        listener: "heartbeat",
        owner: None,
        reading: None,
    });
}
