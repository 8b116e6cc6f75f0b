//! Dispatch trace and subscriber state
//!
//! Built-in listeners are plain functions and methods, so they report what they
//! saw through a thread-local trace that the runner drains after each trigger.
//! `Subscriber` is the stateful owner that scenarios bind methods to; `Tally`
//! is the snapshot of its statistics.

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;

// Invocations recorded by listeners since the last drain
thread_local! {
    static TRACE: RefCell<Vec<Invocation>> = const { RefCell::new(Vec::new()) };
}

/// Append an invocation to the current thread's trace
pub fn record(invocation: Invocation) {
    TRACE.with(|trace| trace.borrow_mut().push(invocation));
}

/// Take every invocation recorded so far, leaving the trace empty
pub fn take_trace() -> Vec<Invocation> {
    TRACE.with(|trace| trace.borrow_mut().drain(..).collect())
}

/// Arguments carried by the scenario channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub source: String,
    pub value: i64,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.source, self.value)
    }
}

/// One listener call observed during a trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Listener name as used in scenario files
    pub listener: &'static str,
    /// Owner name for method listeners
    pub owner: Option<String>,
    /// Arguments received, `None` for ignore-args listeners
    pub reading: Option<Reading>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(owner) = &self.owner {
            write!(f, "{}.", owner)?;
        }
        match &self.reading {
            Some(reading) => write!(f, "{}({}, {})", self.listener, reading.source, reading.value),
            None => write!(f, "{}()", self.listener),
        }
    }
}

/// Running statistics kept by a named subscriber
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub name: String,
    pub count: u64,
    pub total: i64,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub bumps: u64,
}

impl Tally {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fold a value into the statistics
    pub fn add(&mut self, value: i64) {
        self.count += 1;
        self.total = self.total.saturating_add(value);
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
    }

    /// Mean of the recorded values
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total as f64 / self.count as f64)
        }
    }
}

/// Named owner whose methods scenarios subscribe
#[derive(Debug)]
pub struct Subscriber {
    tally: RefCell<Tally>,
}

impl Subscriber {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tally: RefCell::new(Tally::new(name)),
        }
    }

    /// Fold a reading into the tally
    pub fn record(&self, source: String, value: i64) {
        let owner = {
            let mut tally = self.tally.borrow_mut();
            tally.add(value);
            tally.name.clone()
        };
        record(Invocation {
            listener: "record",
            owner: Some(owner),
            reading: Some(Reading { source, value }),
        });
    }

    /// Count a trigger without looking at its arguments
    pub fn bump(&self) {
        let owner = {
            let mut tally = self.tally.borrow_mut();
            tally.bumps += 1;
            tally.name.clone()
        };
        record(Invocation {
            listener: "bump",
            owner: Some(owner),
            reading: None,
        });
    }

    /// Current statistics
    pub fn snapshot(&self) -> Tally {
        self.tally.borrow().clone()
    }
}
