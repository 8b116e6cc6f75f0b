//! Scenario execution
//!
//! A scenario is resolved against the listener catalog up front, so that a run
//! never fails halfway: every listener name, owner reference and owner/method
//! pairing is checked before the channel sees its first step.

use crate::callbacks::{FreeListener, ListenerKind, MethodListener, ReadingChannel};
use crate::config::{ScenarioConfig, ScenarioError, StepConfig};
use crate::state::{self, Invocation, Reading, Subscriber, Tally};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A listener reference with its owner resolved to an index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Free(FreeListener),
    Method { listener: MethodListener, owner: usize },
}

/// A validated scenario step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Subscribe(Binding),
    Unsubscribe(Binding),
    UnsubscribeAll,
    Trigger(Reading),
    DropOwner(usize),
}

/// A scenario ready to run
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    owners: Vec<String>,
    steps: Vec<Step>,
}

/// What happened at one trigger step
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    pub reading: Reading,
    pub invoked: usize,
    pub skipped: usize,
    pub invocations: Vec<Invocation>,
}

/// Channel state after one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// 1-based position in the scenario
    pub index: usize,
    pub summary: String,
    /// Listener records registered after the step
    pub registered: usize,
    pub trigger: Option<TriggerOutcome>,
}

/// Result of running a whole scenario
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub steps: Vec<StepOutcome>,
    /// Final state of every owner, in declaration order
    pub tallies: Vec<Tally>,
}

impl Scenario {
    /// Resolve a scenario file against the listener catalog
    pub fn from_config(config: &ScenarioConfig) -> Result<Self, ScenarioError> {
        let mut owners: Vec<String> = Vec::with_capacity(config.owners.len());
        let mut index: HashMap<&str, usize> = HashMap::new();
        for owner in &config.owners {
            if index.insert(owner.name.as_str(), owners.len()).is_some() {
                return Err(ScenarioError::DuplicateOwner(owner.name.clone()));
            }
            owners.push(owner.name.clone());
        }

        let mut dropped = vec![false; owners.len()];
        let mut steps = Vec::with_capacity(config.steps.len());

        for (position, step) in config.steps.iter().enumerate() {
            let step_no = position + 1;
            let resolve_owner = |name: &str, dropped: &[bool]| -> Result<usize, ScenarioError> {
                let owner = *index.get(name).ok_or_else(|| ScenarioError::UnknownOwner {
                    step: step_no,
                    owner: name.to_string(),
                })?;
                if dropped[owner] {
                    return Err(ScenarioError::OwnerDropped {
                        step: step_no,
                        owner: name.to_string(),
                    });
                }
                Ok(owner)
            };
            let resolve_binding = |listener: &str,
                                   owner: Option<&str>,
                                   dropped: &[bool]|
             -> Result<Binding, ScenarioError> {
                let kind =
                    ListenerKind::from_name(listener).ok_or_else(|| ScenarioError::UnknownListener {
                        step: step_no,
                        listener: listener.to_string(),
                    })?;
                match (kind, owner) {
                    (ListenerKind::Free(free), None) => Ok(Binding::Free(free)),
                    (ListenerKind::Free(_), Some(_)) => Err(ScenarioError::UnexpectedOwner {
                        step: step_no,
                        listener: listener.to_string(),
                    }),
                    (ListenerKind::Method(method), Some(name)) => Ok(Binding::Method {
                        listener: method,
                        owner: resolve_owner(name, dropped)?,
                    }),
                    (ListenerKind::Method(_), None) => Err(ScenarioError::MissingOwner {
                        step: step_no,
                        listener: listener.to_string(),
                    }),
                }
            };

            let resolved = match step {
                StepConfig::Subscribe { listener, owner } => {
                    Step::Subscribe(resolve_binding(listener.as_str(), owner.as_deref(), &dropped)?)
                }
                StepConfig::Unsubscribe { listener, owner } => {
                    Step::Unsubscribe(resolve_binding(listener.as_str(), owner.as_deref(), &dropped)?)
                }
                StepConfig::UnsubscribeAll => Step::UnsubscribeAll,
                StepConfig::Trigger { source, value } => Step::Trigger(Reading {
                    source: source.clone(),
                    value: *value,
                }),
                StepConfig::DropOwner { owner } => {
                    let owner = resolve_owner(owner.as_str(), &dropped)?;
                    dropped[owner] = true;
                    Step::DropOwner(owner)
                }
            };
            steps.push(resolved);
        }

        Ok(Self {
            name: config.name.clone(),
            description: config.description.clone(),
            owners,
            steps,
        })
    }

    /// Run every step against a fresh channel
    pub fn run(&self) -> RunOutcome {
        let mut channel = ReadingChannel::new();
        let mut live: Vec<Option<Rc<Subscriber>>> = self
            .owners
            .iter()
            .map(|name| Some(Rc::new(Subscriber::new(name.as_str()))))
            .collect();
        let mut released: Vec<Option<Tally>> = vec![None; self.owners.len()];
        let mut outcomes = Vec::with_capacity(self.steps.len());

        // Anything left over from a previous run on this thread is not ours
        state::take_trace();

        for (position, step) in self.steps.iter().enumerate() {
            let summary = self.describe(step);
            log::debug!("Step {}: {}", position + 1, summary);

            let trigger = match step {
                Step::Subscribe(binding) => {
                    self.apply(&mut channel, &live, *binding, true);
                    None
                }
                Step::Unsubscribe(binding) => {
                    self.apply(&mut channel, &live, *binding, false);
                    None
                }
                Step::UnsubscribeAll => {
                    channel.unsubscribe_all();
                    None
                }
                Step::Trigger(reading) => {
                    let dispatch = channel.trigger((reading.source.clone(), reading.value));
                    Some(TriggerOutcome {
                        reading: reading.clone(),
                        invoked: dispatch.invoked,
                        skipped: dispatch.skipped,
                        invocations: state::take_trace(),
                    })
                }
                Step::DropOwner(owner) => {
                    if let Some(subscriber) = live[*owner].take() {
                        released[*owner] = Some(subscriber.snapshot());
                    }
                    None
                }
            };

            outcomes.push(StepOutcome {
                index: position + 1,
                summary,
                registered: channel.len(),
                trigger,
            });
        }

        // Owners must not outlive their registrations
        channel.unsubscribe_all();

        let tallies = live
            .into_iter()
            .zip(released)
            .filter_map(|(live, released)| match live {
                Some(subscriber) => Some(subscriber.snapshot()),
                None => released,
            })
            .collect();

        RunOutcome {
            steps: outcomes,
            tallies,
        }
    }

    fn apply(
        &self,
        channel: &mut ReadingChannel,
        live: &[Option<Rc<Subscriber>>],
        binding: Binding,
        subscribe: bool,
    ) {
        match binding {
            Binding::Free(listener) if subscribe => listener.subscribe(channel),
            Binding::Free(listener) => listener.unsubscribe(channel),
            Binding::Method { listener, owner } => {
                let Some(subscriber) = &live[owner] else {
                    unreachable!(
                        "owner '{}' referenced after drop_owner; from_config rejects this",
                        self.owners[owner]
                    );
                };
                if subscribe {
                    listener.subscribe(channel, subscriber);
                } else {
                    listener.unsubscribe(channel, subscriber);
                }
            }
        }
    }

    fn describe(&self, step: &Step) -> String {
        match step {
            Step::Subscribe(binding) => format!("subscribe {}", self.binding_name(binding)),
            Step::Unsubscribe(binding) => format!("unsubscribe {}", self.binding_name(binding)),
            Step::UnsubscribeAll => "unsubscribe_all".to_string(),
            Step::Trigger(reading) => format!("trigger {}", reading),
            Step::DropOwner(owner) => format!("drop_owner {}", self.owners[*owner]),
        }
    }

    fn binding_name(&self, binding: &Binding) -> String {
        match binding {
            Binding::Free(listener) => listener.name().to_string(),
            Binding::Method { listener, owner } => {
                format!("{}.{}", self.owners[*owner], listener.name())
            }
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} owner(s), {} step(s))",
            self.name,
            self.owners.len(),
            self.steps.len()
        )
    }
}
