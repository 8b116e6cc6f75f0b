//! Core types for the event channel library
//!
//! This module defines the identity values that listener records carry and the
//! summary returned from a trigger. Identities are opaque: the channel only ever
//! compares them, it never turns them back into pointers.

use std::any::{self, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::mem;

/// Identity of the function or method behind a listener
///
/// Derived from the listener's type. Every function item and every
/// non-capturing closure has a distinct zero-sized type, so two different
/// functions never share an identity, even when their bodies are identical.
/// Two registrations of the same function do share it, which is what makes
/// removal by identity remove all of them at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId {
    type_id: TypeId,
    name: &'static str,
}

impl CallbackId {
    /// Identity of the listener type `F`
    ///
    /// `F` must be zero-sized. Function pointers and capturing closures share
    /// one type across many values and are rejected at compile time.
    pub(crate) fn of<F: 'static>() -> Self {
        let () = ZeroSized::<F>::CHECK;
        Self {
            type_id: TypeId::of::<F>(),
            name: any::type_name::<F>(),
        }
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

struct ZeroSized<F>(PhantomData<F>);

impl<F> ZeroSized<F> {
    const CHECK: () = assert!(
        mem::size_of::<F>() == 0,
        "listeners must be function items or closures that capture nothing"
    );
}

/// Identity of the instance a method listener is bound to
///
/// Derived from the address of the owner's shared allocation. The channel holds
/// the owner weakly, so the allocation (and therefore this address) cannot be
/// reused while a record still refers to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(usize);

impl OwnerId {
    pub(crate) fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr as *const () as usize)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner@0x{:x}", self.0)
    }
}

/// The (owner, callback) pair that identifies a listener record for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerIdentity {
    /// Bound instance, `None` for free functions
    pub owner: Option<OwnerId>,
    /// Function or method identity
    pub callback: CallbackId,
}

impl ListenerIdentity {
    /// True if this listener is a free function (no bound owner)
    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }
}

impl fmt::Display for ListenerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            Some(owner) => write!(f, "{}::{}", owner, self.callback),
            None => write!(f, "{}", self.callback),
        }
    }
}

/// Outcome of delivering one trigger to one listener record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The listener was invoked
    Invoked,
    /// The bound owner is gone; the record was left in place and not invoked
    Stale,
}

/// Summary of a single trigger call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Number of listeners that were invoked
    pub invoked: usize,
    /// Number of method listeners skipped because their owner was dropped
    pub skipped: usize,
}

impl Dispatch {
    pub(crate) fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Invoked => self.invoked += 1,
            Delivery::Stale => self.skipped += 1,
        }
    }

    /// Total number of records visited
    pub fn visited(&self) -> usize {
        self.invoked + self.skipped
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invoked, {} skipped", self.invoked, self.skipped)
    }
}
