//! Main channel API
//!
//! [`EventChannel`] keeps an ordered list of listener records and calls all of
//! them, synchronously and in registration order, when the channel is triggered.
//!
//! Listeners are either free functions or methods bound to an instance shared
//! through `Rc<T>`. Methods take `&T`; owners that need to change state use
//! their own interior mutability, which also lets a method trigger further
//! channels the same owner listens on. Records are identified for removal by
//! the pair (owner identity, function identity); no per-subscription handle is
//! issued.
//!
//! A function's identity is its type, so listeners must be function items or
//! closures that capture nothing.
//!
//! # Subscriber lifetime
//!
//! The channel does not keep owners alive. Callers are expected to unsubscribe
//! an owner's methods before dropping it. If they don't, the owner is held
//! weakly, so its records are skipped at trigger time and stay registered until
//! removed (or until [`EventChannel::unsubscribe_all`]).

use crate::signature::{Arguments, Callback, MethodCallback, NonEmpty};
use crate::types::{CallbackId, Delivery, Dispatch, ListenerIdentity, OwnerId};
use std::fmt;
use std::rc::Rc;

/// Callable stored in a listener record, adapted to the channel signature
type Invoker<A> = Box<dyn Fn(&A) -> Delivery>;

/// One subscription
struct Listener<A> {
    identity: ListenerIdentity,
    invoker: Invoker<A>,
}

impl<A> Listener<A> {
    fn matches(&self, owner: Option<OwnerId>, callback: CallbackId) -> bool {
        self.identity.owner == owner && self.identity.callback == callback
    }
}

/// A typed registry of callbacks triggered with a fixed argument list
///
/// `A` is the argument tuple handed to listeners: `EventChannel<()>` carries no
/// arguments, `EventChannel<(u32,)>` carries one, and so on.
///
/// # Example
/// ```
/// use event_channel::EventChannel;
///
/// fn on_tick(tick: u32) {
///     println!("tick {}", tick);
/// }
///
/// fn on_any() {
///     println!("something happened");
/// }
///
/// let mut ticks: EventChannel<(u32,)> = EventChannel::new();
/// ticks.subscribe(on_tick);
/// ticks.subscribe_ignoring_args(on_any);
///
/// let dispatch = ticks.trigger((7,));
/// assert_eq!(dispatch.invoked, 2);
/// ```
pub struct EventChannel<A: Arguments = ()> {
    listeners: Vec<Listener<A>>,
}

impl<A: Arguments> EventChannel<A> {
    /// Create an empty channel
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a free function taking the channel's arguments
    ///
    /// No duplicate detection: registering the same function twice makes it
    /// fire twice per trigger.
    pub fn subscribe<F: Callback<A>>(&mut self, function: F) {
        self.push(
            None,
            CallbackId::of::<F>(),
            Box::new(move |args: &A| {
                function.invoke(args);
                Delivery::Invoked
            }),
        );
    }

    /// Register a method of `owner` taking the channel's arguments
    ///
    /// The channel keeps only a weak reference to `owner`.
    pub fn subscribe_method<T: 'static, M: MethodCallback<T, A>>(
        &mut self,
        owner: &Rc<T>,
        method: M,
    ) {
        let target = Rc::downgrade(owner);
        self.push(
            Some(OwnerId::from_ptr(Rc::as_ptr(owner))),
            CallbackId::of::<M>(),
            Box::new(move |args: &A| match target.upgrade() {
                Some(owner) => {
                    method.invoke(&owner, args);
                    Delivery::Invoked
                }
                None => Delivery::Stale,
            }),
        );
    }

    /// Remove every free-function record for `function`
    ///
    /// Does nothing if the function is not registered.
    pub fn unsubscribe<F: Callback<A>>(&mut self, _function: F) {
        self.remove_matching(None, CallbackId::of::<F>());
    }

    /// Remove every record binding `method` to `owner`
    ///
    /// Registrations of the same method on other instances are left alone.
    /// Does nothing if the pair is not registered.
    pub fn unsubscribe_method<T: 'static, M: MethodCallback<T, A>>(
        &mut self,
        owner: &Rc<T>,
        _method: M,
    ) {
        self.remove_matching(
            Some(OwnerId::from_ptr(Rc::as_ptr(owner))),
            CallbackId::of::<M>(),
        );
    }

    /// Remove all listeners
    pub fn unsubscribe_all(&mut self) {
        log::trace!("Clearing {} listener(s)", self.listeners.len());
        self.listeners.clear();
    }

    /// Invoke every registered listener with `args`, in registration order
    ///
    /// Runs on the calling thread and returns once every listener has run. A
    /// panic inside a listener is not caught: it unwinds out of this call and
    /// the remaining listeners are not invoked.
    pub fn trigger(&self, args: A) -> Dispatch {
        let mut dispatch = Dispatch::default();
        for listener in &self.listeners {
            let delivery = (listener.invoker)(&args);
            if delivery == Delivery::Stale {
                log::debug!("Skipping listener {}: owner dropped", listener.identity);
            }
            dispatch.record(delivery);
        }
        dispatch
    }

    /// Number of registered listener records
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Identities of the registered listeners, in registration order
    pub fn identities(&self) -> impl Iterator<Item = ListenerIdentity> + '_ {
        self.listeners.iter().map(|listener| listener.identity)
    }

    fn push(&mut self, owner: Option<OwnerId>, callback: CallbackId, invoker: Invoker<A>) {
        let identity = ListenerIdentity { owner, callback };
        log::trace!("Subscribing listener {}", identity);
        self.listeners.push(Listener { identity, invoker });
    }

    fn remove_matching(&mut self, owner: Option<OwnerId>, callback: CallbackId) {
        let before = self.listeners.len();
        self.listeners.retain(|listener| !listener.matches(owner, callback));
        log::trace!(
            "Removed {} listener(s) matching {}",
            before - self.listeners.len(),
            ListenerIdentity { owner, callback }
        );
    }
}

impl<A: NonEmpty> EventChannel<A> {
    /// Register a zero-argument free function; the channel's arguments are
    /// dropped when it fires
    pub fn subscribe_ignoring_args<F: Fn() + 'static>(&mut self, function: F) {
        self.push(
            None,
            CallbackId::of::<F>(),
            Box::new(move |_: &A| {
                function();
                Delivery::Invoked
            }),
        );
    }

    /// Register a zero-argument method of `owner`; the channel's arguments are
    /// dropped when it fires
    pub fn subscribe_method_ignoring_args<T: 'static, M: Fn(&T) + 'static>(
        &mut self,
        owner: &Rc<T>,
        method: M,
    ) {
        let target = Rc::downgrade(owner);
        self.push(
            Some(OwnerId::from_ptr(Rc::as_ptr(owner))),
            CallbackId::of::<M>(),
            Box::new(move |_: &A| match target.upgrade() {
                Some(owner) => {
                    method(&*owner);
                    Delivery::Invoked
                }
                None => Delivery::Stale,
            }),
        );
    }

    /// Remove every free-function record for a zero-argument `function`
    pub fn unsubscribe_ignoring_args<F: Fn() + 'static>(&mut self, _function: F) {
        self.remove_matching(None, CallbackId::of::<F>());
    }

    /// Remove every record binding the zero-argument `method` to `owner`
    pub fn unsubscribe_method_ignoring_args<T: 'static, M: Fn(&T) + 'static>(
        &mut self,
        owner: &Rc<T>,
        _method: M,
    ) {
        self.remove_matching(
            Some(OwnerId::from_ptr(Rc::as_ptr(owner))),
            CallbackId::of::<M>(),
        );
    }
}

impl EventChannel<()> {
    /// Trigger a channel that carries no arguments
    pub fn fire(&self) -> Dispatch {
        self.trigger(())
    }
}

impl<A: Arguments> Default for EventChannel<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Arguments> fmt::Debug for EventChannel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.identities().collect::<Vec<_>>())
            .finish()
    }
}
