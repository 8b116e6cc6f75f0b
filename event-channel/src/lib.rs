//! Event Channel Library
//!
//! A small, typed, in-process observer primitive. An [`EventChannel`] holds an
//! ordered list of callbacks and invokes all of them synchronously when it is
//! triggered with the channel's fixed argument list.
//!
//! # Architecture
//!
//! This library is intentionally minimal:
//! - One generic channel type over a tuple of argument types (`()` included)
//! - Free functions and `Rc<T>`-bound `&self` methods as listeners
//! - Zero-argument listeners may subscribe to channels that carry arguments
//! - Removal by (owner, function) identity; all matching records go at once
//! - Function identity is the function's type, never its address
//!
//! The library does NOT:
//! - Deliver across threads or processes
//! - Queue or buffer triggers
//! - Isolate listeners from each other's panics
//! - Keep subscribers alive (owners are held weakly)
//!
//! # Example Usage
//!
//! ```
//! use event_channel::EventChannel;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Gauge {
//!     readings: RefCell<Vec<f64>>,
//! }
//!
//! impl Gauge {
//!     fn on_reading(&self, _sensor: String, value: f64) {
//!         self.readings.borrow_mut().push(value);
//!     }
//! }
//!
//! let gauge = Rc::new(Gauge::default());
//! let mut readings: EventChannel<(String, f64)> = EventChannel::new();
//! readings.subscribe_method(&gauge, Gauge::on_reading);
//!
//! readings.trigger(("oil_temp".to_string(), 92.5));
//! assert_eq!(*gauge.readings.borrow(), vec![92.5]);
//!
//! // Unsubscribe before the subscriber goes away
//! readings.unsubscribe_method(&gauge, Gauge::on_reading);
//! assert!(readings.is_empty());
//! ```

// Public modules
pub mod channel;
pub mod signature;
pub mod types;

// Re-export main types for convenience
pub use channel::EventChannel;
pub use signature::{Arguments, Callback, MethodCallback, NonEmpty};
pub use types::{CallbackId, Dispatch, ListenerIdentity, OwnerId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
