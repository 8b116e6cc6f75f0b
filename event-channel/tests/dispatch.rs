// Dispatch behaviour through the public API
use event_channel::EventChannel;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

thread_local! {
    static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn push(entry: String) {
    LOG.with(|log| log.borrow_mut().push(entry));
}

fn drain() -> Vec<String> {
    LOG.with(|log| log.borrow_mut().drain(..).collect())
}

fn first(code: u8, text: String) {
    push(format!("first({}, {})", code, text));
}

fn second(code: u8, text: String) {
    push(format!("second({}, {})", code, text));
}

fn bare() {
    push("bare()".to_string());
}

fn explode(_: u8, _: String) {
    panic!("listener failure");
}

fn quiet_left(_: u8, _: String) {}

fn quiet_right(_: u8, _: String) {}

struct Probe {
    name: &'static str,
    seen: RefCell<Vec<(u8, String)>>,
    pings: Cell<usize>,
    ticks: Cell<usize>,
}

impl Probe {
    fn shared(name: &'static str) -> Rc<Self> {
        Rc::new(Self {
            name,
            seen: RefCell::new(Vec::new()),
            pings: Cell::new(0),
            ticks: Cell::new(0),
        })
    }

    fn observe(&self, code: u8, text: String) {
        push(format!("{}.observe({}, {})", self.name, code, text));
        self.seen.borrow_mut().push((code, text));
    }

    fn echo(&self, code: u8, text: String) {
        push(format!("{}.echo({}, {})", self.name, code, text));
    }

    fn ping(&self) {
        push(format!("{}.ping()", self.name));
        self.pings.set(self.pings.get() + 1);
    }

    fn tick_left(&self, _: u8, _: String) {
        self.ticks.set(self.ticks.get() + 1);
    }

    fn tick_right(&self, _: u8, _: String) {
        self.ticks.set(self.ticks.get() + 1);
    }
}

/// Listens on an outer channel and forwards into a channel it also listens on
struct Relay {
    downstream: RefCell<EventChannel<(u32,)>>,
    received: Cell<Option<u32>>,
}

impl Relay {
    fn on_outer(&self, value: u32) {
        push(format!("relay.on_outer({})", value));
        self.downstream.borrow().trigger((value * 10,));
    }

    fn on_inner(&self, value: u32) {
        push(format!("relay.on_inner({})", value));
        self.received.set(Some(value));
    }
}

type Channel = EventChannel<(u8, String)>;

#[test]
fn each_listener_runs_once_in_registration_order() {
    init_logging();
    let probe = Probe::shared("a");
    let mut channel = Channel::new();
    channel.subscribe(second);
    channel.subscribe_method(&probe, Probe::observe);
    channel.subscribe_ignoring_args(bare);
    channel.subscribe(first);
    channel.subscribe_method_ignoring_args(&probe, Probe::ping);

    let dispatch = channel.trigger((3, "go".to_string()));

    assert_eq!(dispatch.invoked, 5);
    assert_eq!(
        drain(),
        vec![
            "second(3, go)",
            "a.observe(3, go)",
            "bare()",
            "first(3, go)",
            "a.ping()",
        ]
    );
    assert_eq!(*probe.seen.borrow(), vec![(3, "go".to_string())]);
    assert_eq!(probe.pings.get(), 1);
}

#[test]
fn unsubscribe_stops_delivery_and_is_idempotent() {
    init_logging();
    let mut channel = Channel::new();
    channel.subscribe(first);
    channel.subscribe(second);

    channel.unsubscribe(first);
    channel.trigger((1, "x".to_string()));
    assert_eq!(drain(), vec!["second(1, x)"]);

    // Second removal matches nothing and is silently accepted
    channel.unsubscribe(first);
    assert_eq!(channel.len(), 1);
}

#[test]
fn duplicate_registrations_fire_independently_and_go_together() {
    init_logging();
    let mut channel = Channel::new();
    channel.subscribe(first);
    channel.subscribe(first);

    channel.trigger((2, "dup".to_string()));
    assert_eq!(drain(), vec!["first(2, dup)", "first(2, dup)"]);

    channel.unsubscribe(first);
    assert!(channel.is_empty());
    assert_eq!(channel.trigger((2, "dup".to_string())).invoked, 0);
    assert!(drain().is_empty());
}

#[test]
fn same_method_on_different_instances_is_independent() {
    init_logging();
    let a = Probe::shared("a");
    let b = Probe::shared("b");
    let mut channel = Channel::new();
    channel.subscribe_method(&a, Probe::observe);
    channel.subscribe_method(&b, Probe::observe);

    channel.unsubscribe_method(&a, Probe::observe);
    channel.trigger((8, "only-b".to_string()));

    assert_eq!(drain(), vec!["b.observe(8, only-b)"]);
    assert!(a.seen.borrow().is_empty());
    assert_eq!(b.seen.borrow().len(), 1);
}

#[test]
fn unsubscribe_all_clears_everything() {
    init_logging();
    let probe = Probe::shared("a");
    let mut channel = Channel::new();
    channel.subscribe(first);
    channel.subscribe_ignoring_args(bare);
    channel.subscribe_method(&probe, Probe::observe);

    channel.unsubscribe_all();

    assert!(channel.is_empty());
    assert_eq!(channel.trigger((0, String::new())).visited(), 0);
    assert!(drain().is_empty());
}

#[test]
fn empty_channel_trigger_is_a_no_op() {
    init_logging();
    let channel = Channel::new();
    let dispatch = channel.trigger((0, String::new()));
    assert_eq!(dispatch.invoked, 0);
    assert_eq!(dispatch.skipped, 0);
}

#[test]
fn listener_panic_aborts_remaining_dispatch() {
    init_logging();
    let mut channel = Channel::new();
    channel.subscribe(first);
    channel.subscribe(explode);
    channel.subscribe(second);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        channel.trigger((5, "boom".to_string()));
    }));

    assert!(outcome.is_err());
    assert_eq!(drain(), vec!["first(5, boom)"]);
    // The registry is untouched by the failed dispatch
    assert_eq!(channel.len(), 3);
}

#[test]
fn identities_follow_registration_order() {
    init_logging();
    let probe = Probe::shared("a");
    let mut channel = Channel::new();
    channel.subscribe(first);
    channel.subscribe_method(&probe, Probe::observe);

    let identities: Vec<_> = channel.identities().collect();
    assert_eq!(identities.len(), 2);
    assert!(identities[0].is_free());
    assert!(!identities[1].is_free());
    assert_ne!(identities[0].callback, identities[1].callback);
}

#[test]
fn zero_argument_channel_fires_without_arguments() {
    init_logging();
    let probe = Probe::shared("z");
    let mut channel: EventChannel = EventChannel::new();
    channel.subscribe(bare);
    channel.subscribe_method(&probe, Probe::ping);

    channel.fire();
    assert_eq!(drain(), vec!["bare()", "z.ping()"]);

    channel.unsubscribe_method(&probe, Probe::ping);
    channel.fire();
    assert_eq!(drain(), vec!["bare()"]);
}

#[test]
fn functions_with_identical_bodies_keep_separate_identities() {
    init_logging();
    let mut channel = Channel::new();
    channel.subscribe(quiet_left);
    channel.subscribe(quiet_right);

    channel.unsubscribe(quiet_left);

    let remaining: Vec<_> = channel.identities().collect();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].to_string().ends_with("quiet_right"));
}

#[test]
fn methods_with_identical_bodies_keep_separate_identities() {
    init_logging();
    let probe = Probe::shared("a");
    let mut channel = Channel::new();
    channel.subscribe_method(&probe, Probe::tick_left);
    channel.subscribe_method(&probe, Probe::tick_right);

    channel.unsubscribe_method(&probe, Probe::tick_left);
    assert_eq!(channel.len(), 1);

    channel.trigger((1, "t".to_string()));
    assert_eq!(probe.ticks.get(), 1);
}

#[test]
fn unsubscribe_method_of_unregistered_pair_is_a_no_op() {
    init_logging();
    let a = Probe::shared("a");
    let b = Probe::shared("b");
    let mut channel = Channel::new();
    channel.subscribe_method(&a, Probe::observe);

    // Same method on another instance, and another method on the same instance
    channel.unsubscribe_method(&b, Probe::observe);
    channel.unsubscribe_method(&a, Probe::echo);
    assert_eq!(channel.len(), 1);

    channel.trigger((4, "kept".to_string()));
    assert_eq!(drain(), vec!["a.observe(4, kept)"]);
}

#[test]
fn unsubscribe_method_leaves_other_methods_of_same_owner() {
    init_logging();
    let probe = Probe::shared("a");
    let mut channel = Channel::new();
    channel.subscribe_method(&probe, Probe::observe);
    channel.subscribe_method(&probe, Probe::echo);

    channel.unsubscribe_method(&probe, Probe::observe);
    channel.trigger((6, "left".to_string()));

    assert_eq!(drain(), vec!["a.echo(6, left)"]);
    assert!(probe.seen.borrow().is_empty());
}

#[test]
fn method_listener_can_trigger_another_channel_on_same_owner() {
    init_logging();
    let relay = Rc::new(Relay {
        downstream: RefCell::new(EventChannel::new()),
        received: Cell::new(None),
    });
    relay
        .downstream
        .borrow_mut()
        .subscribe_method(&relay, Relay::on_inner);

    let mut outer: EventChannel<(u32,)> = EventChannel::new();
    outer.subscribe_method(&relay, Relay::on_outer);

    let dispatch = outer.trigger((1,));

    assert_eq!(dispatch.invoked, 1);
    assert_eq!(drain(), vec!["relay.on_outer(1)", "relay.on_inner(10)"]);
    assert_eq!(relay.received.get(), Some(10));
}
