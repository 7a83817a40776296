use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use vent::link::NULL_KEY;
use vent::{
    AnySubscription, Event, EventHeader, EventKind, Host, Link, Priority, Subscription, VentError,
    VentMap, listener,
};

#[derive(Event)]
struct Joined {
    #[event(header)]
    header: EventHeader,
}

#[derive(Event)]
struct Left {
    #[event(header)]
    header: EventHeader,
}

struct Greeter;

#[listener(key = "greeter")]
impl Greeter {
    #[subscribe(priority = High)]
    fn greet(&self, _ev: &mut Joined) {}

    #[subscribe(priority = Low, process_cancelled)]
    fn farewell(&self, _ev: &Left) {}

    #[subscribe(priority = Low)]
    #[disabled(until = "3.0")]
    fn retired(&self, _ev: &mut Joined) {}

    #[extend(identifier = "greetings")]
    fn record(&self, _name: &String) {}
}

struct Anonymous;

#[listener]
impl Anonymous {
    #[disabled]
    fn never(&self, _ev: &mut Left) {}
}

fn sub<E: Event>(map: &VentMap, host: &str, priority: Priority, key: &str) -> Subscription<E> {
    Subscription::<E>::builder()
        .host(Host::new(host))
        .priority(priority)
        .key(key)
        .handler(|_, _| {})
        .build(map)
        .unwrap()
}

#[test]
fn listener_macro_builds_the_event_map() {
    let link = Link::new(Host::new("app"), Arc::new(Greeter));
    assert_eq!(link.key(), "greeter");

    let joined = EventKind::of::<Joined>();
    let left = EventKind::of::<Left>();
    let greet = link.handlers(&joined, Priority::High);
    assert_eq!(greet.len(), 1);
    assert_eq!(greet[0].method(), "greet");
    assert!(!greet[0].processes_cancelled());

    let farewell = link.handlers(&left, Priority::Low);
    assert_eq!(farewell.len(), 1);
    assert!(farewell[0].processes_cancelled());

    assert!(link.handlers(&joined, Priority::Low).is_empty());
    let disabled = link.disabled_handlers(&joined, Priority::Low);
    assert_eq!(disabled.len(), 1);
    assert_eq!(disabled[0].method, "retired");
    assert_eq!(disabled[0].until, "3.0");

    assert_eq!(link.extenders().len(), 1);
    assert_eq!(link.extenders()[0].key(), "greetings");
    assert_eq!(link.extenders()[0].link(), link.id());
    assert!(link.listener_as::<Greeter>().is_some());
}

#[test]
fn listener_without_key_uses_null_key() {
    let link = Link::new(Host::new("app"), Arc::new(Anonymous));
    assert_eq!(link.key(), NULL_KEY);
    assert_eq!(link.event_kinds().count(), 0);
    assert_eq!(
        link.disabled_handlers(&EventKind::of::<Left>(), Priority::Medium)
            .len(),
        1
    );
}

#[test]
fn host_conveniences_scope_to_the_host() {
    let map = VentMap::new();
    let app = Host::new("app");
    let plugin = Host::new("plugin");

    let greeter = Arc::new(Greeter);
    let link = app.subscribe(&map, greeter.clone());
    plugin.subscribe_all(&map, vec![Arc::new(Greeter), Arc::new(Greeter)]);
    let joined = sub::<Joined>(&map, "app", Priority::Medium, "welcome");
    sub::<Joined>(&map, "plugin", Priority::Medium, "welcome");

    assert_eq!(app.links(&map).len(), 1);
    assert_eq!(plugin.links(&map).len(), 2);
    assert_eq!(app.link(&map, "greeter").map(|l| l.id()), Some(link.id()));
    assert!(app.link(&map, "missing").is_none());
    assert_eq!(app.subscription::<Joined>(&map, "welcome"), Some(joined));
    assert!(app.subscription::<Left>(&map, "welcome").is_none());
    assert_eq!(app.subscriptions(&map).len(), 1);

    assert!(app.unsubscribe(&map, &greeter));
    assert!(!app.unsubscribe(&map, &greeter));
    assert!(app.links(&map).is_empty());
    assert_eq!(map.extenders("greetings").len(), 2);

    assert_eq!(map.unsubscribe_host(&plugin), 3);
    assert!(map.extenders("greetings").is_empty());
    assert_eq!(map.subscriptions().len(), 1);
}

#[test]
fn builder_reports_every_missing_field() {
    let map = VentMap::new();
    let err = Subscription::<Joined>::builder().build(&map).unwrap_err();
    assert!(matches!(err, VentError::IllegalState { .. }));
    assert_eq!(
        err.to_string(),
        "illegal state: there are still unassigned builds needed to build a subscription: host, priority, handler"
    );
}

#[test]
fn subscribe_all_accepts_mixed_event_types() {
    let map = VentMap::new();
    let joined = Subscription::<Joined>::new(Host::new("app"), Priority::Low, |_, _| {});
    let left = Subscription::<Left>::new(Host::new("app"), Priority::Low, |_, _| {});
    assert!(map.subscriptions().is_empty());

    let batch: Vec<Arc<dyn AnySubscription>> =
        vec![Arc::new(joined.clone()), Arc::new(left.clone())];
    map.subscribe_all(batch);
    assert_eq!(map.subscriptions_of_type::<Joined>(Priority::Low), vec![joined]);
    assert_eq!(map.subscriptions_of_type::<Left>(Priority::Low), vec![left]);
    assert!(map.subscriptions_of_type::<Left>(Priority::High).is_empty());
}

#[test]
fn query_results_follow_registration_order() {
    let map = VentMap::new();
    let first = sub::<Joined>(&map, "b", Priority::Highest, "x");
    let second = sub::<Left>(&map, "a", Priority::Low, "y");
    let third = sub::<Joined>(&map, "a", Priority::Low, "z");

    let ids: Vec<_> = map.subscriptions().iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec![first.id(), second.id(), third.id()]);

    let a = map.subscriptions_of(&Host::new("a"));
    assert_eq!(a.len(), 2);
    assert_eq!(a[0].key(), Some("y"));
    assert_eq!(a[1].key(), Some("z"));
}

#[test]
fn predicate_and_key_removal() {
    let map = VentMap::new();
    sub::<Joined>(&map, "a", Priority::Low, "audit");
    sub::<Left>(&map, "a", Priority::Low, "audit");
    sub::<Joined>(&map, "a", Priority::High, "keep");
    sub::<Joined>(&map, "b", Priority::ReadOnly, "observer");

    assert_eq!(map.unsubscribe_where(|s| s.priority().is_read_only()), 1);
    assert_eq!(map.unsubscribe_all_key("audit"), 2);
    assert_eq!(map.subscriptions().len(), 1);
    assert!(map.subscription::<Joined>("keep").is_some());
    assert!(!map.unsubscribe_keyed::<Left>("keep"));
    assert!(map.unsubscribe_keyed::<Joined>("keep"));
    assert!(map.subscriptions().is_empty());
}

#[test]
fn removal_predicate_may_read_the_registry() {
    let map = Arc::new(VentMap::new());
    sub::<Joined>(&map, "a", Priority::Low, "x");
    sub::<Left>(&map, "a", Priority::High, "y");
    sub::<Joined>(&map, "b", Priority::Low, "z");

    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(&map);
    thread::spawn(move || {
        let removed = worker.unsubscribe_where(|s| worker.subscriptions_of(s.host()).len() > 1);
        let _ = tx.send(removed);
    });

    let removed = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("unsubscribe_where must not hold a lock while evaluating the predicate");
    assert_eq!(removed, 2);
    let left = map.subscriptions();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].key(), Some("z"));
}

#[test]
fn host_registers_and_removes_subscriptions() {
    let map = VentMap::new();
    let app = Host::new("app");
    let own = Subscription::<Joined>::new(app.clone(), Priority::Low, |_, _| {});
    let foreign = Subscription::<Left>::new(Host::new("plugin"), Priority::High, |_, _| {});

    let registered = app.subscribe_subscription(&map, &own);
    assert_eq!(registered, own);
    let rehomed = app.subscribe_subscription(&map, &foreign);
    assert_ne!(rehomed, foreign);
    assert_eq!(rehomed.host(), &app);
    assert_eq!(rehomed.priority(), Priority::High);
    assert_eq!(app.subscriptions(&map).len(), 2);
    assert!(map.subscriptions_of(&Host::new("plugin")).is_empty());

    assert!(app.unsubscribe_subscription(&map, &own));
    assert!(!app.unsubscribe_subscription(&map, &own));
    map.subscribe(&own);

    let batch: Vec<Arc<dyn AnySubscription>> =
        vec![Arc::new(own.clone()), Arc::new(rehomed), Arc::new(foreign)];
    assert_eq!(app.unsubscribe_all(&map, batch), 2);
    assert!(map.subscriptions().is_empty());
}
