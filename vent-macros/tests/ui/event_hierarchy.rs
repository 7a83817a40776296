use vent::event::lineage;
use vent::{Event, EventHeader, Host, State};

#[derive(Event)]
struct Connected {
    #[event(header)]
    header: EventHeader,
    peer: String,
}

#[derive(Event)]
struct Reconnected {
    #[event(parent)]
    base: Connected,
    attempts: u32,
}

#[derive(Event)]
struct Tuple(#[event(header)] EventHeader);

fn main() {
    let mut ev = Reconnected {
        base: Connected {
            header: EventHeader::with_state(Host::new("net"), State::Cancellable, false),
            peer: "10.0.0.1".into(),
        },
        attempts: 3,
    };
    ev.set_cancelled(true).unwrap();
    assert!(ev.base.is_cancelled());
    assert_eq!(lineage(&ev).len(), 2);
    assert_eq!(ev.attempts, 3);
    assert_eq!(ev.base.peer, "10.0.0.1");

    let t = Tuple(EventHeader::new(Host::new("net"), true));
    assert!(t.is_async());
}
