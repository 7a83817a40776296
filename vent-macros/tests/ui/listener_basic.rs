use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use vent::{Event, EventHeader, Host, Link, VentMap, listener};

#[derive(Event)]
struct Tick {
    #[event(header)]
    header: EventHeader,
}

#[derive(Default)]
struct Clock {
    ticks: AtomicUsize,
}

#[listener(key = "clock")]
impl Clock {
    #[subscribe(priority = High)]
    fn on_tick(&self, _tick: &mut Tick) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }

    #[subscribe(priority = ReadOnly, process_cancelled)]
    fn observe(&self, tick: &Tick) -> usize {
        usize::from(tick.is_cancelled())
    }

    #[subscribe(result_processors = ["ticks"])]
    fn fallible(&self, _tick: &mut Tick) -> Result<u64, String> {
        Ok(1)
    }

    #[subscribe]
    #[disabled(until = "2.0")]
    fn legacy(&self, _tick: &mut Tick) {}

    #[extend(identifier = "ticks")]
    fn count(&self, value: &u64) -> u64 {
        *value + 1
    }

    fn helper(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }
}

fn main() {
    let clock = Arc::new(Clock::default());
    let link = Link::new(Host::new("app"), clock.clone());
    assert_eq!(link.key(), "clock");
    assert_eq!(link.extenders().len(), 1);

    let map = VentMap::new();
    map.subscribe_link(Arc::new(link));
    map.dispatch(Tick {
        header: EventHeader::new(Host::new("app"), false),
    })
    .unwrap();
    assert_eq!(clock.helper(), 1);
}
