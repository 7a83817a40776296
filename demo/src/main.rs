use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vent::{
    Call, Event, EventHeader, Host, Priority, Runtime, Subscription, VentConfig, VentMap, listener,
};

#[derive(Event)]
struct MessagePosted {
    #[event(header)]
    header: EventHeader,
    author: String,
    body: String,
}

#[derive(Event)]
struct DirectMessagePosted {
    #[event(parent)]
    message: MessagePosted,
    recipient: String,
}

/// 屏蔽含敏感词的消息
struct Moderation {
    banned: Vec<&'static str>,
}

#[listener(key = "moderation")]
impl Moderation {
    #[subscribe(priority = Low, result_processors = ["strikes"])]
    fn screen(&self, ev: &mut MessagePosted) -> Option<String> {
        let hit = self.banned.iter().any(|w| ev.body.contains(w));
        if hit {
            ev.set_cancelled(true).ok();
            return Some(ev.author.clone());
        }
        None
    }

    #[subscribe(priority = Highest, process_cancelled)]
    fn appeal(&self, ev: &mut MessagePosted) {
        if ev.is_cancelled() && ev.author == "admin" {
            ev.set_cancelled(false).ok();
        }
    }
}

/// 统计违规次数
#[derive(Default)]
struct StrikeBoard {
    strikes: Mutex<Vec<String>>,
}

#[listener(key = "strike-board")]
impl StrikeBoard {
    #[extend(identifier = "strikes")]
    fn record(&self, author: &Option<String>) {
        if let Some(author) = author {
            info!(author = %author, "strike recorded");
            self.strikes.lock().map(|mut s| s.push(author.clone())).ok();
        }
    }
}

/// 投递统计，只读观察
#[derive(Default)]
struct Delivery {
    delivered: AtomicU64,
}

#[listener]
impl Delivery {
    #[subscribe(priority = Medium)]
    fn deliver(&self, ev: &MessagePosted) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        info!(author = %ev.author, "message delivered");
    }

    #[subscribe(priority = ReadOnly, process_cancelled)]
    fn audit(&self, ev: &mut MessagePosted) {
        // 只读处理器的修改会被回滚
        ev.set_cancelled(true).ok();
        info!(author = %ev.author, cancelled = ev.is_cancelled(), "audit");
    }
}

fn post(host: &Host, author: &str, body: &str) -> MessagePosted {
    MessagePosted {
        header: EventHeader::new(host.clone(), false),
        author: author.to_owned(),
        body: body.to_owned(),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vent=info".parse()?))
        .init();

    let config: VentConfig = serde_json::from_str(r#"{ "runtime": "synchronous" }"#)?;
    let map = Arc::new(VentMap::with_config(config));
    let chat = Host::new("chat");

    chat.subscribe(
        &map,
        Arc::new(Moderation {
            banned: vec!["spam", "scam"],
        }),
    );
    let board = Arc::new(StrikeBoard::default());
    chat.subscribe(&map, board.clone());
    let delivery = Arc::new(Delivery::default());
    chat.subscribe(&map, delivery.clone());

    let dm = Subscription::<DirectMessagePosted>::builder()
        .host(chat.clone())
        .priority(Priority::High)
        .key("dm-routing")
        .handler(|ev, _| info!(to = %ev.recipient, "routing direct message"))
        .build(&map)?;

    for (author, body) in [
        ("alice", "hello there"),
        ("mallory", "cheap spam here"),
        ("admin", "scam warning: do not click"),
    ] {
        let ev = Call::new(post(&chat, author, body))
            .expect_runtime(Runtime::Synchronous)
            .run(&map)?;
        info!(author, cancelled = ev.is_cancelled(), "posted");
    }

    let ev = map.dispatch(DirectMessagePosted {
        message: post(&chat, "bob", "see you"),
        recipient: "alice".into(),
    })?;
    info!(cancelled = ev.is_cancelled(), "direct message dispatched");

    dm.remove(&map);
    let strikes = board.strikes.lock().map(|s| s.clone()).unwrap_or_default();
    info!(
        delivered = delivery.delivered.load(Ordering::Relaxed),
        strikes = ?strikes,
        links = chat.links(&map).len(),
        subscriptions = chat.subscriptions(&map).len(),
        "done"
    );

    map.unsubscribe_host(&chat);
    Ok(())
}
