//! 显式订阅（Subscription）
//!
//! 不依赖监听器发现的 (事件类型, 优先级, 处理函数) 绑定：
//! - `Subscription<E>`：调用方持有的句柄，以引用身份（`SubscriptionId`）比较；
//! - `SubscriptionBuilder<E>`：校验必填字段后注册到 `VentMap`；
//! - `AnySubscription`：注册表内部保存的类型擦除视图。
//!
use crate::error::{VentError, VentResult};
use crate::event::{Event, EventKind};
use crate::host::Host;
use crate::priority::Priority;
use crate::registry::{VentMap, next_sequence};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type SubscriptionHandlerFn<E> = Arc<dyn Fn(&mut E, &Subscription<E>) + Send + Sync>;

/// 订阅标识，构造时分配
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

struct Inner<E: Event> {
    id: SubscriptionId,
    kind: EventKind,
    host: Host,
    priority: Priority,
    key: Option<String>,
    process_cancelled: bool,
    handler: SubscriptionHandlerFn<E>,
}

/// 事件订阅句柄
pub struct Subscription<E: Event> {
    inner: Arc<Inner<E>>,
}

impl<E: Event> Clone for Subscription<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Event> PartialEq for Subscription<E> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<E: Event> Eq for Subscription<E> {}

impl<E: Event> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("event", &self.inner.kind.name())
            .field("host", &self.inner.host)
            .field("priority", &self.inner.priority)
            .field("key", &self.inner.key)
            .finish()
    }
}

impl<E: Event> Subscription<E> {
    pub fn builder() -> SubscriptionBuilder<E> {
        SubscriptionBuilder::new()
    }

    /// 创建一个尚未注册的订阅，需通过 `VentMap::subscribe` 注册
    pub fn new<F>(host: Host, priority: Priority, handler: F) -> Self
    where
        F: Fn(&mut E, &Subscription<E>) + Send + Sync + 'static,
    {
        Self::from_parts(host, priority, None, false, Arc::new(handler))
    }

    fn from_parts(
        host: Host,
        priority: Priority,
        key: Option<String>,
        process_cancelled: bool,
        handler: SubscriptionHandlerFn<E>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: SubscriptionId(next_sequence()),
                kind: EventKind::of::<E>(),
                host,
                priority,
                key,
                process_cancelled,
                handler,
            }),
        }
    }

    /// 以另一个宿主重新绑定，得到共享处理函数的新订阅（未注册，身份不同）
    pub fn with_host(&self, host: Host) -> Self {
        Self::from_parts(
            host,
            self.inner.priority,
            self.inner.key.clone(),
            self.inner.process_cancelled,
            self.inner.handler.clone(),
        )
    }

    pub fn id(&self) -> SubscriptionId {
        self.inner.id
    }

    pub fn event_kind(&self) -> EventKind {
        self.inner.kind
    }

    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    pub fn priority(&self) -> Priority {
        self.inner.priority
    }

    pub fn key(&self) -> Option<&str> {
        self.inner.key.as_deref()
    }

    pub fn processes_cancelled(&self) -> bool {
        self.inner.process_cancelled
    }

    /// 从注册表中移除；重复调用无副作用
    pub fn remove(&self, map: &VentMap) {
        map.unsubscribe(self);
    }
}

/// 注册表内部使用的类型擦除订阅
pub trait AnySubscription: Send + Sync {
    fn id(&self) -> SubscriptionId;
    fn event_kind(&self) -> EventKind;
    fn host(&self) -> &Host;
    fn priority(&self) -> Priority;
    fn key(&self) -> Option<&str>;
    fn processes_cancelled(&self) -> bool;
    /// 以 `event_kind` 层级上的事件视图调用处理函数
    fn invoke(&self, event: &mut dyn Event);
    fn as_any(&self) -> &dyn Any;
}

impl dyn AnySubscription {
    /// 还原为具体类型的订阅句柄
    pub fn downcast_ref<E: Event>(&self) -> Option<&Subscription<E>> {
        self.as_any().downcast_ref::<Subscription<E>>()
    }
}

impl fmt::Debug for dyn AnySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnySubscription")
            .field("id", &self.id())
            .field("event", &self.event_kind().name())
            .field("host", self.host())
            .field("priority", &self.priority())
            .field("key", &self.key())
            .finish()
    }
}

impl<E: Event> AnySubscription for Subscription<E> {
    fn id(&self) -> SubscriptionId {
        self.inner.id
    }

    fn event_kind(&self) -> EventKind {
        self.inner.kind
    }

    fn host(&self) -> &Host {
        &self.inner.host
    }

    fn priority(&self) -> Priority {
        self.inner.priority
    }

    fn key(&self) -> Option<&str> {
        self.inner.key.as_deref()
    }

    fn processes_cancelled(&self) -> bool {
        self.inner.process_cancelled
    }

    fn invoke(&self, event: &mut dyn Event) {
        // 调用方按 event_kind 取视图，正常情况下 downcast 不会失败
        if let Some(ev) = event.as_any_mut().downcast_mut::<E>() {
            (self.inner.handler)(ev, self);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 订阅构建器
///
/// `host` 与 `priority`、`handler` 为必填项，缺失时 `build` 返回 `IllegalState`。
/// 构建成功后重复调用 `build` 返回同一个订阅，不会重复注册。
pub struct SubscriptionBuilder<E: Event> {
    key: Option<String>,
    host: Option<Host>,
    priority: Option<Priority>,
    process_cancelled: bool,
    handler: Option<SubscriptionHandlerFn<E>>,
    built: Option<Subscription<E>>,
}

impl<E: Event> Default for SubscriptionBuilder<E> {
    fn default() -> Self {
        Self {
            key: None,
            host: None,
            priority: None,
            process_cancelled: false,
            handler: None,
            built: None,
        }
    }
}

impl<E: Event> SubscriptionBuilder<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn host(mut self, host: Host) -> Self {
        self.host = Some(host);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// 事件已被取消时仍然接收
    pub fn process_cancelled(mut self, yes: bool) -> Self {
        self.process_cancelled = yes;
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut E, &Subscription<E>) + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// 构建并注册到 `map`
    pub fn build(&mut self, map: &VentMap) -> VentResult<Subscription<E>> {
        if let Some(built) = &self.built {
            return Ok(built.clone());
        }

        let (Some(host), Some(priority), Some(handler)) =
            (self.host.clone(), self.priority, self.handler.clone())
        else {
            return Err(VentError::illegal_state(format!(
                "there are still unassigned builds needed to build a subscription: {}",
                self.missing().join(", ")
            )));
        };

        let subscription = Subscription::from_parts(
            host,
            priority,
            self.key.clone(),
            self.process_cancelled,
            handler,
        );
        map.subscribe(&subscription);
        self.built = Some(subscription.clone());
        Ok(subscription)
    }

    fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push("host");
        }
        if self.priority.is_none() {
            missing.push("priority");
        }
        if self.handler.is_none() {
            missing.push("handler");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHeader;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping {
        header: EventHeader,
    }

    impl Event for Ping {
        fn header(&self) -> &EventHeader {
            &self.header
        }

        fn header_mut(&mut self) -> &mut EventHeader {
            &mut self.header
        }
    }

    #[test]
    fn build_fails_without_host_or_priority() {
        let map = VentMap::new();
        let err = Subscription::<Ping>::builder()
            .handler(|_, _| {})
            .build(&map)
            .unwrap_err();
        match err {
            VentError::IllegalState { reason } => {
                assert!(reason.contains("host"));
                assert!(reason.contains("priority"));
                assert!(!reason.contains("handler"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(map.subscriptions().is_empty());
    }

    #[test]
    fn build_registers_once() {
        let map = VentMap::new();
        let mut builder = Subscription::<Ping>::builder()
            .host(Host::new("test"))
            .priority(Priority::High)
            .key("ping")
            .handler(|_, _| {});
        let first = builder.build(&map).unwrap();
        let second = builder.build(&map).unwrap();
        assert_eq!(first, second);
        assert_eq!(map.subscriptions().len(), 1);
        assert_eq!(first.key(), Some("ping"));
        assert_eq!(first.event_kind(), EventKind::of::<Ping>());
    }

    #[test]
    fn identity_is_per_instance() {
        let a = Subscription::<Ping>::new(Host::new("test"), Priority::Low, |_, _| {});
        let b = Subscription::<Ping>::new(Host::new("test"), Priority::Low, |_, _| {});
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.id() < b.id());
    }

    #[test]
    fn erased_invoke_passes_handle() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let sub = Subscription::<Ping>::new(Host::new("test"), Priority::Low, move |ev, s| {
            assert_eq!(s.priority(), Priority::Low);
            ev.set_cancelled(true).unwrap();
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let erased: Arc<dyn AnySubscription> = Arc::new(sub.clone());
        let mut ping = Ping {
            header: EventHeader::new(Host::new("test"), false),
        };
        erased.invoke(&mut ping);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(ping.is_cancelled());
        assert_eq!(erased.downcast_ref::<Ping>(), Some(&sub));
    }
}
