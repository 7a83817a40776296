//! 事件注册表（VentMap）
//!
//! 进程内共享的 Link / Subscription / Extender 存储：
//! - 由应用的组合根显式创建并以 `Arc` 共享，不存在全局单例；
//! - 每类条目一张并发表，以复合键索引，通过 `DashMap::entry` 提供原子的 get-or-create；
//!   订阅按 (事件类型, 优先级) 分桶，分发时直接命中单个桶；
//! - 查询一律返回快照（`Vec`），未命中返回空结果而不是错误；
//! - 结果按注册先后排序：序号在写入桶时盖上，重新注册的条目排在最后。
//!
use crate::call::{Call, isolate};
use crate::config::VentConfig;
use crate::error::VentResult;
use crate::event::{Event, EventKind};
use crate::extender::Extender;
use crate::host::Host;
use crate::link::{Link, Listener};
use crate::priority::Priority;
use crate::subscription::{AnySubscription, Subscription, SubscriptionId};
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, warn};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// 进程内单调递增序号，用于条目标识与注册顺序
pub(crate) fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

type LinkKey = (Host, String);
type SubscriptionKey = (EventKind, Priority);

// 桶内条目：`seq` 为写入注册表时的序号
struct Entry<T: ?Sized> {
    seq: u64,
    item: Arc<T>,
}

impl<T: ?Sized> Entry<T> {
    fn stamp(item: Arc<T>) -> Self {
        Self {
            seq: next_sequence(),
            item,
        }
    }
}

impl<T: ?Sized> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            item: self.item.clone(),
        }
    }
}

/// 事件注册表
pub struct VentMap {
    links: DashMap<LinkKey, Vec<Entry<Link>>>,
    subscriptions: DashMap<SubscriptionKey, Vec<Entry<dyn AnySubscription>>>,
    extenders: DashMap<String, Vec<Arc<Extender>>>,
    config: VentConfig,
}

impl Default for VentMap {
    fn default() -> Self {
        Self::with_config(VentConfig::default())
    }
}

impl VentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: VentConfig) -> Self {
        Self {
            links: DashMap::new(),
            subscriptions: DashMap::new(),
            extenders: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &VentConfig {
        &self.config
    }

    /// 分发事件，等价于 `Call::new(event).run(self)`
    pub fn dispatch<E: Event>(&self, event: E) -> VentResult<E> {
        Call::new(event).run(self)
    }
}

// ---- 注册 ----
impl VentMap {
    /// 扫描监听器并以 `host` 注册；同一监听器重复注册时返回已有的 Link
    pub fn subscribe_listener<L: Listener>(&self, host: &Host, listener: Arc<L>) -> Arc<Link> {
        self.subscribe_link(Arc::new(Link::new(host.clone(), listener)))
    }

    /// 注册 Link 及其扩展器；已存在相等的 Link 时返回已有实例
    pub fn subscribe_link(&self, link: Arc<Link>) -> Arc<Link> {
        {
            let mut bucket = self
                .links
                .entry((link.host().clone(), link.key().to_owned()))
                .or_default();
            if let Some(existing) = bucket
                .iter()
                .find(|e| e.item.as_ref() == link.as_ref())
            {
                warn!(
                    host = %link.host(),
                    key = link.key(),
                    listener = link.listener_name(),
                    "listener already linked, keeping existing link"
                );
                return existing.item.clone();
            }
            bucket.push(Entry::stamp(link.clone()));
        }

        self.attach_extenders(&link);
        link
    }

    // 登记 Link 的扩展器；若 Link 在此期间已被注销，则撤回刚登记的扩展器
    fn attach_extenders(&self, link: &Arc<Link>) {
        for extender in link.extenders() {
            self.subscribe_extender(extender.clone());
        }
        if !self.is_linked(link) {
            for extender in link.extenders() {
                self.unsubscribe_extender(extender);
            }
        }
    }

    fn is_linked(&self, link: &Arc<Link>) -> bool {
        self.links
            .get(&(link.host().clone(), link.key().to_owned()))
            .is_some_and(|bucket| bucket.iter().any(|e| Arc::ptr_eq(&e.item, link)))
    }

    /// 注册订阅
    pub fn subscribe<E: Event>(&self, subscription: &Subscription<E>) {
        self.subscribe_erased(Arc::new(subscription.clone()));
    }

    /// 注册类型擦除的订阅；同一订阅不会重复注册
    pub fn subscribe_erased(&self, subscription: Arc<dyn AnySubscription>) {
        let key = (subscription.event_kind(), subscription.priority());
        let mut bucket = self.subscriptions.entry(key).or_default();
        if bucket.iter().any(|e| e.item.id() == subscription.id()) {
            return;
        }
        bucket.push(Entry::stamp(subscription));
    }

    /// 批量注册订阅
    pub fn subscribe_all(&self, subscriptions: impl IntoIterator<Item = Arc<dyn AnySubscription>>) {
        for subscription in subscriptions {
            self.subscribe_erased(subscription);
        }
    }

    /// 注册扩展器
    pub fn subscribe_extender(&self, extender: Arc<Extender>) {
        let mut bucket = self.extenders.entry(extender.key().to_owned()).or_default();
        if bucket.iter().any(|e| e.id() == extender.id()) {
            return;
        }
        bucket.push(extender);
    }
}

// ---- 注销 ----
impl VentMap {
    /// 注销包装了该监听器实例的第一个 Link
    pub fn unsubscribe_listener<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        match self.links().into_iter().find(|l| l.wraps(listener)) {
            Some(link) => self.unsubscribe_link(&link),
            None => false,
        }
    }

    /// 注销 Link 及其全部扩展器
    pub fn unsubscribe_link(&self, link: &Link) -> bool {
        let key = (link.host().clone(), link.key().to_owned());
        let removed = self.remove_links(&key, |l| l == link);
        !removed.is_empty()
    }

    /// 注销订阅；重复调用无副作用
    pub fn unsubscribe<E: Event>(&self, subscription: &Subscription<E>) -> bool {
        self.unsubscribe_erased(subscription)
    }

    /// 注销类型擦除的订阅
    pub fn unsubscribe_erased(&self, subscription: &dyn AnySubscription) -> bool {
        let key = (subscription.event_kind(), subscription.priority());
        self.remove_subscription(&key, subscription.id())
    }

    /// 注销扩展器
    pub fn unsubscribe_extender(&self, extender: &Extender) -> bool {
        let mut removed = false;
        if let Some(mut bucket) = self.extenders.get_mut(extender.key()) {
            let before = bucket.len();
            bucket.retain(|e| e.id() != extender.id());
            removed = bucket.len() != before;
        }
        self.extenders.remove_if(extender.key(), |_, v| v.is_empty());
        removed
    }

    /// 注销宿主下指定 key 的全部 Link
    pub fn unsubscribe_keyed_links(&self, host: &Host, key: &str) -> usize {
        self.remove_links(&(host.clone(), key.to_owned()), |_| true)
            .len()
    }

    /// 注销宿主下指定 key、且包装了该监听器实例的 Link
    pub fn unsubscribe_keyed_listener<L: ?Sized>(
        &self,
        host: &Host,
        key: &str,
        listener: &Arc<L>,
    ) -> usize {
        self.remove_links(&(host.clone(), key.to_owned()), |l| l.wraps(listener))
            .len()
    }

    /// 注销事件类型 `E` 下第一个 key 匹配的订阅
    ///
    /// 同一 key 可能对应多个订阅，此时无法确定移除的是哪一个；
    /// 需要全部移除时使用 [`VentMap::unsubscribe_all_keyed`]。
    pub fn unsubscribe_keyed<E: Event>(&self, key: &str) -> bool {
        let kind = EventKind::of::<E>();
        self.collect_subscriptions(|s| s.event_kind() == kind)
            .into_iter()
            .find(|s| s.key() == Some(key))
            .is_some_and(|found| self.unsubscribe_erased(&*found))
    }

    /// 注销事件类型 `E` 下全部 key 匹配的订阅
    pub fn unsubscribe_all_keyed<E: Event>(&self, key: &str) -> usize {
        let kind = EventKind::of::<E>();
        self.remove_subscriptions(|s| s.event_kind() == kind && s.key() == Some(key))
    }

    /// 注销任意事件类型下全部 key 匹配的订阅
    pub fn unsubscribe_all_key(&self, key: &str) -> usize {
        self.remove_subscriptions(|s| s.key() == Some(key))
    }

    /// 注销满足条件的全部订阅
    ///
    /// 条件在快照上求值，求值期间不持有注册表的锁，因此可以在其中查询注册表。
    pub fn unsubscribe_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&dyn AnySubscription) -> bool,
    {
        self.remove_subscriptions(predicate)
    }

    /// 注销宿主下的全部 Link（连同其扩展器）与订阅
    pub fn unsubscribe_host(&self, host: &Host) -> usize {
        let link_keys: Vec<LinkKey> = self
            .links
            .iter()
            .filter(|e| e.key().0 == *host)
            .map(|e| e.key().clone())
            .collect();
        let mut removed = 0;
        for key in link_keys {
            removed += self.remove_links(&key, |_| true).len();
        }
        removed + self.remove_subscriptions(|s| s.host() == host)
    }

    // 从一个 Link 桶中移除匹配项，同时注销它们的扩展器
    fn remove_links<F>(&self, key: &LinkKey, matches: F) -> Vec<Arc<Link>>
    where
        F: Fn(&Link) -> bool,
    {
        let mut removed = Vec::new();
        if let Some(mut bucket) = self.links.get_mut(key) {
            bucket.retain(|e| {
                if matches(&e.item) {
                    removed.push(e.item.clone());
                    false
                } else {
                    true
                }
            });
        }
        self.links.remove_if(key, |_, v| v.is_empty());

        for link in &removed {
            for extender in link.extenders() {
                self.unsubscribe_extender(extender);
            }
        }
        removed
    }

    // 先在快照上筛选，再逐个按 id 移除，返回移除数量
    fn remove_subscriptions<F>(&self, remove: F) -> usize
    where
        F: Fn(&dyn AnySubscription) -> bool,
    {
        let matched: Vec<Arc<dyn AnySubscription>> = self
            .subscriptions()
            .into_iter()
            .filter(|s| remove(s.as_ref()))
            .collect();
        matched
            .into_iter()
            .filter(|s| self.unsubscribe_erased(s.as_ref()))
            .count()
    }

    fn remove_subscription(&self, key: &SubscriptionKey, id: SubscriptionId) -> bool {
        let mut removed = false;
        if let Some(mut bucket) = self.subscriptions.get_mut(key) {
            let before = bucket.len();
            bucket.retain(|e| e.item.id() != id);
            removed = bucket.len() != before;
        }
        self.subscriptions.remove_if(key, |_, v| v.is_empty());
        removed
    }
}

// ---- 查询 ----
impl VentMap {
    /// 全部 Link
    pub fn links(&self) -> Vec<Arc<Link>> {
        self.collect_links(|_| true)
    }

    /// 指定宿主的全部 Link
    pub fn links_of(&self, host: &Host) -> Vec<Arc<Link>> {
        self.collect_links(|k| k.0 == *host)
    }

    /// 第一个 key 匹配的 Link
    pub fn link(&self, key: &str) -> Option<Arc<Link>> {
        self.collect_links(|k| k.1 == key).into_iter().next()
    }

    /// 全部订阅
    pub fn subscriptions(&self) -> Vec<Arc<dyn AnySubscription>> {
        self.collect_subscriptions(|_| true)
    }

    /// 指定宿主的全部订阅
    pub fn subscriptions_of(&self, host: &Host) -> Vec<Arc<dyn AnySubscription>> {
        self.collect_subscriptions(|s| s.host() == host)
    }

    /// 指定事件类型与优先级的订阅（不含子类型）
    pub fn subscriptions_for(
        &self,
        kind: EventKind,
        priority: Priority,
    ) -> Vec<Arc<dyn AnySubscription>> {
        // 同一桶内按写入顺序排列，即注册顺序
        self.subscriptions
            .get(&(kind, priority))
            .map(|bucket| bucket.iter().map(|e| e.item.clone()).collect())
            .unwrap_or_default()
    }

    /// 指定事件类型与优先级的订阅，还原为具体类型句柄
    pub fn subscriptions_of_type<E: Event>(&self, priority: Priority) -> Vec<Subscription<E>> {
        self.subscriptions_for(EventKind::of::<E>(), priority)
            .iter()
            .filter_map(|s| s.downcast_ref::<E>().cloned())
            .collect()
    }

    /// 事件类型 `E` 下第一个 key 匹配的订阅
    pub fn subscription<E: Event>(&self, key: &str) -> Option<Subscription<E>> {
        let kind = EventKind::of::<E>();
        self.collect_subscriptions(|s| s.event_kind() == kind && s.key() == Some(key))
            .iter()
            .find_map(|s| s.downcast_ref::<E>().cloned())
    }

    /// 指定通道上的扩展器
    pub fn extenders(&self, key: &str) -> Vec<Arc<Extender>> {
        self.extenders
            .get(key)
            .map(|bucket| bucket.clone())
            .unwrap_or_default()
    }

    fn collect_links<F>(&self, in_bucket: F) -> Vec<Arc<Link>>
    where
        F: Fn(&LinkKey) -> bool,
    {
        let mut entries: Vec<Entry<Link>> = self
            .links
            .iter()
            .filter(|e| in_bucket(e.key()))
            .flat_map(|e| e.value().clone())
            .collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.item).collect()
    }

    // `keep` 在遍历分片时求值，只接受注册表内部的简单条件
    fn collect_subscriptions<F>(&self, keep: F) -> Vec<Arc<dyn AnySubscription>>
    where
        F: Fn(&dyn AnySubscription) -> bool,
    {
        let mut entries: Vec<Entry<dyn AnySubscription>> = self
            .subscriptions
            .iter()
            .flat_map(|e| {
                e.value()
                    .iter()
                    .filter(|s| keep(&*s.item))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.item).collect()
    }
}

// ---- 扩展器投递 ----
impl VentMap {
    /// 把 `value` 投递给 `key` 通道上载荷类型匹配的全部扩展器
    pub fn run_extensions(&self, key: &str, value: &dyn Any) {
        self.run_extensions_at(key, value, 0);
    }

    fn run_extensions_at(&self, key: &str, value: &dyn Any, depth: usize) {
        if depth >= self.config.max_extension_depth {
            warn!(
                key,
                depth, "extension chain exceeded max depth, dropping value"
            );
            return;
        }

        for extender in self.extenders(key) {
            if !extender.accepts(value) {
                continue;
            }

            let outcome = isolate(
                || format!("{}#{} (extender `{}`)", extender.link().value(), extender.method(), key),
                || extender.apply(value),
            );
            match outcome {
                Some(Ok(Some(result))) => {
                    for next in extender.result_processors() {
                        self.run_extensions_at(next, &*result, depth + 1);
                    }
                }
                Some(Ok(None)) | None => {}
                Some(Err(reason)) => {
                    error!(
                        key,
                        method = extender.method(),
                        error = %reason,
                        "extender failed to process value"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHeader;
    use crate::link::Discovery;

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

    struct Pong {
        header: EventHeader,
    }

    impl Event for Pong {
        fn header(&self) -> &EventHeader {
            &self.header
        }

        fn header_mut(&mut self) -> &mut EventHeader {
            &mut self.header
        }
    }

    struct Keyed(&'static str);

    impl Listener for Keyed {
        fn key(&self) -> Option<&str> {
            Some(self.0)
        }

        fn discover(self: Arc<Self>) -> Discovery {
            let mut d = Discovery::new();
            d.extender("collect", "numbers", &[], |_: &u32| {});
            d
        }
    }

    fn sub<E: Event>(host: &str, priority: Priority, key: Option<&str>) -> Subscription<E> {
        let mut builder = Subscription::<E>::builder()
            .host(Host::new(host))
            .priority(priority)
            .handler(|_, _| {});
        if let Some(key) = key {
            builder = builder.key(key);
        }
        builder.build(&VentMap::new()).unwrap()
    }

    #[test]
    fn lookups_on_empty_registry_are_empty() {
        let map = VentMap::new();
        let host = Host::new("nobody");
        assert!(map.links().is_empty());
        assert!(map.links_of(&host).is_empty());
        assert!(map.link("missing").is_none());
        assert!(map.subscriptions().is_empty());
        assert!(map.subscriptions_of(&host).is_empty());
        assert!(map.subscriptions_for(EventKind::of::<Ping>(), Priority::Low).is_empty());
        assert!(map.subscription::<Ping>("missing").is_none());
        assert!(map.extenders("missing").is_empty());
    }

    #[test]
    fn subscriptions_for_is_exact_and_ordered_across_hosts() {
        let map = VentMap::new();
        let a = sub::<Ping>("a", Priority::High, None);
        let b = sub::<Ping>("b", Priority::High, None);
        let c = sub::<Ping>("a", Priority::High, None);
        let other_priority = sub::<Ping>("a", Priority::Low, None);
        let other_kind = sub::<Pong>("a", Priority::High, None);
        for s in [&a, &b, &c, &other_priority] {
            map.subscribe(s);
        }
        map.subscribe(&other_kind);

        let ids: Vec<_> = map
            .subscriptions_for(EventKind::of::<Ping>(), Priority::High)
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(ids, vec![a.id(), b.id(), c.id()]);
        assert_eq!(map.subscriptions_of_type::<Ping>(Priority::Low), vec![other_priority]);
        assert_eq!(map.subscriptions_of(&Host::new("b")).len(), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let map = VentMap::new();
        let s = sub::<Ping>("a", Priority::Medium, None);
        map.subscribe(&s);
        map.subscribe(&s);
        assert_eq!(map.subscriptions().len(), 1);
        assert!(map.unsubscribe(&s));
        assert!(!map.unsubscribe(&s));
        s.remove(&map);
        assert!(map.subscriptions().is_empty());
    }

    #[test]
    fn keyed_unsubscribe_removes_first_match_only() {
        let map = VentMap::new();
        let first = sub::<Ping>("a", Priority::High, Some("dup"));
        let second = sub::<Ping>("b", Priority::Low, Some("dup"));
        let pong = sub::<Pong>("a", Priority::High, Some("dup"));
        map.subscribe(&first);
        map.subscribe(&second);
        map.subscribe(&pong);

        assert_eq!(map.subscription::<Ping>("dup"), Some(first.clone()));
        assert!(map.unsubscribe_keyed::<Ping>("dup"));
        assert_eq!(map.subscription::<Ping>("dup"), Some(second));
        assert_eq!(map.subscriptions().len(), 2);

        map.subscribe(&first);
        assert_eq!(map.unsubscribe_all_keyed::<Ping>("dup"), 2);
        assert!(map.subscription::<Ping>("dup").is_none());
        assert_eq!(map.subscription::<Pong>("dup"), Some(pong));
        assert_eq!(map.unsubscribe_all_key("dup"), 1);
        assert!(map.subscriptions().is_empty());
    }

    #[test]
    fn unsubscribe_where_and_host() {
        let map = VentMap::new();
        map.subscribe(&sub::<Ping>("a", Priority::Low, None));
        map.subscribe(&sub::<Ping>("a", Priority::ReadOnly, None));
        map.subscribe(&sub::<Pong>("b", Priority::Low, None));
        map.subscribe_listener(&Host::new("a"), Arc::new(Keyed("k")));

        assert_eq!(map.unsubscribe_where(|s| s.priority() == Priority::ReadOnly), 1);
        assert_eq!(map.unsubscribe_host(&Host::new("a")), 2);
        assert!(map.links().is_empty());
        assert!(map.extenders("numbers").is_empty());
        assert_eq!(map.subscriptions().len(), 1);
    }

    #[test]
    fn links_are_deduplicated_per_listener_instance() {
        let map = VentMap::new();
        let host = Host::new("a");
        let listener = Arc::new(Keyed("k"));
        let first = map.subscribe_listener(&host, listener.clone());
        let again = map.subscribe_listener(&host, listener.clone());
        let other = map.subscribe_listener(&host, Arc::new(Keyed("k")));

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(map.links_of(&host).len(), 2);
        assert_eq!(map.extenders("numbers").len(), 2);
        assert_eq!(map.link("k").map(|l| l.id()), Some(first.id()));
    }

    #[test]
    fn removing_link_drops_its_extenders() {
        let map = VentMap::new();
        let host = Host::new("a");
        let listener = Arc::new(Keyed("k"));
        let link = map.subscribe_listener(&host, listener.clone());
        let survivor = map.subscribe_listener(&host, Arc::new(Keyed("k")));

        link.remove(&map);
        let remaining = map.extenders("numbers");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].link(), survivor.id());
        assert!(!map.unsubscribe_listener(&listener));
    }

    #[test]
    fn keyed_link_removal() {
        let map = VentMap::new();
        let host = Host::new("a");
        let other = Arc::new(Keyed("other"));
        let dropped = Arc::new(Keyed("k"));
        map.subscribe_listener(&host, Arc::new(Keyed("k")));
        map.subscribe_listener(&host, dropped.clone());
        map.subscribe_listener(&host, other.clone());

        assert_eq!(map.unsubscribe_keyed_listener(&host, "k", &dropped), 1);
        assert_eq!(map.links_of(&host).len(), 2);
        assert_eq!(map.unsubscribe_keyed_links(&host, "k"), 1);
        assert_eq!(map.links_of(&host).len(), 1);
        assert!(map.unsubscribe_listener(&other));
        assert!(map.links().is_empty());
        assert!(map.extenders("numbers").is_empty());
    }

    #[test]
    fn registration_order_is_stamped_on_subscribe() {
        let map = VentMap::new();
        let a = sub::<Ping>("a", Priority::Low, None);
        let b = sub::<Ping>("b", Priority::Low, None);
        map.subscribe(&b);
        map.subscribe(&a);

        let ids = |map: &VentMap| -> Vec<_> {
            map.subscriptions_for(EventKind::of::<Ping>(), Priority::Low)
                .iter()
                .map(|s| s.id())
                .collect()
        };
        assert_eq!(ids(&map), vec![b.id(), a.id()]);

        map.unsubscribe(&b);
        map.subscribe(&b);
        assert_eq!(ids(&map), vec![a.id(), b.id()]);
        let all: Vec<_> = map.subscriptions().iter().map(|s| s.id()).collect();
        assert_eq!(all, vec![a.id(), b.id()]);
    }

    #[test]
    fn links_follow_registration_order() {
        let map = VentMap::new();
        let host = Host::new("a");
        let early = Arc::new(Link::new(host.clone(), Arc::new(Keyed("x"))));
        let late = Arc::new(Link::new(host.clone(), Arc::new(Keyed("y"))));
        map.subscribe_link(late.clone());
        map.subscribe_link(early.clone());

        let ids: Vec<_> = map.links().iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec![late.id(), early.id()]);
    }

    #[test]
    fn extenders_of_a_vanished_link_are_withdrawn() {
        let map = VentMap::new();
        let host = Host::new("a");
        let gone = Arc::new(Link::new(host.clone(), Arc::new(Keyed("k"))));
        map.attach_extenders(&gone);
        assert!(map.extenders("numbers").is_empty());

        let kept = map.subscribe_link(Arc::new(Link::new(host, Arc::new(Keyed("k")))));
        map.attach_extenders(&kept);
        assert_eq!(map.extenders("numbers").len(), 1);
    }
}
