//! 宿主（Host）
//!
//! 监听器与订阅的归属身份。注册表中的所有条目都挂在某个宿主之下，
//! 便于按宿主整体注销（例如一个模块卸载时）。
//!
use crate::event::Event;
use crate::link::{Link, Listener, NULL_KEY};
use crate::registry::VentMap;
use crate::subscription::{AnySubscription, Subscription};
use std::fmt;
use std::sync::Arc;

/// 宿主身份：以名称区分，克隆代价低
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Host {
    name: Arc<str>,
}

impl Host {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 以本宿主注册一个监听器对象
    pub fn subscribe<L: Listener>(&self, map: &VentMap, listener: Arc<L>) -> Arc<Link> {
        map.subscribe_listener(self, listener)
    }

    /// 以本宿主批量注册监听器对象
    pub fn subscribe_all<L: Listener>(
        &self,
        map: &VentMap,
        listeners: impl IntoIterator<Item = Arc<L>>,
    ) -> Vec<Arc<Link>> {
        listeners
            .into_iter()
            .map(|l| map.subscribe_listener(self, l))
            .collect()
    }

    /// 注销一个监听器对象（按实例身份匹配）
    pub fn unsubscribe<L: Listener>(&self, map: &VentMap, listener: &Arc<L>) -> bool {
        let key = listener.key().unwrap_or(NULL_KEY);
        map.unsubscribe_keyed_listener(self, key, listener) > 0
    }

    /// 以本宿主注册一个订阅
    ///
    /// 订阅已属于本宿主时直接注册并返回原句柄；否则以本宿主重新绑定，
    /// 注册并返回新句柄（原句柄保持未注册）。
    pub fn subscribe_subscription<E: Event>(
        &self,
        map: &VentMap,
        subscription: &Subscription<E>,
    ) -> Subscription<E> {
        let subscription = if subscription.host() == self {
            subscription.clone()
        } else {
            subscription.with_host(self.clone())
        };
        map.subscribe(&subscription);
        subscription
    }

    /// 注销一个订阅
    pub fn unsubscribe_subscription<E: Event>(
        &self,
        map: &VentMap,
        subscription: &Subscription<E>,
    ) -> bool {
        map.unsubscribe(subscription)
    }

    /// 批量注销订阅，返回实际移除的数量
    pub fn unsubscribe_all(
        &self,
        map: &VentMap,
        subscriptions: impl IntoIterator<Item = Arc<dyn AnySubscription>>,
    ) -> usize {
        subscriptions
            .into_iter()
            .filter(|s| map.unsubscribe_erased(s.as_ref()))
            .count()
    }

    /// 按 key 获取本宿主的第一个 Link
    pub fn link(&self, map: &VentMap, key: &str) -> Option<Arc<Link>> {
        map.links_of(self).into_iter().find(|l| l.key() == key)
    }

    /// 本宿主的全部 Link
    pub fn links(&self, map: &VentMap) -> Vec<Arc<Link>> {
        map.links_of(self)
    }

    /// 按事件类型与 key 获取本宿主的订阅
    pub fn subscription<E: Event>(&self, map: &VentMap, key: &str) -> Option<Subscription<E>> {
        map.subscriptions_of(self)
            .iter()
            .filter_map(|s| s.downcast_ref::<E>())
            .find(|s| s.key() == Some(key))
            .cloned()
    }

    /// 本宿主的全部订阅
    pub fn subscriptions(&self, map: &VentMap) -> Vec<Arc<dyn AnySubscription>> {
        map.subscriptions_of(self)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Host {
    fn from(name: &str) -> Self {
        Host::new(name)
    }
}
