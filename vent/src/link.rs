//! 监听器链接（Link）与处理器发现（Discovery）
//!
//! `Link` 把任意监听器对象的处理方法绑定进总线：
//! - 处理方法按 事件类型 → 优先级 → 消费者 分组；
//! - 扩展方法转换为 `Extender`，随 Link 一起注册与注销；
//! - 发现过程由 `Listener::discover` 提供，通常由 `#[listener]` 在编译期生成，
//!   也可以手写实现，注册表与分发器都不关心发现方式。
//!
//! 发现在构造时一次性完成（非惰性）。
//!
use crate::event::{Event, EventKind};
use crate::extender::{Extender, ExtenderFn, HandlerResult, erase_result};
use crate::host::Host;
use crate::priority::Priority;
use crate::registry::{VentMap, next_sequence};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 监听器未声明 key 时使用的 key
pub const NULL_KEY: &str = "null";

pub(crate) type LinkHandlerFn = Arc<dyn Fn(&mut dyn Event) -> HandlerResult + Send + Sync>;

/// Link 标识，同时反映注册先后顺序
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(u64);

impl LinkId {
    /// 不属于任何 Link（独立创建的扩展器）
    pub fn detached() -> Self {
        LinkId(0)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// 可被 Link 扫描的监听器
///
/// ```rust
/// use std::sync::Arc;
/// use vent::{Event, EventHeader, Priority};
/// use vent::link::{Discovery, Listener};
///
/// #[derive(Event)]
/// struct Tick {
///     #[event(header)]
///     header: EventHeader,
/// }
///
/// struct Clock;
///
/// impl Listener for Clock {
///     fn key(&self) -> Option<&str> {
///         Some("clock")
///     }
///
///     fn discover(self: Arc<Self>) -> Discovery {
///         let mut d = Discovery::new();
///         d.handler("on_tick", Priority::Low, false, &[], move |_: &mut Tick| {});
///         d
///     }
/// }
/// ```
pub trait Listener: Send + Sync + 'static {
    /// 监听器 key（对应类型级标记），缺省为 `"null"`
    fn key(&self) -> Option<&str> {
        None
    }

    /// 产出处理器与扩展器的发现结果
    fn discover(self: Arc<Self>) -> Discovery;
}

/// Link 内的单个事件消费者
#[derive(Clone)]
pub struct LinkConsumer {
    method: &'static str,
    process_cancelled: bool,
    result_processors: Vec<String>,
    handler: LinkHandlerFn,
}

impl LinkConsumer {
    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn processes_cancelled(&self) -> bool {
        self.process_cancelled
    }

    pub fn result_processors(&self) -> &[String] {
        &self.result_processors
    }

    /// 以对应事件类型层级上的视图调用
    pub(crate) fn call(&self, event: &mut dyn Event) -> HandlerResult {
        (self.handler)(event)
    }
}

impl fmt::Debug for LinkConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkConsumer")
            .field("method", &self.method)
            .field("process_cancelled", &self.process_cancelled)
            .field("result_processors", &self.result_processors)
            .finish()
    }
}

/// 被 `#[disabled]` 标记、未参与分发的处理方法
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisabledHandler {
    pub kind: EventKind,
    pub priority: Priority,
    pub method: &'static str,
    pub until: &'static str,
}

struct HandlerBinding {
    kind: EventKind,
    priority: Priority,
    consumer: LinkConsumer,
}

struct ExtenderBinding {
    key: String,
    payload: TypeId,
    payload_name: &'static str,
    method: &'static str,
    result_processors: Vec<String>,
    consumer: ExtenderFn,
}

/// 一次监听器扫描的结果
///
/// - 处理器：(事件类型, 优先级, 是否处理已取消事件, 结果处理 key, 处理函数)
/// - 扩展器：(载荷类型, 扩展 key, 结果处理 key, 处理函数)
/// - 已禁用的处理方法（仅作记录）
#[derive(Default)]
pub struct Discovery {
    handlers: Vec<HandlerBinding>,
    extenders: Vec<ExtenderBinding>,
    disabled: Vec<DisabledHandler>,
}

fn owned_keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| (*k).to_owned()).collect()
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册事件处理器
    pub fn handler<E, R, F>(
        &mut self,
        method: &'static str,
        priority: Priority,
        process_cancelled: bool,
        result_processors: &[&str],
        f: F,
    ) -> &mut Self
    where
        E: Event,
        R: Any + Send,
        F: Fn(&mut E) -> R + Send + Sync + 'static,
    {
        let route = !result_processors.is_empty();
        let handler: LinkHandlerFn = Arc::new(move |event: &mut dyn Event| {
            match event.as_any_mut().downcast_mut::<E>() {
                Some(ev) => {
                    let out = f(ev);
                    Ok(if route { erase_result(out) } else { None })
                }
                None => Err(format!("type mismatch: expected={}", type_name::<E>())),
            }
        });
        self.push_handler::<E>(method, priority, process_cancelled, result_processors, handler)
    }

    /// 注册返回 `Result` 的事件处理器，`Err` 会被记录为调用失败
    pub fn fallible_handler<E, R, Er, F>(
        &mut self,
        method: &'static str,
        priority: Priority,
        process_cancelled: bool,
        result_processors: &[&str],
        f: F,
    ) -> &mut Self
    where
        E: Event,
        R: Any + Send,
        Er: fmt::Display,
        F: Fn(&mut E) -> Result<R, Er> + Send + Sync + 'static,
    {
        let route = !result_processors.is_empty();
        let handler: LinkHandlerFn = Arc::new(move |event: &mut dyn Event| {
            match event.as_any_mut().downcast_mut::<E>() {
                Some(ev) => match f(ev) {
                    Ok(out) => Ok(if route { erase_result(out) } else { None }),
                    Err(err) => Err(err.to_string()),
                },
                None => Err(format!("type mismatch: expected={}", type_name::<E>())),
            }
        });
        self.push_handler::<E>(method, priority, process_cancelled, result_processors, handler)
    }

    fn push_handler<E: Event>(
        &mut self,
        method: &'static str,
        priority: Priority,
        process_cancelled: bool,
        result_processors: &[&str],
        handler: LinkHandlerFn,
    ) -> &mut Self {
        self.handlers.push(HandlerBinding {
            kind: EventKind::of::<E>(),
            priority,
            consumer: LinkConsumer {
                method,
                process_cancelled,
                result_processors: owned_keys(result_processors),
                handler,
            },
        });
        self
    }

    /// 注册扩展器：接收 `key` 通道上类型为 `T` 的载荷
    pub fn extender<T, R, F>(
        &mut self,
        method: &'static str,
        key: &str,
        result_processors: &[&str],
        f: F,
    ) -> &mut Self
    where
        T: Any,
        R: Any + Send,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let route = !result_processors.is_empty();
        let consumer: ExtenderFn = Arc::new(move |value: &dyn Any| match value.downcast_ref::<T>() {
            Some(v) => {
                let out = f(v);
                Ok(if route { erase_result(out) } else { None })
            }
            None => Err(format!("type mismatch: expected={}", type_name::<T>())),
        });
        self.push_extender::<T>(method, key, result_processors, consumer)
    }

    /// 注册返回 `Result` 的扩展器
    pub fn fallible_extender<T, R, Er, F>(
        &mut self,
        method: &'static str,
        key: &str,
        result_processors: &[&str],
        f: F,
    ) -> &mut Self
    where
        T: Any,
        R: Any + Send,
        Er: fmt::Display,
        F: Fn(&T) -> Result<R, Er> + Send + Sync + 'static,
    {
        let route = !result_processors.is_empty();
        let consumer: ExtenderFn = Arc::new(move |value: &dyn Any| match value.downcast_ref::<T>() {
            Some(v) => match f(v) {
                Ok(out) => Ok(if route { erase_result(out) } else { None }),
                Err(err) => Err(err.to_string()),
            },
            None => Err(format!("type mismatch: expected={}", type_name::<T>())),
        });
        self.push_extender::<T>(method, key, result_processors, consumer)
    }

    fn push_extender<T: Any>(
        &mut self,
        method: &'static str,
        key: &str,
        result_processors: &[&str],
        consumer: ExtenderFn,
    ) -> &mut Self {
        self.extenders.push(ExtenderBinding {
            key: key.to_owned(),
            payload: TypeId::of::<T>(),
            payload_name: type_name::<T>(),
            method,
            result_processors: owned_keys(result_processors),
            consumer,
        });
        self
    }

    /// 记录一个被禁用的处理方法
    pub fn disabled<E: Event>(
        &mut self,
        method: &'static str,
        priority: Priority,
        until: &'static str,
    ) -> &mut Self {
        self.disabled.push(DisabledHandler {
            kind: EventKind::of::<E>(),
            priority,
            method,
            until,
        });
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn extender_count(&self) -> usize {
        self.extenders.len()
    }
}

type EventMap = HashMap<EventKind, HashMap<Priority, Vec<LinkConsumer>>>;

/// 监听器链接
pub struct Link {
    id: LinkId,
    listener: Arc<dyn Any + Send + Sync>,
    listener_name: &'static str,
    host: Host,
    key: String,
    event_map: EventMap,
    extenders: Vec<Arc<Extender>>,
    disabled: Vec<DisabledHandler>,
}

impl Link {
    /// 扫描监听器并构建 Link（不会注册到注册表）
    pub fn new<L: Listener>(host: Host, listener: Arc<L>) -> Self {
        let key = listener.key().unwrap_or(NULL_KEY).to_owned();
        let discovery = listener.clone().discover();
        Self::from_discovery(host, listener, key, discovery)
    }

    /// 由外部提供的发现结果构建 Link
    pub fn from_discovery<L: Any + Send + Sync>(
        host: Host,
        listener: Arc<L>,
        key: impl Into<String>,
        discovery: Discovery,
    ) -> Self {
        let id = LinkId(next_sequence());

        let mut event_map: EventMap = HashMap::new();
        for binding in discovery.handlers {
            event_map
                .entry(binding.kind)
                .or_default()
                .entry(binding.priority)
                .or_default()
                .push(binding.consumer);
        }

        let extenders = discovery
            .extenders
            .into_iter()
            .map(|b| {
                Arc::new(Extender::from_parts(
                    b.key,
                    b.payload,
                    b.payload_name,
                    id,
                    b.method,
                    b.result_processors,
                    b.consumer,
                ))
            })
            .collect();

        Self {
            id,
            listener,
            listener_name: type_name::<L>(),
            host,
            key: key.into(),
            event_map,
            extenders,
            disabled: discovery.disabled,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Link 的 key，未声明时为 `"null"`
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 被包装的监听器实例
    pub fn listener(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.listener
    }

    pub fn listener_name(&self) -> &'static str {
        self.listener_name
    }

    /// 还原为具体类型的监听器
    pub fn listener_as<L: Any + Send + Sync>(&self) -> Option<Arc<L>> {
        self.listener.clone().downcast::<L>().ok()
    }

    /// 是否包装了同一个监听器实例
    pub fn wraps<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        Arc::as_ptr(&self.listener).cast::<()>() == Arc::as_ptr(listener).cast::<()>()
    }

    /// 指定事件类型与优先级上的消费者（不含子类型）
    pub fn handlers(&self, kind: &EventKind, priority: Priority) -> &[LinkConsumer] {
        self.event_map
            .get(kind)
            .and_then(|m| m.get(&priority))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn event_kinds(&self) -> impl Iterator<Item = &EventKind> {
        self.event_map.keys()
    }

    pub fn extenders(&self) -> &[Arc<Extender>] {
        &self.extenders
    }

    /// 指定事件类型与优先级上被禁用的处理方法
    pub fn disabled_handlers(&self, kind: &EventKind, priority: Priority) -> Vec<&DisabledHandler> {
        self.disabled
            .iter()
            .filter(|d| d.kind == *kind && d.priority == priority)
            .collect()
    }

    /// 从注册表中移除本 Link 及其全部扩展器
    pub fn remove(&self, map: &VentMap) {
        map.unsubscribe_link(self);
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.listener, &other.listener)
            && self.host == other.host
            && self.key == other.key
    }
}

impl Eq for Link {}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("id", &self.id)
            .field("listener", &self.listener_name)
            .field("host", &self.host)
            .field("key", &self.key)
            .field("event_map", &self.event_map)
            .field("extenders", &self.extenders)
            .finish()
    }
}
