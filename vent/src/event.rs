//! 事件（Event）
//!
//! 所有被分发消息的基础能力：
//! - `EventHeader`：宿主、运行时标签、可取消状态与取消标记，每个事件实例恰好一份；
//! - `Event`：事件 trait，子事件通过组合父事件（`parent`）形成类型层级；
//! - `EventKind`：事件类型标签（`TypeId` + 类型名），作为注册表的键；
//! - `lineage`/`view_mut`：沿父链计算可匹配的事件类型并取得对应视图。
//!
//! 通常通过 `#[derive(Event)]` 实现：
//! ```rust
//! use vent::{Event, EventHeader, Host};
//!
//! #[derive(Event)]
//! struct Connected {
//!     #[event(header)]
//!     header: EventHeader,
//!     peer: String,
//! }
//!
//! #[derive(Event)]
//! struct TlsConnected {
//!     #[event(parent)]
//!     base: Connected,
//!     cipher: String,
//! }
//!
//! let ev = TlsConnected {
//!     base: Connected {
//!         header: EventHeader::new(Host::new("net"), false),
//!         peer: "10.0.0.1".into(),
//!     },
//!     cipher: "TLS_AES_128_GCM_SHA256".into(),
//! };
//! assert_eq!(vent::event::lineage(&ev).len(), 2);
//! ```
use crate::error::{VentError, VentResult};
use crate::host::Host;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// 事件是否允许被取消
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// 可取消
    #[default]
    Cancellable,
    /// 不可变：任何取消尝试都会返回错误
    Immutable,
}

/// 事件构建时所面向的执行环境（仅为标签，不参与调度）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runtime {
    Synchronous,
    Asynchronous,
}

impl Runtime {
    /// 校验事件能否在当前运行时中执行
    pub fn validate<E: Event + ?Sized>(self, event: &E) -> VentResult<()> {
        let required = event.runtime();
        if required != self {
            return Err(VentError::RuntimeMismatch {
                attempted: self,
                required,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Synchronous => f.write_str("synchronous"),
            Runtime::Asynchronous => f.write_str("asynchronous"),
        }
    }
}

/// 事件头：宿主、运行时、状态与取消标记
#[derive(Clone, Debug)]
pub struct EventHeader {
    host: Host,
    is_async: bool,
    state: State,
    cancelled: bool,
}

impl EventHeader {
    /// 可取消事件
    pub fn new(host: Host, is_async: bool) -> Self {
        Self::with_state(host, State::Cancellable, is_async)
    }

    pub fn with_state(host: Host, state: State, is_async: bool) -> Self {
        Self {
            host,
            is_async,
            state,
            cancelled: false,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub fn runtime(&self) -> Runtime {
        if self.is_async {
            Runtime::Asynchronous
        } else {
            Runtime::Synchronous
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn set_cancelled(&mut self, cancelled: bool) -> VentResult<()> {
        if self.state == State::Immutable {
            return Err(VentError::illegal_state("cannot cancel immutable events"));
        }
        self.cancelled = cancelled;
        Ok(())
    }

    // 只读阶段结束后回滚取消标记，绕过不可变校验
    pub(crate) fn restore_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

/// 事件类型标签
#[derive(Clone, Copy, Debug)]
pub struct EventKind {
    id: TypeId,
    name: &'static str,
}

impl EventKind {
    pub fn of<E: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKind {}

impl Hash for EventKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 类型擦除辅助，为所有 `'static` 类型自动实现
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 事件：可被分发到订阅与监听器的消息
///
/// 根事件持有 `EventHeader`；子事件组合父事件，并通过 `parent`/`parent_mut`
/// 暴露出来，`header` 委托给父事件，保证取消标记在整条继承链上只有一份。
pub trait Event: AsAny + Send + Sync {
    fn header(&self) -> &EventHeader;

    fn header_mut(&mut self) -> &mut EventHeader;

    /// 直接父事件（根事件返回 `None`）
    fn parent(&self) -> Option<&dyn Event> {
        None
    }

    fn parent_mut(&mut self) -> Option<&mut dyn Event> {
        None
    }

    /// 具体类型标签
    fn kind(&self) -> EventKind {
        EventKind::of::<Self>()
    }

    fn host(&self) -> &Host {
        self.header().host()
    }

    fn state(&self) -> State {
        self.header().state()
    }

    fn runtime(&self) -> Runtime {
        self.header().runtime()
    }

    fn is_async(&self) -> bool {
        self.header().is_async()
    }

    fn is_cancelled(&self) -> bool {
        self.header().is_cancelled()
    }

    fn set_cancelled(&mut self, cancelled: bool) -> VentResult<()> {
        self.header_mut().set_cancelled(cancelled)
    }
}

/// 具体类型及其全部祖先类型，自下而上
pub fn lineage(event: &dyn Event) -> Vec<EventKind> {
    let mut kinds = vec![event.kind()];
    let mut current = event.parent();
    while let Some(parent) = current {
        kinds.push(parent.kind());
        current = parent.parent();
    }
    kinds
}

/// 事件是否可以被视为 `kind`（自身或祖先）
pub fn is_assignable(event: &dyn Event, kind: &EventKind) -> bool {
    lineage(event).contains(kind)
}

/// 取得事件在 `kind` 层级上的视图
pub fn view_mut<'a>(event: &'a mut dyn Event, kind: &EventKind) -> Option<&'a mut dyn Event> {
    if event.kind() == *kind {
        return Some(event);
    }
    match event.parent_mut() {
        Some(parent) => view_mut(parent, kind),
        None => None,
    }
}

/// 以具体类型取得事件（自身或祖先）的只读引用
pub fn view<'a, E: Event>(event: &'a dyn Event) -> Option<&'a E> {
    if let Some(found) = event.as_any().downcast_ref::<E>() {
        return Some(found);
    }
    event.parent().and_then(view::<E>)
}

/// 以具体类型取得事件（自身或祖先）的可变引用
pub fn downcast_view_mut<'a, E: Event>(event: &'a mut dyn Event) -> Option<&'a mut E> {
    view_mut(event, &EventKind::of::<E>()).and_then(|v| v.as_any_mut().downcast_mut::<E>())
}
