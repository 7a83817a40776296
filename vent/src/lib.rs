//! 进程内事件订阅与分发引擎（vent）
//!
//! 提供带优先级的同步事件总线：
//! - 事件（`event`）：可取消/不可变状态、运行时标签与基于组合的类型层级
//! - 订阅（`subscription`）与监听器链接（`link`）两种注册方式
//! - 扩展器（`extender`）：按 key 扇出处理器的返回值
//! - 注册表（`registry`）：显式创建、以 `Arc` 共享的并发存储
//! - 分发器（`call`）：按优先级逐级调用，最后执行只读轮
//!
//! 典型用法：
//! 1. 用 `#[derive(Event)]` 定义事件，用 `#[listener]` 标注监听器的处理方法；
//! 2. 创建 `VentMap`，以某个 `Host` 注册监听器或 `Subscription`；
//! 3. 构造事件并通过 `Call::new(event).run(&map)` 分发。
//!
//! 处理器内部的失败（panic 或返回 `Err`）只会通过 `tracing` 记录，
//! 不会中断分发，也不会返回给调用方。
//!
pub mod call;
pub mod config;
pub mod error;
pub mod event;
pub mod extender;
pub mod host;
pub mod link;
pub mod priority;
pub mod registry;
pub mod subscription;

// 允许在本 crate 内部通过 ::vent 进行自引用，
// 以便过程宏生成的代码在本 crate 的测试中也能解析到 ::vent 路径。
extern crate self as vent;

pub use call::Call;
pub use config::VentConfig;
pub use error::{VentError, VentResult};
pub use event::{Event, EventHeader, EventKind, Runtime, State};
pub use extender::Extender;
pub use host::Host;
pub use link::{Discovery, Link, Listener};
pub use priority::Priority;
pub use registry::VentMap;
pub use subscription::{AnySubscription, Subscription, SubscriptionBuilder};

#[cfg(feature = "macros")]
pub use vent_macros::{Event, listener};
