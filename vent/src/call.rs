//! 事件分发（Call）
//!
//! 一次分发分两轮：
//! 1. 写入轮：按 `Priority::write_accessing()` 逐级，再按事件谱系（自身类型在前，
//!    祖先在后）依次调用订阅与 Link 消费者，取消标记的修改对后续处理器可见；
//! 2. 只读轮：对谱系中每个类型调用 `ReadOnly` 处理器，每个处理器返回后
//!    立即回滚它对取消标记的修改。
//!
//! 处理器在调用线程上同步执行。执行期间不持有注册表的任何锁，处理器可以
//! 重入地注册/注销；本轮使用的 Link 在分发开始时取快照。
//!
use crate::error::{VentError, VentResult};
use crate::event::{Event, EventKind, Runtime, lineage, view_mut};
use crate::extender::HandlerResult;
use crate::link::{Link, LinkConsumer};
use crate::priority::Priority;
use crate::registry::VentMap;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{error, trace};

/// 事件分发器
pub struct Call<E: Event> {
    event: E,
    runtime: Option<Runtime>,
}

impl<E: Event> Call<E> {
    pub fn new(event: E) -> Self {
        Self {
            event,
            runtime: None,
        }
    }

    /// 声明本次分发所在的运行时，事件的运行时标签不一致时 `run` 返回错误
    pub fn expect_runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn event(&self) -> &E {
        &self.event
    }

    /// 执行分发并交还事件
    ///
    /// 只有运行时不匹配会返回错误，且发生在任何处理器执行之前；
    /// 处理器自身的失败只记录日志。
    pub fn run(mut self, map: &VentMap) -> VentResult<E> {
        if let Some(runtime) = self.runtime.or(map.config().runtime) {
            runtime.validate(&self.event)?;
        }

        let kinds = lineage(&self.event);
        let links = map.links();
        trace!(
            event = self.event.kind().name(),
            lineage = kinds.len(),
            links = links.len(),
            "dispatching event"
        );

        for priority in Priority::write_accessing() {
            for kind in &kinds {
                self.deliver(map, &links, kind, *priority);
            }
        }
        for kind in &kinds {
            self.deliver(map, &links, kind, Priority::ReadOnly);
        }

        Ok(self.event)
    }

    fn deliver(&mut self, map: &VentMap, links: &[Arc<Link>], kind: &EventKind, priority: Priority) {
        let read_only = priority.is_read_only();

        for subscription in map.subscriptions_for(*kind, priority) {
            if self.event.is_cancelled() && !subscription.processes_cancelled() {
                continue;
            }
            let Some(view) = view_mut(&mut self.event, kind) else {
                continue;
            };
            let before = view.is_cancelled();
            isolate(
                || format!("subscription#{} ({})", subscription.id().value(), kind),
                || subscription.invoke(view),
            );
            if read_only {
                view.header_mut().restore_cancelled(before);
            }
        }

        for link in links {
            for consumer in link.handlers(kind, priority) {
                if self.event.is_cancelled() && !consumer.processes_cancelled() {
                    continue;
                }
                let Some(view) = view_mut(&mut self.event, kind) else {
                    continue;
                };
                let before = view.is_cancelled();
                let outcome = isolate(|| target(link, consumer), || consumer.call(view));
                if read_only {
                    view.header_mut().restore_cancelled(before);
                }
                if let Some(result) = outcome {
                    route(map, link, consumer, result);
                }
            }
        }
    }
}

fn target(link: &Link, consumer: &LinkConsumer) -> String {
    format!("{}::{}", link.listener_name(), consumer.method())
}

// 把处理器返回值投递到结果处理通道，失败只记录日志
fn route(map: &VentMap, link: &Link, consumer: &LinkConsumer, result: HandlerResult) {
    match result {
        Ok(Some(value)) => {
            let value: &dyn Any = &*value;
            for key in consumer.result_processors() {
                map.run_extensions(key, value);
            }
        }
        Ok(None) => {}
        Err(reason) => {
            let err = VentError::invocation(target(link, consumer), reason);
            error!(error = %err, host = %link.host(), "event handler returned an error");
        }
    }
}

/// 隔离执行单个处理器：panic 被捕获并记录，返回 `None`
pub(crate) fn isolate<T>(describe: impl FnOnce() -> String, f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let err = VentError::invocation(describe(), panic_message(payload.as_ref()));
            error!(error = %err, "event handler panicked");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
