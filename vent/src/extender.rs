//! 扩展器（Extender）
//!
//! 与事件层级正交的二级扇出通道：处理器的返回值按 key 投递给所有
//! 在同一 key 下注册、且声明的载荷类型与返回值具体类型一致的扩展器。
//!
use crate::link::LinkId;
use crate::registry::next_sequence;
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

/// 处理器/扩展器的返回值：`Ok(None)` 表示无需继续投递
pub(crate) type HandlerResult = Result<Option<Box<dyn Any + Send>>, String>;

pub(crate) type ExtenderFn = Arc<dyn Fn(&dyn Any) -> HandlerResult + Send + Sync>;

/// 将返回值擦除为可投递的载荷，`()` 视为无返回值
pub(crate) fn erase_result<R: Any + Send>(value: R) -> Option<Box<dyn Any + Send>> {
    if TypeId::of::<R>() == TypeId::of::<()>() {
        None
    } else {
        Some(Box::new(value))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtenderId(u64);

/// 扩展器
pub struct Extender {
    id: ExtenderId,
    key: String,
    payload: TypeId,
    payload_name: &'static str,
    link: LinkId,
    method: &'static str,
    result_processors: Vec<String>,
    consumer: ExtenderFn,
}

impl Extender {
    /// 创建扩展器；`consumer` 只会收到类型为 `T` 的载荷
    pub fn new<T, R, F>(
        key: impl Into<String>,
        link: LinkId,
        result_processors: Vec<String>,
        consumer: F,
    ) -> Self
    where
        T: Any,
        R: Any + Send,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let route = !result_processors.is_empty();
        let f: ExtenderFn = Arc::new(move |value: &dyn Any| match value.downcast_ref::<T>() {
            Some(v) => {
                let out = consumer(v);
                Ok(if route { erase_result(out) } else { None })
            }
            None => Err(format!("type mismatch: expected={}", type_name::<T>())),
        });
        Self::from_parts(
            key.into(),
            TypeId::of::<T>(),
            type_name::<T>(),
            link,
            "<closure>",
            result_processors,
            f,
        )
    }

    pub(crate) fn from_parts(
        key: String,
        payload: TypeId,
        payload_name: &'static str,
        link: LinkId,
        method: &'static str,
        result_processors: Vec<String>,
        consumer: ExtenderFn,
    ) -> Self {
        Self {
            id: ExtenderId(next_sequence()),
            key,
            payload,
            payload_name,
            link,
            method,
            result_processors,
            consumer,
        }
    }

    pub fn id(&self) -> ExtenderId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 所属 Link
    pub fn link(&self) -> LinkId {
        self.link
    }

    pub fn payload_name(&self) -> &'static str {
        self.payload_name
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn result_processors(&self) -> &[String] {
        &self.result_processors
    }

    /// 载荷的具体类型是否与声明类型一致
    pub fn accepts(&self, value: &dyn Any) -> bool {
        value.type_id() == self.payload
    }

    pub(crate) fn apply(&self, value: &dyn Any) -> HandlerResult {
        (self.consumer)(value)
    }
}

impl fmt::Debug for Extender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extender")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("payload", &self.payload_name)
            .field("link", &self.link)
            .field("method", &self.method)
            .finish()
    }
}
