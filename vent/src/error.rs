//! 事件系统统一错误定义
//!
//! 只有“调用方的配置错误”会以 `Err` 返回（构建订阅缺少字段、修改不可变事件、
//! 运行时不匹配）；处理器执行期的失败会被逐个捕获并记录日志，不会向调用方传播。
//!
use crate::event::Runtime;
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum VentError {
    // --- 配置错误（直接返回给调用方）---
    #[error("illegal state: {reason}")]
    IllegalState { reason: String },
    #[error("vent was tried to run {attempted} but only can be run {required}")]
    RuntimeMismatch { attempted: Runtime, required: Runtime },

    // --- 调用错误（仅用于日志记录）---
    #[error("invocation failed: target={target}, reason={reason}")]
    Invocation { target: String, reason: String },
}

impl VentError {
    pub fn illegal_state(reason: impl Into<String>) -> Self {
        VentError::IllegalState {
            reason: reason.into(),
        }
    }

    pub(crate) fn invocation(target: impl Into<String>, reason: impl Into<String>) -> Self {
        VentError::Invocation {
            target: target.into(),
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type VentResult<T> = Result<T, VentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_mismatch_message_names_both_runtimes() {
        let err = VentError::RuntimeMismatch {
            attempted: Runtime::Asynchronous,
            required: Runtime::Synchronous,
        };
        assert_eq!(
            err.to_string(),
            "vent was tried to run asynchronous but only can be run synchronous"
        );
    }

    #[test]
    fn illegal_state_keeps_reason() {
        let err = VentError::illegal_state("cannot cancel immutable events");
        match err {
            VentError::IllegalState { reason } => {
                assert_eq!(reason, "cannot cancel immutable events")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
