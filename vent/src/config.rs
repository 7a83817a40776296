use crate::event::Runtime;
use bon::Builder;
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_EXTENSION_DEPTH: usize = 16;

/// 注册表配置
#[derive(Builder, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VentConfig {
    /// 所有分发默认所在的运行时；为空时只校验 `Call::expect_runtime` 声明的运行时
    pub runtime: Option<Runtime>,
    /// 扩展器结果链的最大深度，超出后丢弃并告警
    #[builder(default = DEFAULT_MAX_EXTENSION_DEPTH)]
    pub max_extension_depth: usize,
}

impl Default for VentConfig {
    fn default() -> Self {
        Self {
            runtime: None,
            max_extension_depth: DEFAULT_MAX_EXTENSION_DEPTH,
        }
    }
}
