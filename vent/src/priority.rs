use serde::{Deserialize, Serialize};
use std::fmt;

/// 处理器优先级：数值越小越早执行
///
/// `ReadOnly` 总是最后执行，且对事件取消标记的修改不会保留。
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Highest,
    ReadOnly,
}

const WRITE_ACCESSING: [Priority; 4] = [
    Priority::Low,
    Priority::Medium,
    Priority::High,
    Priority::Highest,
];

impl Priority {
    /// 全部优先级，按执行顺序
    pub const ALL: [Priority; 5] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Highest,
        Priority::ReadOnly,
    ];

    /// 拥有事件写权限的优先级（不含 `ReadOnly`）
    pub fn write_accessing() -> &'static [Priority] {
        &WRITE_ACCESSING
    }

    pub fn level(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Highest => 4,
            Priority::ReadOnly => 5,
        }
    }

    pub fn is_read_only(self) -> bool {
        self == Priority::ReadOnly
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Highest => "highest",
            Priority::ReadOnly => "read_only",
        };
        f.write_str(name)
    }
}
