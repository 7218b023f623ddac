//! 配置常量模块
//!
//! 调度器相关的可调常量都在这里定义，便于后期修改

/// 抢占基准间隔（毫秒）
///
/// 控制线程的实际等待间隔按活跃工作线程数摊薄
pub const PREEMPT_BASE_INTERVAL_MS: u64 = 100;

/// 抢占间隔下限（毫秒）
pub const PREEMPT_MIN_INTERVAL_MS: u64 = 1;

/// 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
