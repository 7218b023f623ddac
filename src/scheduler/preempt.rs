//! 抢占
//!
//! 控制线程周期性地要求单个工作线程中断解释；
//! 抢占是协作式的：只设置解释器轮询的标记，不做硬中断

use crate::config::{PREEMPT_BASE_INTERVAL_MS, PREEMPT_MIN_INTERVAL_MS};

/// 抢占配置
#[derive(Debug, Clone)]
pub struct PreemptConfig {
    /// 是否启用抢占
    pub enabled: bool,
    /// 基准间隔（毫秒），按活跃线程数摊薄
    pub base_interval_ms: u64,
}

impl Default for PreemptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_interval_ms: PREEMPT_BASE_INTERVAL_MS,
        }
    }
}

impl PreemptConfig {
    /// 计算当前的抢占等待间隔（毫秒）
    ///
    /// 线程越多轮转越快，单个线程的期望抢占周期保持在基准间隔附近
    pub fn interval_ms(&self, thread_count: usize) -> u64 {
        let threads = thread_count.max(1) as u64;
        (self.base_interval_ms / threads).max(PREEMPT_MIN_INTERVAL_MS)
    }
}
