//! 程序
//!
//! 被零个或多个进程共享的代码映像

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::scheduler::Scheduler;

/// 程序 ID 计数器
static PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// 程序
///
/// 调度器以程序为粒度执行暂停与恢复
pub struct Program {
    /// 程序唯一 ID
    pub id: u64,
    /// 关联的调度器
    scheduler: Mutex<Weak<Scheduler>>,
}

impl Program {
    /// 创建新程序
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: PROGRAM_ID.fetch_add(1, Ordering::Relaxed),
            scheduler: Mutex::new(Weak::new()),
        })
    }

    /// 获取关联的调度器
    pub fn scheduler(&self) -> Option<Arc<Scheduler>> {
        self.scheduler.lock().upgrade()
    }

    /// 关联调度器（由 Scheduler::schedule_program 调用）
    pub(crate) fn set_scheduler(&self, scheduler: &Arc<Scheduler>) {
        *self.scheduler.lock() = Arc::downgrade(scheduler);
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("id", &self.id)
            .field("scheduled", &self.scheduler.lock().upgrade().is_some())
            .finish()
    }
}
