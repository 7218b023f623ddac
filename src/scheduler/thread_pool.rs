//! 工作线程池
//!
//! 按需启动工作线程，数量受上限约束

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

/// 工作线程池
///
/// 线程只启动不归还；调度结束时统一 join
pub struct ThreadPool {
    /// 线程数上限
    max_threads: usize,
    /// 已启动的线程数
    started: AtomicUsize,
    /// 线程句柄
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
    /// 创建线程池
    pub fn new(max_threads: usize) -> Self {
        Self {
            max_threads,
            started: AtomicUsize::new(0),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// 线程数上限
    #[inline]
    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// 已启动的线程数
    #[inline]
    pub fn started(&self) -> usize {
        self.started.load(Ordering::Acquire)
    }

    /// 尝试启动一个新的工作线程
    ///
    /// 线程数已达到 min(limit, max_threads) 时不启动，视为成功；
    /// 返回 false 仅表示计数竞争，调用方应重试
    pub fn try_start_thread<F>(&self, limit: usize, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let limit = limit.min(self.max_threads);
        let started = self.started.load(Ordering::Acquire);
        if started >= limit {
            return true;
        }
        if self
            .started
            .compare_exchange(started, started + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let handle = thread::Builder::new()
            .name(format!("lpvm-worker-{}", started))
            .spawn(f)
            .expect("Failed to spawn worker thread");
        self.handles.lock().push(handle);
        true
    }

    /// 等待所有工作线程结束
    pub fn join_all(&self) {
        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("max_threads", &self.max_threads)
            .field("started", &self.started())
            .finish()
    }
}
