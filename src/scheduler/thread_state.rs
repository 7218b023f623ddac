//! 工作线程状态
//!
//! 每个工作线程持有自己的进程队列、空闲监视器和查找缓存

use std::collections::HashMap;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};

use super::process::Process;
use super::queue::ProcessQueue;

/// 临时线程状态的 ID（不占用线程槽位）
pub const EPHEMERAL_THREAD_ID: i64 = -1;

/// 空闲栈链接：栈底哨兵
pub(crate) const IDLE_EMPTY: usize = 0xFFFF_FFFF;
/// 空闲栈链接：不在栈中
pub(crate) const IDLE_UNLINKED: usize = 0xFFFF_FFFE;

/// 解释器查找缓存
///
/// (类, 选择子) -> 方法 的线程本地缓存，暂停时必须清空
pub struct LookupCache {
    entries: Mutex<HashMap<(u64, u64), u64>>,
}

impl LookupCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 查找缓存条目
    pub fn lookup(&self, class: u64, selector: u64) -> Option<u64> {
        self.entries.lock().get(&(class, selector)).copied()
    }

    /// 写入缓存条目
    pub fn insert(&self, class: u64, selector: u64, method: u64) {
        self.entries.lock().insert((class, selector), method);
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// 检查缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new()
    }
}

/// 工作线程状态
///
/// 队列归拥有它的线程消费；空闲监视器上只有拥有者等待，
/// 其他线程只负责唤醒
pub struct ThreadState {
    /// 线程 ID（对应调度器的线程槽位；EPHEMERAL_THREAD_ID 表示临时状态）
    id: i64,
    /// 本线程拥有的进程队列
    queue: Arc<ProcessQueue>,
    /// 空闲监视器
    idle_mutex: Mutex<()>,
    idle_cond: Condvar,
    /// 空闲线程栈的链接
    next_idle: AtomicUsize,
    /// 解释器查找缓存
    cache: LookupCache,
    /// 是否已注册为活跃工作线程
    live: AtomicBool,
}

impl ThreadState {
    /// 创建指定槽位的线程状态
    pub fn new(id: usize) -> Arc<Self> {
        Arc::new(Self {
            id: id as i64,
            queue: ProcessQueue::new(),
            idle_mutex: Mutex::new(()),
            idle_cond: Condvar::new(),
            next_idle: AtomicUsize::new(IDLE_UNLINKED),
            cache: LookupCache::new(),
            live: AtomicBool::new(false),
        })
    }

    /// 创建栈上临时状态，用于在调用方线程直接运行单个进程
    ///
    /// 临时状态不注册到调度器，其他线程不得向它的队列入队
    pub fn ephemeral() -> Self {
        Self {
            id: EPHEMERAL_THREAD_ID,
            queue: ProcessQueue::new(),
            idle_mutex: Mutex::new(()),
            idle_cond: Condvar::new(),
            next_idle: AtomicUsize::new(IDLE_UNLINKED),
            cache: LookupCache::new(),
            live: AtomicBool::new(false),
        }
    }

    /// 线程 ID
    #[inline]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// 本线程拥有的进程队列
    #[inline]
    pub fn queue(&self) -> &Arc<ProcessQueue> {
        &self.queue
    }

    /// 解释器查找缓存
    #[inline]
    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// 是否已注册为活跃工作线程
    #[inline]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::Release);
    }

    /// 空闲栈链接
    #[inline]
    pub(crate) fn next_idle(&self) -> usize {
        self.next_idle.load(Ordering::Acquire)
    }

    pub(crate) fn set_next_idle(&self, next: usize) {
        self.next_idle.store(next, Ordering::Release);
    }

    /// 取空闲监视器的锁
    pub(crate) fn idle_lock(&self) -> MutexGuard<'_, ()> {
        self.idle_mutex.lock()
    }

    /// 在空闲监视器上等待（虚假唤醒无害，调用方需回查条件）
    pub(crate) fn idle_wait(&self, guard: &mut MutexGuard<'_, ()>) {
        self.idle_cond.wait(guard);
    }

    /// 唤醒在空闲监视器上等待的拥有者线程
    pub fn notify(&self) {
        let _guard = self.idle_mutex.lock();
        self.idle_cond.notify_one();
    }
}

impl std::fmt::Debug for ThreadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadState")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .field("queue_len", &self.queue.len())
            .finish()
    }
}

/// 正在解释的进程槽位
///
/// 以原子指针持有一个强引用；抢占驱动与派发线程
/// 通过 CAS 协调对槽位的独占访问
pub struct CurrentProcess {
    slot: AtomicPtr<Process>,
}

impl CurrentProcess {
    /// 创建空槽位
    pub fn new() -> Self {
        Self {
            slot: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// 槽位当前是否为空
    #[inline]
    pub fn is_null(&self) -> bool {
        self.slot.load(Ordering::Acquire).is_null()
    }

    /// 写入进程（要求槽位为空，由派发线程在解释前调用）
    pub(crate) fn set(&self, process: &Arc<Process>) {
        let ptr = Arc::into_raw(Arc::clone(process)) as *mut Process;
        let previous = self.slot.swap(ptr, Ordering::AcqRel);
        debug_assert!(previous.is_null());
    }

    /// 清除进程（自旋直到抢占驱动归还槽位）
    pub(crate) fn clear(&self, process: &Arc<Process>) {
        let expected = Arc::as_ptr(process) as *mut Process;
        loop {
            if self
                .slot
                .compare_exchange_weak(
                    expected,
                    ptr::null_mut(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                unsafe { drop(Arc::from_raw(expected)) };
                return;
            }
            std::hint::spin_loop();
        }
    }

    /// 抢占槽位中的进程
    ///
    /// 先把槽位换成空，设置抢占标记，再换回去，
    /// 保证标记不会设置在一个正被换出的进程上；
    /// 换回失败说明进程已经不在槽位里，放弃本次归还
    pub fn preempt(&self) {
        let ptr = self.slot.load(Ordering::Acquire);
        if ptr.is_null() {
            return;
        }
        if self
            .slot
            .compare_exchange(ptr, ptr::null_mut(), Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let process = unsafe { Arc::from_raw(ptr) };
        process.request_preempt();
        let raw = Arc::into_raw(process) as *mut Process;
        if self
            .slot
            .compare_exchange(ptr::null_mut(), raw, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            unsafe { drop(Arc::from_raw(raw)) };
        }
    }
}

impl Default for CurrentProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CurrentProcess {
    fn drop(&mut self) {
        let ptr = self.slot.load(Ordering::Relaxed);
        if !ptr.is_null() {
            unsafe { drop(Arc::from_raw(ptr)) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::program::Program;

    #[test]
    fn test_lookup_cache() {
        let cache = LookupCache::new();
        assert!(cache.is_empty());

        cache.insert(1, 2, 42);
        assert_eq!(cache.lookup(1, 2), Some(42));
        assert_eq!(cache.lookup(1, 3), None);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(1, 2), None);
    }

    #[test]
    fn test_thread_state_new() {
        let state = ThreadState::new(3);
        assert_eq!(state.id(), 3);
        assert!(!state.is_live());
        assert!(state.queue().is_empty());
        assert_eq!(state.next_idle(), IDLE_UNLINKED);
    }

    #[test]
    fn test_ephemeral_thread_state() {
        let state = ThreadState::ephemeral();
        assert_eq!(state.id(), EPHEMERAL_THREAD_ID);
        assert!(!state.is_live());
    }

    #[test]
    fn test_current_process_set_clear() {
        let slot = CurrentProcess::new();
        assert!(slot.is_null());

        let process = Process::new(Program::new());
        slot.set(&process);
        assert!(!slot.is_null());

        slot.clear(&process);
        assert!(slot.is_null());
        // 槽位释放后引用计数只剩本地这一份
        assert_eq!(Arc::strong_count(&process), 1);
    }

    #[test]
    fn test_current_process_preempt() {
        let slot = CurrentProcess::new();
        let process = Process::new(Program::new());

        // 空槽位上的抢占是空操作
        slot.preempt();
        assert!(!process.should_preempt());

        slot.set(&process);
        slot.preempt();
        assert!(process.should_preempt());
        // 抢占完成后槽位被归还
        assert!(!slot.is_null());

        slot.clear(&process);
    }
}
