//! 进程队列
//!
//! 工作线程间交接进程的队列；入队和出队都不阻塞，
//! 竞争时报告重试而不是等待

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

use super::process::{Process, ProcessState};

/// 出队结果
#[derive(Debug)]
pub enum DequeueResult {
    /// 取到一个进程（已完成 Ready -> Running 迁移）
    Process(Arc<Process>),
    /// 队列为空
    Empty,
    /// 瞬时竞争，调用方应稍后重试
    Contended,
}

/// 进程队列
///
/// 多生产者单消费者：只有拥有队列的工作线程为解释执行出队，
/// 暂停协议和工作窃取走 try 系列操作并容忍瞬时失败
pub struct ProcessQueue {
    /// 队列条目
    entries: Mutex<VecDeque<Arc<Process>>>,
    /// 长度的无锁观察值（跨线程只是观察，不是保证）
    len: CachePadded<AtomicUsize>,
}

impl ProcessQueue {
    /// 创建空队列
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(VecDeque::new()),
            len: CachePadded::new(AtomicUsize::new(0)),
        })
    }

    /// 获取队列长度
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// 检查队列是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 尝试入队
    ///
    /// 返回 Some(was_empty)，was_empty 表示本次入队使队列从空变为非空，
    /// 调用方据此决定是否唤醒队列的拥有者；
    /// 返回 None 表示瞬时竞争，调用方应改试其他队列或重试
    pub fn try_enqueue(self: &Arc<Self>, process: &Arc<Process>) -> Option<bool> {
        let mut entries = self.entries.try_lock()?;
        debug_assert_eq!(process.state(), ProcessState::Ready);
        debug_assert!(process.current_queue().is_none());

        let was_empty = entries.is_empty();
        process.set_queue(Arc::downgrade(self));
        entries.push_back(Arc::clone(process));
        self.len.fetch_add(1, Ordering::Relaxed);
        Some(was_empty)
    }

    /// 尝试出队
    ///
    /// 成功取出的进程已完成 Ready -> Running 迁移
    pub fn try_dequeue(&self) -> DequeueResult {
        let Some(mut entries) = self.entries.try_lock() else {
            return DequeueResult::Contended;
        };
        match entries.pop_front() {
            Some(process) => {
                self.len.fetch_sub(1, Ordering::Relaxed);
                process.clear_queue();
                assert!(
                    process.change_state(ProcessState::Ready, ProcessState::Running),
                    "dequeued process was not ready"
                );
                DequeueResult::Process(process)
            }
            None => DequeueResult::Empty,
        }
    }

    /// 尝试移除指定进程
    ///
    /// 仅当该进程仍在本队列中且完成 Ready -> Running 迁移时返回 true
    pub fn try_dequeue_entry(self: &Arc<Self>, process: &Arc<Process>) -> bool {
        let Some(mut entries) = self.entries.try_lock() else {
            return false;
        };
        let Some(index) = entries.iter().position(|p| Arc::ptr_eq(p, process)) else {
            return false;
        };
        if !process.change_state(ProcessState::Ready, ProcessState::Running) {
            return false;
        }
        entries.remove(index);
        self.len.fetch_sub(1, Ordering::Relaxed);
        process.clear_queue();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::program::Program;

    fn make_ready_process() -> Arc<Process> {
        let process = Process::new(Program::new());
        assert!(process.change_state(ProcessState::Sleeping, ProcessState::Ready));
        process
    }

    #[test]
    fn test_enqueue_dequeue_fifo() {
        let queue = ProcessQueue::new();
        let a = make_ready_process();
        let b = make_ready_process();

        assert_eq!(queue.try_enqueue(&a), Some(true));
        assert_eq!(queue.try_enqueue(&b), Some(false));
        assert_eq!(queue.len(), 2);

        let DequeueResult::Process(first) = queue.try_dequeue() else {
            panic!("expected a process");
        };
        assert_eq!(first.id, a.id);
        assert_eq!(first.state(), ProcessState::Running);

        let DequeueResult::Process(second) = queue.try_dequeue() else {
            panic!("expected a process");
        };
        assert_eq!(second.id, b.id);
        assert!(matches!(queue.try_dequeue(), DequeueResult::Empty));
    }

    #[test]
    fn test_enqueue_sets_queue_backref() {
        let queue = ProcessQueue::new();
        let process = make_ready_process();

        queue.try_enqueue(&process).unwrap();
        assert!(Arc::ptr_eq(&process.current_queue().unwrap(), &queue));

        let DequeueResult::Process(process) = queue.try_dequeue() else {
            panic!("expected a process");
        };
        assert!(process.current_queue().is_none());
    }

    #[test]
    fn test_was_empty_after_drain() {
        let queue = ProcessQueue::new();
        let a = make_ready_process();

        assert_eq!(queue.try_enqueue(&a), Some(true));
        let DequeueResult::Process(a) = queue.try_dequeue() else {
            panic!("expected a process");
        };

        // 取空后再入队，再次报告从空变为非空
        assert!(a.change_state(ProcessState::Running, ProcessState::Ready));
        assert_eq!(queue.try_enqueue(&a), Some(true));
    }

    #[test]
    fn test_dequeue_entry() {
        let queue = ProcessQueue::new();
        let a = make_ready_process();
        let b = make_ready_process();
        let c = make_ready_process();

        queue.try_enqueue(&a).unwrap();
        queue.try_enqueue(&b).unwrap();
        queue.try_enqueue(&c).unwrap();

        // 从中间摘出
        assert!(queue.try_dequeue_entry(&b));
        assert_eq!(b.state(), ProcessState::Running);
        assert!(b.current_queue().is_none());
        assert_eq!(queue.len(), 2);

        // 不在队列中的进程无法摘出
        assert!(!queue.try_dequeue_entry(&b));

        let DequeueResult::Process(first) = queue.try_dequeue() else {
            panic!("expected a process");
        };
        assert_eq!(first.id, a.id);
    }

    #[test]
    fn test_dequeue_entry_other_queue() {
        let queue = ProcessQueue::new();
        let other = ProcessQueue::new();
        let process = make_ready_process();

        queue.try_enqueue(&process).unwrap();
        assert!(!other.try_dequeue_entry(&process));
        assert_eq!(queue.len(), 1);
    }
}
