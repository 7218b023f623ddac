//! 端口
//!
//! 进程的消息投递入口，可加锁用于定向让出的交接

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::process::{Message, Process};

/// 端口 ID 计数器
static PORT_ID: AtomicU64 = AtomicU64::new(1);

/// 端口
///
/// 持有接收进程的引用；锁定期间对接收进程的状态交接
/// 不会被并发的投递方干扰
pub struct Port {
    /// 端口唯一 ID
    id: u64,
    /// 接收进程
    process: Arc<Process>,
    /// 锁标记
    locked: AtomicBool,
}

impl Port {
    /// 为进程创建端口
    pub fn new(process: Arc<Process>) -> Arc<Self> {
        Arc::new(Self {
            id: PORT_ID.fetch_add(1, Ordering::Relaxed),
            process,
            locked: AtomicBool::new(false),
        })
    }

    /// 端口 ID
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 接收进程
    #[inline]
    pub fn process(&self) -> &Arc<Process> {
        &self.process
    }

    /// 加锁（自旋）
    pub fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
    }

    /// 尝试加锁
    pub fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// 解锁
    pub fn unlock(&self) {
        let was_locked = self.locked.swap(false, Ordering::Release);
        debug_assert!(was_locked);
    }

    /// 是否已锁定
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// 投递一条消息到接收进程的邮箱
    pub fn send(&self, message: Message) {
        self.lock();
        self.process.mailbox().send(message);
        self.unlock();
    }
}

impl std::fmt::Debug for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("id", &self.id)
            .field("process", &self.process.id)
            .field("locked", &self.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::program::Program;

    fn make_port() -> Arc<Port> {
        Port::new(Process::new(Program::new()))
    }

    #[test]
    fn test_lock_unlock() {
        let port = make_port();
        assert!(!port.is_locked());

        port.lock();
        assert!(port.is_locked());
        assert!(!port.try_lock());

        port.unlock();
        assert!(!port.is_locked());
        assert!(port.try_lock());
        port.unlock();
    }

    #[test]
    fn test_send_delivers_to_mailbox() {
        let port = make_port();
        port.send(Message::Int(3));
        port.send(Message::Bytes(vec![1, 2]));

        let mailbox = port.process().mailbox();
        assert_eq!(mailbox.len(), 2);
        assert_eq!(mailbox.try_receive(), Some(Message::Int(3)));
        // 投递完成后端口已解锁
        assert!(!port.is_locked());
    }
}
