//! 进程结构
//!
//! 逻辑进程是调度的基本单位，携带自己的状态机和邮箱

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use super::program::Program;
use super::queue::ProcessQueue;
use super::ProcessId;

/// 进程 ID 计数器
static PROCESS_ID: AtomicU64 = AtomicU64::new(1);

/// 无持有者标记
const NO_OWNER: i64 = i64::MIN;

/// 进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessState {
    /// 休眠，不在任何队列中
    Sleeping = 0,
    /// 就绪，在某个队列中等待被调度
    Ready = 1,
    /// 正在被某个工作线程解释执行
    Running = 2,
    /// 协作让出过程中的过渡状态
    Yielding = 3,
}

impl From<u8> for ProcessState {
    fn from(v: u8) -> Self {
        match v {
            0 => ProcessState::Sleeping,
            1 => ProcessState::Ready,
            2 => ProcessState::Running,
            3 => ProcessState::Yielding,
            _ => ProcessState::Sleeping,
        }
    }
}

/// 消息
///
/// 投递到进程邮箱的最小值单元
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// 空消息（仅用于唤醒）
    Empty,
    /// 整数值
    Int(i64),
    /// 字节数据
    Bytes(Vec<u8>),
}

/// 进程邮箱
///
/// 多生产者单消费者：生产者是各端口，消费者是解释器
pub struct Mailbox {
    sender: Sender<Message>,
    receiver: Receiver<Message>,
}

impl Mailbox {
    /// 创建空邮箱
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// 投递一条消息（无界，不会阻塞）
    pub fn send(&self, message: Message) {
        // 接收端与邮箱同生命周期，发送不会失败
        let _ = self.sender.send(message);
    }

    /// 尝试取出一条消息
    pub fn try_receive(&self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }

    /// 检查邮箱是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// 获取邮箱中的消息数
    #[inline]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// 进程
///
/// 包含进程的全部调度状态；执行内容由外部解释器定义
pub struct Process {
    /// 进程唯一 ID
    pub id: ProcessId,
    /// 所属程序
    program: Arc<Program>,
    /// 进程状态（原子操作）
    state: AtomicU8,
    /// 收件邮箱
    mailbox: Mailbox,
    /// 当前持有本进程的工作线程 ID（NO_OWNER 表示无）
    owner: AtomicI64,
    /// 抢占标记
    preempt: AtomicU8,
    /// 当前容纳本进程的队列
    queue: Mutex<Weak<ProcessQueue>>,
}

impl Process {
    /// 创建新进程（初始为休眠状态）
    pub fn new(program: Arc<Program>) -> Arc<Self> {
        Arc::new(Self {
            id: PROCESS_ID.fetch_add(1, Ordering::Relaxed),
            program,
            state: AtomicU8::new(ProcessState::Sleeping as u8),
            mailbox: Mailbox::new(),
            owner: AtomicI64::new(NO_OWNER),
            preempt: AtomicU8::new(0),
            queue: Mutex::new(Weak::new()),
        })
    }

    /// 所属程序
    #[inline]
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// 收件邮箱
    #[inline]
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// 获取进程状态
    #[inline]
    pub fn state(&self) -> ProcessState {
        ProcessState::from(self.state.load(Ordering::Acquire))
    }

    /// 尝试将状态从 from 改为 to
    ///
    /// 每次实际迁移恰好让一个调用者得到 true；
    /// 失败表示别的线程赢得了竞争
    #[inline]
    pub fn change_state(&self, from: ProcessState, to: ProcessState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 检查是否需要抢占
    #[inline]
    pub fn should_preempt(&self) -> bool {
        self.preempt.load(Ordering::Relaxed) != 0
    }

    /// 请求抢占
    #[inline]
    pub fn request_preempt(&self) {
        self.preempt.store(1, Ordering::Relaxed);
    }

    /// 清除抢占标记
    #[inline]
    pub fn clear_preempt(&self) {
        self.preempt.store(0, Ordering::Relaxed);
    }

    /// 当前持有本进程的工作线程 ID
    pub fn owner(&self) -> Option<i64> {
        let owner = self.owner.load(Ordering::Acquire);
        if owner == NO_OWNER {
            None
        } else {
            Some(owner)
        }
    }

    /// 标记进程被某个工作线程持有
    pub(crate) fn set_owner(&self, thread_id: i64) {
        self.owner.store(thread_id, Ordering::Release);
    }

    /// 清除持有者标记
    pub(crate) fn clear_owner(&self) {
        self.owner.store(NO_OWNER, Ordering::Release);
    }

    /// 当前容纳本进程的队列
    pub fn current_queue(&self) -> Option<Arc<ProcessQueue>> {
        self.queue.lock().upgrade()
    }

    /// 记录容纳本进程的队列（仅由队列在持锁时调用）
    pub(crate) fn set_queue(&self, queue: Weak<ProcessQueue>) {
        *self.queue.lock() = queue;
    }

    /// 清除队列记录（仅由队列在持锁时调用）
    pub(crate) fn clear_queue(&self) {
        *self.queue.lock() = Weak::new();
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("program", &self.program.id)
            .field("state", &self.state())
            .field("owner", &self.owner())
            .finish()
    }
}
