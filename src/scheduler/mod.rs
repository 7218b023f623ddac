//! 进程调度模块
//!
//! 把数量不受限的逻辑进程复用到有限的工作线程池上
//!
//! 核心组件：
//! - Process: 逻辑进程，调度的基本单位
//! - ProcessQueue: 进程队列，工作线程间交接进程的通道
//! - ThreadState: 工作线程状态，队列、空闲监视器和查找缓存
//! - Scheduler: 调度器核心，派发循环、暂停协议与抢占驱动
//! - Port: 端口，进程间定向让出的交接点

pub mod interpreter;
pub mod port;
pub mod preempt;
pub mod process;
pub mod program;
pub mod queue;
pub mod scheduler;
pub mod thread_pool;
pub mod thread_state;

pub use interpreter::{InterpretResult, Interpreter};
pub use port::Port;
pub use preempt::PreemptConfig;
pub use process::{Mailbox, Message, Process, ProcessState};
pub use program::Program;
pub use queue::{DequeueResult, ProcessQueue};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerStats};
pub use thread_pool::ThreadPool;
pub use thread_state::{CurrentProcess, LookupCache, ThreadState};

/// 进程 ID 类型
pub type ProcessId = u64;

/// 获取当前 CPU 核心数
pub fn num_hardware_threads() -> usize {
    num_cpus::get()
}
