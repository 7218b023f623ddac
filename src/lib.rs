//! lpvm — 轻量级进程虚拟机的调度器核心
//!
//! 把数量不受限的逻辑进程复用到有限的工作线程池上，
//! 提供协作式与抢占式调度、程序级的暂停与恢复协议，
//! 以及通过端口完成的进程间定向让出。
//!
//! 字节码解释器不在本 crate 内：通过 [`Interpreter`] 接口接入，
//! 解释器按契约在让出、终止、被抢占等时刻把控制权交还调度器。

pub mod config;
pub mod scheduler;

pub use scheduler::{
    InterpretResult, Interpreter, Mailbox, Message, Port, PreemptConfig, Process, ProcessId,
    ProcessQueue, ProcessState, Program, Scheduler, SchedulerConfig, SchedulerStats, ThreadState,
};
