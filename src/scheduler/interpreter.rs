//! 解释器契约
//!
//! 调度器把进程交给解释器执行；解释器运行到必须返回时
//! 报告五种结果之一

use std::sync::Arc;

use super::port::Port;
use super::process::Process;
use super::thread_state::ThreadState;

/// 解释结果
///
/// 进入解释器和从任一路径返回时，进程状态都保证为 Running
#[derive(Debug)]
pub enum InterpretResult {
    /// 进程已终止，调度器负责销毁
    Terminated,
    /// 协作让出
    Yielded,
    /// 定向让出：端口处于锁定状态，其进程是预期的接收者
    TargetYielded(Arc<Port>),
    /// 被抢占标记打断
    Interrupted,
    /// 未捕获异常：既不重新入队也不销毁
    UncaughtException,
}

/// 解释器接口
///
/// 由外部字节码解释器实现；thread_state 提供线程本地的查找缓存
pub trait Interpreter: Send + Sync {
    /// 执行一个进程直到必须返回
    fn run(&self, process: &Arc<Process>, thread_state: &ThreadState) -> InterpretResult;
}
