//! 调度器核心
//!
//! 派发循环、空闲线程栈、入队路由、暂停协议与抢占驱动

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_utils::CachePadded;
use dashmap::DashMap;
use log::{debug, trace, warn};
use parking_lot::{Condvar, Mutex, RwLock};

use super::interpreter::{InterpretResult, Interpreter};
use super::num_hardware_threads;
use super::port::Port;
use super::preempt::PreemptConfig;
use super::process::{Process, ProcessState};
use super::program::Program;
use super::queue::{DequeueResult, ProcessQueue};
use super::thread_pool::ThreadPool;
use super::thread_state::{CurrentProcess, ThreadState, IDLE_EMPTY, IDLE_UNLINKED};

/// 空闲栈栈顶的打包格式：高 32 位是版本号，低 32 位是线程下标。
/// 版本号随每次成功的压栈/弹栈递增，避免 Treiber 栈的 ABA 问题
const IDLE_INDEX_MASK: u64 = 0xFFFF_FFFF;

#[inline]
fn idle_pack(tag: u64, index: usize) -> u64 {
    ((tag & IDLE_INDEX_MASK) << 32) | index as u64
}

#[inline]
fn idle_index(word: u64) -> usize {
    (word & IDLE_INDEX_MASK) as usize
}

#[inline]
fn idle_tag(word: u64) -> u64 {
    word >> 32
}

/// 调度器配置
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 工作线程数上限（0 表示使用 CPU 核心数）
    pub max_threads: usize,
    /// 抢占配置
    pub preempt: PreemptConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            preempt: PreemptConfig::default(),
        }
    }
}

/// 调度统计信息
#[derive(Debug)]
pub struct SchedulerStats {
    pub alive_processes: i64,
    pub started_threads: usize,
    pub sleeping_threads: usize,
    pub startup_queue_len: usize,
    pub queue_lengths: Vec<usize>,
}

/// 调度器
///
/// 把任意数量的逻辑进程复用到有限的工作线程上；
/// 工作线程惰性启动，进程间通过队列交接
pub struct Scheduler {
    /// 配置
    config: SchedulerConfig,
    /// 工作线程数上限
    max_threads: usize,
    /// 线程池
    thread_pool: ThreadPool,
    /// 工作线程槽位（预分配；live 标记表示已注册）
    threads: Vec<Arc<ThreadState>>,
    /// 各工作线程正在解释的进程
    current_processes: Vec<CurrentProcess>,
    /// 启动队列：还没有任何工作线程时使用
    startup_queue: Arc<ProcessQueue>,
    /// 空闲线程栈的栈顶（带版本号的 Treiber 栈）
    idle_threads: CachePadded<AtomicU64>,
    /// 存活的进程总数
    processes: CachePadded<AtomicI64>,
    /// 已注册的工作线程数
    thread_count: AtomicUsize,
    /// 暂停协议中已自停的线程数
    sleeping_threads: AtomicUsize,
    /// 暂停标记（无锁读取，是派发循环的退出条件之一）
    pause: AtomicBool,
    /// 暂停监视器：保护已停止进程表和暂停握手
    pause_mutex: Mutex<HashMap<u64, Vec<Arc<Process>>>>,
    pause_cond: Condvar,
    /// 抢占监视器：控制线程的定时等待与完成通知
    preempt_mutex: Mutex<()>,
    preempt_cond: Condvar,
    /// 已关联的程序注册表
    programs: DashMap<u64, Arc<Program>>,
    /// 解释器
    interpreter: RwLock<Option<Arc<dyn Interpreter>>>,
}

impl Scheduler {
    /// 创建调度器（默认配置）
    pub fn new() -> Arc<Self> {
        Self::with_config(SchedulerConfig::default())
    }

    /// 使用指定配置创建调度器
    pub fn with_config(config: SchedulerConfig) -> Arc<Self> {
        let max_threads = if config.max_threads == 0 {
            num_hardware_threads()
        } else {
            config.max_threads
        };
        let threads = (0..max_threads).map(ThreadState::new).collect();
        let current_processes = (0..max_threads).map(|_| CurrentProcess::new()).collect();

        Arc::new(Self {
            config,
            max_threads,
            thread_pool: ThreadPool::new(max_threads),
            threads,
            current_processes,
            startup_queue: ProcessQueue::new(),
            idle_threads: CachePadded::new(AtomicU64::new(idle_pack(0, IDLE_EMPTY))),
            processes: CachePadded::new(AtomicI64::new(0)),
            thread_count: AtomicUsize::new(0),
            sleeping_threads: AtomicUsize::new(0),
            pause: AtomicBool::new(false),
            pause_mutex: Mutex::new(HashMap::new()),
            pause_cond: Condvar::new(),
            preempt_mutex: Mutex::new(()),
            preempt_cond: Condvar::new(),
            programs: DashMap::new(),
            interpreter: RwLock::new(None),
        })
    }

    /// 工作线程数上限
    #[inline]
    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// 存活的进程总数
    #[inline]
    pub fn alive_processes(&self) -> i64 {
        self.processes.load(Ordering::Acquire)
    }

    /// 是否处于暂停状态
    #[inline]
    fn paused(&self) -> bool {
        self.pause.load(Ordering::Acquire)
    }

    /// 安装解释器
    pub fn set_interpreter(&self, interpreter: Arc<dyn Interpreter>) {
        *self.interpreter.write() = Some(interpreter);
    }

    /// 将程序与本调度器关联（幂等）
    pub fn schedule_program(self: &Arc<Self>, program: &Arc<Program>) {
        program.set_scheduler(self);
        self.programs.insert(program.id, Arc::clone(program));
    }

    /// 为程序创建一个新进程并交给调度器执行
    pub fn spawn_process(self: &Arc<Self>, program: &Arc<Program>) -> Arc<Process> {
        let process = Process::new(Arc::clone(program));
        self.enqueue_process(Arc::clone(&process));
        process
    }

    /// 把进程交给调度器执行
    ///
    /// 进程必须处于休眠状态；必要时会启动新的工作线程
    pub fn enqueue_process(self: &Arc<Self>, process: Arc<Process>) {
        self.processes.fetch_add(1, Ordering::AcqRel);
        assert!(
            process.change_state(ProcessState::Sleeping, ProcessState::Ready),
            "enqueued process was not sleeping"
        );
        self.enqueue_and_notify(process);
    }

    /// 唤醒一个休眠中的进程；其他状态下静默忽略
    pub fn resume_process(&self, process: &Arc<Process>) {
        if !process.change_state(ProcessState::Sleeping, ProcessState::Ready) {
            return;
        }
        self.enqueue_on_any_thread(process, 0);
    }

    /// 暂停一个程序的全部进程
    ///
    /// 返回后该程序的进程都收在停止表中，没有工作线程在解释它们；
    /// 程序已处于停止状态时返回 false
    pub fn stop_program(&self, program: &Arc<Program>) -> bool {
        debug_assert!(self.programs.contains_key(&program.id));
        let mut stopped = self.pause_mutex.lock();

        if stopped.contains_key(&program.id) {
            return false;
        }
        // 先占住条目，再开始暂停握手
        stopped.insert(program.id, Vec::new());

        self.pause.store(true, Ordering::Release);
        self.notify_all_threads();

        // 反复抢占，直到所有活跃线程都已自停；
        // 只有成功换出槽位的抢占才会触碰进程，不会打在正被销毁的进程上
        loop {
            let mut live = 0;
            for index in 0..self.max_threads {
                if self.threads[index].is_live() {
                    live += 1;
                }
                self.preempt_thread_process(index);
            }
            if live == self.sleeping_threads.load(Ordering::Acquire) {
                break;
            }
            self.pause_cond.wait(&mut stopped);
        }

        // 清空所有队列；取出的进程都已处于 Running 状态
        let mut collected = Vec::new();
        let mut to_requeue = Vec::new();
        loop {
            match self.try_dequeue_from_any_thread(0) {
                DequeueResult::Process(process) => {
                    if Arc::ptr_eq(process.program(), program) {
                        collected.push(process);
                    } else {
                        to_requeue.push(process);
                    }
                }
                DequeueResult::Empty => break,
                DequeueResult::Contended => continue,
            }
        }
        for process in to_requeue {
            assert!(
                process.change_state(ProcessState::Running, ProcessState::Ready),
                "drained process was not running"
            );
            self.enqueue_on_any_thread(&process, 0);
        }

        debug!(
            "program {} stopped with {} processes",
            program.id,
            collected.len()
        );
        stopped.insert(program.id, collected);

        self.pause.store(false, Ordering::Release);
        drop(stopped);
        self.notify_all_threads();

        true
    }

    /// 恢复一个已停止程序的全部进程
    ///
    /// 程序必须处于停止状态
    pub fn resume_program(&self, program: &Arc<Program>) {
        let mut stopped = self.pause_mutex.lock();
        let list = stopped
            .remove(&program.id)
            .expect("program is not stopped");

        debug!("program {} resumed with {} processes", program.id, list.len());
        for process in list {
            assert!(
                process.change_state(ProcessState::Running, ProcessState::Ready),
                "stopped process was not running"
            );
            self.enqueue_on_any_thread(&process, 0);
        }

        drop(stopped);
        self.notify_all_threads();
    }

    /// 在暂停锁下遍历一个已停止程序的进程
    ///
    /// 程序必须处于停止状态
    pub fn visit_processes<F>(&self, program: &Arc<Program>, mut visitor: F)
    where
        F: FnMut(&Arc<Process>),
    {
        let stopped = self.pause_mutex.lock();
        let list = stopped.get(&program.id).expect("program is not stopped");
        for process in list {
            visitor(process);
        }
    }

    /// 在调用方线程上直接运行一个进程的一个量子
    ///
    /// 端口必须已由调用方锁定；成功认领进程时返回 true，
    /// 进程已被别处持有时解锁端口并返回 false
    pub fn run_process_on_current_thread(&self, process: &Arc<Process>, port: &Arc<Port>) -> bool {
        assert!(port.is_locked());
        if !process.change_state(ProcessState::Sleeping, ProcessState::Running) {
            port.unlock();
            return false;
        }
        port.unlock();

        let thread_state = ThreadState::ephemeral();
        if let Some(next) = self.interpret_process(Arc::clone(process), &thread_state) {
            assert!(
                next.change_state(ProcessState::Running, ProcessState::Ready),
                "follow-up process was not running"
            );
            self.enqueue_on_any_thread(&next, 0);
        }
        debug_assert!(thread_state.queue().is_empty());
        true
    }

    /// 在控制线程上驱动调度，直到所有进程终止
    ///
    /// 阻塞期间周期性地轮转抢占各工作线程；返回前 join 全部工作线程
    pub fn run(self: &Arc<Self>) -> bool {
        // 启动第一个工作线程
        while !self.try_start_worker(1) {}

        let mut thread_index = 0;
        loop {
            {
                let mut guard = self.preempt_mutex.lock();
                if self.alive_processes() == 0 {
                    break;
                }
                let interval = self
                    .config
                    .preempt
                    .interval_ms(self.thread_count.load(Ordering::Acquire));
                let _ = self
                    .preempt_cond
                    .wait_for(&mut guard, Duration::from_millis(interval));
            }

            if !self.config.preempt.enabled {
                continue;
            }
            let count = self.thread_count.load(Ordering::Acquire);
            if count == 0 {
                continue;
            }
            if thread_index >= count {
                thread_index = 0;
            }
            self.preempt_thread_process(thread_index);
            thread_index += 1;
        }

        self.thread_pool.join_all();
        true
    }

    /// 获取调度统计信息
    pub fn stats(&self) -> SchedulerStats {
        let count = self.thread_count.load(Ordering::Acquire);
        let queue_lengths = (0..count).map(|i| self.threads[i].queue().len()).collect();
        SchedulerStats {
            alive_processes: self.alive_processes(),
            started_threads: count,
            sleeping_threads: self.sleeping_threads.load(Ordering::Acquire),
            startup_queue_len: self.startup_queue.len(),
            queue_lengths,
        }
    }

    /// 请求抢占指定线程正在解释的进程
    pub fn preempt_thread_process(&self, thread_id: usize) {
        if thread_id >= self.max_threads {
            return;
        }
        self.current_processes[thread_id].preempt();
    }

    // ---- 内部实现 ----

    fn try_start_worker(self: &Arc<Self>, limit: usize) -> bool {
        let scheduler = Arc::clone(self);
        self.thread_pool
            .try_start_thread(limit, move || scheduler.run_in_thread())
    }

    /// 工作线程的派发循环
    fn run_in_thread(&self) {
        let thread_state = self.thread_enter();
        let thread_id = thread_state.id();
        trace!("worker {} entered", thread_id);

        loop {
            {
                let mut guard = thread_state.idle_lock();
                while thread_state.queue().is_empty()
                    && self.startup_queue.is_empty()
                    && !self.paused()
                    && self.alive_processes() > 0
                {
                    self.push_idle_thread(&thread_state);
                    thread_state.idle_wait(&mut guard);
                    // 醒来后本线程可能仍留在空闲栈里，
                    // 消费者会把这种失效条目当作建议处理
                }
            }

            if self.alive_processes() == 0 {
                let _guard = self.preempt_mutex.lock();
                self.preempt_cond.notify_one();
                break;
            } else if self.paused() {
                thread_state.cache().clear();
                {
                    // 先取暂停锁，确保 stop_program 正在等待
                    let _stopped = self.pause_mutex.lock();
                    self.sleeping_threads.fetch_add(1, Ordering::AcqRel);
                    self.pause_cond.notify_one();
                }
                {
                    let mut guard = thread_state.idle_lock();
                    while self.paused() {
                        thread_state.idle_wait(&mut guard);
                    }
                    self.sleeping_threads.fetch_sub(1, Ordering::AcqRel);
                }
            } else {
                while !self.paused() {
                    let Some(mut process) = self.dequeue_for_thread(&thread_state) else {
                        break;
                    };
                    // 解释器可能返回一个直接接力的进程，无需重新排队
                    loop {
                        match self.interpret_process(process, &thread_state) {
                            Some(next) => process = next,
                            None => break,
                        }
                    }
                }
            }
        }

        trace!("worker {} exited", thread_id);
        self.thread_exit(&thread_state);
    }

    /// 注册当前线程为工作线程
    fn thread_enter(&self) -> Arc<ThreadState> {
        let thread_id = self.thread_count.fetch_add(1, Ordering::AcqRel);
        assert!(thread_id < self.max_threads, "worker count exceeded max_threads");
        let thread_state = Arc::clone(&self.threads[thread_id]);
        thread_state.set_live(true);
        // 线程表变化要通知暂停监视器
        let _stopped = self.pause_mutex.lock();
        self.pause_cond.notify_one();
        thread_state
    }

    fn thread_exit(&self, thread_state: &Arc<ThreadState>) {
        thread_state.set_live(false);
        let _stopped = self.pause_mutex.lock();
        self.pause_cond.notify_one();
    }

    /// 把一个就绪进程路由到某个队列上，必要时启动新的工作线程
    fn enqueue_and_notify(self: &Arc<Self>, process: Arc<Process>) {
        if self.thread_count.load(Ordering::Acquire) == 0 {
            // 还没有任何工作线程，放进启动队列等第一个线程来取
            loop {
                if self.startup_queue.try_enqueue(&process).is_some() {
                    return;
                }
            }
        }

        // 落在空闲线程上就不用扩容
        if self.enqueue_on_any_thread(&process, 1) {
            return;
        }
        // 工作线程数少于存活进程数时补一个
        let limit = self.alive_processes().max(0) as usize;
        while !self.try_start_worker(limit) {}
    }

    /// 把就绪进程放到某个工作线程的队列上
    ///
    /// 返回 true 表示落在了空闲线程上（已唤醒），false 表示落在了
    /// 忙碌线程上；调用方只把返回值当作是否需要扩容的提示
    fn enqueue_on_any_thread(&self, process: &Arc<Process>, start_id: usize) -> bool {
        debug_assert_eq!(process.state(), ProcessState::Ready);

        if self.try_enqueue_on_idle_thread(process) {
            return true;
        }

        let mut index = start_id;
        loop {
            let count = self.thread_count.load(Ordering::Acquire);
            if count == 0 {
                // 工作线程还没起来，退回启动队列
                loop {
                    if self.startup_queue.try_enqueue(process).is_some() {
                        return false;
                    }
                }
            }
            if index >= count {
                index = 0;
            }
            let thread_state = &self.threads[index];
            if thread_state.is_live() {
                if let Some(was_empty) = thread_state.queue().try_enqueue(process) {
                    // 队列从空变为非空且没有进程在解释，拥有者可能在空闲等待
                    if was_empty && self.current_processes[index].is_null() {
                        thread_state.notify();
                    }
                    return false;
                }
            }
            index += 1;
        }
    }

    /// 尝试把进程派给一个空闲线程并唤醒它
    fn try_enqueue_on_idle_thread(&self, process: &Arc<Process>) -> bool {
        loop {
            let Some(index) = self.pop_idle_thread() else {
                return false;
            };
            let thread_state = &self.threads[index];
            if thread_state.queue().try_enqueue(process).is_none() {
                // 队列正忙，说明别人已经在往这个线程派活，换一个
                continue;
            }
            thread_state.notify();
            return true;
        }
    }

    /// 优先回到当前线程的队列；临时线程状态则转给任意线程
    fn enqueue_on_thread(&self, thread_state: &ThreadState, process: &Arc<Process>) {
        if thread_state.id() < 0 {
            self.enqueue_on_any_thread(process, 0);
            return;
        }
        loop {
            if thread_state.queue().try_enqueue(process).is_some() {
                return;
            }
            // 自己的队列正忙，扫一遍其他线程
            let count = self.thread_count.load(Ordering::Acquire);
            for index in 0..count {
                let other = &self.threads[index];
                if other.is_live() && other.queue().try_enqueue(process).is_some() {
                    return;
                }
            }
        }
    }

    /// 为工作线程取下一个进程：先取自己的队列，空了再窃取
    fn dequeue_for_thread(&self, thread_state: &Arc<ThreadState>) -> Option<Arc<Process>> {
        let thread_id = thread_state.id() as usize;
        loop {
            match thread_state.queue().try_dequeue() {
                DequeueResult::Process(process) => return Some(process),
                DequeueResult::Empty => break,
                DequeueResult::Contended => {
                    // 自己的队列正忙，顺手从别处找一个
                    if let DequeueResult::Process(process) =
                        self.try_dequeue_from_any_thread(thread_id)
                    {
                        return Some(process);
                    }
                }
            }
        }
        // 自己的队列空了，最后扫一轮其他线程和启动队列
        match self.try_dequeue_from_any_thread(thread_id) {
            DequeueResult::Process(process) => Some(process),
            _ => None,
        }
    }

    /// 从任意队列里取一个进程（从 start_id 开始环形扫描，最后是启动队列）
    fn try_dequeue_from_any_thread(&self, start_id: usize) -> DequeueResult {
        let count = self.thread_count.load(Ordering::Acquire);
        let mut contended = false;
        for offset in 0..count {
            let index = (start_id + offset) % count;
            let thread_state = &self.threads[index];
            if !thread_state.is_live() {
                continue;
            }
            match thread_state.queue().try_dequeue() {
                DequeueResult::Process(process) => return DequeueResult::Process(process),
                DequeueResult::Empty => {}
                DequeueResult::Contended => contended = true,
            }
        }
        match self.startup_queue.try_dequeue() {
            DequeueResult::Process(process) => return DequeueResult::Process(process),
            DequeueResult::Empty => {}
            DequeueResult::Contended => contended = true,
        }
        if contended {
            DequeueResult::Contended
        } else {
            DequeueResult::Empty
        }
    }

    /// 解释一个进程并处理其结果
    ///
    /// 返回 Some 表示有一个直接接力的进程，调用方应立即运行它
    fn interpret_process(
        &self,
        process: Arc<Process>,
        thread_state: &ThreadState,
    ) -> Option<Arc<Process>> {
        debug_assert_eq!(process.state(), ProcessState::Running);

        let thread_id = thread_state.id();
        if thread_id >= 0 {
            self.current_processes[thread_id as usize].set(&process);
        }
        process.set_owner(thread_id);

        let interpreter = self
            .interpreter
            .read()
            .clone()
            .expect("no interpreter installed");
        let result = interpreter.run(&process, thread_state);

        process.clear_owner();
        if thread_id >= 0 {
            self.current_processes[thread_id as usize].clear(&process);
        }

        match result {
            InterpretResult::Terminated => {
                trace!("process {} terminated", process.id);
                drop(process);
                if self.processes.fetch_sub(1, Ordering::AcqRel) == 1 {
                    self.notify_all_threads();
                }
                None
            }
            InterpretResult::Yielded => {
                // 先进入过渡状态再决定去向，邮箱投递方在 Yielding
                // 期间无法通过 Sleeping -> Ready 抢先入队
                assert!(
                    process.change_state(ProcessState::Running, ProcessState::Yielding),
                    "yielding process was not running"
                );
                if process.mailbox().is_empty() {
                    assert!(process.change_state(ProcessState::Yielding, ProcessState::Sleeping));
                } else {
                    assert!(process.change_state(ProcessState::Yielding, ProcessState::Ready));
                    self.enqueue_on_thread(thread_state, &process);
                }
                None
            }
            InterpretResult::TargetYielded(port) => {
                assert!(port.is_locked());
                let target = Arc::clone(port.process());

                // 先试休眠中的接收者
                if target.change_state(ProcessState::Sleeping, ProcessState::Running) {
                    port.unlock();
                    self.requeue_after_donation(&process, thread_id);
                    return Some(target);
                }
                // 再试从容纳它的队列里摘出来
                if let Some(queue) = target.current_queue() {
                    if queue.try_dequeue_entry(&target) {
                        port.unlock();
                        debug_assert_eq!(target.state(), ProcessState::Running);
                        self.requeue_after_donation(&process, thread_id);
                        return Some(target);
                    }
                }
                // 接收者正在运行，交接失败，自己回到本线程队列
                port.unlock();
                assert!(process.change_state(ProcessState::Running, ProcessState::Ready));
                self.enqueue_on_thread(thread_state, &process);
                None
            }
            InterpretResult::Interrupted => {
                assert!(process.change_state(ProcessState::Running, ProcessState::Ready));
                self.enqueue_on_thread(thread_state, &process);
                None
            }
            InterpretResult::UncaughtException => {
                // 不重新入队也不销毁，由外部会话观察并处理
                warn!("process {} raised an uncaught exception", process.id);
                None
            }
        }
    }

    /// 定向让出成功后，把让出方重新排为就绪
    fn requeue_after_donation(&self, process: &Arc<Process>, thread_id: i64) {
        assert!(
            process.change_state(ProcessState::Running, ProcessState::Ready),
            "donating process was not running"
        );
        let start = if thread_id < 0 { 0 } else { thread_id as usize + 1 };
        self.enqueue_on_any_thread(process, start);
    }

    /// 逐个唤醒所有活跃工作线程
    fn notify_all_threads(&self) {
        let count = self.thread_count.load(Ordering::Acquire);
        for index in 0..count {
            let thread_state = &self.threads[index];
            if thread_state.is_live() {
                thread_state.notify();
            }
        }
    }

    /// 把工作线程压入空闲栈（幂等：已在栈中时跳过）
    fn push_idle_thread(&self, thread_state: &Arc<ThreadState>) {
        let index = thread_state.id() as usize;
        let mut head = self.idle_threads.load(Ordering::Acquire);
        if idle_index(head) == index || thread_state.next_idle() != IDLE_UNLINKED {
            return;
        }
        loop {
            thread_state.set_next_idle(idle_index(head));
            let replacement = idle_pack(idle_tag(head).wrapping_add(1), index);
            match self.idle_threads.compare_exchange_weak(
                head,
                replacement,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(current) => head = current,
            }
        }
    }

    /// 从空闲栈弹出一个工作线程的下标
    fn pop_idle_thread(&self) -> Option<usize> {
        let mut head = self.idle_threads.load(Ordering::Acquire);
        loop {
            let index = idle_index(head);
            if index == IDLE_EMPTY {
                return None;
            }
            let next = self.threads[index].next_idle();
            let replacement = idle_pack(idle_tag(head).wrapping_add(1), next);
            match self.idle_threads.compare_exchange_weak(
                head,
                replacement,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.threads[index].set_next_idle(IDLE_UNLINKED);
                    return Some(index);
                }
                Err(current) => head = current,
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("max_threads", &self.max_threads)
            .field("alive_processes", &self.alive_processes())
            .field("thread_count", &self.thread_count.load(Ordering::Acquire))
            .field("paused", &self.paused())
            .finish()
    }
}
