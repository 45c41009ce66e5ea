//! 定时器抽象：为退避重连提供“在指定时长后执行回调”的能力。
//!
//! # 模块定位（Why）
//! - 连接管理器在整圈失败后需要延迟发起下一次建连，但任何公开操作都不允许阻塞调用线程，
//!   因此延迟只能以“登记回调”的形式表达；
//! - 通过 trait 注入定时器，生产环境使用 Tokio 驱动，测试中使用可手动推进的虚拟定时器，
//!   让退避节律在 CI 中 100% 可复现。
//!
//! # 结构概览（What）
//! - [`TimerService`]：核心 trait，暴露 `schedule_after` 原语；
//! - [`TimerHandle`]：可取消的登记句柄；
//! - [`ManualTimer`]：虚拟定时器，`advance` 推进时间并按确定顺序执行到期回调；
//! - [`TokioTimer`]：基于 Tokio 运行时的生产实现（`runtime-tokio` 特性）。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

/// 定时器回调。
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// 可注入的定时器服务。
///
/// # 接口约束（What）
/// - `schedule_after` 必须立即返回，回调不得在本调用内同步执行；
/// - 回调在到期后至多执行一次；若句柄在执行前被取消，则不再执行；
/// - 回调可能在任意线程执行。
pub trait TimerService: Send + Sync + 'static {
    /// 登记一个在 `delay` 之后执行的回调。
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// 定时回调的取消句柄。
///
/// 丢弃句柄不会取消回调，需显式调用 [`cancel`](Self::cancel)。
#[derive(Clone, Debug, Default)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    /// 创建未取消的句柄，供 [`TimerService`] 实现使用。
    pub fn new() -> Self {
        Self::default()
    }

    /// 取消尚未执行的回调。
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// 回调是否已被取消。
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 虚拟定时器：通过手动推进时间在测试中复现确定性的回调序列。
///
/// # 设计动机（Why）
/// - 退避节律（“等 9ms 不应建连，再等 1ms 应建连”）需要精确到单个时间点的断言；
/// - 真实时间的抖动会让这类断言在 CI 中偶发失败。
///
/// # 行为概览（How）
/// - 内部维护 `elapsed`（自构造起的虚拟偏移）与待执行的回调列表；
/// - `advance` 增加偏移，在释放内部锁之后按（截止时间，登记顺序）依次执行到期回调；
/// - 回调内部再次登记且已经到期的回调，会在同一次 `advance` 中继续执行。
///
/// # 契约说明（What）
/// - `advance` 可以多次调用，偏移量单调增加；
/// - 被取消的回调在下一次 `advance` 时被清理，不会执行。
#[derive(Clone, Debug, Default)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualTimerState>>,
}

#[derive(Default)]
struct ManualTimerState {
    elapsed: Duration,
    entries: Vec<ManualEntry>,
    next_id: u64,
}

impl std::fmt::Debug for ManualTimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualTimerState")
            .field("elapsed", &self.elapsed)
            .field("entries", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

struct ManualEntry {
    id: u64,
    deadline: Duration,
    handle: TimerHandle,
    task: TimerTask,
}

impl ManualTimer {
    /// 创建起始偏移为 0 的虚拟定时器。
    pub fn new() -> Self {
        Self::default()
    }

    /// 推进虚拟时间并执行所有到期回调。
    pub fn advance(&self, delta: Duration) {
        let target = {
            let mut state = self.inner.lock();
            state.elapsed = state.elapsed.saturating_add(delta);
            state.elapsed
        };

        while let Some(entry) = self.take_next_due(target) {
            if !entry.handle.is_cancelled() {
                (entry.task)();
            }
        }
    }

    /// 自起点以来的虚拟时间偏移。
    pub fn elapsed(&self) -> Duration {
        self.inner.lock().elapsed
    }

    /// 尚未执行且未取消的回调数量。
    pub fn pending_tasks(&self) -> usize {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|entry| !entry.handle.is_cancelled())
            .count()
    }

    fn take_next_due(&self, now: Duration) -> Option<ManualEntry> {
        let mut state = self.inner.lock();
        state.entries.retain(|entry| !entry.handle.is_cancelled());
        let index = state
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.deadline <= now)
            .min_by_key(|(_, entry)| (entry.deadline, entry.id))
            .map(|(index, _)| index)?;
        Some(state.entries.remove(index))
    }
}

impl TimerService for ManualTimer {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut state = self.inner.lock();
        let id = state.next_id;
        state.next_id += 1;
        let deadline = state.elapsed.saturating_add(delay);
        state.entries.push(ManualEntry {
            id,
            deadline,
            handle: handle.clone(),
            task,
        });
        handle
    }
}

#[cfg(feature = "runtime-tokio")]
pub use tokio_timer::TokioTimer;

#[cfg(feature = "runtime-tokio")]
mod tokio_timer {
    use std::time::Duration;

    use tokio::runtime::Handle;

    use super::{TimerHandle, TimerService, TimerTask};

    /// 基于 Tokio 运行时的定时器。
    ///
    /// # 契约说明（What）
    /// - 每次登记派生一个任务，`tokio::time::sleep` 到期后检查取消标记再执行回调；
    /// - 持有构造时捕获的运行时句柄，因此可以在运行时之外的线程上登记回调。
    ///
    /// # 风险提示（Trade-offs）
    /// - 取消只阻止回调执行，休眠任务仍会运行到期；退避登记频率低，这点开销可以忽略。
    #[derive(Clone, Debug)]
    pub struct TokioTimer {
        runtime: Handle,
    }

    impl TokioTimer {
        /// 使用指定运行时句柄。
        pub fn new(runtime: Handle) -> Self {
            Self { runtime }
        }

        /// 捕获当前运行时句柄；必须在 Tokio 运行时上下文中调用。
        pub fn current() -> Self {
            Self::new(Handle::current())
        }
    }

    impl TimerService for TokioTimer {
        fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
            let handle = TimerHandle::new();
            let guard = handle.clone();
            self.runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                if !guard.is_cancelled() {
                    task();
                }
            });
            handle
        }
    }
}
