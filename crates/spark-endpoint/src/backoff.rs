//! 退避会话契约。
//!
//! 退避算法本身（指数、抖动、上限）属于外部策略，这里只约定调用节律：
//! - 每次“重置”（首次建连，或一次成功连接结束后的首次建连）创建一个新的 [`BackoffSession`]；
//! - 同一会话在整个失败序列中保留，每完成一圈失败调用一次 [`BackoffSession::next_delay`]；
//! - 触发重置的那次建连本身从不询问退避。

use std::time::Duration;

/// 一次退避会话，产出逐次递进的等待时长。
pub trait BackoffSession: Send + 'static {
    /// 返回下一次整圈失败后应等待的时长。
    fn next_delay(&mut self) -> Duration;
}

/// 退避会话的提供者。
///
/// # 教案式说明
/// - **意图 (Why)**：会话在重置时被整体替换而非复位，提供者只需返回全新实例，无需暴露 `reset` 接口；
/// - **契约 (What)**：`new_session` 可能在连接管理器内部锁内调用，实现必须快速返回且不得回调管理器；
/// - **扩展 (How)**：任何 `Fn() -> Box<dyn BackoffSession>` 闭包都可直接作为提供者。
pub trait BackoffProvider: Send + Sync + 'static {
    /// 创建新的退避会话。
    fn new_session(&self) -> Box<dyn BackoffSession>;
}

impl<F> BackoffProvider for F
where
    F: Fn() -> Box<dyn BackoffSession> + Send + Sync + 'static,
{
    fn new_session(&self) -> Box<dyn BackoffSession> {
        self()
    }
}
