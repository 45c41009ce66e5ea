use bytes::Bytes;

use crate::{Metadata, Status};

/// 流事件的接收方。
///
/// # 教案级注释
///
/// ## 契约说明（What）
/// - `on_closed` 在流生命周期内恰好触发一次，之后不再有任何回调；
/// - `on_headers`/`on_message` 默认忽略，只关心终态的调用方无需实现；
/// - 回调可能在任意线程触发，实现需自行保证线程安全。
pub trait StreamListener: Send + Sync + 'static {
    /// 收到响应头。
    fn on_headers(&self, _headers: Metadata) {}

    /// 收到一条响应消息。
    fn on_message(&self, _message: Bytes) {}

    /// 流进入终态。
    fn on_closed(&self, status: Status);
}

/// 客户端流句柄。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 连接管理器在连接尚未就绪时也必须立即返回可用的流句柄，因此流契约只包含“可缓冲”的操作：
///   启动、写消息、半关闭、取消，全部为非阻塞调用。
///
/// ## 契约说明（What）
/// - `start` 必须先于其他操作调用，且只调用一次；
/// - `cancel` 可在任意时刻调用，若流尚未结束，监听器会以给定状态收到 `on_closed`；
/// - 所有方法均不得阻塞调用线程。
pub trait ClientStream: Send + Sync + 'static {
    /// 启动流并登记监听器。
    fn start(&self, listener: Box<dyn StreamListener>);

    /// 发送一条请求消息。
    fn write_message(&self, message: Bytes);

    /// 声明不再发送请求消息。
    fn half_close(&self);

    /// 取消流。
    fn cancel(&self, status: Status);
}
