use std::borrow::Cow;
use std::sync::Arc;

use crate::{ClientStream, EndpointAddress, Metadata, MethodDescriptor, Status};

/// 可以在其上创建流的传输形态。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 真实连接与“等待连接就绪的占位传输”都需要对外提供同一个建流入口，
///   调用方拿到句柄后无需关心底层连接是否已经建立；
/// - 将建流能力与生命周期管理拆成两个 trait，占位传输只实现本 trait。
///
/// ## 契约说明（What）
/// - `new_stream` 必须立即返回，不得等待网络；
/// - 返回的流在 `start` 之前不会向网络发送任何数据。
pub trait StreamTransport: Send + Sync + 'static {
    /// 基于方法描述与请求头创建新流。
    fn new_stream(&self, method: MethodDescriptor, headers: Metadata) -> Arc<dyn ClientStream>;
}

/// 单个地址上的客户端连接。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 连接管理器负责“何时连、连哪里、失败后等多久”，连接本身的握手、分帧与多路复用由实现 crate 负责；
/// - 生命周期通过 [`TransportListener`] 回报，管理器无需轮询连接状态。
///
/// ## 契约说明（What）
/// - `start`：开始建连，之后以 [`TransportEvent`] 回报进度；实现不得在 `start` 之前发出事件；
/// - `shutdown`：优雅关闭，已创建的流允许继续完成，完成后回报 `Terminated`；可重复调用；
/// - `id`：用于日志的稳定标识。
///
/// ## 风险提示（Trade-offs）
/// - 实现可以在 `start` 内同步回报事件，管理器保证此时未持有内部锁；
/// - 若实现从不回报 `Terminated`，管理器将无法进入终止态。
pub trait ClientTransport: StreamTransport {
    /// 返回可用于日志或追踪的连接 ID。
    fn id(&self) -> Cow<'_, str>;

    /// 开始建连并登记生命周期监听器。
    fn start(&self, listener: Arc<dyn TransportListener>);

    /// 发起优雅关闭。
    fn shutdown(&self);
}

/// 传输工厂：每次建连尝试调用一次。
///
/// # 契约说明（What）
/// - `authority` 为端点的逻辑身份（如 TLS SNI 或 `:authority` 头）；
/// - 返回的连接尚未启动，由调用方决定何时 `start`；
/// - 实现不得在本方法内回调连接管理器。
pub trait TransportFactory: Send + Sync + 'static {
    /// 为指定地址创建一个新的连接。
    fn new_transport(&self, address: &EndpointAddress, authority: &str)
    -> Arc<dyn ClientTransport>;
}

/// 连接生命周期事件。
///
/// # 状态转换（What）
/// - `connecting → Ready`：连接可用；
/// - `connecting → Shutdown`：连接在就绪前失败；
/// - `ready → Shutdown`：已建立的连接被对端或本地关闭，不再接受新流；
/// - `* → Terminated`：连接的全部资源已释放，此后不再有事件。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// 连接就绪。
    Ready,
    /// 连接关闭或建连失败。
    Shutdown(Status),
    /// 连接资源释放完毕。
    Terminated,
}

/// 连接生命周期事件的接收方，由连接管理器在 `start` 时提供。
pub trait TransportListener: Send + Sync + 'static {
    /// 投递一次生命周期事件。
    fn on_event(&self, event: TransportEvent);

    /// 便捷方法：连接就绪。
    fn transport_ready(&self) {
        self.on_event(TransportEvent::Ready);
    }

    /// 便捷方法：连接关闭或建连失败。
    fn transport_shutdown(&self, status: Status) {
        self.on_event(TransportEvent::Shutdown(status));
    }

    /// 便捷方法：连接资源释放完毕。
    fn transport_terminated(&self) {
        self.on_event(TransportEvent::Terminated);
    }
}
