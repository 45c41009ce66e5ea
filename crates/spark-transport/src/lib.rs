#![deny(unsafe_code)]
#![doc = "spark-transport: 客户端传输契约统一抽象层。"]
#![doc = ""]
#![doc = "== 使命概述 =="]
#![doc = "- **Why**：连接管理器只关心“建连、就绪、关闭、建流”四件事，具体协议实现（TCP/TLS/QUIC）由各实现 crate 提供，二者通过本 crate 的 trait 对接。"]
#![doc = "- **What**：定义 `ClientTransport`/`TransportFactory`/`TransportListener` 生命周期契约、`ClientStream`/`StreamListener` 流契约，以及 `EndpointAddress`、`Metadata`、`MethodDescriptor`、`Status` 等基础结构。"]
#![doc = "- **How**：所有契约均为对象安全 trait，调用方以 `Arc<dyn …>` 持有，便于在测试中注入桩实现。"]

/// `Result` 是传输层契约内部使用的统一返回别名。
///
/// # 使用方式（How）
/// - 与 `core::result::Result` 完全等价，默认错误类型为 [`Status`]；
/// - 地址解析等非状态类失败需在签名中显式声明错误类型。
pub type Result<T, E = Status> = core::result::Result<T, E>;

pub mod addr;
pub mod connection;
pub mod metadata;
pub mod method;
pub mod status;
pub mod stream;

pub use addr::{AddressParseError, EndpointAddress};
pub use connection::{
    ClientTransport, StreamTransport, TransportEvent, TransportFactory, TransportListener,
};
pub use metadata::{Metadata, MetadataKey};
pub use method::{MethodDescriptor, MethodKind};
pub use status::{Status, StatusCode};
pub use stream::{ClientStream, StreamListener};
