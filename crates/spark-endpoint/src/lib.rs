#![deny(unsafe_code)]
#![doc = "spark-endpoint: 单个逻辑端点的连接生命周期管理。"]
#![doc = ""]
#![doc = "== 使命概述 =="]
#![doc = "- **Why**：RPC 客户端需要一个“总能立刻拿到可建流传输”的入口；建连、地址轮转、退避重连与停机排空都应对调用方透明。"]
#![doc = "- **What**：`ConnectionManager` 驱动状态机，`AddressCycle` 负责圈语义，`BackoffSession` 约定退避节律，`DelayedTransport` 在连接就绪前缓冲建流请求。"]
#![doc = "- **How**：状态由单把互斥锁串行化，对外副作用在锁外执行；定时器与传输工厂以 trait 注入，测试使用 `ManualTimer` 精确推进虚拟时间。"]

pub mod address;
pub mod backoff;
pub mod config;
pub mod delayed;
pub mod error;
pub mod manager;
pub mod timer;

pub use address::{AddressCycle, AddressGroup, Advance};
pub use backoff::{BackoffProvider, BackoffSession};
pub use config::EndpointConfig;
pub use delayed::{DelayedStream, DelayedTransport};
pub use error::EndpointError;
pub use manager::{
    ConnectionManager, ConnectionManagerBuilder, IDLE_MESSAGE, Lifecycle, SHUTDOWN_MESSAGE,
    TerminationHook, TransportSlot,
};
#[cfg(feature = "runtime-tokio")]
pub use timer::TokioTimer;
pub use timer::{ManualTimer, TimerHandle, TimerService, TimerTask};
