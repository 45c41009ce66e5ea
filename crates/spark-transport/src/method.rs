use std::sync::Arc;

/// RPC 方法的调用形态。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// 一请求一响应。
    Unary,
    /// 客户端流式请求。
    ClientStreaming,
    /// 服务端流式响应。
    ServerStreaming,
    /// 双向流。
    BidiStreaming,
    /// 形态未知，由传输实现按双向流处理。
    Unknown,
}

/// 建流请求携带的方法描述。
///
/// # 契约说明（What）
/// - `full_name` 采用 `/<service>/<method>` 形式；
/// - 克隆只增加引用计数，连接管理器在缓冲建流请求时会持有一份副本。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    kind: MethodKind,
    full_name: Arc<str>,
}

impl MethodDescriptor {
    /// 构造方法描述。
    pub fn new(kind: MethodKind, full_name: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            full_name: full_name.into(),
        }
    }

    /// 调用形态。
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// 完整方法名。
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// 从完整方法名中拆出服务名；格式不符时返回 `None`。
    pub fn service_name(&self) -> Option<&str> {
        let trimmed = self.full_name.strip_prefix('/')?;
        trimmed.rsplit_once('/').map(|(service, _)| service)
    }
}
