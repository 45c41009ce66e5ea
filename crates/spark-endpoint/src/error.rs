//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 连接管理器运行期的失败（建连失败、对端关闭）全部在重试循环内部消化，不以错误形式外泄；
//! - 真正需要交给调用方处理的只有“构造期”问题：地址组为空、地址无法解析、配置格式错误、协作方缺失。
//!
//! ## 设计要求（What）
//! - 所有错误类型派生 `thiserror::Error`；
//! - 每个变体提供稳定错误码（[`EndpointError::code`]），命名沿用 `<域>.<语义>` 约定。

use spark_transport::AddressParseError;
use thiserror::Error;

/// 端点构造与配置错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：集中描述构造连接管理器时可能出现的问题，调用方可据此在启动阶段快速失败；
/// - **契约 (What)**：所有变体均为 `Send + Sync + 'static`，可跨线程传播；
/// - **设计权衡 (Trade-offs)**：使用 `String` 保存上下文，牺牲少量堆分配换取易读性，构造期路径对性能不敏感。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EndpointError {
    /// 地址组至少需要一个地址。
    #[error("address group for `{authority}` is empty")]
    EmptyAddressGroup { authority: String },

    /// 配置中的地址无法解析。
    #[error("invalid address in endpoint configuration: {source}")]
    InvalidAddress {
        #[from]
        source: AddressParseError,
    },

    /// 配置文本格式错误。
    #[error("malformed endpoint configuration: {source}")]
    MalformedConfig {
        #[from]
        source: toml::de::Error,
    },

    /// 构造器缺少必需的协作方。
    #[error("connection manager builder is missing `{collaborator}`")]
    MissingCollaborator { collaborator: &'static str },
}

impl EndpointError {
    /// 返回稳定错误码，便于日志与告警归类。
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyAddressGroup { .. } => "endpoint.address_group.empty",
            Self::InvalidAddress { .. } => "endpoint.address.invalid",
            Self::MalformedConfig { .. } => "endpoint.config.malformed",
            Self::MissingCollaborator { .. } => "endpoint.builder.incomplete",
        }
    }
}
