//! 端点配置：从 TOML 文本装配地址组。
//!
//! 配置只描述“连谁”，即端点身份与有序地址列表；传输工厂、退避策略与定时器属于运行时协作方，
//! 由 [`ConnectionManagerBuilder`](crate::ConnectionManagerBuilder) 注入。
//!
//! ```toml
//! authority = "orders.internal"
//! addresses = ["10.0.0.7:7443", "orders-b.internal:7443"]
//! ```

use serde::Deserialize;
use spark_transport::EndpointAddress;

use crate::{AddressGroup, EndpointError};

/// 单个端点的静态配置。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// 端点身份，随每次建连传给传输工厂。
    pub authority: String,
    /// 有序地址列表，`ip:port` 或 `host:port`。
    pub addresses: Vec<String>,
}

impl EndpointConfig {
    /// 解析 TOML 文本；未知字段视为格式错误。
    pub fn from_toml_str(source: &str) -> Result<Self, EndpointError> {
        Ok(toml::from_str(source)?)
    }

    /// 解析全部地址并构造地址组，保持配置中的顺序。
    pub fn address_group(&self) -> Result<AddressGroup, EndpointError> {
        let addresses = self
            .addresses
            .iter()
            .map(|raw| raw.parse::<EndpointAddress>())
            .collect::<Result<Vec<_>, _>>()?;
        AddressGroup::new(&self.authority, addresses)
    }
}
