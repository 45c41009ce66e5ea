use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// `EndpointAddress` 描述地址组中的单个候选地址。
///
/// # 设计初衷（Why）
/// - 负载均衡器下发的地址既可能是已解析的 Socket 地址，也可能是尚待解析的主机名；
///   连接管理器本身不做解析，只原样交给传输工厂，因此需要一个同时容纳两者的枚举。
/// - 地址在地址组内被反复轮询，`Named` 变体使用 `Arc<str>` 以便廉价克隆。
///
/// # 契约定义（What）
/// - `Socket`：已解析的 IPv4/IPv6 地址；
/// - `Named`：主机名 + 端口，由传输实现自行解析；
/// - `Display` 输出稳定的 `host:port` 形式（IPv6 带方括号），可直接用作日志字段。
///
/// # 设计取舍与风险（Trade-offs）
/// - 未内建 Unix Domain Socket 支持；如需扩展可新增变体，`non_exhaustive` 保证下游匹配不被破坏。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EndpointAddress {
    /// 已解析的套接字地址。
    Socket(SocketAddr),
    /// 主机名形式的地址。
    Named { host: Arc<str>, port: u16 },
}

impl EndpointAddress {
    /// 以主机名与端口构造地址。
    pub fn named(host: impl Into<Arc<str>>, port: u16) -> Self {
        Self::Named {
            host: host.into(),
            port,
        }
    }

    /// 返回端口号。
    pub fn port(&self) -> u16 {
        match self {
            Self::Socket(addr) => addr.port(),
            Self::Named { port, .. } => *port,
        }
    }
}

impl From<SocketAddr> for EndpointAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::Socket(addr)
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(addr) => write!(f, "{addr}"),
            Self::Named { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

/// 地址文本解析失败。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// 缺少 `:port` 部分。
    #[error("address `{input}` is missing a port")]
    MissingPort { input: String },
    /// 端口不是合法的 `u16`。
    #[error("address `{input}` has an invalid port")]
    InvalidPort { input: String },
    /// 主机部分为空。
    #[error("address `{input}` has an empty host")]
    EmptyHost { input: String },
}

impl FromStr for EndpointAddress {
    type Err = AddressParseError;

    /// 先尝试按 `SocketAddr` 解析，失败后回退为 `host:port`。
    fn from_str(input: &str) -> crate::Result<Self, Self::Err> {
        let trimmed = input.trim();
        if let Ok(addr) = trimmed.parse::<SocketAddr>() {
            return Ok(Self::Socket(addr));
        }
        let (host, port) = trimmed
            .rsplit_once(':')
            .ok_or_else(|| AddressParseError::MissingPort {
                input: input.to_owned(),
            })?;
        if host.is_empty() {
            return Err(AddressParseError::EmptyHost {
                input: input.to_owned(),
            });
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| AddressParseError::InvalidPort {
                input: input.to_owned(),
            })?;
        Ok(Self::named(host, port))
    }
}
