use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// 流终态的稳定分类。
///
/// # 教案式说明
/// - **意图 (Why)**：流监听器只需要判断“为何结束”，稳定的枚举比解析消息文本可靠；
/// - **契约 (What)**：[`as_str`](Self::as_str) 返回 `transport.<语义>` 形式的稳定码，可直接作为日志或指标标签；
/// - **风险 (Trade-offs)**：枚举非穷尽，新增变体不会破坏下游匹配，但下游需保留兜底分支。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StatusCode {
    /// 正常结束。
    Ok,
    /// 调用方主动取消。
    Cancelled,
    /// 端点不可用：连接失败、对端关闭或本地已停机。
    Unavailable,
    /// 截止时间已过。
    DeadlineExceeded,
    /// 实现内部错误。
    Internal,
    /// 无法归类的失败。
    Unknown,
}

impl StatusCode {
    /// 返回稳定的错误码字符串。
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "transport.ok",
            Self::Cancelled => "transport.cancelled",
            Self::Unavailable => "transport.unavailable",
            Self::DeadlineExceeded => "transport.deadline_exceeded",
            Self::Internal => "transport.internal",
            Self::Unknown => "transport.unknown",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Status` 是传输与流向上层交付的终态描述。
///
/// # 设计背景（Why）
/// - 连接失败、对端关闭与本地停机都需要以同一种形态通知流监听器，避免每个实现各自定义错误类型；
/// - 结构体仅承载 `code` 与 `message`，可廉价克隆并在多个监听器之间广播。
///
/// # 契约说明（What）
/// - `code`：稳定分类，见 [`StatusCode`]；
/// - `message`：面向排障人员的描述，不应包含敏感信息；
/// - 通过 `thiserror` 实现 `std::error::Error`，可直接参与 `?` 传播。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct Status {
    code: StatusCode,
    message: Cow<'static, str>,
}

impl Status {
    /// 构造任意分类的状态。
    pub fn new(code: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 正常结束。
    pub fn ok() -> Self {
        Self::new(StatusCode::Ok, "")
    }

    /// 端点不可用。
    pub fn unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }

    /// 调用方取消。
    pub fn cancelled(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::Cancelled, message)
    }

    /// 内部错误。
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    /// 读取分类。
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// 读取描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 是否为正常结束。
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }
}
