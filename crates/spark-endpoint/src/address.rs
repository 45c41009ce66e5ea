//! 地址组与轮转游标。
//!
//! # 教案式导航
//! - **定位（Where）**：纯簿记模块，不做任何 I/O，由 [`ConnectionManager`](crate::ConnectionManager)
//!   在其内部锁保护下独占使用；
//! - **动机（Why）**：把“下一次连哪个地址”“是否已经绕完一圈”的判断从状态机中剥离，
//!   使圈（lap）语义可以被单独验证；
//! - **契约（What）**：游标始终满足 `0 <= cursor < len`，圈头（head）在任意时刻只有一个值。

use std::sync::Arc;

use spark_transport::EndpointAddress;

use crate::EndpointError;

/// 一个逻辑端点的等价地址集合，构造后不可变。
///
/// 克隆只增加引用计数。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressGroup {
    addresses: Arc<[EndpointAddress]>,
}

impl AddressGroup {
    /// 以有序地址列表构造地址组。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`addresses` 至少包含一个元素，否则返回 [`EndpointError::EmptyAddressGroup`]；
    /// - `authority` 仅用于错误上下文。
    pub fn new(
        authority: &str,
        addresses: impl IntoIterator<Item = EndpointAddress>,
    ) -> Result<Self, EndpointError> {
        let addresses: Arc<[EndpointAddress]> = addresses.into_iter().collect();
        if addresses.is_empty() {
            return Err(EndpointError::EmptyAddressGroup {
                authority: authority.to_owned(),
            });
        }
        Ok(Self { addresses })
    }

    /// 地址数量，恒大于 0。
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// 地址组不会为空，保留该方法以满足 clippy 的 `len_without_is_empty` 约定。
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// 按下标读取地址。
    pub fn get(&self, index: usize) -> Option<&EndpointAddress> {
        self.addresses.get(index)
    }

    /// 按顺序遍历地址。
    pub fn iter(&self) -> impl Iterator<Item = &EndpointAddress> {
        self.addresses.iter()
    }
}

/// [`AddressCycle::advance`] 的结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Advance {
    /// 前进后的游标。
    pub cursor: usize,
    /// 新游标是否回到了圈头，即完整绕过一圈仍未成功。
    pub wrapped: bool,
}

/// 带圈头标记的地址轮转游标。
///
/// # 教案式说明
/// - **意图 (Why)**：连接失败时按顺序尝试下一个地址，绕回圈头意味着整圈失败，需要退避；
///   一次成功的连接结束后，从“成功地址的下一个”重新起圈，避免反复敲打刚断开的地址；
/// - **契约 (What)**：
///   - [`current`](Self::current)：当前游标指向的地址；
///   - [`advance`](Self::advance)：游标前进一位（取模回绕），`wrapped` 当且仅当新游标等于圈头；
///   - [`reset_head_to_next`](Self::reset_head_to_next)：圈头与游标同时移动到当前游标的下一位；
/// - **风险 (Trade-offs)**：单地址组每次 `advance` 都会回到圈头，这正是“每次失败都退避”的预期行为。
#[derive(Clone, Debug)]
pub struct AddressCycle {
    group: AddressGroup,
    cursor: usize,
    head: usize,
}

impl AddressCycle {
    /// 以第一个地址作为游标与圈头创建轮转器。
    pub fn new(group: AddressGroup) -> Self {
        Self {
            group,
            cursor: 0,
            head: 0,
        }
    }

    /// 当前游标指向的地址。
    pub fn current(&self) -> &EndpointAddress {
        &self.group.addresses[self.cursor]
    }

    /// 当前游标。
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 当前圈头。
    pub fn head(&self) -> usize {
        self.head
    }

    /// 所属地址组。
    pub fn group(&self) -> &AddressGroup {
        &self.group
    }

    /// 游标前进一位。
    pub fn advance(&mut self) -> Advance {
        self.cursor = (self.cursor + 1) % self.group.len();
        Advance {
            cursor: self.cursor,
            wrapped: self.cursor == self.head,
        }
    }

    /// 以当前游标的下一位作为新圈的起点。
    pub fn reset_head_to_next(&mut self) {
        self.head = (self.cursor + 1) % self.group.len();
        self.cursor = self.head;
    }
}
