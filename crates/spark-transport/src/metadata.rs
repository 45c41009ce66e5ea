use std::borrow::Cow;

use bytes::Bytes;

/// 请求头键名，统一转换为 ASCII 小写。
///
/// # 教案级说明
/// - **意图 (Why)**：HTTP/2 与多数 RPC 协议的头部键大小写不敏感，在入口处归一化可避免查找时重复比较；
/// - **设计 (How)**：内部持有 `Cow`，静态小写键零拷贝复用，含大写字母的键才分配新字符串。
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetadataKey(Cow<'static, str>);

impl MetadataKey {
    /// 基于任意可转换为 `Cow` 的输入创建键名。
    pub fn new<S>(key: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        let key = key.into();
        if key.bytes().any(|byte| byte.is_ascii_uppercase()) {
            Self(Cow::Owned(key.to_ascii_lowercase()))
        } else {
            Self(key)
        }
    }

    /// 读取底层字符串切片。
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

/// 随建流请求下发的头部集合。
///
/// 保留插入顺序，同一键允许出现多次；值以 [`Bytes`] 存储以便零拷贝转交给编码层。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(MetadataKey, Bytes)>,
}

impl Metadata {
    /// 创建空的头部集合。
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加键值对，不覆盖已有同名条目。
    pub fn append(&mut self, key: impl Into<Cow<'static, str>>, value: impl Into<Bytes>) {
        self.entries.push((MetadataKey::new(key), value.into()));
    }

    /// 返回某键首次出现的值。
    pub fn get(&self, key: &str) -> Option<&Bytes> {
        let key = MetadataKey::new(key.to_owned());
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value)
    }

    /// 按插入顺序遍历全部条目。
    pub fn iter(&self) -> impl Iterator<Item = (&MetadataKey, &Bytes)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// 条目数量。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
