//! 内容获取层
//!
//! [`ContentSource`] 执行一个具名查询并返回原始 JSON 结果（`null` 表示没有结果）。
//! [`SanityClient`] 访问托管的内容 API，[`FixtureSource`] 从本地 JSON 文件读取，
//! 用于离线构建和测试。

mod error;
mod fixture;
pub mod queries;
mod sanity;

pub use error::FetchError;
pub use fixture::FixtureSource;
pub use queries::Query;
pub use sanity::SanityClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 查询视角
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Perspective {
    /// 只包含已发布文档
    #[default]
    Published,
    /// 草稿优先于已发布文档
    PreviewDrafts,
    /// 不做任何合并
    Raw,
}

impl Perspective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Perspective::Published => "published",
            Perspective::PreviewDrafts => "previewDrafts",
            Perspective::Raw => "raw",
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Perspective {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(Perspective::Published),
            "previewDrafts" | "drafts" => Ok(Perspective::PreviewDrafts),
            "raw" => Ok(Perspective::Raw),
            other => Err(FetchError::Config {
                message: format!("unknown perspective '{}'", other),
            }),
        }
    }
}

/// 查询模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchOptions {
    pub perspective: Perspective,
    /// 是否请求可视化编辑元数据
    pub stega: bool,
}

impl FetchOptions {
    /// 构建期使用：只读已发布内容，不带编辑元数据
    pub fn published() -> Self {
        Self {
            perspective: Perspective::Published,
            stega: false,
        }
    }

    pub fn without_stega(self) -> Self {
        Self { stega: false, ..self }
    }
}

/// 查询参数，值以 JSON 编码传递
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(BTreeMap<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// 内容数据源
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// 数据源名称（日志用）
    fn name(&self) -> &str;

    /// 执行查询，返回原始结果
    async fn fetch(
        &self,
        query: &Query,
        params: &QueryParams,
        options: FetchOptions,
    ) -> Result<Value, FetchError>;
}

/// 执行查询并反序列化结果；`null` 结果返回 `None`
pub async fn fetch_as<T, S>(
    source: &S,
    query: &Query,
    params: &QueryParams,
    options: FetchOptions,
) -> Result<Option<T>, FetchError>
where
    T: DeserializeOwned,
    S: ContentSource + ?Sized,
{
    let value = source.fetch(query, params, options).await?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}
