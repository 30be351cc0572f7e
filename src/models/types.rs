use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::portable_text::Block;

/// 内容平台中的页面文档（只读投影）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentRecord {
    /// 文档 ID，缺失表示未找到
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    /// 页面标题
    #[serde(default)]
    pub title: Option<String>,
    /// 本地化的 slug
    #[serde(default)]
    pub slug: Option<String>,
    /// 文档语言
    #[serde(default)]
    pub language: Option<String>,
    /// 最后更新时间
    #[serde(rename = "_updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// 正文（Portable Text 块序列）
    #[serde(default)]
    pub content: Option<Vec<Block>>,
}

impl ContentRecord {
    /// 记录是否带有有效 ID
    pub fn is_found(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn blocks(&self) -> &[Block] {
        self.content.as_deref().unwrap_or(&[])
    }
}

/// 枚举查询返回的 slug 投影
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSlug {
    pub slug: String,
}

/// 一个待渲染页面：(语言, slug)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathDescriptor {
    pub locale: String,
    pub slug: String,
}

impl PathDescriptor {
    pub fn new(locale: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            slug: slug.into(),
        }
    }
}

impl fmt::Display for PathDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/pages/{}", self.locale, self.slug)
    }
}

/// 社交分享预览图片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenGraphImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenGraph {
    pub images: Vec<OpenGraphImage>,
}

/// 页面元数据，每次请求重新计算
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub open_graph: OpenGraph,
}

impl Metadata {
    /// 标题缺失时使用给定的默认标题
    pub fn title_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(default)
    }
}
