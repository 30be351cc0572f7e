//! Portable Text 数据结构
//!
//! 内容平台用 JSON 块序列表示富文本，每个块用 `_type` 区分种类。
//! 无法识别的块种类反序列化为 [`Block::Unknown`]，渲染时跳过。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Block {
    /// 文本块（段落、标题、引用、列表项）
    #[serde(rename = "block")]
    Text(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "code")]
    Code(CodeBlock),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "_key", default)]
    pub key: Option<String>,
    /// normal / h1-h6 / blockquote
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub children: Vec<Span>,
    #[serde(rename = "markDefs", default)]
    pub mark_defs: Vec<MarkDef>,
    /// bullet / number
    #[serde(rename = "listItem", default)]
    pub list_item: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
}

impl TextBlock {
    pub fn style(&self) -> &str {
        self.style.as_deref().unwrap_or("normal")
    }

    /// 列表嵌套层级，从 1 开始
    pub fn level(&self) -> u32 {
        self.level.unwrap_or(1).max(1)
    }

    /// 按 key 查找注解定义
    pub fn mark_def(&self, key: &str) -> Option<&MarkDef> {
        self.mark_defs.iter().find(|def| def.key == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub text: String,
    /// 装饰名（strong、em...）或注解 key
    #[serde(default)]
    pub marks: Vec<String>,
}

/// 注解定义，例如链接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub blank: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(default)]
    pub asset: Option<AssetRef>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// 解析后的图片资源引用 `image-<id>-<w>x<h>-<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

impl ImageRef {
    pub fn parse(reference: &str) -> Option<Self> {
        let rest = reference.strip_prefix("image-")?;
        let mut parts = rest.rsplitn(3, '-');
        let format = parts.next()?;
        let dimensions = parts.next()?;
        let id = parts.next()?;

        let (width, height) = dimensions.split_once('x')?;
        if id.is_empty() || format.is_empty() {
            return None;
        }

        Some(Self {
            id: id.to_string(),
            width: width.parse().ok()?,
            height: height.parse().ok()?,
            format: format.to_string(),
        })
    }

    /// 资源在图片 CDN 上的文件名
    pub fn file_name(&self) -> String {
        format!("{}-{}x{}.{}", self.id, self.width, self.height, self.format)
    }
}
