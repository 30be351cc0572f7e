use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::core::fetch::{fetch_as, queries, ContentSource, FetchOptions};
use crate::core::metadata::page_params;
use crate::models::{ContentRecord, PathDescriptor};
use crate::theme::portable_text::PortableTextRenderer;

/// 渲染好的页面主体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPage {
    pub id: String,
    pub title: String,
    /// 正文 HTML，正文为空时没有
    pub body: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 页面渲染结果：找到或未找到
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Found(RenderedPage),
    NotFound,
}

impl PageOutcome {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PageOutcome::NotFound)
    }
}

/// 获取并渲染一个页面
///
/// 记录不存在或没有 `_id` 时返回 [`PageOutcome::NotFound`]；获取失败的错误直接向上传递。
pub async fn render_page<S>(
    source: &S,
    path: &PathDescriptor,
    options: FetchOptions,
    rich_text: &PortableTextRenderer,
) -> Result<PageOutcome>
where
    S: ContentSource + ?Sized,
{
    let record: Option<ContentRecord> = fetch_as(source, &queries::PAGE, &page_params(path), options)
        .await
        .with_context(|| format!("Failed to fetch page {}", path))?;

    let record = match record {
        Some(record) if record.is_found() => record,
        _ => {
            debug!("Page {} not found", path);
            return Ok(PageOutcome::NotFound);
        }
    };

    let blocks = record.blocks();
    let body = if blocks.is_empty() {
        None
    } else {
        Some(rich_text.render(blocks))
    };

    Ok(PageOutcome::Found(RenderedPage {
        id: record.id.clone().unwrap_or_default(),
        title: record.title.clone().unwrap_or_default(),
        body,
        updated_at: record.updated_at,
    }))
}
