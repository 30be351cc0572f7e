use anyhow::{Context, Result};
use tracing::debug;

use crate::core::fetch::{fetch_as, queries, ContentSource, FetchOptions, QueryParams};
use crate::models::{ContentRecord, Metadata, OpenGraph, PathDescriptor};

/// 页面查询参数
pub(crate) fn page_params(path: &PathDescriptor) -> QueryParams {
    QueryParams::new()
        .with("slug", path.slug.as_str())
        .with("language", path.locale.as_str())
}

/// 计算页面元数据
///
/// 标题来自页面记录，找不到时为空；分享图片原样沿用父级元数据。
pub async fn generate_metadata<S>(
    source: &S,
    path: &PathDescriptor,
    parent: &Metadata,
    options: FetchOptions,
) -> Result<Metadata>
where
    S: ContentSource + ?Sized,
{
    let record: Option<ContentRecord> = fetch_as(
        source,
        &queries::PAGE,
        &page_params(path),
        options.without_stega(),
    )
    .await
    .with_context(|| format!("Failed to fetch metadata for {}", path))?;

    let title = record.and_then(|record| record.title);
    if title.is_none() {
        debug!("No title for {}, falling back to default", path);
    }

    Ok(Metadata {
        title,
        open_graph: OpenGraph {
            images: parent.open_graph.images.clone(),
        },
    })
}
