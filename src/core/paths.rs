use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::core::fetch::{fetch_as, queries, ContentSource, FetchOptions, QueryParams};
use crate::i18n::LocaleRegistry;
use crate::models::{PageSlug, PathDescriptor};

/// 枚举所有需要预渲染的 (语言, slug)
///
/// 结果按语言分组，语言顺序与注册表一致，组内保持查询返回的顺序。
/// 查询失败时整个构建失败。
pub async fn generate_static_params<S>(source: &S, locales: &LocaleRegistry) -> Result<Vec<PathDescriptor>>
where
    S: ContentSource + ?Sized,
{
    let pages: Vec<PageSlug> = fetch_as(
        source,
        &queries::PAGE_SLUGS,
        &QueryParams::new(),
        FetchOptions::published(),
    )
    .await
    .with_context(|| format!("Failed to enumerate page slugs from {}", source.name()))?
    .unwrap_or_default();

    // 不同语言的文档可能共用同一个 slug
    let mut seen = HashSet::new();
    let slugs: Vec<String> = pages
        .into_iter()
        .map(|page| page.slug)
        .filter(|slug| !slug.is_empty() && seen.insert(slug.clone()))
        .collect();
    debug!("Found {} distinct page slugs", slugs.len());

    let paths: Vec<PathDescriptor> = locales
        .locales()
        .iter()
        .flat_map(|locale| slugs.iter().map(move |slug| PathDescriptor::new(locale.as_str(), slug.as_str())))
        .collect();

    info!(
        "Enumerated {} paths ({} slugs x {} locales)",
        paths.len(),
        slugs.len(),
        locales.locales().len()
    );
    Ok(paths)
}
