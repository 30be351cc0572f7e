use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::core::engine::Engine;
use crate::models::PathDescriptor;
use crate::utils::is_safe_path_segment;

/// 一次构建的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// 写出的页面数
    pub written: usize,
    /// 内容缺失或路径不合法而跳过的页面
    pub skipped: Vec<PathDescriptor>,
}

/// HTML 生成器
pub struct HtmlGenerator {
    /// 输出目录
    pub output_dir: PathBuf,
    /// 同时渲染的页面数
    concurrency: usize,
}

impl HtmlGenerator {
    pub fn new(output_dir: PathBuf, concurrency: usize) -> Self {
        Self {
            output_dir,
            concurrency: concurrency.max(1),
        }
    }

    /// 生成所有页面
    ///
    /// 路径枚举或任意页面获取失败都会中止构建；内容缺失的页面跳过。
    pub async fn generate(&self, engine: &Engine) -> Result<BuildReport> {
        info!("Generating static site into {}", self.output_dir.display());

        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let assets = engine.theme().copy_assets(&self.output_dir)?;
        debug!("Copied {} theme assets", assets);

        let paths = engine.static_paths().await?;
        let mut report = BuildReport::default();

        let mut renders = stream::iter(paths)
            .map(|path| async move {
                let html = engine.render(&path).await?;
                Ok::<_, anyhow::Error>((path, html))
            })
            .buffer_unordered(self.concurrency);

        while let Some(result) = renders.next().await {
            let (path, html) = result?;
            match html {
                Some(html) => match self.page_file(&path) {
                    Some(file) => {
                        write_file(&file, &html)?;
                        debug!("Wrote {}", file.display());
                        report.written += 1;
                    }
                    None => {
                        warn!("Skipping {}: slug cannot be used as a file name", path);
                        report.skipped.push(path);
                    }
                },
                None => {
                    warn!("Skipping {}: page not found", path);
                    report.skipped.push(path);
                }
            }
        }

        let not_found = engine.theme().render_not_found(engine.locales.default_locale())?;
        write_file(&self.output_dir.join("404.html"), &not_found)?;

        info!(
            "Generated {} pages ({} skipped)",
            report.written,
            report.skipped.len()
        );
        Ok(report)
    }

    /// 页面输出文件：`{out}/{locale}/pages/{slug}/index.html`
    fn page_file(&self, path: &PathDescriptor) -> Option<PathBuf> {
        if !is_safe_path_segment(&path.locale) || !is_safe_path_segment(&path.slug) {
            return None;
        }
        Some(
            self.output_dir
                .join(&path.locale)
                .join("pages")
                .join(&path.slug)
                .join("index.html"),
        )
    }
}

fn write_file(file: &Path, content: &str) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file, content).with_context(|| format!("Failed to write {}", file.display()))
}
