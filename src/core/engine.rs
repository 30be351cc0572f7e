use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::fetch::{ContentSource, FetchOptions, FixtureSource, Perspective, SanityClient};
use crate::core::generator::{BuildReport, HtmlGenerator};
use crate::core::metadata::generate_metadata;
use crate::core::page::{render_page, PageOutcome};
use crate::core::paths::generate_static_params;
use crate::core::server::Server;
use crate::i18n::LocaleRegistry;
use crate::models::{Config, Metadata, OpenGraph, PathDescriptor};
use crate::theme::{PortableTextRenderer, ThemeRenderer};

/// 站点引擎：把配置、内容源、语言注册表和主题渲染器组合在一起
#[derive(Clone)]
pub struct Engine {
    /// 基础目录
    pub base_dir: PathBuf,
    /// 公共目录（输出）
    pub public_dir: PathBuf,
    /// 站点配置
    pub config: Config,
    /// 支持的语言
    pub locales: LocaleRegistry,
    /// Studio 挂载路径，未启用时为空
    pub studio_path: Option<String>,
    source: Arc<dyn ContentSource>,
    theme: ThemeRenderer,
    rich_text: PortableTextRenderer,
    /// 运行时页面查询模式
    runtime_options: FetchOptions,
    /// 站点级元数据，页面元数据从它继承
    parent_metadata: Metadata,
}

impl Engine {
    /// 从站点目录创建引擎
    ///
    /// 提供 `fixtures` 时从本地 JSON 文件读取内容，否则连接内容 API。
    pub fn new(base_dir: PathBuf, config_path: Option<&Path>, fixtures: Option<&Path>) -> Result<Self> {
        info!("Site directory: {}", base_dir.display());

        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| base_dir.join("_config.yml"));
        let config = Config::load(&config_path)?;

        let source: Arc<dyn ContentSource> = match fixtures {
            Some(path) => Arc::new(FixtureSource::from_file(path)?),
            None => Arc::new(
                SanityClient::new(&config.sanity).context("Failed to configure the content API client")?,
            ),
        };

        Self::with_source(base_dir, config, source)
    }

    /// 使用指定内容源创建引擎
    pub fn with_source(base_dir: PathBuf, config: Config, source: Arc<dyn ContentSource>) -> Result<Self> {
        let locales = LocaleRegistry::from_config(&config).context("Invalid locale configuration")?;
        let theme = ThemeRenderer::new(&base_dir, &config, &locales)?;
        let rich_text = PortableTextRenderer::from_config(&config.sanity);

        let perspective: Perspective = config
            .sanity
            .perspective
            .parse()
            .context("Invalid sanity.perspective")?;
        if perspective != Perspective::Published && config.sanity.token.is_none() {
            warn!("Perspective '{}' usually requires an API token", perspective);
        }

        let runtime_options = FetchOptions {
            perspective,
            stega: config.sanity.stega,
        };

        let studio_path = if config.studio.enable {
            Some(config.studio.mount_path().context("Invalid studio configuration")?)
        } else {
            None
        };

        let public_dir = base_dir.join(config.public_dir.as_deref().unwrap_or("public"));
        let parent_metadata = Metadata {
            title: Some(config.title.clone()),
            open_graph: OpenGraph {
                images: config.open_graph.images.clone(),
            },
        };

        info!(
            "Content source: {}, locales: {}",
            source.name(),
            locales.locales().join(", ")
        );

        Ok(Self {
            base_dir,
            public_dir,
            config,
            locales,
            studio_path,
            source,
            theme,
            rich_text,
            runtime_options,
            parent_metadata,
        })
    }

    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    pub fn theme(&self) -> &ThemeRenderer {
        &self.theme
    }

    /// 所有需要预渲染的路径
    pub async fn static_paths(&self) -> Result<Vec<PathDescriptor>> {
        generate_static_params(self.source(), &self.locales).await
    }

    /// 页面元数据
    pub async fn metadata(&self, path: &PathDescriptor) -> Result<Metadata> {
        generate_metadata(self.source(), path, &self.parent_metadata, self.runtime_options).await
    }

    /// 页面主体
    pub async fn page(&self, path: &PathDescriptor) -> Result<PageOutcome> {
        render_page(self.source(), path, self.runtime_options, &self.rich_text).await
    }

    /// 渲染完整 HTML；页面不存在时返回 `None`
    pub async fn render(&self, path: &PathDescriptor) -> Result<Option<String>> {
        let (meta, outcome) = tokio::try_join!(self.metadata(path), self.page(path))?;

        match outcome {
            PageOutcome::Found(page) => Ok(Some(self.theme.render_page(path, &meta, &page)?)),
            PageOutcome::NotFound => Ok(None),
        }
    }

    /// 生成静态站点
    pub async fn generate(&self, output_dir: &Path) -> Result<BuildReport> {
        let generator = HtmlGenerator::new(output_dir.to_path_buf(), self.config.build.concurrency);
        generator.generate(self).await
    }

    /// 启动服务器
    pub async fn server(self, port: u16) -> Result<()> {
        Server::new(Arc::new(self), port).start().await
    }

    /// 清理输出目录
    pub fn clean(&self) -> Result<()> {
        if self.public_dir.exists() {
            fs::remove_dir_all(&self.public_dir)
                .with_context(|| format!("Failed to remove {}", self.public_dir.display()))?;
            info!("Removed {}", self.public_dir.display());
        } else {
            info!("Nothing to clean");
        }
        Ok(())
    }
}
