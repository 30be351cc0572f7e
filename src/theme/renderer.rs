use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::core::page::RenderedPage;
use crate::i18n::LocaleRegistry;
use crate::models::{Config, Metadata, PathDescriptor};
use crate::utils::{encode_path_segment, ensure_leading_slash, ensure_trailing_slash};

// 内置的默认主题
mod default_theme {
    pub const STYLE_CSS: &str = include_str!("../../embed/theme/default/source/css/style.css");

    pub const LAYOUT_HTML: &str = include_str!("../../embed/theme/default/layout/layout.html");
    pub const PAGE_HTML: &str = include_str!("../../embed/theme/default/layout/page.html");
    pub const NOT_FOUND_HTML: &str = include_str!("../../embed/theme/default/layout/404.html");
    pub const ERROR_HTML: &str = include_str!("../../embed/theme/default/layout/error.html");
    pub const STUDIO_HTML: &str = include_str!("../../embed/theme/default/layout/studio.html");
}

/// 模板中可用的站点信息
#[derive(Debug, Clone, Serialize)]
struct SiteContext {
    title: String,
    description: Option<String>,
    url: Option<String>,
    root: String,
    locales: Vec<String>,
    default_locale: String,
    home_slug: String,
}

#[derive(Clone)]
pub struct ThemeRenderer {
    /// 主题目录（可能不存在，此时只使用内置模板）
    pub theme_dir: PathBuf,
    tera: Tera,
    site: SiteContext,
}

impl ThemeRenderer {
    /// 创建主题渲染器：先加载内置模板，再用主题目录 `layout/` 下的同名模板覆盖
    pub fn new(base_dir: &Path, config: &Config, locales: &LocaleRegistry) -> Result<Self> {
        let theme_dir = base_dir.join("themes").join(config.theme_name());
        let root = ensure_trailing_slash(&ensure_leading_slash(config.root()));

        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("layout.html", default_theme::LAYOUT_HTML),
            ("page.html", default_theme::PAGE_HTML),
            ("404.html", default_theme::NOT_FOUND_HTML),
            ("error.html", default_theme::ERROR_HTML),
            ("studio.html", default_theme::STUDIO_HTML),
        ])
        .context("Failed to load built-in templates")?;

        let layout_dir = theme_dir.join("layout");
        if layout_dir.is_dir() {
            for entry in WalkDir::new(&layout_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
            {
                let name = entry
                    .path()
                    .strip_prefix(&layout_dir)?
                    .to_string_lossy()
                    .replace('\\', "/");
                debug!("Loading theme template {}", name);
                tera.add_template_file(entry.path(), Some(&name))
                    .with_context(|| format!("Failed to load template {}", entry.path().display()))?;
            }
            info!("Using theme templates from {}", layout_dir.display());
        } else {
            debug!("Theme directory {} not found, using built-in templates", layout_dir.display());
        }

        Self::register_functions(&mut tera, root.clone());

        Ok(Self {
            theme_dir,
            tera,
            site: SiteContext {
                title: config.title.clone(),
                description: config.description.clone(),
                url: config.url.clone(),
                root,
                locales: locales.locales().to_vec(),
                default_locale: locales.default_locale().to_string(),
                home_slug: config.home_slug().to_string(),
            },
        })
    }

    /// 注册模板函数
    fn register_functions(tera: &mut Tera, root: String) {
        tera.register_function("url_for", move |args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
            let locale = args
                .get("locale")
                .and_then(|v| v.as_str())
                .ok_or_else(|| tera::Error::msg("url_for: missing argument 'locale'"))?;
            let slug = args
                .get("slug")
                .and_then(|v| v.as_str())
                .ok_or_else(|| tera::Error::msg("url_for: missing argument 'slug'"))?;
            Ok(tera::Value::String(page_url(&root, locale, slug)))
        });
    }

    fn base_context(&self, locale: &str) -> TeraContext {
        let mut context = TeraContext::new();
        context.insert("site", &self.site);
        context.insert("locale", locale);
        context
    }

    fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        match self.tera.render(template, context) {
            Ok(html) => Ok(html),
            Err(e) => {
                error!("Failed to render template {}: {}", template, e);
                Err(e).with_context(|| format!("Failed to render {}", template))
            }
        }
    }

    /// 渲染完整页面
    pub fn render_page(&self, path: &PathDescriptor, meta: &Metadata, page: &RenderedPage) -> Result<String> {
        let mut context = self.base_context(&path.locale);
        context.insert("slug", &path.slug);
        context.insert("meta_title", meta.title_or(&self.site.title));
        context.insert("og_images", &meta.open_graph.images);
        context.insert("page", page);
        self.render("page.html", &context)
    }

    /// 渲染 404 页面
    pub fn render_not_found(&self, locale: &str) -> Result<String> {
        let mut context = self.base_context(locale);
        context.insert("meta_title", &self.site.title);
        context.insert("og_images", &Vec::<String>::new());
        self.render("404.html", &context)
    }

    /// 渲染通用错误页面
    pub fn render_error(&self, locale: &str) -> Result<String> {
        let context = self.base_context(locale);
        self.render("error.html", &context)
    }

    /// 渲染 Studio 外壳页面，`studio_script` 为要加载的 Studio 脚本
    pub fn render_studio(&self, base_path: &str, studio_script: Option<&str>) -> Result<String> {
        let mut context = self.base_context("en");
        context.insert("base_path", base_path);
        context.insert("studio_script", &studio_script);
        self.render("studio.html", &context)
    }

    /// 页面 URL
    pub fn url_for(&self, path: &PathDescriptor) -> String {
        page_url(&self.site.root, &path.locale, &path.slug)
    }

    /// 复制主题静态资源到输出目录，没有主题资源时写入内置样式表
    pub fn copy_assets(&self, output_dir: &Path) -> Result<usize> {
        let theme_source = self.theme_dir.join("source");

        if !theme_source.is_dir() {
            let css_dir = output_dir.join("css");
            fs::create_dir_all(&css_dir)?;
            fs::write(css_dir.join("style.css"), default_theme::STYLE_CSS)?;
            debug!("Wrote built-in stylesheet");
            return Ok(1);
        }

        info!("Copying theme assets from {}", theme_source.display());
        let mut copied = 0;
        for entry in WalkDir::new(&theme_source)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let source_path = entry.path();
            let relative_path = source_path.strip_prefix(&theme_source)?;
            let target_path = output_dir.join(relative_path);

            if let Some(parent) = target_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(source_path, &target_path)
                .with_context(|| format!("Failed to copy {}", source_path.display()))?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn page_url(root: &str, locale: &str, slug: &str) -> String {
    format!("{}{}/pages/{}", root, encode_path_segment(locale), encode_path_segment(slug))
}
