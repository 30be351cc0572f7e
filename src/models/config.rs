use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{bail, Context, Result};

use crate::models::types::OpenGraphImage;
use crate::utils::ensure_leading_slash;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub root: Option<String>,
    /// 默认语言
    pub language: Option<String>,
    /// 支持的语言列表
    #[serde(default)]
    pub locales: Vec<String>,
    /// 根路径重定向到的页面
    pub home_slug: Option<String>,
    pub public_dir: Option<String>,
    pub theme: Option<String>,
    #[serde(default)]
    pub sanity: SanityConfig,
    #[serde(default)]
    pub studio: StudioConfig,
    #[serde(default)]
    pub open_graph: OpenGraphConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanityConfig {
    pub project_id: Option<String>,
    pub dataset: String,
    pub api_version: String,
    pub use_cdn: bool,
    pub token: Option<String>,
    /// 运行时查询使用的视角：published / previewDrafts / raw
    pub perspective: String,
    /// 是否在运行时查询中请求编辑元数据
    pub stega: bool,
    /// 覆盖 API 地址（测试或代理）
    pub api_host: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub enable: bool,
    pub base_path: String,
    /// 预先构建好的 Studio 静态文件目录
    pub dist_dir: Option<String>,
    /// 外壳页面加载的 Studio 脚本地址（没有 dist_dir 时使用）
    pub script: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenGraphConfig {
    #[serde(default)]
    pub images: Vec<OpenGraphImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// 并发渲染的页面数
    pub concurrency: usize,
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: "production".to_string(),
            api_version: "2024-07-11".to_string(),
            use_cdn: true,
            token: None,
            perspective: "published".to_string(),
            stega: false,
            api_host: None,
        }
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            enable: true,
            base_path: "/studio".to_string(),
            dist_dir: None,
            script: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "My Site".to_string(),
            description: None,
            url: Some("http://localhost:4000".to_string()),
            root: Some("/".to_string()),
            language: Some("en".to_string()),
            locales: vec!["en".to_string()],
            home_slug: Some("home".to_string()),
            public_dir: None,
            theme: Some("default".to_string()),
            sanity: SanityConfig::default(),
            studio: StudioConfig::default(),
            open_graph: OpenGraphConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl StudioConfig {
    /// 规范化后的挂载路径，不允许挂载在站点根路径
    pub fn mount_path(&self) -> Result<String> {
        let path = ensure_leading_slash(self.base_path.trim_end_matches('/'));
        if path == "/" {
            bail!("studio.base_path must not be the site root");
        }
        Ok(path)
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// 加载配置：文件不存在时使用默认值，然后应用环境变量覆盖
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 用环境变量覆盖 Sanity 相关配置
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(project_id) = lookup("SANITY_PROJECT_ID") {
            self.sanity.project_id = Some(project_id);
        }
        if let Some(dataset) = lookup("SANITY_DATASET") {
            self.sanity.dataset = dataset;
        }
        if let Some(api_version) = lookup("SANITY_API_VERSION") {
            self.sanity.api_version = api_version;
        }
        if let Some(token) = lookup("SANITY_API_TOKEN") {
            self.sanity.token = Some(token);
        }
    }

    /// 默认语言
    pub fn default_locale(&self) -> &str {
        self.language.as_deref().unwrap_or("en")
    }

    pub fn root(&self) -> &str {
        self.root.as_deref().unwrap_or("/")
    }

    pub fn home_slug(&self) -> &str {
        self.home_slug.as_deref().unwrap_or("home")
    }

    pub fn theme_name(&self) -> &str {
        self.theme.as_deref().unwrap_or("default")
    }
}
