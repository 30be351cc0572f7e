//! 站点语言注册表
//!
//! 支持的语言在启动时从配置加载并校验，之后只读。
//! 语言代码同时用作路由段和查询参数。

use anyhow::{bail, Result};

use crate::models::Config;

/// 封闭的语言集合，带一个默认语言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleRegistry {
    locales: Vec<String>,
    default_locale: String,
}

impl LocaleRegistry {
    /// 创建注册表。默认语言必须属于集合，重复的代码只保留第一次出现。
    pub fn new<I, S>(locales: I, default_locale: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for code in locales {
            let code = code.into();
            let code = code.trim();
            if code.is_empty() {
                bail!("Locale codes must not be empty");
            }
            if !unique.iter().any(|existing| existing == code) {
                unique.push(code.to_string());
            }
        }

        if unique.is_empty() {
            bail!("At least one locale must be configured");
        }
        if !unique.iter().any(|code| code == default_locale) {
            bail!(
                "Default locale '{}' is not one of the configured locales: {}",
                default_locale,
                unique.join(", ")
            );
        }

        Ok(Self {
            locales: unique,
            default_locale: default_locale.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let default_locale = config.default_locale();
        if config.locales.is_empty() {
            return Self::new([default_locale], default_locale);
        }
        Self::new(config.locales.iter().cloned(), default_locale)
    }

    /// 按配置顺序列出所有语言
    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.locales.iter().any(|locale| locale == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keeps_order_and_dedups() {
        let registry = LocaleRegistry::new(["en", "es", "en", "de"], "es").unwrap();
        assert_eq!(registry.locales(), &["en", "es", "de"]);
        assert_eq!(registry.default_locale(), "es");
        assert!(registry.is_supported("de"));
        assert!(!registry.is_supported("fr"));
    }

    #[test]
    fn test_default_must_be_member() {
        let err = LocaleRegistry::new(["en", "es"], "fr").unwrap_err();
        assert!(err.to_string().contains("fr"));
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(LocaleRegistry::new(Vec::<String>::new(), "en").is_err());
    }

    #[test]
    fn test_from_config_falls_back_to_default_locale() {
        let mut config = Config::default();
        config.locales.clear();
        config.language = Some("nl".to_string());

        let registry = LocaleRegistry::from_config(&config).unwrap();
        assert_eq!(registry.locales(), &["nl"]);
    }
}
