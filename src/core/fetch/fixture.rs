use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

use super::{queries, ContentSource, FetchError, FetchOptions, Perspective, Query, QueryParams};

const DRAFT_PREFIX: &str = "drafts.";

/// 从本地 JSON 文件读取的页面数据源
///
/// 文件内容是页面文档数组，字段与 [`queries::PAGE`] 的投影一致。
/// `_id` 以 `drafts.` 开头的文档是草稿，只有在预览视角下可见。
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    documents: Vec<Value>,
}

impl FixtureSource {
    pub fn new(documents: Vec<Value>) -> Self {
        Self { documents }
    }

    pub fn from_file(path: &Path) -> Result<Self, FetchError> {
        let fixture_err = |message: String| FetchError::Fixture {
            path: path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| fixture_err(e.to_string()))?;
        let value: Value = serde_json::from_str(&content).map_err(|e| fixture_err(e.to_string()))?;
        let documents = match value {
            Value::Array(documents) => documents,
            _ => return Err(fixture_err("expected a JSON array of documents".to_string())),
        };

        info!("Loaded {} documents from {}", documents.len(), path.display());
        Ok(Self::new(documents))
    }

    /// 按视角过滤可见文档
    fn visible(&self, perspective: Perspective) -> Vec<&Value> {
        let is_draft = |doc: &Value| {
            doc.get("_id")
                .and_then(Value::as_str)
                .is_some_and(|id| id.starts_with(DRAFT_PREFIX))
        };

        match perspective {
            Perspective::Published => self.documents.iter().filter(|doc| !is_draft(*doc)).collect(),
            Perspective::Raw => self.documents.iter().collect(),
            Perspective::PreviewDrafts => {
                // 有草稿的文档用草稿替换已发布版本
                let drafted: HashSet<&str> = self
                    .documents
                    .iter()
                    .filter(|doc| is_draft(*doc))
                    .filter_map(|doc| doc.get("_id").and_then(Value::as_str))
                    .map(|id| &id[DRAFT_PREFIX.len()..])
                    .collect();

                self.documents
                    .iter()
                    .filter(|doc| {
                        is_draft(*doc)
                            || doc
                                .get("_id")
                                .and_then(Value::as_str)
                                .map_or(true, |id| !drafted.contains(id))
                    })
                    .collect()
            }
        }
    }
}

fn field<'a>(doc: &'a Value, name: &str) -> Option<&'a str> {
    doc.get(name).and_then(Value::as_str)
}

#[async_trait]
impl ContentSource for FixtureSource {
    fn name(&self) -> &str {
        "fixtures"
    }

    async fn fetch(
        &self,
        query: &Query,
        params: &QueryParams,
        options: FetchOptions,
    ) -> Result<Value, FetchError> {
        let documents = self.visible(options.perspective);

        if query.name == queries::PAGE_SLUGS.name {
            let slugs: Vec<Value> = documents
                .iter()
                .filter_map(|doc| field(doc, "slug"))
                .map(|slug| json!({ "slug": slug }))
                .collect();
            return Ok(Value::Array(slugs));
        }

        if query.name == queries::PAGE.name {
            let slug = params.get_str("slug");
            let language = params.get_str("language");
            let found = documents
                .into_iter()
                .find(|doc| field(doc, "slug") == slug && field(doc, "language") == language);
            return Ok(found.cloned().unwrap_or(Value::Null));
        }

        Err(FetchError::UnsupportedQuery(query.name.to_string()))
    }
}
