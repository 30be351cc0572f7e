//! 站点使用的具名 GROQ 查询

/// 具名查询：名称用于日志和离线数据源分派，`groq` 为实际查询表达式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub name: &'static str,
    pub groq: &'static str,
}

/// 所有已发布页面的 slug
pub const PAGE_SLUGS: Query = Query {
    name: "pageSlugs",
    groq: r#"*[_type == "page" && defined(slug.current)]{"slug": slug.current}"#,
};

/// 按 slug 和语言取单个页面
pub const PAGE: Query = Query {
    name: "pageQuery",
    groq: r#"*[_type == "page" && slug.current == $slug && language == $language][0]{
  _id,
  _updatedAt,
  title,
  "slug": slug.current,
  language,
  content
}"#,
};
