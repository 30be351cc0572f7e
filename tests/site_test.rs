// 使用本地内容源的端到端测试：静态生成和按请求渲染

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use rust_cms_site::core::fetch::{queries, FixtureSource, Query, QueryParams};
use rust_cms_site::core::server::router;
use rust_cms_site::{
    Config, ContentSource, Engine, FetchError, FetchOptions, PageOutcome, PathDescriptor,
};

fn fixtures() -> FixtureSource {
    FixtureSource::new(vec![
        json!({
            "_id": "abc",
            "title": "About Us",
            "slug": "about",
            "language": "en",
            "content": [
                {"_type": "block", "style": "normal", "children": [{"_type": "span", "text": "Hello"}]}
            ]
        }),
        json!({
            "_id": "abc-es",
            "title": "Sobre nosotros",
            "slug": "about",
            "language": "es",
            "content": []
        }),
        json!({
            "_id": "home",
            "title": "Home",
            "slug": "home",
            "language": "en"
        }),
    ])
}

/// 能列出页面，但读取页面内容时 API 不可用
struct UnavailablePages;

#[async_trait]
impl ContentSource for UnavailablePages {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn fetch(&self, query: &Query, params: &QueryParams, options: FetchOptions) -> Result<Value, FetchError> {
        if query.name == queries::PAGE_SLUGS.name {
            return fixtures().fetch(query, params, options).await;
        }
        Err(FetchError::Status {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

fn site_config() -> Config {
    let mut config = Config::default();
    config.title = "Acme".to_string();
    config.locales = vec!["en".to_string(), "es".to_string()];
    config
}

fn engine(base_dir: &Path) -> Engine {
    Engine::with_source(base_dir.to_path_buf(), site_config(), Arc::new(fixtures())).unwrap()
}

fn unavailable_engine(base_dir: &Path) -> Engine {
    Engine::with_source(base_dir.to_path_buf(), site_config(), Arc::new(UnavailablePages)).unwrap()
}

async fn get(engine: Engine, uri: &str) -> (StatusCode, String) {
    let response = router(Arc::new(engine))
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn about_page_shows_heading_and_paragraph() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());

    match engine.page(&PathDescriptor::new("en", "about")).await.unwrap() {
        PageOutcome::Found(page) => {
            assert_eq!(page.title, "About Us");
            assert_eq!(page.body.as_deref(), Some("<p>Hello</p>"));
        }
        PageOutcome::NotFound => panic!("about page should exist"),
    }

    let (status, html) = get(engine, "/en/pages/about").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(">About Us</h1>"));
    assert!(html.contains("<p>Hello</p>"));
    assert!(html.contains("<title>About Us</title>"));
}

#[tokio::test]
async fn ghost_page_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());

    assert!(engine
        .page(&PathDescriptor::new("en", "ghost"))
        .await
        .unwrap()
        .is_not_found());
    assert!(engine.render(&PathDescriptor::new("en", "ghost")).await.unwrap().is_none());

    let (status, html) = get(engine, "/en/pages/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!html.contains("<h1 class=\"text-balance"));
}

#[tokio::test]
async fn unsupported_locale_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _) = get(engine(dir.path()), "/fr/pages/about").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn root_redirects_to_home_page() {
    let dir = tempfile::tempdir().unwrap();
    let response = router(Arc::new(engine(dir.path())))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()["location"], "/en/pages/home");
}

#[tokio::test]
async fn studio_shell_is_mounted() {
    let dir = tempfile::tempdir().unwrap();
    for uri in ["/studio", "/studio/", "/studio/structure/page"] {
        let (status, html) = get(engine(dir.path()), uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert!(html.contains("id=\"sanity\""), "{}", uri);
    }
}

#[test]
fn studio_cannot_be_mounted_at_site_root() {
    let dir = tempfile::tempdir().unwrap();
    for base_path in ["/", ""] {
        let mut config = site_config();
        config.studio.base_path = base_path.to_string();
        let result = Engine::with_source(dir.path().to_path_buf(), config, Arc::new(fixtures()));
        assert!(result.is_err(), "{:?} should be rejected", base_path);
    }

    let mut config = site_config();
    config.studio.enable = false;
    config.studio.base_path = "/".to_string();
    assert!(Engine::with_source(dir.path().to_path_buf(), config, Arc::new(fixtures())).is_ok());
}

#[tokio::test]
async fn fetch_failure_serves_error_page() {
    let dir = tempfile::tempdir().unwrap();
    let (status, html) = get(unavailable_engine(dir.path()), "/en/pages/about").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(html.contains("Something went wrong"));
    assert!(!html.contains("About Us"));
}

#[tokio::test]
async fn fetch_failure_aborts_generation() {
    let dir = tempfile::tempdir().unwrap();
    let engine = unavailable_engine(dir.path());
    let out = dir.path().join("public");

    assert!(engine.generate(&out).await.is_err());
    assert!(!out.join("en/pages/about/index.html").exists());
    assert!(!out.join("es/pages/about/index.html").exists());
    assert!(!out.join("404.html").exists());
}

#[tokio::test]
async fn generate_writes_every_found_path() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let out = dir.path().join("public");

    let paths = engine.static_paths().await.unwrap();
    assert_eq!(paths.len(), 4);

    let report = engine.generate(&out).await.unwrap();

    // home 只有英文版本
    assert_eq!(report.written, 3);
    assert_eq!(report.skipped, vec![PathDescriptor::new("es", "home")]);

    let about = fs::read_to_string(out.join("en/pages/about/index.html")).unwrap();
    assert!(about.contains("<p>Hello</p>"));

    let about_es = fs::read_to_string(out.join("es/pages/about/index.html")).unwrap();
    assert!(about_es.contains(">Sobre nosotros</h1>"));
    assert!(!about_es.contains("prose"));

    assert!(out.join("404.html").exists());
    assert!(out.join("css/style.css").exists());
}

#[tokio::test]
async fn generated_files_are_served_as_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let public_dir = engine.public_dir.clone();
    engine.generate(&public_dir).await.unwrap();

    let (status, css) = get(engine, "/css/style.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(css.contains(".prose"));
}

#[tokio::test]
async fn metadata_falls_back_to_site_title() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());

    let meta = engine.metadata(&PathDescriptor::new("en", "ghost")).await.unwrap();
    assert!(meta.title.is_none());
    assert_eq!(meta.title_or(&engine.config.title), "Acme");
}
