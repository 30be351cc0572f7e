use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::core::engine::Engine;
use crate::models::PathDescriptor;

/// HTTP 服务器
pub struct Server {
    engine: Arc<Engine>,
    /// 端口
    port: u16,
}

impl Server {
    /// 创建新的服务器
    pub fn new(engine: Arc<Engine>, port: u16) -> Self {
        Self { engine, port }
    }

    /// 启动服务器，直到收到 Ctrl+C
    pub async fn start(self) -> Result<()> {
        let app = router(self.engine.clone());

        let addr: SocketAddr = format!("0.0.0.0:{}", self.port).parse()?;
        info!("Server started at http://localhost:{}", self.port);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// 构造路由
pub fn router(engine: Arc<Engine>) -> Router {
    let public_dir = engine.public_dir.clone();
    let studio_dist = engine.config.studio.dist_dir.clone();

    let mut app = Router::new()
        .route("/", get(home_handler))
        .route("/:locale/pages/:slug", get(page_handler));

    if let Some(base_path) = engine.studio_path.clone() {
        match studio_dist.as_deref().map(|dir| engine.base_dir.join(dir)) {
            Some(dist) if dist.is_dir() => {
                info!("Serving studio from {} at {}", dist.display(), base_path);
                app = app.nest_service(&base_path, studio_service(dist));
            }
            Some(dist) => {
                warn!("Studio bundle {} not found, serving the studio shell", dist.display());
                app = studio_shell_routes(app, &base_path);
            }
            None => {
                app = studio_shell_routes(app, &base_path);
            }
        }
    }

    app.fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

/// 预构建的 Studio：静态文件，未知路径回退到入口页面由前端路由处理
fn studio_service(dist: PathBuf) -> ServeDir<ServeFile> {
    let index = dist.join("index.html");
    ServeDir::new(dist).fallback(ServeFile::new(index))
}

fn studio_shell_routes(app: Router<Arc<Engine>>, base_path: &str) -> Router<Arc<Engine>> {
    app.route(base_path, get(studio_shell_handler))
        .route(&format!("{}/", base_path), get(studio_shell_handler))
        .route(&format!("{}/*rest", base_path), get(studio_shell_handler))
}

async fn home_handler(State(engine): State<Arc<Engine>>) -> Redirect {
    let home = PathDescriptor::new(engine.locales.default_locale(), engine.config.home_slug());
    Redirect::temporary(&engine.theme().url_for(&home))
}

async fn page_handler(
    State(engine): State<Arc<Engine>>,
    Path((locale, slug)): Path<(String, String)>,
) -> Response {
    if !engine.locales.is_supported(&locale) {
        return not_found(&engine, engine.locales.default_locale());
    }

    let path = PathDescriptor::new(locale, slug);
    match engine.render(&path).await {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => not_found(&engine, &path.locale),
        Err(e) => {
            error!("Failed to render {}: {:#}", path, e);
            server_error(&engine, &path.locale)
        }
    }
}

async fn studio_shell_handler(State(engine): State<Arc<Engine>>) -> Response {
    let base_path = engine.studio_path.as_deref().unwrap_or_default();
    let script = engine.config.studio.script.as_deref();
    match engine.theme().render_studio(base_path, script) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render studio shell: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn not_found(engine: &Engine, locale: &str) -> Response {
    match engine.theme().render_not_found(locale) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

fn server_error(engine: &Engine, locale: &str) -> Response {
    match engine.theme().render_error(locale) {
        Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
    }
}
