use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use rust_cms_site::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // 本地开发时从 .env 读取内容 API 凭据
    let _ = dotenvy::dotenv();

    // 初始化日志系统
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rust_cms_site=info,tower_http=info")),
        )
        .with_target(false)
        .init();

    // 解析命令行参数
    let cli = cli::Cli::parse();

    println!("{} {}", "rust-cms-site".bright_cyan(), env!("CARGO_PKG_VERSION").bright_green());
    println!();

    // 执行命令
    if let Err(e) = cli::execute(cli).await {
        error!("Error: {}", e);

        // 打印错误链
        for cause in e.chain().skip(1) {
            error!("Caused by: {}", cause);
        }

        std::process::exit(1);
    }

    Ok(())
}
