use crate::core::Engine;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 指定站点目录
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// 配置文件（默认为站点目录下的 _config.yml）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 从本地 JSON 文件读取内容，而不是访问内容 API
    #[arg(long, value_name = "FILE")]
    pub fixtures: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 生成静态文件
    Generate(GenArgs),

    /// 启动服务器，按请求渲染页面
    Server(ServerArgs),

    /// 列出所有需要预渲染的页面路径
    Paths,

    /// 清理生成的文件
    Clean,
}

#[derive(Args)]
pub struct GenArgs {
    /// 输出目录（默认为配置中的 public_dir）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ServerArgs {
    /// 服务器端口
    #[arg(short, long, default_value = "4000")]
    pub port: u16,
}

/// 执行命令
pub async fn execute(cli: Cli) -> Result<()> {
    let engine = Engine::new(cli.path.clone(), cli.config.as_deref(), cli.fixtures.as_deref())?;

    match cli.command {
        Commands::Generate(args) => {
            let output_dir = args.output.unwrap_or_else(|| engine.public_dir.clone());
            let report = engine.generate(&output_dir).await?;

            println!(
                "{} {} pages written to {}",
                "✔".bright_green(),
                report.written,
                output_dir.display()
            );
            for path in &report.skipped {
                println!("  {} {}", "skipped".yellow(), path);
            }
        }
        Commands::Server(args) => {
            engine.server(args.port).await?;
        }
        Commands::Paths => {
            let paths = engine.static_paths().await?;
            for path in &paths {
                println!("{}", path.to_string().bright_white());
            }
            info!("{} paths", paths.len());
        }
        Commands::Clean => {
            engine.clean()?;
        }
    }

    Ok(())
}
