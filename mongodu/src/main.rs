//! MongoDB 磁盘用量分析工具
//!
//! 提供以下功能：
//! - 采集各数据库及集合的原始存储统计
//! - 将统计快照保存为 JSON 文件或从文件载入
//! - 计算用量指标并输出需要关注的集合

mod args;
mod runner;

use std::process::ExitCode;

use args::Args;
use clap::{CommandFactory, Parser};
use common::errors::AppError;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "mongodu";

/// Exit code for failures that are not part of the error taxonomy.
const EXIT_FAILURE: u8 = 1;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // 解析参数（参数错误按配置错误退出）
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = args::parse_error_exit_code(&e);
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    // 初始化日志追踪（stdout 仅用于输出报告）
    let default_filter = if args.verbose {
        "debug,mongodb=info"
    } else {
        "info,mongodb=warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    // 既无主机也无文件时打印帮助
    let nothing_to_do = args.host.is_none() && args.file.is_none();

    // 加载配置
    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!(code = e.code(), error = %e, "配置无效");
            if nothing_to_do {
                let _ = Args::command().print_help();
            }
            return ExitCode::from(e.exit_code());
        }
    };

    info!(service = SERVICE_NAME, mode = ?config.mode, "启动");

    match runner::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<AppError>()
                .map(AppError::exit_code)
                .unwrap_or(EXIT_FAILURE);
            let message = format!("{:#}", err);
            error!(exit_code = code, error = %message, "运行失败");
            ExitCode::from(code)
        }
    }
}
