//! 日志工具模块
//!
//! 初始化 tracing，以及会话日志文件的写入

use std::fs::{self, OpenOptions};
use std::io::Write;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Result;
use crate::models::disease::Severity;
use crate::models::DiagnosisResult;
use crate::services::scoring;

/// 初始化 tracing
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 初始化会话日志文件（覆盖旧内容）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n诊断会话日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 追加一条诊断记录
pub fn append_diagnosis(log_file_path: &str, file_name: &str, result: &DiagnosisResult) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    let line = format!(
        "{} | {} | {} ({}) | {} | AI {} | 问卷 {} | 最终 {} ({})\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        file_name,
        result.disease_name(),
        result.disease_class(),
        result
            .disease_info()
            .map(|info| info.severity.tag())
            .unwrap_or(Severity::Other.tag()),
        scoring::format_probability(result.ai_probability()),
        result.user_score(),
        result.final_score(),
        result.confidence_level()
    );
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🌾 程序启动 - 水稻病虫害诊断");
    info!("📦 模型目录: {}", config.model_base_url);
    info!(
        "🔁 最多尝试 {} 次, 单次超时 {}s",
        config.max_load_attempts, config.load_timeout_secs
    );
    info!("{}", "=".repeat(60));
}
