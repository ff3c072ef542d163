// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 下载检测/分类模型 (已存在则跳过)
///
/// 运行: cargo run --release --bin fetch_models -- --config sentinel.json
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info};

use threat_sentinel::models::ensure_model;
use threat_sentinel::{logging, SentinelConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "下载模型文件", long_about = None)]
struct FetchArgs {
    /// 配置文件
    #[arg(short, long, default_value = "sentinel.json")]
    config: PathBuf,

    /// 模型目录 (默认使用配置中的 model_dir)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// 跳过分类模型
    #[arg(long)]
    no_classifier: bool,

    /// 日志目录
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = FetchArgs::parse();
    let _guard = logging::init(&args.log_dir)?;

    let config = SentinelConfig::load(&args.config);
    let dir = args.model_dir.unwrap_or_else(|| config.model_dir());

    let mut failed = 0;
    for spec in config.downloads() {
        if args.no_classifier && spec == &config.classifier {
            continue;
        }
        match ensure_model(&spec.source(), &dir) {
            Ok(path) => info!("📦 {} → {}", spec.repo_id, path.display()),
            Err(e) => {
                error!("❌ {} 下载失败: {:#}", spec.repo_id, e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{} model(s) failed to download", failed);
    }
    Ok(())
}
