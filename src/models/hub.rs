// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 模型权重下载 (HuggingFace Hub)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

const HF_ENDPOINT: &str = "https://huggingface.co";

/// 模型来源: HuggingFace 仓库 + 文件名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    pub repo_id: String,
    pub filename: String,
}

impl ModelSource {
    pub fn new(repo_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            filename: filename.into(),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}/resolve/main/{}",
            HF_ENDPOINT, self.repo_id, self.filename
        )
    }
}

/// 默认模型目录: `<cache>/threat-sentinel/models`, 取不到缓存目录时用 `./models`
pub fn default_model_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("threat-sentinel").join("models"))
        .unwrap_or_else(|| PathBuf::from("models"))
}

/// 确保模型文件存在, 不存在则下载到 `model_dir`
///
/// 已存在的文件不会重复下载。
pub fn ensure_model(source: &ModelSource, model_dir: &Path) -> Result<PathBuf> {
    let path = model_dir.join(&source.filename);
    if path.exists() {
        info!("✅ 模型已存在: {}", path.display());
        return Ok(path);
    }

    fs::create_dir_all(model_dir)
        .with_context(|| format!("Failed to create model dir: {}", model_dir.display()))?;

    info!("🔄 正在下载 {} (来自 {})...", source.filename, source.repo_id);
    let response = ureq::get(&source.url())
        .call()
        .with_context(|| format!("Failed to download {}", source.url()))?;

    // 写入 .part, 完成后改名
    let tmp = path.with_extension("part");
    let mut file =
        fs::File::create(&tmp).with_context(|| format!("Failed to create {}", tmp.display()))?;
    io::copy(&mut response.into_reader(), &mut file)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    drop(file);
    fs::rename(&tmp, &path)?;

    info!("✅ 下载完成: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let src = ModelSource::new("PIA-SPACE-LAB/PersonDet_v3.2.0", "PersonDet_v3.2.0.onnx");
        assert_eq!(
            src.url(),
            "https://huggingface.co/PIA-SPACE-LAB/PersonDet_v3.2.0/resolve/main/PersonDet_v3.2.0.onnx"
        );
    }

    #[test]
    fn test_existing_model_is_not_downloaded() {
        let dir = std::env::temp_dir().join(format!("sentinel-hub-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("local.onnx"), b"weights").unwrap();

        // 仓库不存在, 若真的发起下载会失败
        let src = ModelSource::new("no-such/repo", "local.onnx");
        let path = ensure_model(&src, &dir).unwrap();
        assert_eq!(path, dir.join("local.onnx"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
