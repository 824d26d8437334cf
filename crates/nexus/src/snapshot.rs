use anyhow::{bail, Context, Result};
use nexus_referral::InMemoryNexus;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn load(path: &Path) -> Result<InMemoryNexus> {
    let raw = fs::read_to_string(path).with_context(|| format!("🔴 Failed to read snapshot {:?}, run `nexus init` first", path))?;
    let nexus = serde_json::from_str(&raw).with_context(|| format!("🔴 Corrupted snapshot {:?}", path))?;
    info!("📂 已加载快照: {:?}", path);
    Ok(nexus)
}

/// 先写临时文件再 rename，写入失败不会破坏原快照
pub fn save(path: &Path, nexus: &InMemoryNexus) -> Result<()> {
    let tmp = tmp_path(path);
    let raw = serde_json::to_string_pretty(nexus).context("🔴 Failed to serialize ledger")?;
    fs::write(&tmp, raw).with_context(|| format!("🔴 Failed to write {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("🔴 Failed to replace snapshot {:?}", path))?;
    info!("💾 已保存快照: {:?}", path);
    Ok(())
}

pub fn ensure_absent(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("🔴 Snapshot {:?} already exists", path);
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
