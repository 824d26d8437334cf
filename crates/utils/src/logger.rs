use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::CargoEnv;

const DEFAULT_FILTER: &str = "nexus=debug,nexus_referral=debug";
const FALLBACK_LOG_DIR: &str = "logs";

pub struct Logger;

impl Logger {
    /// 安装全局 subscriber，返回的 guard 必须活到进程结束
    ///
    /// `default_filter` 在没有设置 RUST_LOG 时生效
    pub fn new_with_log_dir(cargo_env: CargoEnv, log_dir: Option<PathBuf>, default_filter: Option<&str>) -> WorkerGuard {
        let (writer, guard) = Self::writer(cargo_env, log_dir);

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_FILTER)));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(false),
            )
            .init();

        guard
    }

    fn writer(cargo_env: CargoEnv, log_dir: Option<PathBuf>) -> (NonBlocking, WorkerGuard) {
        match cargo_env {
            CargoEnv::Development => tracing_appender::non_blocking(std::io::stdout()),
            CargoEnv::Production => {
                let directory = Self::prepare_directory(Self::log_directory(log_dir));
                println!("✅ 日志将输出到目录: {:?}", directory);
                tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, "nexus.log"))
            }
        }
    }

    /// 目录创建失败时退回到 ./logs
    fn prepare_directory(directory: PathBuf) -> PathBuf {
        match std::fs::create_dir_all(&directory) {
            Ok(()) => directory,
            Err(e) => {
                eprintln!("⚠️ 无法创建日志目录 {:?}: {}，改用 {}", directory, e, FALLBACK_LOG_DIR);
                let fallback = Path::new(FALLBACK_LOG_DIR).to_path_buf();
                if let Err(e) = std::fs::create_dir_all(&fallback) {
                    eprintln!("⚠️ 无法创建日志目录 {:?}: {}", fallback, e);
                }
                fallback
            }
        }
    }

    fn log_directory(log_dir: Option<PathBuf>) -> PathBuf {
        log_dir
            .or_else(|| std::env::var("LOG_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(FALLBACK_LOG_DIR)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_log_dir_wins() {
        let dir = PathBuf::from("/var/log/nexus");
        assert_eq!(Logger::log_directory(Some(dir.clone())), dir);
    }

    #[test]
    fn test_unwritable_directory_falls_back() {
        // 文件下面不能再建目录
        let blocker = std::env::temp_dir().join(format!("nexus-log-blocker-{}", std::process::id()));
        std::fs::write(&blocker, b"").unwrap();

        let directory = Logger::prepare_directory(blocker.join("nested"));
        assert_eq!(directory, PathBuf::from(FALLBACK_LOG_DIR));
        assert!(directory.is_dir());

        std::fs::remove_file(&blocker).ok();
    }

    #[test]
    fn test_writable_directory_is_kept() {
        let dir = std::env::temp_dir().join(format!("nexus-log-dir-{}", std::process::id()));
        assert_eq!(Logger::prepare_directory(dir.clone()), dir);
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).ok();
    }
}
