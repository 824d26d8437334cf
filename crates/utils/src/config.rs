use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[clap(rename_all = "lowercase")]
pub enum CargoEnv {
    Development,
    Production,
}

/// 环境配置加载器
pub struct EnvLoader;

impl EnvLoader {
    /// 根据 CARGO_ENV 加载对应的环境配置文件
    pub fn load_env_file() -> Result<(), Box<dyn std::error::Error>> {
        // 1. 获取环境变量 CARGO_ENV，默认 development
        let cargo_env = std::env::var("CARGO_ENV").unwrap_or_else(|_| "development".to_string());

        // 2. 构建配置文件路径
        let env_file = Self::env_file_for(&cargo_env);

        // 3. 文件不存在时回退到 .env
        if !std::path::Path::new(env_file).exists() {
            eprintln!("⚠️  配置文件 {} 不存在，尝试加载默认的 .env 文件", env_file);
            if std::path::Path::new(".env").exists() {
                dotenvy::from_filename(".env")?;
                println!("✅ 已加载默认配置文件: .env");
            } else {
                eprintln!("❌ 未找到任何配置文件，使用默认配置");
            }
            return Ok(());
        }

        // 4. 加载指定的环境配置文件
        dotenvy::from_filename(env_file)?;
        println!("✅ 已加载环境配置文件: {} (CARGO_ENV={})", env_file, cargo_env);

        Ok(())
    }

    pub fn env_file_for(cargo_env: &str) -> &'static str {
        match cargo_env {
            "production" | "Production" | "prod" => ".env.production",
            "development" | "Development" | "dev" => ".env.development",
            "test" | "Test" => ".env.test",
            _ => {
                println!("⚠️  未知的 CARGO_ENV: {}，使用默认的 .env.development", cargo_env);
                ".env.development"
            }
        }
    }
}

#[derive(clap::Parser, Clone, Debug)]
pub struct AppConfig {
    #[clap(long, env, value_enum, default_value = "development")]
    pub cargo_env: CargoEnv,

    #[clap(long, env, default_value = "info")]
    pub rust_log: String,

    /// 生产环境日志目录
    #[clap(long, env)]
    pub log_dir: Option<PathBuf>,

    /// 账本快照文件
    #[clap(long, env, default_value = "nexus-state.json")]
    pub state_file: PathBuf,

    #[clap(long, env, default_value = "43112")]
    pub chain_id: u64,

    /// 目录自身地址，不填则 init 时随机生成
    #[clap(long, env)]
    pub nexus_address: Option<Pubkey>,

    /// 初始 master（管理员）
    #[clap(long, env)]
    pub master: Option<Pubkey>,
}

impl AppConfig {
    /// 手动创建配置实例（用于测试）
    pub fn new_for_test() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            rust_log: "info".to_string(),
            log_dir: None,
            state_file: std::env::temp_dir().join("nexus-state-test.json"),
            chain_id: 43112,
            nexus_address: None,
            master: None,
        }
    }
}
