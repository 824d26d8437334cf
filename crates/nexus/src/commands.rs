use anyhow::{Context, Result};
use clap::Subcommand;
use nexus_referral::external::{Asset, AssetVault};
use nexus_referral::{InMemoryNexus, NexusEvent, Role};
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 用配置里的 MASTER 初始化一个新的账本快照
    Init,

    /// 发行 profile 并创建推荐账户（guardian）
    CreateProfile {
        #[clap(long)]
        caller: Pubkey,
        /// 0 表示没有推荐人
        #[clap(long, default_value = "0")]
        referrer: u64,
        #[clap(long)]
        recipient: Pubkey,
        #[clap(long, default_value = "")]
        link: String,
        /// 64 位十六进制，或不超过 32 字节的文本
        #[clap(long, default_value = "0", value_parser = parse_salt)]
        salt: [u8; 32],
    },

    /// handler 上报自己的等级变化
    NotifyTier {
        #[clap(long)]
        caller: Pubkey,
        #[clap(long)]
        old: u8,
        #[clap(long)]
        new: u8,
    },

    /// tier manager 调整某个 profile 的等级
    SetTier {
        #[clap(long)]
        caller: Pubkey,
        #[clap(long)]
        nft_id: u64,
        #[clap(long)]
        tier: u8,
    },

    SetRole {
        #[clap(long)]
        caller: Pubkey,
        #[clap(long)]
        role: Role,
        #[clap(long)]
        address: Pubkey,
    },

    AddHandler {
        #[clap(long)]
        caller: Pubkey,
        #[clap(long)]
        address: Pubkey,
    },

    /// 给目录地址记一笔余额（模拟误转入的资产）
    Fund {
        /// 全零地址表示原生币
        #[clap(long, default_value = "11111111111111111111111111111111")]
        asset: Pubkey,
        #[clap(long)]
        amount: u64,
    },

    /// 把目录上的某种资产全部转出（master）
    Recover {
        #[clap(long)]
        caller: Pubkey,
        #[clap(long, default_value = "11111111111111111111111111111111")]
        asset: Pubkey,
        #[clap(long)]
        destination: Pubkey,
    },

    /// 查看账本或某个 profile
    Show {
        #[clap(long)]
        nft_id: Option<u64>,
    },
}

impl Command {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Command::Show { .. })
    }
}

/// 解析 salt：64 位十六进制直接解码，否则按文本左对齐补零
pub fn parse_salt(raw: &str) -> std::result::Result<[u8; 32], String> {
    let mut salt = [0u8; 32];

    let hex = raw.strip_prefix("0x").unwrap_or(raw);
    if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let byte = std::str::from_utf8(chunk).map_err(|e| e.to_string())?;
            salt[i] = u8::from_str_radix(byte, 16).map_err(|e| e.to_string())?;
        }
        return Ok(salt);
    }

    if raw.len() > 32 {
        return Err(format!("salt text longer than 32 bytes: {}", raw.len()));
    }
    salt[..raw.len()].copy_from_slice(raw.as_bytes());
    Ok(salt)
}

/// 执行一条命令，返回命令输出以及期间产生的事件
pub fn execute(nexus: &mut InMemoryNexus, command: Command) -> Result<(Value, Vec<NexusEvent>)> {
    let output = match command {
        Command::Init => json!({ "nexus": nexus.address().to_string(), "master": nexus.master().to_string() }),
        Command::CreateProfile {
            caller,
            referrer,
            recipient,
            link,
            salt,
        } => {
            let handler = nexus
                .create_profile(&caller, referrer, &recipient, &link, salt)
                .context("🔴 create_profile failed")?;
            json!({ "handler": handler.to_string() })
        }
        Command::NotifyTier { caller, old, new } => {
            nexus.notify_tier_update(&caller, old, new).context("🔴 notify_tier_update failed")?;
            json!({ "handler": caller.to_string(), "tier": new })
        }
        Command::SetTier { caller, nft_id, tier } => {
            nexus.set_tier(&caller, nft_id, tier).context("🔴 set_tier failed")?;
            json!({ "nft_id": nft_id, "tier": tier })
        }
        Command::SetRole { caller, role, address } => {
            nexus.set_role(&caller, role, address).context("🔴 set_role failed")?;
            json!({ "role": role, "address": address.to_string() })
        }
        Command::AddHandler { caller, address } => {
            nexus.add_handler(&caller, address).context("🔴 add_handler failed")?;
            json!({ "handler": address.to_string() })
        }
        Command::Fund { asset, amount } => {
            let kind = Asset::from_address(asset);
            let holder = nexus.address();
            nexus.vault_mut().credit(&kind, &holder, amount);
            json!({ "asset": kind.to_string(), "balance": nexus.vault().balance_of(&kind, &holder) })
        }
        Command::Recover {
            caller,
            asset,
            destination,
        } => {
            let amount = nexus
                .recover_tokens(&caller, asset, destination)
                .context("🔴 recover_tokens failed")?;
            json!({ "amount": amount })
        }
        Command::Show { nft_id: Some(nft_id) } => show_profile(nexus, nft_id)?,
        Command::Show { nft_id: None } => show_summary(nexus),
    };

    Ok((output, nexus.take_events()))
}

fn show_profile(nexus: &InMemoryNexus, nft_id: u64) -> Result<Value> {
    let handler = nexus
        .get_handler(nft_id)
        .with_context(|| format!("🔴 profile #{} not found", nft_id))?;
    let account = nexus
        .get_account(&handler)
        .with_context(|| format!("🔴 account {} not found", handler))?;

    Ok(json!({
        "nft_id": nft_id,
        "handler": handler.to_string(),
        "referred_by": nexus.referred_by(&handler).map(|p| p.to_string()),
        "tier": account.tier,
        "tier_counts": account.get_tier_counts(),
    }))
}

fn show_summary(nexus: &InMemoryNexus) -> Value {
    let roles: serde_json::Map<String, Value> = Role::SETTABLE
        .iter()
        .map(|role| (role.to_string(), Value::String(nexus.access_gate().role(*role).to_string())))
        .collect();

    json!({
        "nexus": nexus.address().to_string(),
        "chain_id": nexus.chain_id(),
        "roles": roles,
        "profiles": nexus.profile_count(),
        "handlers": nexus.access_gate().handler_count(),
    })
}
