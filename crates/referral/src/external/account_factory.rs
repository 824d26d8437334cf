use crate::constants::ACCOUNT_SEED;
use crate::error::Result;
use crate::serde_helpers::pubkey;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use tracing::debug;

/// 确定性账户的创建参数
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKey {
    #[serde(with = "pubkey")]
    pub implementation: Pubkey,
    pub salt: [u8; 32],
    pub chain_id: u64,
    #[serde(with = "pubkey")]
    pub collection: Pubkey,
    pub token_id: u64,
}

/// 账户工厂（registry）
///
/// 同一个 key 永远对应同一个地址；重复创建直接返回已有地址。
/// `create_account` 在发行 NFT 之前调用，失败时目录和发行方都不会有变化。
pub trait AccountFactory {
    /// 只计算地址，不创建
    fn account(&self, registry: &Pubkey, key: &AccountKey) -> Pubkey;

    /// 创建（或返回已存在的）账户
    fn create_account(&mut self, registry: &Pubkey, key: &AccountKey) -> Result<Pubkey>;

    fn is_deployed(&self, address: &Pubkey) -> bool;
}

/// 已部署账户记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(with = "pubkey")]
    address: Pubkey,
    #[serde(with = "pubkey")]
    registry: Pubkey,
    key: AccountKey,
}

/// 用 registry 的 PDA 作为账户地址
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Deployment>", into = "Vec<Deployment>")]
pub struct PdaAccountFactory {
    deployed: HashMap<Pubkey, Deployment>,
}

impl From<Vec<Deployment>> for PdaAccountFactory {
    fn from(list: Vec<Deployment>) -> Self {
        Self {
            deployed: list.into_iter().map(|d| (d.address, d)).collect(),
        }
    }
}

impl From<PdaAccountFactory> for Vec<Deployment> {
    fn from(factory: PdaAccountFactory) -> Self {
        let mut list: Vec<Deployment> = factory.deployed.into_values().collect();
        list.sort_by_key(|d| (d.key.collection, d.key.token_id));
        list
    }
}

impl PdaAccountFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deployed_count(&self) -> usize {
        self.deployed.len()
    }

    pub fn find_account_address(registry: &Pubkey, key: &AccountKey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[
                ACCOUNT_SEED,
                key.implementation.as_ref(),
                &key.salt,
                &key.chain_id.to_le_bytes(),
                key.collection.as_ref(),
                &key.token_id.to_le_bytes(),
            ],
            registry,
        )
    }
}

impl AccountFactory for PdaAccountFactory {
    fn account(&self, registry: &Pubkey, key: &AccountKey) -> Pubkey {
        Self::find_account_address(registry, key).0
    }

    fn create_account(&mut self, registry: &Pubkey, key: &AccountKey) -> Result<Pubkey> {
        let address = self.account(registry, key);
        if self.deployed.contains_key(&address) {
            debug!("♻️ 账户已存在: {}", address);
            return Ok(address);
        }

        self.deployed.insert(
            address,
            Deployment {
                address,
                registry: *registry,
                key: key.clone(),
            },
        );
        debug!("🆕 创建账户: {} (token_id={})", address, key.token_id);
        Ok(address)
    }

    fn is_deployed(&self, address: &Pubkey) -> bool {
        self.deployed.contains_key(address)
    }
}
