use crate::constants::{DEFAULT_TIER, TIER_COUNT};
use crate::error::{NexusError, Result};
use crate::serde_helpers::pubkey;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// 账户在 ReferralTree 中的下标
pub type AccountIndex = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralAccount {
    pub nft_id: u64, // 对应的 profile id
    #[serde(with = "pubkey")]
    pub address: Pubkey, // 账户地址（工厂生成）
    pub parent: Option<AccountIndex>, // 上级，创建时写入一次
    pub tier: u8,                     // 当前等级
    pub tier_counts: [u64; TIER_COUNT], // 传播窗口内各等级的下级数量
}

impl ReferralAccount {
    pub fn new(nft_id: u64, address: Pubkey, parent: Option<AccountIndex>) -> Self {
        Self {
            nft_id,
            address,
            parent,
            tier: DEFAULT_TIER,
            tier_counts: [0; TIER_COUNT],
        }
    }

    pub fn get_nft_id(&self) -> u64 {
        self.nft_id
    }

    pub fn get_tier_counts(&self) -> [u64; TIER_COUNT] {
        self.tier_counts
    }

    /// 窗口内下级总数
    pub fn descendant_count(&self) -> u64 {
        self.tier_counts.iter().sum()
    }

    /// 新下级以 tier 0 进入
    pub(crate) fn record_descendant(&mut self) {
        self.tier_counts[DEFAULT_TIER as usize] += 1;
    }

    pub(crate) fn can_shift(&self, old_tier: u8) -> bool {
        self.tier_counts[old_tier as usize] > 0
    }

    /// 一个下级从 old_tier 变到 new_tier：一减一加，总数不变
    pub(crate) fn shift_tier(&mut self, old_tier: u8, new_tier: u8) -> Result<()> {
        if !is_valid_tier(old_tier) || !is_valid_tier(new_tier) || !self.can_shift(old_tier) {
            return Err(NexusError::InvalidTier { old_tier, new_tier });
        }
        self.tier_counts[old_tier as usize] -= 1;
        self.tier_counts[new_tier as usize] += 1;
        Ok(())
    }
}

pub fn is_valid_tier(tier: u8) -> bool {
    (tier as usize) < TIER_COUNT
}
