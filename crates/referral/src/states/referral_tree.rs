use super::referral_account::{is_valid_tier, AccountIndex, ReferralAccount};
use crate::constants::MAX_REFERRAL_DEPTH;
use crate::error::{NexusError, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// 推荐关系森林（arena + 下标）
///
/// 账户只追加、不删除；`parent` 保存的是下标而不是引用。
/// 按 nft id / 地址的索引在反序列化时重建，不写入快照。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ReferralAccount>", into = "Vec<ReferralAccount>")]
pub struct ReferralTree {
    accounts: Vec<ReferralAccount>,
    by_nft_id: BTreeMap<u64, AccountIndex>,
    by_address: HashMap<Pubkey, AccountIndex>,
}

/// 从快照重建：parent 只能指向更早的账户，nft id 与地址都不能重复
impl TryFrom<Vec<ReferralAccount>> for ReferralTree {
    type Error = NexusError;

    fn try_from(accounts: Vec<ReferralAccount>) -> Result<Self> {
        let mut by_nft_id = BTreeMap::new();
        let mut by_address = HashMap::new();

        for (index, account) in accounts.iter().enumerate() {
            if let Some(parent) = account.parent.filter(|&p| p >= index) {
                return Err(NexusError::InvalidSnapshot(format!(
                    "account #{} points to parent index {}",
                    account.nft_id, parent
                )));
            }
            if !is_valid_tier(account.tier) {
                return Err(NexusError::InvalidSnapshot(format!(
                    "account #{} has tier {}",
                    account.nft_id, account.tier
                )));
            }
            if by_nft_id.insert(account.nft_id, index).is_some() {
                return Err(NexusError::InvalidSnapshot(format!("duplicate nft id {}", account.nft_id)));
            }
            if by_address.insert(account.address, index).is_some() {
                return Err(NexusError::InvalidSnapshot(format!("duplicate address {}", account.address)));
            }
        }

        Ok(Self {
            accounts,
            by_nft_id,
            by_address,
        })
    }
}

impl From<ReferralTree> for Vec<ReferralAccount> {
    fn from(tree: ReferralTree) -> Self {
        tree.accounts
    }
}

impl ReferralTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, index: AccountIndex) -> Option<&ReferralAccount> {
        self.accounts.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferralAccount> {
        self.accounts.iter()
    }

    pub fn index_of_nft(&self, nft_id: u64) -> Option<AccountIndex> {
        self.by_nft_id.get(&nft_id).copied()
    }

    pub fn index_of_address(&self, address: &Pubkey) -> Option<AccountIndex> {
        self.by_address.get(address).copied()
    }

    /// 上级账户地址
    pub fn referred_by(&self, index: AccountIndex) -> Option<Pubkey> {
        self.get(index)?.parent.and_then(|p| self.get(p)).map(|p| p.address)
    }

    /// 登记一个新账户
    ///
    /// 同一个 nft id 重复登记时直接返回已有下标，不做任何修改。
    /// parent 必须是已经存在的账户，因此关系永远是森林（不会成环）。
    pub(crate) fn insert(&mut self, nft_id: u64, address: Pubkey, parent: Option<AccountIndex>) -> AccountIndex {
        if let Some(existing) = self.index_of_nft(nft_id) {
            return existing;
        }
        debug_assert!(parent.map_or(true, |p| p < self.accounts.len()));

        let index = self.accounts.len();
        self.accounts.push(ReferralAccount::new(nft_id, address, parent));
        self.by_nft_id.insert(nft_id, index);
        self.by_address.insert(address, index);
        index
    }

    /// 从直接上级开始向上，最多 MAX_REFERRAL_DEPTH 个祖先
    pub fn ancestors(&self, index: AccountIndex) -> Vec<AccountIndex> {
        let mut result = Vec::with_capacity(MAX_REFERRAL_DEPTH);
        let mut current = self.get(index).and_then(|a| a.parent);

        while let Some(ancestor) = current {
            if result.len() == MAX_REFERRAL_DEPTH {
                break;
            }
            result.push(ancestor);
            current = self.accounts[ancestor].parent;
        }
        result
    }

    /// 新下级挂到上级后调用：窗口内每个祖先的 tier 0 计数 +1
    pub(crate) fn on_descendant_added(&mut self, index: AccountIndex) -> Vec<AccountIndex> {
        let ancestors = self.ancestors(index);
        for &ancestor in &ancestors {
            self.accounts[ancestor].record_descendant();
        }
        debug!("🌳 账户 #{} 加入，更新了 {} 个祖先", index, ancestors.len());
        ancestors
    }

    /// 账户等级变化：窗口内每个祖先 old 桶 -1、new 桶 +1
    ///
    /// 先校验全部祖先，再统一写入；任何一个条件不满足都不会留下部分修改。
    pub(crate) fn on_tier_changed(&mut self, index: AccountIndex, old_tier: u8, new_tier: u8) -> Result<Vec<AccountIndex>> {
        let invalid = NexusError::InvalidTier { old_tier, new_tier };
        if !is_valid_tier(old_tier) || !is_valid_tier(new_tier) || old_tier == new_tier {
            return Err(invalid);
        }

        let account = self
            .get(index)
            .ok_or_else(|| NexusError::UnknownAccount(format!("index {}", index)))?;
        if account.tier != old_tier {
            return Err(invalid);
        }

        let ancestors = self.ancestors(index);
        if ancestors.iter().any(|&a| !self.accounts[a].can_shift(old_tier)) {
            return Err(invalid);
        }

        for &ancestor in &ancestors {
            self.accounts[ancestor].shift_tier(old_tier, new_tier)?;
        }
        self.accounts[index].tier = new_tier;

        debug!(
            "🌳 账户 #{} 等级 {} -> {}，更新了 {} 个祖先",
            index,
            old_tier,
            new_tier,
            ancestors.len()
        );
        Ok(ancestors)
    }
}
