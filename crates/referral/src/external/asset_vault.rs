use crate::constants::UNSET_ADDRESS;
use crate::error::{NexusError, Result};
use crate::serde_helpers::pubkey;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;

/// 资产类型：原生币或某个代币
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Native,
    Token(Pubkey),
}

impl Asset {
    /// 全零地址表示原生币
    pub fn from_address(address: Pubkey) -> Self {
        if address == UNSET_ADDRESS {
            Asset::Native
        } else {
            Asset::Token(address)
        }
    }

    pub fn address(&self) -> Pubkey {
        match self {
            Asset::Native => UNSET_ADDRESS,
            Asset::Token(mint) => *mint,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Token(mint) => write!(f, "{}", mint),
        }
    }
}

/// 余额来源（链上余额 / 代币合约）
pub trait AssetVault {
    fn balance_of(&self, asset: &Asset, holder: &Pubkey) -> u64;

    fn transfer(&mut self, asset: &Asset, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    #[serde(with = "pubkey")]
    pub asset: Pubkey,
    #[serde(with = "pubkey")]
    pub holder: Pubkey,
    pub amount: u64,
}

/// 内存账本
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryVault {
    balances: Vec<BalanceEntry>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_mut(&mut self, asset: &Asset, holder: &Pubkey) -> &mut BalanceEntry {
        let asset = asset.address();
        match self.balances.iter().position(|b| b.asset == asset && b.holder == *holder) {
            Some(i) => &mut self.balances[i],
            None => {
                self.balances.push(BalanceEntry {
                    asset,
                    holder: *holder,
                    amount: 0,
                });
                let last = self.balances.len() - 1;
                &mut self.balances[last]
            }
        }
    }

    /// 直接给某个地址记一笔余额（测试 / 运维注资）
    pub fn credit(&mut self, asset: &Asset, holder: &Pubkey, amount: u64) {
        let entry = self.entry_mut(asset, holder);
        entry.amount = entry.amount.saturating_add(amount);
    }
}

impl AssetVault for InMemoryVault {
    fn balance_of(&self, asset: &Asset, holder: &Pubkey) -> u64 {
        let asset = asset.address();
        self.balances
            .iter()
            .find(|b| b.asset == asset && b.holder == *holder)
            .map_or(0, |b| b.amount)
    }

    fn transfer(&mut self, asset: &Asset, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(NexusError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let balance = self.balance_of(asset, to);
        let credited = balance
            .checked_add(amount)
            .ok_or(NexusError::BalanceOverflow { balance, amount })?;

        self.entry_mut(asset, from).amount -= amount;
        self.entry_mut(asset, to).amount = credited;
        Ok(())
    }
}
