use crate::error::{NexusError, Result};
use crate::events::LevelChange;
use crate::external::{AccountFactory, AssetVault, ProfileIssuer};
use crate::nexus::Nexus;
use crate::states::Role;
use solana_sdk::pubkey::Pubkey;
use tracing::info;

impl<F, I, V> Nexus<F, I, V>
where
    F: AccountFactory,
    I: ProfileIssuer,
    V: AssetVault,
{
    /// handler 上报自己的等级变化，窗口内的祖先同步挪动计数
    pub fn notify_tier_update(&mut self, caller: &Pubkey, old_tier: u8, new_tier: u8) -> Result<()> {
        self.guard(Role::Handler, caller, "notify_tier_update")?;

        let index = self
            .tree
            .index_of_address(caller)
            .ok_or_else(|| NexusError::UnknownAccount(caller.to_string()))?;
        let touched = self.tree.on_tier_changed(index, old_tier, new_tier)?;
        info!("📈 {} tier {} -> {}, {} ancestors updated", caller, old_tier, new_tier, touched.len());

        self.emit(LevelChange {
            handler: *caller,
            old_tier,
            new_tier,
        });
        Ok(())
    }

    /// tier manager 调整某个 profile 的等级，由该账户代为上报
    pub fn set_tier(&mut self, caller: &Pubkey, nft_id: u64, new_tier: u8) -> Result<()> {
        self.guard(Role::TierManager, caller, "set_tier")?;

        let account = self
            .tree
            .index_of_nft(nft_id)
            .and_then(|i| self.tree.get(i))
            .ok_or_else(|| NexusError::UnknownAccount(format!("nft #{}", nft_id)))?;
        let (handler, old_tier) = (account.address, account.tier);

        self.notify_tier_update(&handler, old_tier, new_tier)
    }
}
