use crate::error::Result;
use crate::external::{AccountFactory, AssetVault, ProfileIssuer};
use crate::nexus::Nexus;
use crate::states::Role;
use solana_sdk::pubkey::Pubkey;
use tracing::warn;

impl<F, I, V> Nexus<F, I, V>
where
    F: AccountFactory,
    I: ProfileIssuer,
    V: AssetVault,
{
    pub fn set_role(&mut self, caller: &Pubkey, role: Role, new_address: Pubkey) -> Result<()> {
        let event = self.gate.set_role(caller, role, new_address).inspect_err(|e| {
            warn!("❌ set {} rejected for {}: {}", role, caller, e);
        })?;
        self.emit(event);
        Ok(())
    }

    pub fn set_master(&mut self, caller: &Pubkey, new_master: Pubkey) -> Result<()> {
        self.set_role(caller, Role::Master, new_master)
    }

    pub fn set_guardian(&mut self, caller: &Pubkey, new_guardian: Pubkey) -> Result<()> {
        self.set_role(caller, Role::Guardian, new_guardian)
    }

    pub fn set_rewarder(&mut self, caller: &Pubkey, new_rewarder: Pubkey) -> Result<()> {
        self.set_role(caller, Role::Rewarder, new_rewarder)
    }

    pub fn set_tax_manager(&mut self, caller: &Pubkey, new_tax_manager: Pubkey) -> Result<()> {
        self.set_role(caller, Role::TaxManager, new_tax_manager)
    }

    pub fn set_tier_manager(&mut self, caller: &Pubkey, new_tier_manager: Pubkey) -> Result<()> {
        self.set_role(caller, Role::TierManager, new_tier_manager)
    }

    pub fn set_nft(&mut self, caller: &Pubkey, new_nft: Pubkey) -> Result<()> {
        self.set_role(caller, Role::Nft, new_nft)
    }

    pub fn set_account_impl(&mut self, caller: &Pubkey, new_implementation: Pubkey) -> Result<()> {
        self.set_role(caller, Role::AccountImplementation, new_implementation)
    }

    pub fn set_registry(&mut self, caller: &Pubkey, new_registry: Pubkey) -> Result<()> {
        self.set_role(caller, Role::Registry, new_registry)
    }

    /// 手动登记 handler（仅 master）
    pub fn add_handler(&mut self, caller: &Pubkey, handler: Pubkey) -> Result<()> {
        let event = self.gate.add_handler(caller, handler).inspect_err(|e| {
            warn!("❌ add_handler rejected for {}: {}", caller, e);
        })?;
        self.emit(event);
        Ok(())
    }
}
