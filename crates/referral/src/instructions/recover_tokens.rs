use crate::error::Result;
use crate::events::TokensRecovered;
use crate::external::{AccountFactory, Asset, AssetVault, ProfileIssuer};
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
    /// 把目录地址上的某种资产全部转走（仅 master）
    ///
    /// `asset` 为全零地址时表示原生币。返回实际转出的数量，余额为 0 也算成功。
    pub fn recover_tokens(&mut self, caller: &Pubkey, asset: Pubkey, destination: Pubkey) -> Result<u64> {
        self.guard(Role::Master, caller, "recover_tokens")?;

        let kind = Asset::from_address(asset);
        let amount = self.vault.balance_of(&kind, &self.address);
        if amount > 0 {
            self.vault.transfer(&kind, &self.address, &destination, amount)?;
        }
        info!("💸 recovered {} of {} -> {}", amount, kind, destination);

        self.emit(TokensRecovered {
            asset,
            destination,
            amount,
        });
        Ok(amount)
    }
}
