use crate::constants::NO_REFERRER;
use crate::error::{NexusError, Result};
use crate::events::NewProfileIssuance;
use crate::external::{AccountFactory, AccountKey, AssetVault, ProfileIssuer};
use crate::nexus::Nexus;
use crate::states::Role;
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

impl<F, I, V> Nexus<F, I, V>
where
    F: AccountFactory,
    I: ProfileIssuer,
    V: AssetVault,
{
    /// 发行新 profile 并为其创建推荐账户
    ///
    /// `referrer_id == 0` 表示没有推荐人。有推荐人时，新账户挂到推荐人下面，
    /// 并向上最多 4 级更新各祖先的 tier 0 计数。
    pub fn create_profile(
        &mut self,
        caller: &Pubkey,
        referrer_id: u64,
        recipient: &Pubkey,
        profile_link: &str,
        salt: [u8; 32],
    ) -> Result<Pubkey> {
        self.guard(Role::Guardian, caller, "create_profile")?;

        let collection = self.gate.configured(Role::Nft)?;
        let implementation = self.gate.configured(Role::AccountImplementation)?;
        let registry = self.gate.configured(Role::Registry)?;

        // 1. 校验（全部校验都在写入之前）
        let nft_id = self.issuer.next_id(&collection);
        if referrer_id == nft_id {
            warn!("❌ profile #{} cannot refer to itself", nft_id);
            return Err(NexusError::SelfReferral);
        }
        // 换了 collection 后 id 会从 1 重新开始，不能覆盖已有账户
        if self.tree.index_of_nft(nft_id).is_some() {
            warn!("❌ profile #{} already has a referral account", nft_id);
            return Err(NexusError::ProfileExists(nft_id));
        }
        let parent = match referrer_id {
            NO_REFERRER => None,
            id => Some(self.tree.index_of_nft(id).ok_or_else(|| {
                warn!("❌ referrer #{} has no profile", id);
                NexusError::UnknownReferrer(id)
            })?),
        };

        let key = AccountKey {
            implementation,
            salt,
            chain_id: self.chain_id,
            collection,
            token_id: nft_id,
        };
        if self.tree.index_of_address(&self.factory.account(&registry, &key)).is_some() {
            warn!("❌ account for profile #{} is already registered", nft_id);
            return Err(NexusError::ProfileExists(nft_id));
        }

        // 2. 先创建账户（幂等，失败重试会复用同一地址），再发行 NFT
        let handler_address = self.factory.create_account(&registry, &key)?;
        let issued = self.issuer.issue(&collection, recipient, profile_link)?;
        if issued != nft_id {
            return Err(NexusError::IssuanceMismatch {
                expected: nft_id,
                issued,
            });
        }

        // 3. 登记
        let index = self.tree.insert(nft_id, handler_address, parent);
        self.gate.register_handler(handler_address);

        // 4. 建立推荐关系
        if parent.is_some() {
            let touched = self.tree.on_descendant_added(index);
            info!("🔗 profile #{} referred by #{}, {} ancestors updated", nft_id, referrer_id, touched.len());
        }

        self.emit(NewProfileIssuance { nft_id, handler_address });
        Ok(handler_address)
    }

    /// 计算某个 profile 的账户地址（不创建）
    pub fn account_address(&self, salt: [u8; 32], nft_id: u64) -> Result<Pubkey> {
        let key = AccountKey {
            implementation: self.gate.configured(Role::AccountImplementation)?,
            salt,
            chain_id: self.chain_id,
            collection: self.gate.configured(Role::Nft)?,
            token_id: nft_id,
        };
        Ok(self.factory.account(&self.gate.configured(Role::Registry)?, &key))
    }
}
