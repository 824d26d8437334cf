use crate::constants::TIER_COUNT;
use crate::error::Result;
use crate::events::NexusEvent;
use crate::external::{AccountFactory, AssetVault, InMemoryVault, PdaAccountFactory, ProfileCollection, ProfileIssuer};
use crate::serde_helpers::pubkey;
use crate::states::{AccessGate, ReferralAccount, ReferralTree, Role};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

/// Profile 目录
///
/// 负责 nft id -> 账户 的映射、推荐关系的建立，以及等级变化在祖先链上的传播。
/// 每个公开操作都是先校验、后写入：返回 `Err` 时状态不会有任何改变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nexus<F, I, V> {
    #[serde(with = "pubkey")]
    pub(crate) address: Pubkey, // 目录自身地址（持有待恢复的余额）
    pub(crate) chain_id: u64,
    pub(crate) gate: AccessGate,
    pub(crate) tree: ReferralTree,
    pub(crate) factory: F,
    pub(crate) issuer: I,
    pub(crate) vault: V,
    #[serde(skip)]
    pub(crate) events: Vec<NexusEvent>,
}

pub type InMemoryNexus = Nexus<PdaAccountFactory, ProfileCollection, InMemoryVault>;

impl InMemoryNexus {
    pub fn in_memory(address: Pubkey, chain_id: u64, master: Pubkey) -> Self {
        Self::new(
            address,
            chain_id,
            master,
            PdaAccountFactory::new(),
            ProfileCollection::new(),
            InMemoryVault::new(),
        )
    }
}

impl<F, I, V> Nexus<F, I, V>
where
    F: AccountFactory,
    I: ProfileIssuer,
    V: AssetVault,
{
    pub fn new(address: Pubkey, chain_id: u64, master: Pubkey, factory: F, issuer: I, vault: V) -> Self {
        info!("🚀 初始化 Nexus {} (chain_id={}, master={})", address, chain_id, master);
        Self {
            address,
            chain_id,
            gate: AccessGate::new(master),
            tree: ReferralTree::new(),
            factory,
            issuer,
            vault,
            events: Vec::new(),
        }
    }

    pub(crate) fn guard(&self, role: Role, caller: &Pubkey, operation: &str) -> Result<()> {
        self.gate.require(role, caller).inspect_err(|e| {
            warn!("❌ {} rejected for {}: {}", operation, caller, e);
        })
    }

    pub(crate) fn emit(&mut self, event: impl Into<NexusEvent>) {
        let event = event.into();
        info!("📣 {}: {}", event.name(), event.to_program_data());
        self.events.push(event);
    }

    /// 取出并清空已发出的事件
    pub fn take_events(&mut self) -> Vec<NexusEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[NexusEvent] {
        &self.events
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn access_gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn tree(&self) -> &ReferralTree {
        &self.tree
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }

    pub fn master(&self) -> Pubkey {
        self.gate.role(Role::Master)
    }

    pub fn guardian(&self) -> Pubkey {
        self.gate.role(Role::Guardian)
    }

    pub fn rewarder(&self) -> Pubkey {
        self.gate.role(Role::Rewarder)
    }

    pub fn tax_manager(&self) -> Pubkey {
        self.gate.role(Role::TaxManager)
    }

    pub fn tier_manager(&self) -> Pubkey {
        self.gate.role(Role::TierManager)
    }

    pub fn nft(&self) -> Pubkey {
        self.gate.role(Role::Nft)
    }

    pub fn account_implementation(&self) -> Pubkey {
        self.gate.role(Role::AccountImplementation)
    }

    pub fn registry(&self) -> Pubkey {
        self.gate.role(Role::Registry)
    }

    pub fn is_handler(&self, address: &Pubkey) -> bool {
        self.gate.is_handler(address)
    }

    pub fn profile_count(&self) -> usize {
        self.tree.len()
    }

    /// nft id 对应的账户地址
    pub fn get_handler(&self, nft_id: u64) -> Option<Pubkey> {
        self.tree.index_of_nft(nft_id).and_then(|i| self.tree.get(i)).map(|a| a.address)
    }

    pub fn get_account(&self, address: &Pubkey) -> Option<&ReferralAccount> {
        self.tree.index_of_address(address).and_then(|i| self.tree.get(i))
    }

    pub fn get_tier_counts(&self, address: &Pubkey) -> Option<[u64; TIER_COUNT]> {
        self.get_account(address).map(|a| a.get_tier_counts())
    }

    pub fn get_tier(&self, address: &Pubkey) -> Option<u8> {
        self.get_account(address).map(|a| a.tier)
    }

    pub fn get_nft_id(&self, address: &Pubkey) -> Option<u64> {
        self.get_account(address).map(|a| a.get_nft_id())
    }

    pub fn referred_by(&self, address: &Pubkey) -> Option<Pubkey> {
        self.tree.index_of_address(address).and_then(|i| self.tree.referred_by(i))
    }
}
