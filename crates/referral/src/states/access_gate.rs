use crate::constants::UNSET_ADDRESS;
use crate::error::{NexusError, Result};
use crate::events::{HandlerAdded, RoleChanged};
use crate::serde_helpers::{pubkey, pubkey_set};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// 权限角色
///
/// `Handler` 不对应单一地址，而是一个地址集合，只能通过 `add_handler` 维护；
/// 它出现在这里是为了让 handler 校验失败时也能报出 `Unauthorized(Role::Handler)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Master,
    Guardian,
    Rewarder,
    TaxManager,
    TierManager,
    Nft,
    AccountImplementation,
    Registry,
    Handler,
}

impl Role {
    pub const SETTABLE: [Role; 8] = [
        Role::Master,
        Role::Guardian,
        Role::Rewarder,
        Role::TaxManager,
        Role::TierManager,
        Role::Nft,
        Role::AccountImplementation,
        Role::Registry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Guardian => "guardian",
            Role::Rewarder => "rewarder",
            Role::TaxManager => "tax manager",
            Role::TierManager => "tier manager",
            Role::Nft => "nft",
            Role::AccountImplementation => "account implementation",
            Role::Registry => "registry",
            Role::Handler => "handler",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "master" => Ok(Role::Master),
            "guardian" => Ok(Role::Guardian),
            "rewarder" => Ok(Role::Rewarder),
            "tax-manager" => Ok(Role::TaxManager),
            "tier-manager" => Ok(Role::TierManager),
            "nft" => Ok(Role::Nft),
            "account-impl" | "account-implementation" => Ok(Role::AccountImplementation),
            "registry" => Ok(Role::Registry),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// 全局权限表：所有角色地址 + handler 集合
///
/// 初始状态只有 master 有值，其余全部为 `UNSET_ADDRESS`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGate {
    #[serde(with = "pubkey")]
    master: Pubkey,
    #[serde(with = "pubkey")]
    guardian: Pubkey,
    #[serde(with = "pubkey")]
    rewarder: Pubkey,
    #[serde(with = "pubkey")]
    tax_manager: Pubkey,
    #[serde(with = "pubkey")]
    tier_manager: Pubkey,
    #[serde(with = "pubkey")]
    nft: Pubkey,
    #[serde(with = "pubkey")]
    account_implementation: Pubkey,
    #[serde(with = "pubkey")]
    registry: Pubkey,
    #[serde(with = "pubkey_set")]
    handlers: BTreeSet<Pubkey>,
}

impl AccessGate {
    pub fn new(master: Pubkey) -> Self {
        Self {
            master,
            guardian: UNSET_ADDRESS,
            rewarder: UNSET_ADDRESS,
            tax_manager: UNSET_ADDRESS,
            tier_manager: UNSET_ADDRESS,
            nft: UNSET_ADDRESS,
            account_implementation: UNSET_ADDRESS,
            registry: UNSET_ADDRESS,
            handlers: BTreeSet::new(),
        }
    }

    /// 读取角色地址，未设置时返回 `UNSET_ADDRESS`
    pub fn role(&self, role: Role) -> Pubkey {
        match role {
            Role::Master => self.master,
            Role::Guardian => self.guardian,
            Role::Rewarder => self.rewarder,
            Role::TaxManager => self.tax_manager,
            Role::TierManager => self.tier_manager,
            Role::Nft => self.nft,
            Role::AccountImplementation => self.account_implementation,
            Role::Registry => self.registry,
            Role::Handler => UNSET_ADDRESS,
        }
    }

    fn slot_mut(&mut self, role: Role) -> Option<&mut Pubkey> {
        match role {
            Role::Master => Some(&mut self.master),
            Role::Guardian => Some(&mut self.guardian),
            Role::Rewarder => Some(&mut self.rewarder),
            Role::TaxManager => Some(&mut self.tax_manager),
            Role::TierManager => Some(&mut self.tier_manager),
            Role::Nft => Some(&mut self.nft),
            Role::AccountImplementation => Some(&mut self.account_implementation),
            Role::Registry => Some(&mut self.registry),
            Role::Handler => None,
        }
    }

    /// 统一的权限校验入口
    pub fn require(&self, role: Role, caller: &Pubkey) -> Result<()> {
        let allowed = match role {
            Role::Handler => self.is_handler(caller),
            _ => {
                let holder = self.role(role);
                holder != UNSET_ADDRESS && holder == *caller
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(NexusError::Unauthorized(role))
        }
    }

    /// 取出一个必须已配置的地址（NFT 合约、账户实现、registry 等）
    pub fn configured(&self, role: Role) -> Result<Pubkey> {
        match self.role(role) {
            addr if addr == UNSET_ADDRESS => Err(NexusError::NotConfigured(role)),
            addr => Ok(addr),
        }
    }

    /// master 可以修改任何角色；guardian 还可以由当前 guardian 自己轮换
    pub fn set_role(&mut self, caller: &Pubkey, role: Role, new_address: Pubkey) -> Result<RoleChanged> {
        // handler 是地址集合，只能走 add_handler
        if !Role::SETTABLE.contains(&role) {
            return Err(NexusError::RoleNotSettable(role));
        }
        let authorized = match role {
            Role::Guardian => self.require(Role::Master, caller).is_ok() || self.require(Role::Guardian, caller).is_ok(),
            _ => self.require(Role::Master, caller).is_ok(),
        };
        if !authorized {
            return Err(NexusError::Unauthorized(Role::Master));
        }

        let slot = self.slot_mut(role).ok_or(NexusError::RoleNotSettable(role))?;
        let previous = std::mem::replace(slot, new_address);

        Ok(RoleChanged {
            role,
            previous,
            current: new_address,
        })
    }

    /// 手动把一个地址标记为 handler（仅 master）
    pub fn add_handler(&mut self, caller: &Pubkey, handler: Pubkey) -> Result<HandlerAdded> {
        self.require(Role::Master, caller)?;
        self.register_handler(handler);
        Ok(HandlerAdded { handler })
    }

    /// 内部路径：新建的 profile 账户自动成为 handler
    pub(crate) fn register_handler(&mut self, handler: Pubkey) -> bool {
        self.handlers.insert(handler)
    }

    pub fn is_handler(&self, address: &Pubkey) -> bool {
        self.handlers.contains(address)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}
