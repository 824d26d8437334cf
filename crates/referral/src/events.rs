//! 对外事件
//!
//! 链下索引器使用的编码与 Anchor 事件一致：
//! `base64(discriminator || borsh(payload))`，discriminator = sha256("event:<Name>")[..8]

use crate::error::{NexusError, Result};
use crate::serde_helpers::pubkey;
use crate::states::Role;
use base64::{engine::general_purpose, Engine as _};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

/// 从事件名计算 discriminator
pub fn calculate_event_discriminator(event_name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(format!("event:{}", event_name).as_bytes());
    let hash = hasher.finalize();

    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct NewProfileIssuance {
    pub nft_id: u64, // 新 profile id
    #[serde(with = "pubkey")]
    pub handler_address: Pubkey, // 新账户地址
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LevelChange {
    #[serde(with = "pubkey")]
    pub handler: Pubkey,
    pub old_tier: u8,
    pub new_tier: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoleChanged {
    pub role: Role,
    #[serde(with = "pubkey")]
    pub previous: Pubkey,
    #[serde(with = "pubkey")]
    pub current: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct HandlerAdded {
    #[serde(with = "pubkey")]
    pub handler: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokensRecovered {
    /// 全零地址表示原生币
    #[serde(with = "pubkey")]
    pub asset: Pubkey,
    #[serde(with = "pubkey")]
    pub destination: Pubkey,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum NexusEvent {
    NewProfileIssuance(NewProfileIssuance),
    LevelChange(LevelChange),
    RoleChanged(RoleChanged),
    HandlerAdded(HandlerAdded),
    TokensRecovered(TokensRecovered),
}

impl NexusEvent {
    pub fn name(&self) -> &'static str {
        match self {
            NexusEvent::NewProfileIssuance(_) => "NewProfileIssuance",
            NexusEvent::LevelChange(_) => "LevelChange",
            NexusEvent::RoleChanged(_) => "RoleChanged",
            NexusEvent::HandlerAdded(_) => "HandlerAdded",
            NexusEvent::TokensRecovered(_) => "TokensRecovered",
        }
    }

    pub fn discriminator(&self) -> [u8; 8] {
        calculate_event_discriminator(self.name())
    }

    fn payload(&self) -> Vec<u8> {
        // 写入 Vec 不会失败
        let encoded = match self {
            NexusEvent::NewProfileIssuance(e) => borsh::to_vec(e),
            NexusEvent::LevelChange(e) => borsh::to_vec(e),
            NexusEvent::RoleChanged(e) => borsh::to_vec(e),
            NexusEvent::HandlerAdded(e) => borsh::to_vec(e),
            NexusEvent::TokensRecovered(e) => borsh::to_vec(e),
        };
        encoded.unwrap_or_default()
    }

    /// 编码成 "Program data:" 日志里的 base64 字符串
    pub fn to_program_data(&self) -> String {
        let mut data = self.discriminator().to_vec();
        data.extend(self.payload());
        general_purpose::STANDARD.encode(data)
    }

    /// 从 base64 数据解析事件
    pub fn from_program_data(data_str: &str) -> Result<Self> {
        let data = general_purpose::STANDARD
            .decode(data_str)
            .map_err(|e| NexusError::EventParsing(format!("base64 decode failed: {}", e)))?;

        if data.len() < 8 {
            return Err(NexusError::EventParsing("data too short for discriminator".to_string()));
        }
        let (discriminator, mut payload) = data.split_at(8);

        fn decode<T: BorshDeserialize>(payload: &mut &[u8]) -> Result<T> {
            T::deserialize(payload).map_err(|e| NexusError::EventParsing(format!("borsh decode failed: {}", e)))
        }

        let event = match discriminator {
            d if d == calculate_event_discriminator("NewProfileIssuance") => NexusEvent::NewProfileIssuance(decode(&mut payload)?),
            d if d == calculate_event_discriminator("LevelChange") => NexusEvent::LevelChange(decode(&mut payload)?),
            d if d == calculate_event_discriminator("RoleChanged") => NexusEvent::RoleChanged(decode(&mut payload)?),
            d if d == calculate_event_discriminator("HandlerAdded") => NexusEvent::HandlerAdded(decode(&mut payload)?),
            d if d == calculate_event_discriminator("TokensRecovered") => NexusEvent::TokensRecovered(decode(&mut payload)?),
            other => {
                return Err(NexusError::EventParsing(format!("unknown discriminator: {:?}", other)));
            }
        };

        if !payload.is_empty() {
            return Err(NexusError::EventParsing(format!("{} trailing bytes", payload.len())));
        }
        Ok(event)
    }
}

impl From<NewProfileIssuance> for NexusEvent {
    fn from(e: NewProfileIssuance) -> Self {
        NexusEvent::NewProfileIssuance(e)
    }
}

impl From<LevelChange> for NexusEvent {
    fn from(e: LevelChange) -> Self {
        NexusEvent::LevelChange(e)
    }
}

impl From<RoleChanged> for NexusEvent {
    fn from(e: RoleChanged) -> Self {
        NexusEvent::RoleChanged(e)
    }
}

impl From<HandlerAdded> for NexusEvent {
    fn from(e: HandlerAdded) -> Self {
        NexusEvent::HandlerAdded(e)
    }
}

impl From<TokensRecovered> for NexusEvent {
    fn from(e: TokensRecovered) -> Self {
        NexusEvent::TokensRecovered(e)
    }
}
