use crate::constants::FIRST_PROFILE_ID;
use crate::error::Result;
use crate::serde_helpers::pubkey;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::info;

/// Profile NFT 发行方
///
/// id 单调递增且唯一；所有权以发行方为准，目录本身不记录 owner。
pub trait ProfileIssuer {
    /// 下一个将要发行的 id（只读，不消耗）
    fn next_id(&self, collection: &Pubkey) -> u64;

    /// 发行一个 profile，返回实际使用的 id
    fn issue(&mut self, collection: &Pubkey, owner: &Pubkey, profile_link: &str) -> Result<u64>;

    fn owner_of(&self, collection: &Pubkey, nft_id: u64) -> Option<Pubkey>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedProfile {
    #[serde(with = "pubkey")]
    pub collection: Pubkey,
    pub nft_id: u64,
    #[serde(with = "pubkey")]
    pub owner: Pubkey,
    pub profile_link: String,
}

/// 内存版的 profile 集合，按 collection 分别从 1 开始编号
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileCollection {
    profiles: Vec<IssuedProfile>,
}

impl ProfileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self, collection: &Pubkey, nft_id: u64) -> Option<&IssuedProfile> {
        self.profiles.iter().find(|p| p.collection == *collection && p.nft_id == nft_id)
    }

    pub fn issued_count(&self, collection: &Pubkey) -> usize {
        self.profiles.iter().filter(|p| p.collection == *collection).count()
    }
}

impl ProfileIssuer for ProfileCollection {
    fn next_id(&self, collection: &Pubkey) -> u64 {
        self.profiles
            .iter()
            .filter(|p| p.collection == *collection)
            .map(|p| p.nft_id + 1)
            .max()
            .unwrap_or(FIRST_PROFILE_ID)
    }

    fn issue(&mut self, collection: &Pubkey, owner: &Pubkey, profile_link: &str) -> Result<u64> {
        let nft_id = self.next_id(collection);
        self.profiles.push(IssuedProfile {
            collection: *collection,
            nft_id,
            owner: *owner,
            profile_link: profile_link.to_string(),
        });
        info!("🎫 发行 profile #{} -> {}", nft_id, owner);
        Ok(nft_id)
    }

    fn owner_of(&self, collection: &Pubkey, nft_id: u64) -> Option<Pubkey> {
        self.profile(collection, nft_id).map(|p| p.owner)
    }
}
