use solana_sdk::pubkey::Pubkey;

/// 等级桶数量（0..=4）
pub const TIER_COUNT: usize = 5;

/// 向上传播的最大层数：直接上级 + 再往上 3 级
pub const MAX_REFERRAL_DEPTH: usize = 4;

/// 新账户进入的初始等级
pub const DEFAULT_TIER: u8 = 0;

/// referrer_id 为 0 表示没有推荐人
pub const NO_REFERRER: u64 = 0;

/// 第一个发行的 profile id
pub const FIRST_PROFILE_ID: u64 = 1;

pub const ACCOUNT_SEED: &[u8] = b"account";

/// 全零地址：角色未设置 / 资产恢复时表示原生币
pub const UNSET_ADDRESS: Pubkey = Pubkey::new_from_array([0u8; 32]);
