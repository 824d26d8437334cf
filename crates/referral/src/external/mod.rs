//! 外部协作方：账户工厂、profile 发行、资产余额
//!
//! 目录只通过这些 trait 与外部交互；内存实现用于测试和 CLI。

pub mod account_factory;
pub use account_factory::*;

pub mod profile_issuer;
pub use profile_issuer::*;

pub mod asset_vault;
pub use asset_vault::*;
