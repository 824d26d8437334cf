pub mod access_gate;
pub use access_gate::*;

pub mod referral_account;
pub use referral_account::*;

pub mod referral_tree;
pub use referral_tree::*;
