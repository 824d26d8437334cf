use crate::states::Role;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NexusError {
    #[error("only {0}")]
    Unauthorized(Role),

    #[error("Cannot be its own referrer")]
    SelfReferral,

    #[error("Referrer should have a valid profile id: {0}")]
    UnknownReferrer(u64),

    #[error("Profile id {0} is already registered")]
    ProfileExists(u64),

    #[error("No referral account registered for {0}")]
    UnknownAccount(String),

    #[error("Invalid tier change: {old_tier} -> {new_tier}")]
    InvalidTier { old_tier: u8, new_tier: u8 },

    #[error("{0} is not configured")]
    NotConfigured(Role),

    #[error("{0} cannot be assigned as a single address")]
    RoleNotSettable(Role),

    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u64, requested: u64 },

    #[error("Balance overflow: {balance} + {amount}")]
    BalanceOverflow { balance: u64, amount: u64 },

    #[error("Issued profile id {issued} does not match expected id {expected}")]
    IssuanceMismatch { expected: u64, issued: u64 },

    #[error("Event parsing error: {0}")]
    EventParsing(String),

    #[error("Invalid referral snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type Result<T> = std::result::Result<T, NexusError>;
