pub mod create_profile;
pub mod notify_tier_update;
pub mod recover_tokens;
pub mod update_config;

#[cfg(test)]
mod tests;
