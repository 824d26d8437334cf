use crate::constants::UNSET_ADDRESS;
use crate::error::NexusError;
use crate::events::{LevelChange, NewProfileIssuance, NexusEvent};
use crate::external::{
    AccountFactory, AccountKey, Asset, AssetVault, InMemoryVault, PdaAccountFactory, ProfileCollection, ProfileIssuer,
};
use crate::nexus::{InMemoryNexus, Nexus};
use crate::states::Role;
use solana_sdk::pubkey::Pubkey;

const CHAIN_ID: u64 = 43112;
const LINK: &str = "ProfileLinkGoesHere";
const SALT: [u8; 32] = [0u8; 32];

struct Fixture {
    nexus: InMemoryNexus,
    master: Pubkey,
    guardian: Pubkey,
    seeker: Pubkey,
}

fn fixture() -> Fixture {
    let master = Pubkey::new_unique();
    let guardian = Pubkey::new_unique();
    let mut nexus = InMemoryNexus::in_memory(Pubkey::new_unique(), CHAIN_ID, master);

    nexus.set_guardian(&master, guardian).unwrap();
    nexus.set_nft(&master, Pubkey::new_unique()).unwrap();
    nexus.set_account_impl(&master, Pubkey::new_unique()).unwrap();
    nexus.set_registry(&master, Pubkey::new_unique()).unwrap();
    nexus.take_events();

    Fixture {
        nexus,
        master,
        guardian,
        seeker: Pubkey::new_unique(),
    }
}

impl Fixture {
    fn create(&mut self, referrer_id: u64) -> Pubkey {
        self.nexus
            .create_profile(&self.guardian, referrer_id, &self.seeker, LINK, SALT)
            .unwrap()
    }
}

#[test]
fn test_account_and_registry_configured() {
    let f = fixture();
    assert_ne!(f.nexus.account_implementation(), UNSET_ADDRESS);
    assert_ne!(f.nexus.registry(), UNSET_ADDRESS);
    assert_eq!(f.nexus.master(), f.master);
    assert_eq!(f.nexus.guardian(), f.guardian);
}

#[test]
fn test_only_master_can_add_handlers() {
    let mut f = fixture();
    let outsider = Pubkey::new_unique();

    assert_eq!(
        f.nexus.add_handler(&outsider, UNSET_ADDRESS),
        Err(NexusError::Unauthorized(Role::Master))
    );

    f.nexus.add_handler(&f.master, f.master).unwrap();
    assert!(f.nexus.is_handler(&f.master));
}

#[test]
fn test_notify_tier_update_requires_handler() {
    let mut f = fixture();
    let outsider = Pubkey::new_unique();

    assert_eq!(
        f.nexus.notify_tier_update(&outsider, 1, 2),
        Err(NexusError::Unauthorized(Role::Handler))
    );
    assert!(f.nexus.events().is_empty());
}

#[test]
fn test_manual_handler_without_account_is_unknown() {
    let mut f = fixture();
    f.nexus.add_handler(&f.master, f.master).unwrap();

    assert!(matches!(
        f.nexus.notify_tier_update(&f.master, 0, 1),
        Err(NexusError::UnknownAccount(_))
    ));
}

#[test]
fn test_handler_tier_update_emits_level_change() {
    let mut f = fixture();
    let root = f.create(0);
    let child = f.create(1);
    f.nexus.take_events();

    f.nexus.notify_tier_update(&child, 0, 2).unwrap();

    assert_eq!(
        f.nexus.take_events(),
        vec![NexusEvent::LevelChange(LevelChange {
            handler: child,
            old_tier: 0,
            new_tier: 2,
        })]
    );
    assert_eq!(f.nexus.get_tier(&child), Some(2));
    assert_eq!(f.nexus.get_tier_counts(&root), Some([0, 0, 1, 0, 0]));
}

#[test]
fn test_invalid_tier_values_rejected() {
    let mut f = fixture();
    f.create(0);
    let child = f.create(1);

    for (old, new) in [(0, 0), (0, 5), (7, 1), (3, 1)] {
        assert_eq!(
            f.nexus.notify_tier_update(&child, old, new),
            Err(NexusError::InvalidTier {
                old_tier: old,
                new_tier: new
            })
        );
    }
    assert_eq!(f.nexus.get_tier(&child), Some(0));
}

#[test]
fn test_only_master_changes_master() {
    let mut f = fixture();
    let next = Pubkey::new_unique();

    assert_eq!(
        f.nexus.set_master(&next, next),
        Err(NexusError::Unauthorized(Role::Master))
    );

    f.nexus.set_master(&f.master, next).unwrap();
    assert_eq!(f.nexus.master(), next);

    // 旧 master 失去权限
    assert!(f.nexus.set_guardian(&f.master, f.master).is_err());
    f.nexus.set_guardian(&next, next).unwrap();
    assert_eq!(f.nexus.guardian(), next);
}

#[test]
fn test_role_setters_require_master() {
    let mut f = fixture();
    let outsider = Pubkey::new_unique();
    let target = Pubkey::new_unique();

    type Setter = fn(&mut InMemoryNexus, &Pubkey, Pubkey) -> crate::Result<()>;
    type Getter = fn(&InMemoryNexus) -> Pubkey;
    let cases: [(Setter, Getter); 7] = [
        (InMemoryNexus::set_rewarder, InMemoryNexus::rewarder),
        (InMemoryNexus::set_tax_manager, InMemoryNexus::tax_manager),
        (InMemoryNexus::set_tier_manager, InMemoryNexus::tier_manager),
        (InMemoryNexus::set_nft, InMemoryNexus::nft),
        (InMemoryNexus::set_account_impl, InMemoryNexus::account_implementation),
        (InMemoryNexus::set_registry, InMemoryNexus::registry),
        (InMemoryNexus::set_guardian, InMemoryNexus::guardian),
    ];

    for (set, get) in cases {
        let before = get(&f.nexus);
        assert_eq!(set(&mut f.nexus, &outsider, target), Err(NexusError::Unauthorized(Role::Master)));
        assert_eq!(get(&f.nexus), before);

        set(&mut f.nexus, &f.master, target).unwrap();
        assert_eq!(get(&f.nexus), target);
    }

    let events = f.nexus.take_events();
    assert_eq!(events.len(), 7);
    assert!(events.iter().all(|e| matches!(e, NexusEvent::RoleChanged(_))));
}

#[test]
fn test_create_profile_matches_registry_address() {
    let mut f = fixture();
    let expected = f.nexus.account_address(SALT, 1).unwrap();

    let handler = f.create(0);

    assert_eq!(handler, expected);
    assert_eq!(
        f.nexus.take_events(),
        vec![NexusEvent::NewProfileIssuance(NewProfileIssuance {
            nft_id: 1,
            handler_address: handler,
        })]
    );
    assert!(f.nexus.is_handler(&handler));
    assert_eq!(f.nexus.referred_by(&handler), None);
    assert_eq!(f.nexus.issuer().owner_of(&f.nexus.nft(), 1), Some(f.seeker));
}

#[test]
fn test_create_profile_requires_guardian() {
    let mut f = fixture();
    assert_eq!(
        f.nexus.create_profile(&f.seeker, 0, &f.seeker, LINK, SALT),
        Err(NexusError::Unauthorized(Role::Guardian))
    );
    assert_eq!(f.nexus.profile_count(), 0);
}

#[test]
fn test_token_id_matches_handler_mapping() {
    let mut f = fixture();
    let handler = f.create(0);

    assert_eq!(f.nexus.get_handler(1), Some(handler));
    assert_eq!(f.nexus.get_nft_id(&handler), Some(1));
    assert_eq!(f.nexus.get_handler(2), None);
}

#[test]
fn test_create_profile_requires_configuration() {
    let master = Pubkey::new_unique();
    let mut nexus = InMemoryNexus::in_memory(Pubkey::new_unique(), CHAIN_ID, master);
    nexus.set_guardian(&master, master).unwrap();

    assert_eq!(
        nexus.create_profile(&master, 0, &master, LINK, SALT),
        Err(NexusError::NotConfigured(Role::Nft))
    );

    nexus.set_nft(&master, Pubkey::new_unique()).unwrap();
    nexus.set_account_impl(&master, Pubkey::new_unique()).unwrap();
    assert_eq!(
        nexus.create_profile(&master, 0, &master, LINK, SALT),
        Err(NexusError::NotConfigured(Role::Registry))
    );
}

#[test]
fn test_self_referral_rejected() {
    let mut f = fixture();
    f.create(0);
    f.create(0);

    assert_eq!(
        f.nexus.create_profile(&f.guardian, 3, &f.seeker, LINK, SALT),
        Err(NexusError::SelfReferral)
    );
}

#[test]
fn test_unknown_referrer_rejected() {
    let mut f = fixture();
    f.create(0);

    assert_eq!(
        f.nexus.create_profile(&f.guardian, 999, &f.seeker, LINK, SALT),
        Err(NexusError::UnknownReferrer(999))
    );
}

#[test]
fn test_rejected_create_leaves_state_untouched() {
    let mut f = fixture();
    let root = f.create(0);
    f.nexus.take_events();

    let collection = f.nexus.nft();
    let next_id = f.nexus.issuer().next_id(&collection);

    assert!(f.nexus.create_profile(&f.guardian, 42, &f.seeker, LINK, SALT).is_err());
    assert!(f.nexus.create_profile(&f.guardian, next_id, &f.seeker, LINK, SALT).is_err());

    assert_eq!(f.nexus.issuer().next_id(&collection), next_id);
    assert_eq!(f.nexus.profile_count(), 1);
    assert_eq!(f.nexus.factory().deployed_count(), 1);
    assert_eq!(f.nexus.get_tier_counts(&root), Some([0; 5]));
    assert!(f.nexus.events().is_empty());
}

#[test]
fn test_collection_switch_cannot_reuse_profile_ids() {
    let mut f = fixture();
    let root = f.create(0);
    let middle = f.create(1);
    f.create(2);
    assert_eq!(f.nexus.get_tier_counts(&root), Some([2, 0, 0, 0, 0]));

    let collection = Pubkey::new_unique();
    f.nexus.set_nft(&f.master, collection).unwrap();
    f.nexus.take_events();
    let handlers = f.nexus.access_gate().handler_count();

    // 新 collection 从 1 开始编号，和已有的 profile #1 冲突
    for _ in 0..2 {
        assert_eq!(
            f.nexus.create_profile(&f.guardian, 3, &f.seeker, LINK, SALT),
            Err(NexusError::ProfileExists(1))
        );
    }

    assert_eq!(f.nexus.get_handler(1), Some(root));
    assert_eq!(f.nexus.get_tier_counts(&root), Some([2, 0, 0, 0, 0]));
    assert_eq!(f.nexus.get_tier_counts(&middle), Some([1, 0, 0, 0, 0]));
    assert_eq!(f.nexus.profile_count(), 3);
    assert_eq!(f.nexus.access_gate().handler_count(), handlers);
    assert_eq!(f.nexus.issuer().next_id(&collection), 1);
    assert_eq!(f.nexus.factory().deployed_count(), 3);
    assert!(f.nexus.events().is_empty());
}

/// registry 拒绝创建账户
#[derive(Debug, Default)]
struct RejectingFactory;

impl AccountFactory for RejectingFactory {
    fn account(&self, registry: &Pubkey, key: &AccountKey) -> Pubkey {
        PdaAccountFactory::find_account_address(registry, key).0
    }

    fn create_account(&mut self, _registry: &Pubkey, _key: &AccountKey) -> crate::Result<Pubkey> {
        Err(NexusError::Unauthorized(Role::Registry))
    }

    fn is_deployed(&self, _address: &Pubkey) -> bool {
        false
    }
}

#[test]
fn test_failed_account_creation_issues_no_profile() {
    let master = Pubkey::new_unique();
    let mut nexus = Nexus::new(
        Pubkey::new_unique(),
        CHAIN_ID,
        master,
        RejectingFactory,
        ProfileCollection::new(),
        InMemoryVault::new(),
    );
    let collection = Pubkey::new_unique();
    nexus.set_guardian(&master, master).unwrap();
    nexus.set_nft(&master, collection).unwrap();
    nexus.set_account_impl(&master, Pubkey::new_unique()).unwrap();
    nexus.set_registry(&master, Pubkey::new_unique()).unwrap();
    nexus.take_events();

    assert_eq!(
        nexus.create_profile(&master, 0, &master, LINK, SALT),
        Err(NexusError::Unauthorized(Role::Registry))
    );

    assert_eq!(nexus.issuer().next_id(&collection), 1);
    assert_eq!(nexus.issuer().issued_count(&collection), 0);
    assert_eq!(nexus.profile_count(), 0);
    assert_eq!(nexus.access_gate().handler_count(), 0);
    assert!(nexus.events().is_empty());
}

#[test]
fn test_set_tier_by_tier_manager() {
    let mut f = fixture();
    let tier_manager = Pubkey::new_unique();
    f.nexus.set_tier_manager(&f.master, tier_manager).unwrap();

    let root = f.create(0);
    let child = f.create(1);

    assert_eq!(
        f.nexus.set_tier(&f.master, 2, 1),
        Err(NexusError::Unauthorized(Role::TierManager))
    );
    assert!(matches!(f.nexus.set_tier(&tier_manager, 77, 1), Err(NexusError::UnknownAccount(_))));

    f.nexus.set_tier(&tier_manager, 2, 1).unwrap();
    f.nexus.set_tier(&tier_manager, 2, 4).unwrap();

    assert_eq!(f.nexus.get_tier(&child), Some(4));
    assert_eq!(f.nexus.get_tier_counts(&root), Some([0, 0, 0, 0, 1]));

    // 等级没变不算一次变化
    assert_eq!(
        f.nexus.set_tier(&tier_manager, 2, 4),
        Err(NexusError::InvalidTier { old_tier: 4, new_tier: 4 })
    );
}

#[test]
fn test_recover_tokens_native() {
    let mut f = fixture();
    let solver = Pubkey::new_unique();
    let nexus_address = f.nexus.address();
    f.nexus.vault_mut().credit(&Asset::Native, &nexus_address, 1_000_000_000);

    assert_eq!(
        f.nexus.recover_tokens(&f.seeker, UNSET_ADDRESS, f.seeker),
        Err(NexusError::Unauthorized(Role::Master))
    );

    let amount = f.nexus.recover_tokens(&f.master, UNSET_ADDRESS, solver).unwrap();

    assert_eq!(amount, 1_000_000_000);
    assert_eq!(f.nexus.vault().balance_of(&Asset::Native, &solver), 1_000_000_000);
    assert_eq!(f.nexus.vault().balance_of(&Asset::Native, &nexus_address), 0);
}

#[test]
fn test_recover_tokens_fungible() {
    let mut f = fixture();
    let solver = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let nexus_address = f.nexus.address();
    f.nexus.vault_mut().credit(&Asset::Token(mint), &nexus_address, 1000);
    f.nexus.vault_mut().credit(&Asset::Native, &nexus_address, 5);

    assert_eq!(f.nexus.recover_tokens(&f.master, mint, solver).unwrap(), 1000);
    assert_eq!(f.nexus.vault().balance_of(&Asset::Token(mint), &solver), 1000);
    // 只转走指定资产
    assert_eq!(f.nexus.vault().balance_of(&Asset::Native, &nexus_address), 5);

    // 余额为 0 时照常成功
    assert_eq!(f.nexus.recover_tokens(&f.master, mint, solver).unwrap(), 0);
}
