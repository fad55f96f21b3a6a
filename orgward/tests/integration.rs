//! End-to-end scenarios exercising membership mutations through the engine

use std::sync::Arc;

use chrono::{Duration, Utc};
use orgward::{
    AccessError, EntityRef, EntityStore, Grant, LicenseConfig, MembershipEvent, MembershipManager,
    MemoryStore, Organization, PermissionEngine, RecordingNotifier, User,
};

fn fixtures() -> (Arc<MemoryStore>, MembershipManager, PermissionEngine) {
    let store = Arc::new(MemoryStore::new());
    let manager = MembershipManager::new(store.clone());
    let engine = PermissionEngine::new(store.clone());
    (store, manager, engine)
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn license_pool_exhausts_and_recovers() {
    let (store, manager, _) = fixtures();
    let org = Organization::new("acme").with_total_licenses(2);
    let org_id = org.id;
    store.save_organization(org).await.unwrap();
    for name in ["alice", "bob", "carol"] {
        let user = User::new(name).with_expires_at(Utc::now() + Duration::weeks(4));
        store.save_user(user).await.unwrap();
    }

    assert!(manager.add_user(org_id, "alice", false, true).await.unwrap());
    assert!(manager.add_user(org_id, "bob", false, true).await.unwrap());

    let result = manager.add_user(org_id, "carol", false, true).await;
    match result {
        Err(error) => assert_eq!(error.to_string(), "no licenses available"),
        Ok(_) => panic!("third sponsored member admitted past capacity"),
    }

    manager.remove_user(org_id, "alice").await.unwrap();

    // Alice's personal clock resumes close to where it paused
    let alice = store.user_by_name("alice").await.unwrap().unwrap();
    assert!(alice.subscription.is_none());
    let expires = alice.expires_at.unwrap();
    assert!(expires >= Utc::now() + Duration::weeks(4) - Duration::seconds(10));

    // The freed seat admits carol
    assert!(manager.add_user(org_id, "carol", false, true).await.unwrap());
    let org = store.organization(org_id).await.unwrap().unwrap();
    assert_eq!(org.used_licenses, 2);
}

#[tokio::test]
async fn membership_is_exclusive_across_organizations() {
    let (store, manager, _) = fixtures();
    let org_a = Organization::new("a").with_total_licenses(1);
    let org_b = Organization::new("b").with_total_licenses(1);
    let (a_id, b_id) = (org_a.id, org_b.id);
    store.save_organization(org_a).await.unwrap();
    store.save_organization(org_b).await.unwrap();
    store.save_user(User::new("drifter")).await.unwrap();

    manager.add_user(a_id, "drifter", false, true).await.unwrap();
    let result = manager.add_user(b_id, "drifter", false, true).await;
    assert!(matches!(result, Err(AccessError::AlreadyAssociated)));

    // Leaving the first organization unlocks the second
    manager.remove_user(a_id, "drifter").await.unwrap();
    assert!(manager.add_user(b_id, "drifter", false, true).await.unwrap());
}

#[tokio::test]
async fn full_manager_supervises_members_but_assistant_does_not() {
    let (store, manager, engine) = fixtures();
    let org = Organization::new("acme").with_total_licenses(5);
    let org_id = org.id;
    store.save_organization(org).await.unwrap();
    for name in ["boss", "helper", "member", "outsider"] {
        store.save_user(User::new(name)).await.unwrap();
    }
    let boss_id = store.user_by_name("boss").await.unwrap().unwrap().id;
    let helper_id = store.user_by_name("helper").await.unwrap().unwrap().id;
    let member_id = store.user_by_name("member").await.unwrap().unwrap().id;
    let outsider_id = store.user_by_name("outsider").await.unwrap().unwrap().id;

    manager.add_manager(org_id, "boss", true).await.unwrap();
    manager.add_manager(org_id, "helper", false).await.unwrap();
    manager.add_user(org_id, "member", false, true).await.unwrap();

    let map = engine
        .permissions_for(Some(EntityRef::User(boss_id)), EntityRef::User(member_id))
        .await;
    assert!(map.allows(Grant::ViewDetailed));
    assert!(map.allows(Grant::Supervise));
    assert!(map.allows(Grant::ManageSupervision));
    assert!(map.allows(Grant::SupportActions));
    assert!(map.allows(Grant::ViewDeletedBoards));

    let map = engine
        .permissions_for(Some(EntityRef::User(helper_id)), EntityRef::User(member_id))
        .await;
    assert!(map.allows(Grant::ViewExistence));
    assert!(!map.allows(Grant::Supervise));
    assert!(!map.allows(Grant::ViewDetailed));

    // The manager role stops at the org boundary: a user never added to the
    // org exposes existence only, even to the full manager
    let map = engine
        .permissions_for(Some(EntityRef::User(boss_id)), EntityRef::User(outsider_id))
        .await;
    assert!(map.allows(Grant::ViewExistence));
    assert!(!map.allows(Grant::Supervise));
    assert!(!map.allows(Grant::ManageSupervision));
    assert!(!map.allows(Grant::ViewDetailed));

    // Both manage the org itself to different depths
    assert!(
        engine
            .allowed(
                Some(EntityRef::User(boss_id)),
                EntityRef::Organization(org_id),
                "manage"
            )
            .await
    );
    assert!(
        engine
            .allowed(
                Some(EntityRef::User(helper_id)),
                EntityRef::Organization(org_id),
                "edit"
            )
            .await
    );
    assert!(
        !engine
            .allowed(
                Some(EntityRef::User(helper_id)),
                EntityRef::Organization(org_id),
                "manage"
            )
            .await
    );
}

#[tokio::test]
async fn full_manager_oversees_accepted_supervisors() {
    let (store, manager, engine) = fixtures();
    let org = Organization::new("acme");
    let org_id = org.id;
    store.save_organization(org).await.unwrap();
    store.save_user(User::new("boss")).await.unwrap();
    store.save_user(User::new("coach")).await.unwrap();
    let boss_id = store.user_by_name("boss").await.unwrap().unwrap().id;
    let coach_id = store.user_by_name("coach").await.unwrap().unwrap().id;

    manager.add_manager(org_id, "boss", true).await.unwrap();
    manager.add_supervisor(org_id, "coach", true).await.unwrap();

    // A pending invitation exposes nothing beyond existence
    let map = engine
        .permissions_for(Some(EntityRef::User(boss_id)), EntityRef::User(coach_id))
        .await;
    assert!(!map.allows(Grant::Supervise));

    manager.add_supervisor(org_id, "coach", false).await.unwrap();
    let map = engine
        .permissions_for(Some(EntityRef::User(boss_id)), EntityRef::User(coach_id))
        .await;
    assert!(map.allows(Grant::ViewDetailed));
    assert!(map.allows(Grant::Supervise));
    assert!(map.allows(Grant::ManageSupervision));
    assert!(!map.allows(Grant::SupportActions));
}

#[tokio::test]
async fn admin_org_managers_supervise_everyone() {
    let (store, manager, engine) = fixtures();
    let admin_org = Organization::new("root").with_admin();
    let admin_org_id = admin_org.id;
    store.save_organization(admin_org).await.unwrap();
    store.save_user(User::new("operator")).await.unwrap();
    store.save_user(User::new("bystander")).await.unwrap();
    let operator_id = store.user_by_name("operator").await.unwrap().unwrap().id;
    let bystander_id = store.user_by_name("bystander").await.unwrap().unwrap().id;

    manager.add_manager(admin_org_id, "operator", true).await.unwrap();

    // Bystander has no tie to the admin org at all
    let map = engine
        .permissions_for(
            Some(EntityRef::User(operator_id)),
            EntityRef::User(bystander_id),
        )
        .await;
    assert!(map.allows(Grant::Supervise));
    assert!(map.allows(Grant::AdminSupportActions));
    assert!(map.allows(Grant::ViewDeletedBoards));

    assert!(
        engine
            .manager_for(Some(operator_id), Some(bystander_id))
            .await
    );

    // Assistants of the admin org get nothing extra
    manager.add_manager(admin_org_id, "operator", false).await.unwrap();
    let map = engine
        .permissions_for(
            Some(EntityRef::User(operator_id)),
            EntityRef::User(bystander_id),
        )
        .await;
    assert!(!map.allows(Grant::Supervise));
    assert!(!map.allows(Grant::AdminSupportActions));
}

#[tokio::test]
async fn revoked_roles_are_not_served_from_cache() {
    let (store, manager, engine) = fixtures();
    let org = Organization::new("acme").with_total_licenses(1);
    let org_id = org.id;
    store.save_organization(org).await.unwrap();
    store.save_user(User::new("boss")).await.unwrap();
    store.save_user(User::new("member")).await.unwrap();
    let boss_id = store.user_by_name("boss").await.unwrap().unwrap().id;
    let member_id = store.user_by_name("member").await.unwrap().unwrap().id;

    manager.add_manager(org_id, "boss", true).await.unwrap();
    manager.add_user(org_id, "member", false, true).await.unwrap();

    // Compute twice so the second read is a cache hit
    for _ in 0..2 {
        let map = engine
            .permissions_for(Some(EntityRef::User(boss_id)), EntityRef::User(member_id))
            .await;
        assert!(map.allows(Grant::Supervise));
    }

    manager.remove_manager(org_id, "boss").await.unwrap();

    let map = engine
        .permissions_for(Some(EntityRef::User(boss_id)), EntityRef::User(member_id))
        .await;
    assert!(!map.allows(Grant::Supervise));
    assert!(map.allows(Grant::ViewExistence));
}

#[tokio::test]
async fn adding_roles_never_shrinks_the_grant_set() {
    let (store, manager, engine) = fixtures();
    let org = Organization::new("acme").with_total_licenses(1);
    let org_id = org.id;
    store.save_organization(org).await.unwrap();
    store.save_user(User::new("watcher")).await.unwrap();
    store.save_user(User::new("member")).await.unwrap();
    let watcher_id = store.user_by_name("watcher").await.unwrap().unwrap().id;
    let member_id = store.user_by_name("member").await.unwrap().unwrap().id;

    manager.add_user(org_id, "member", false, true).await.unwrap();
    manager.add_supervisor(org_id, "watcher", false).await.unwrap();
    let before: Vec<Grant> = engine
        .permissions_for(Some(EntityRef::User(watcher_id)), EntityRef::User(member_id))
        .await
        .granted()
        .collect();

    manager.add_manager(org_id, "watcher", true).await.unwrap();
    let after: Vec<Grant> = engine
        .permissions_for(Some(EntityRef::User(watcher_id)), EntityRef::User(member_id))
        .await
        .granted()
        .collect();

    for grant in &before {
        assert!(after.contains(grant), "{grant:?} lost after role addition");
    }
    assert!(after.len() > before.len());
}

#[tokio::test]
async fn short_sponsorships_end_with_a_grace_period() {
    let store = Arc::new(MemoryStore::new());
    let config = LicenseConfig::default();
    let manager = MembershipManager::new(store.clone()).with_config(config.clone());
    let org = Organization::new("acme").with_total_licenses(1);
    let org_id = org.id;
    store.save_organization(org).await.unwrap();

    // Only two days left when sponsorship begins
    let user = User::new("latecomer").with_expires_at(Utc::now() + Duration::days(2));
    store.save_user(user).await.unwrap();

    manager.add_user(org_id, "latecomer", false, true).await.unwrap();
    manager.remove_user(org_id, "latecomer").await.unwrap();

    let user = store.user_by_name("latecomer").await.unwrap().unwrap();
    let expires = user.expires_at.unwrap();
    let now = Utc::now();
    assert!(expires >= now + config.grace_period() - Duration::seconds(10));
    assert!(expires <= now + config.grace_period() + Duration::seconds(10));
}

#[tokio::test]
async fn membership_changes_notify_the_user() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let manager = MembershipManager::new(store.clone()).with_notifier(notifier.clone());
    let org = Organization::new("acme").with_total_licenses(2);
    let org_id = org.id;
    store.save_organization(org).await.unwrap();
    store.save_user(User::new("quiet")).await.unwrap();
    store.save_user(User::new("loud")).await.unwrap();

    manager.add_user(org_id, "quiet", true, true).await.unwrap();
    manager.add_user(org_id, "loud", false, true).await.unwrap();
    manager.remove_user(org_id, "quiet").await.unwrap();
    settle().await;

    let quiet_id = store.user_by_name("quiet").await.unwrap().unwrap().id;
    let loud_id = store.user_by_name("loud").await.unwrap().unwrap().id;
    let mut events = notifier.events().await;
    events.sort_by_key(|event| format!("{event:?}"));
    let mut expected = vec![
        MembershipEvent::OrganizationAssigned {
            user_id: loud_id,
            org_id,
        },
        MembershipEvent::OrganizationUnassigned {
            user_id: quiet_id,
            org_id,
        },
    ];
    expected.sort_by_key(|event| format!("{event:?}"));
    assert_eq!(events, expected);
}
