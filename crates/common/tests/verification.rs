//! Verification services against live Niffler databases.
//!
//! Skipped unless NIFFLER_USERDATA_DB_URL and NIFFLER_SPEND_DB_URL are set.
//! Only absent, randomly named users are touched.

use niffler_common::{Cleanup, DataFactory, Error, Settings};
use uuid::Uuid;

fn configured() -> Option<(Settings, DataFactory)> {
    let settings = Settings::from_env().ok()?;
    if settings.userdata_db_url.is_none() || settings.spend_db_url.is_none() {
        eprintln!("Skipping: NIFFLER_USERDATA_DB_URL / NIFFLER_SPEND_DB_URL not set");
        return None;
    }
    let factory = DataFactory::new(settings.seed, settings.params.clone());
    Some((settings, factory))
}

#[tokio::test]
async fn cascade_delete_of_absent_user_is_idempotent() {
    let Some((settings, mut factory)) = configured() else {
        return;
    };
    let cleanup = Cleanup::new(&settings).expect("cleanup services");
    let ghost = factory.make_user(24, 10);

    let first = cleanup.delete_user_cascade(&ghost.username).await.expect("first delete");
    let second = cleanup.delete_user_cascade(&ghost.username).await.expect("second delete");

    assert!(first.is_empty());
    assert_eq!(first, second);
    assert!(!cleanup.users().user_exists(&ghost.username).await.unwrap());
}

#[tokio::test]
async fn lookups_of_absent_entities_are_not_found() {
    let Some((settings, mut factory)) = configured() else {
        return;
    };
    let cleanup = Cleanup::new(&settings).expect("cleanup services");
    let ghost = factory.make_user(24, 10);

    let err = cleanup
        .users()
        .get_user_by_username(&ghost.username)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");

    let err = cleanup.spends().get_spend(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert!(!cleanup.spends().spend_exists(Uuid::new_v4()).await.unwrap());
    assert!(!cleanup.spends().delete_spend(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn friendship_check_requires_both_users() {
    let Some((settings, mut factory)) = configured() else {
        return;
    };
    let cleanup = Cleanup::new(&settings).expect("cleanup services");
    let requester = factory.make_user(24, 10);
    let addressee = factory.make_user(24, 10);

    match cleanup
        .friendships()
        .friend_exists(&requester.username, &addressee.username)
        .await
    {
        Err(Error::NotFound { kind, .. }) => assert_eq!(kind, "requester"),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert_eq!(
        cleanup
            .friendships()
            .count_user_friendships(&requester.username)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn counts_for_unknown_user_are_zero() {
    let Some((settings, mut factory)) = configured() else {
        return;
    };
    let cleanup = Cleanup::new(&settings).expect("cleanup services");
    let ghost = factory.make_user(24, 10);

    assert_eq!(cleanup.spends().get_user_spend_count(&ghost.username).await.unwrap(), 0);
    assert!(cleanup.spends().get_user_spends(&ghost.username).await.unwrap().is_empty());
    assert!(cleanup.spends().get_user_categories(&ghost.username).await.unwrap().is_empty());
    assert!(!cleanup
        .spends()
        .category_exists(&ghost.username, "groceries")
        .await
        .unwrap());
}
