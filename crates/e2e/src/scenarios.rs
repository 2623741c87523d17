//! End-to-end scenarios
//!
//! Each scenario drives the UI through page objects and checks the outcome
//! both on screen and in the backing stores. The registry below is what the
//! runner and the integration tests execute.

use futures::future::BoxFuture;
use rust_decimal::Decimal;
use tracing::info;

use crate::browser::poll_until;
use crate::error::{E2eError, E2eResult};
use crate::expect::{ensure, ensure_eq, expect_count, expect_url, expect_visible};
use crate::fixtures::Fixtures;
use crate::pages::{urls, LoginPage, Page};

/// Boxed scenario entry point
pub type ScenarioFn = for<'a> fn(&'a mut Fixtures) -> BoxFuture<'a, E2eResult<()>>;

/// A named, tagged scenario
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub run: ScenarioFn,
}

impl Scenario {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }
}

macro_rules! scenario {
    ($name:ident, [$($tag:literal),*]) => {{
        fn run(fx: &mut Fixtures) -> BoxFuture<'_, E2eResult<()>> {
            Box::pin($name(fx))
        }
        Scenario {
            name: stringify!($name),
            tags: &[$($tag),*],
            run,
        }
    }};
}

/// Every scenario, in execution order
pub fn registry() -> Vec<Scenario> {
    vec![
        scenario!(registration_persists_user, ["auth"]),
        scenario!(login_with_unregistered_user_fails, ["auth"]),
        scenario!(login_success, ["auth"]),
        scenario!(add_spend_success, ["spend"]),
        scenario!(add_spend_zero_amount, ["spend", "validation"]),
        scenario!(add_spend_negative_amount, ["spend", "validation"]),
        scenario!(add_spend_empty_category, ["spend", "validation"]),
        scenario!(delete_spend, ["spend"]),
        scenario!(edit_spend, ["spend"]),
        scenario!(add_friend, ["friends"]),
        scenario!(cleanup_is_idempotent, ["cleanup"]),
    ]
}

pub fn find(name: &str) -> Option<Scenario> {
    registry().into_iter().find(|s| s.name == name)
}

/// Scenarios by name, in the order given; any unknown name is an error
pub fn select(names: &[String]) -> E2eResult<Vec<Scenario>> {
    names
        .iter()
        .map(|name| find(name).ok_or_else(|| E2eError::UnknownScenario(name.clone())))
        .collect()
}

/// Userdata rows appear asynchronously after sign-up
async fn wait_for_userdata(fx: &Fixtures, username: &str) -> E2eResult<()> {
    let users = fx.cleanup().users();
    let what = format!("{} in userdata", username);
    poll_until(&what, fx.settings().timeout, move || async move {
        Ok::<_, E2eError>(users.user_exists(username).await?)
    })
    .await
    .map_err(|e| e.into_assertion(format!("{} should be persisted in userdata", username)))
}

async fn stored_spend_count(fx: &Fixtures, username: &str) -> E2eResult<i64> {
    Ok(fx.cleanup().spends().get_user_spend_count(username).await?)
}

pub async fn registration_persists_user(fx: &mut Fixtures) -> E2eResult<()> {
    let user = fx.registered_user().await?;
    wait_for_userdata(fx, &user.username).await?;

    if let Some(auth) = fx.cleanup().auth() {
        let record = auth.get_user(&user.username).await?;
        ensure(record.enabled, format!("{} should be enabled", user.username))?;
    }
    Ok(())
}

pub async fn login_with_unregistered_user_fails(fx: &mut Fixtures) -> E2eResult<()> {
    let ghost = fx.factory().make_default_user();

    // The frontend bounces anonymous visitors to the auth server
    let tab = fx.tab().clone();
    tab.goto(fx.settings().frontend_url()?).await?;
    expect_url(&tab, &regex::escape(fx.settings().auth_url()?)).await?;

    let login = LoginPage::new(tab).await?;
    login.login_expect_error(&ghost).await?;

    ensure(
        !fx.cleanup().users().user_exists(&ghost.username).await?,
        format!("{} should not exist", ghost.username),
    )
}

pub async fn login_success(fx: &mut Fixtures) -> E2eResult<()> {
    let user = fx.registered_user().await?;
    let main = fx.login_page().await?.login(&user).await?;
    ensure_eq(main.spend_count().await?, 0, "spends of a new user")?;
    main.log_out().await?;
    Ok(())
}

pub async fn add_spend_success(fx: &mut Fixtures) -> E2eResult<()> {
    let user = fx.reset_session_spends().await?;
    let spend = fx.make_spend();

    let main = fx.new_spending_page().await?.add_spend(&spend).await?;
    expect_count(&main.spend_rows(), 1, "Spend list").await?;

    let shown = main.get_spend(0).await?;
    ensure_eq(shown, spend.with_display_date(&fx.settings().params)?, "spend in the list")?;
    ensure_eq(stored_spend_count(fx, &user.username).await?, 1, "stored spends")
}

/// Amounts the form must reject, such as 0 or -200
pub async fn add_spend_invalid_amount(fx: &mut Fixtures, amount: Decimal) -> E2eResult<()> {
    let user = fx.reset_session_spends().await?;
    let mut spend = fx.make_spend();
    spend.amount = amount;

    let page = fx.new_spending_page().await?;
    page.arrange_add_spend(&spend).await?;

    expect_url(page.tab(), urls::SPENDING).await?;
    expect_visible(&page.amount_helper(), "Amount helper text").await?;
    ensure_eq(stored_spend_count(fx, &user.username).await?, 0, "stored spends")
}

pub async fn add_spend_zero_amount(fx: &mut Fixtures) -> E2eResult<()> {
    add_spend_invalid_amount(fx, Decimal::ZERO).await
}

pub async fn add_spend_negative_amount(fx: &mut Fixtures) -> E2eResult<()> {
    add_spend_invalid_amount(fx, Decimal::from(-200)).await
}

pub async fn add_spend_empty_category(fx: &mut Fixtures) -> E2eResult<()> {
    let user = fx.reset_session_spends().await?;
    let mut spend = fx.make_spend();
    spend.category.clear();

    let page = fx.new_spending_page().await?;
    page.arrange_add_spend(&spend).await?;

    expect_url(page.tab(), urls::SPENDING).await?;
    expect_visible(&page.category_helper(), "Category helper text").await?;
    ensure_eq(stored_spend_count(fx, &user.username).await?, 0, "stored spends")
}

pub async fn delete_spend(fx: &mut Fixtures) -> E2eResult<()> {
    let user = fx.reset_session_spends().await?;
    let spend = fx.make_spend();

    let main = fx.new_spending_page().await?.add_spend(&spend).await?;
    expect_count(&main.spend_rows(), 1, "Spend list").await?;
    ensure_eq(stored_spend_count(fx, &user.username).await?, 1, "stored spends")?;

    main.delete_spend(0).await?;

    expect_count(&main.spend_rows(), 0, "Spend list").await?;
    ensure_eq(stored_spend_count(fx, &user.username).await?, 0, "stored spends")
}

pub async fn edit_spend(fx: &mut Fixtures) -> E2eResult<()> {
    let user = fx.reset_session_spends().await?;
    let original = fx.make_spend();
    let edited = fx.make_spend();

    let main = fx.new_spending_page().await?.add_spend(&original).await?;
    expect_count(&main.spend_rows(), 1, "Spend list").await?;
    ensure_eq(stored_spend_count(fx, &user.username).await?, 1, "stored spends")?;

    let edit = main.edit_spend(0).await?;
    let spend_id = edit.spend_id();
    let main = edit.edit_spend(&edited).await?;

    expect_count(&main.spend_rows(), 1, "Spend list").await?;
    ensure_eq(stored_spend_count(fx, &user.username).await?, 1, "stored spends")?;
    ensure_eq(
        main.get_spend(0).await?,
        edited.with_display_date(&fx.settings().params)?,
        "edited spend in the list",
    )?;

    let reopened = main.edit_spend(0).await?;
    ensure_eq(reopened.spend_id(), spend_id, "id of the edited spend")?;
    ensure(
        fx.cleanup().spends().spend_exists(spend_id).await?,
        format!("spend {} should still be stored", spend_id),
    )?;
    reopened.cancel().await?;
    Ok(())
}

pub async fn add_friend(fx: &mut Fixtures) -> E2eResult<()> {
    let inviter = fx.registered_user().await?;
    let invitee = fx.registered_user().await?;
    wait_for_userdata(fx, &inviter.username).await?;
    wait_for_userdata(fx, &invitee.username).await?;

    let people = fx
        .login_page()
        .await?
        .login(&inviter)
        .await?
        .go_to_all_people_page()
        .await?;
    people.send_invitation(&invitee.username).await?;

    let friendships = fx.cleanup().friendships();
    ensure(
        !friendships.friend_exists(&inviter.username, &invitee.username).await?,
        "friendship should not exist before the invitation is accepted",
    )?;

    let friends = people
        .header()
        .log_out()
        .await?
        .login(&invitee)
        .await?
        .go_to_friends_page()
        .await?;
    friends.accept_request(&inviter.username).await?;

    let (a, b) = (inviter.username.as_str(), invitee.username.as_str());
    poll_until("accepted friendship", fx.settings().timeout, move || async move {
        Ok::<_, E2eError>(friendships.friend_exists(a, b).await?)
    })
    .await
    .map_err(|e| e.into_assertion(format!("{} and {} should be friends", a, b)))?;

    info!("{} and {} are friends", a, b);
    Ok(())
}

pub async fn cleanup_is_idempotent(fx: &mut Fixtures) -> E2eResult<()> {
    let user = fx.registered_user().await?;
    wait_for_userdata(fx, &user.username).await?;

    let cleanup = fx.cleanup();
    let first = cleanup.delete_user_cascade(&user.username).await?;
    ensure(first.user_deleted, format!("{} should be deleted", user.username))?;

    let second = cleanup.delete_user_cascade(&user.username).await?;
    ensure(second.is_empty(), format!("second cleanup should be a no-op, got {:?}", second))?;
    ensure(
        !cleanup.users().user_exists(&user.username).await?,
        format!("{} should be gone", user.username),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_names_are_unique() {
        let scenarios = registry();
        let names: HashSet<_> = scenarios.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), scenarios.len());
    }

    #[test]
    fn test_find_and_tags() {
        let scenario = find("add_spend_zero_amount").unwrap();
        assert!(scenario.has_tag("spend"));
        assert!(scenario.has_tag("validation"));
        assert!(!scenario.has_tag("friends"));
        assert!(find("no_such_scenario").is_none());
    }

    #[test]
    fn test_select_keeps_order_and_rejects_unknown() {
        let names = vec!["edit_spend".to_string(), "login_success".to_string()];
        let selected = select(&names).unwrap();
        assert_eq!(selected[0].name, "edit_spend");
        assert_eq!(selected[1].name, "login_success");

        let err = select(&["edit_spend".to_string(), "typo".to_string()]).unwrap_err();
        assert!(matches!(err, E2eError::UnknownScenario(ref n) if n == "typo"));
    }

    #[test]
    fn test_every_scenario_is_tagged() {
        for scenario in registry() {
            assert!(!scenario.tags.is_empty(), "{} has no tags", scenario.name);
        }
    }
}
