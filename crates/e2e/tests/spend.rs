//! Spend creation, validation, editing and deletion

mod common;

use test_case::test_case;

#[tokio::test]
async fn add_spend_success() {
    common::run("add_spend_success").await;
}

#[test_case("add_spend_zero_amount" ; "zero amount")]
#[test_case("add_spend_negative_amount" ; "negative amount")]
#[test_case("add_spend_empty_category" ; "empty category")]
#[tokio::test]
async fn add_spend_is_rejected(scenario: &str) {
    common::run(scenario).await;
}

#[tokio::test]
async fn delete_spend() {
    common::run("delete_spend").await;
}

#[tokio::test]
async fn edit_spend() {
    common::run("edit_spend").await;
}
