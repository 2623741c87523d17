//! Registration and login

mod common;

#[tokio::test]
async fn registration_persists_user() {
    common::run("registration_persists_user").await;
}

#[tokio::test]
async fn login_with_unregistered_user_fails() {
    common::run("login_with_unregistered_user_fails").await;
}

#[tokio::test]
async fn login_success() {
    common::run("login_success").await;
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    common::run("cleanup_is_idempotent").await;
}
