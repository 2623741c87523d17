//! Friend invitations between two fresh users

mod common;

#[tokio::test]
async fn add_friend() {
    common::run("add_friend").await;
}
