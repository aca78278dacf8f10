use testcontainers_modules::mongo::Mongo;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;

use marketplace_chat::integration::db;
use marketplace_chat::user::model::User;
use marketplace_chat::user::repository::{MongoUserRepository, UserRepository};
use marketplace_chat::user::Sub;

async fn database() -> (ContainerAsync<Mongo>, mongodb::Database) {
    let mongo = Mongo::default().start().await.unwrap();

    let config = db::Config::new(
        mongo.get_host().await.unwrap().to_string(),
        mongo.get_host_port_ipv4(27017).await.unwrap(),
        "test_marketplace_chat",
    );

    let database = db::init(&config);
    (mongo, database)
}

fn sub(s: &str) -> Sub {
    Sub(s.to_owned())
}

#[tokio::test]
#[ignore = "requires a local docker daemon"]
async fn finds_user_by_sub() {
    let (_mongo, database) = database().await;
    let repository = MongoUserRepository::new(&database);

    let user = User::new(sub("seller|1"), "Ada Vector", "ada@studio.io", "/p/a.png");
    repository.insert(&user).await.unwrap();

    let found = repository.find_by_sub(&sub("seller|1")).await.unwrap();
    assert_eq!(found.name, "Ada Vector");

    let missing = repository.find_by_sub(&sub("seller|404")).await;
    assert!(matches!(
        missing,
        Err(marketplace_chat::user::Error::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires a local docker daemon"]
async fn search_matches_name_or_email_case_insensitively() {
    let (_mongo, database) = database().await;
    let repository = MongoUserRepository::new(&database);

    for user in [
        User::new(sub("a"), "Ada Vector", "ada@studio.io", "/p/a.png"),
        User::new(sub("b"), "Bran Glyph", "bran@forge.dev", "/p/b.png"),
        User::new(sub("c"), "Cara Mark", "cara@vector.io", "/p/c.png"),
    ] {
        repository.insert(&user).await.unwrap();
    }

    // matches a's name and c's email, a excluded as the caller
    let results = repository
        .search_excluding("VECTOR", &sub("a"), 10)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].sub, sub("c"));

    // regex metacharacters in the query must not match everything
    let results = repository
        .search_excluding(".*", &sub("x"), 10)
        .await
        .unwrap();
    assert!(results.is_empty());
}
