use std::sync::Arc;

use super::model::UserDto;
use super::repository::UserRepository;
use super::Sub;

pub const SEARCH_LIMIT_DEFAULT: i64 = 10;
pub const SEARCH_LIMIT_MAX: i64 = 25;

#[async_trait::async_trait]
pub trait UserService {
    async fn find_by_sub(&self, sub: &Sub) -> super::Result<UserDto>;

    async fn search(
        &self,
        query: &str,
        caller: &Sub,
        limit: Option<i64>,
    ) -> super::Result<Vec<UserDto>>;

    async fn touch_last_seen(&self, sub: &Sub) -> super::Result<()>;
}

pub struct UserServiceImpl {
    repo: Arc<dyn UserRepository + Send + Sync>,
}

impl UserServiceImpl {
    pub fn new(repo: impl UserRepository + Send + Sync + 'static) -> Self {
        Self {
            repo: Arc::new(repo),
        }
    }
}

#[async_trait::async_trait]
impl UserService for UserServiceImpl {
    async fn find_by_sub(&self, sub: &Sub) -> super::Result<UserDto> {
        self.repo.find_by_sub(sub).await.map(UserDto::from)
    }

    async fn search(
        &self,
        query: &str,
        caller: &Sub,
        limit: Option<i64>,
    ) -> super::Result<Vec<UserDto>> {
        if query.trim().is_empty() {
            return Ok(vec![]);
        }

        let limit = limit
            .unwrap_or(SEARCH_LIMIT_DEFAULT)
            .clamp(1, SEARCH_LIMIT_MAX);

        let users = self.repo.search_excluding(query.trim(), caller, limit).await?;

        Ok(users.into_iter().map(UserDto::from).collect())
    }

    async fn touch_last_seen(&self, sub: &Sub) -> super::Result<()> {
        self.repo
            .touch_last_seen(sub, chrono::Utc::now().timestamp_millis())
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use crate::user::model::User;

    use super::*;

    /// In-memory directory used across the crate's unit tests.
    pub(crate) struct FakeUserRepository {
        users: Mutex<Vec<User>>,
    }

    impl FakeUserRepository {
        pub fn with_users(users: Vec<User>) -> Self {
            Self {
                users: Mutex::new(users),
            }
        }
    }

    #[async_trait::async_trait]
    impl UserRepository for FakeUserRepository {
        async fn insert(&self, user: &User) -> crate::user::Result<()> {
            self.users.lock().unwrap().push(user.clone());
            Ok(())
        }

        async fn find_by_sub(&self, sub: &Sub) -> crate::user::Result<User> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| &u.sub == sub)
                .cloned()
                .ok_or(crate::user::Error::NotFound(sub.to_owned()))
        }

        async fn search_excluding(
            &self,
            query: &str,
            exclude: &Sub,
            limit: i64,
        ) -> crate::user::Result<Vec<User>> {
            let q = query.to_lowercase();
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| &u.sub != exclude)
                .filter(|u| {
                    u.name.to_lowercase().contains(&q) || u.email.to_lowercase().contains(&q)
                })
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn touch_last_seen(&self, sub: &Sub, at: i64) -> crate::user::Result<()> {
            for u in self.users.lock().unwrap().iter_mut() {
                if &u.sub == sub {
                    u.last_seen = at;
                }
            }
            Ok(())
        }
    }

    fn directory() -> UserServiceImpl {
        UserServiceImpl::new(FakeUserRepository::with_users(vec![
            User::new(Sub("a".into()), "Ada Vector", "ada@studio.io", "/p/a.png"),
            User::new(Sub("b".into()), "Bran Glyph", "bran@forge.dev", "/p/b.png"),
            User::new(Sub("c".into()), "Cara Mark", "cara@vector.io", "/p/c.png"),
        ]))
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_name_and_email() {
        let service = directory();

        let by_name = service.search("ADA", &Sub("x".into()), None).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].sub, Sub("a".into()));

        let by_email = service
            .search("vector.io", &Sub("x".into()), None)
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].sub, Sub("c".into()));
    }

    #[tokio::test]
    async fn search_excludes_the_caller() {
        let service = directory();

        // "Vector" appears in a's name and c's email
        let results = service.search("vector", &Sub("a".into()), None).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sub, Sub("c".into()));
    }

    #[tokio::test]
    async fn blank_query_returns_nothing() {
        let service = directory();

        let results = service.search("   ", &Sub("x".into()), None).await.unwrap();

        assert!(results.is_empty());
    }
}
