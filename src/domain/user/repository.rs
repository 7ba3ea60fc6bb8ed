use async_trait::async_trait;

use super::User;
use crate::domain::DomainResult;
use crate::shared::Page;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save(&self, user: User) -> DomainResult<User>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    /// Active users ordered by creation time.
    async fn find_all(&self, page: Page) -> DomainResult<Vec<User>>;

    async fn update(&self, user: User) -> DomainResult<User>;
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
