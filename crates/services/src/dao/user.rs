use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use startup_deals_db::models::{Role, User, VerificationStatus};

use super::base::{BaseDao, DaoError, DaoResult};
use crate::validation::{RegisterInput, VerificationRequestInput};

/// Credential store. Password hashes go in here and never come back out
/// through the API layer.
pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(&self, input: &RegisterInput, password_hash: String) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash: Some(password_hash),
            role: Role::User,
            is_verified: false,
            company: input.company.clone(),
            website_url: input.website_url.clone(),
            verification_status: VerificationStatus::NotRequested,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn email_taken(&self, email: &str) -> DaoResult<bool> {
        Ok(self.base.count(doc! { "email": email }).await? > 0)
    }

    /// Record company details and move the account into `pending` review.
    pub async fn request_verification(
        &self,
        user_id: ObjectId,
        input: &VerificationRequestInput,
    ) -> DaoResult<User> {
        let status = bson::to_bson(&VerificationStatus::Pending)?;
        let matched = self
            .base
            .update_by_id(
                user_id,
                doc! {
                    "$set": {
                        "company": input.company.as_str(),
                        "website_url": input.website_url.as_str(),
                        "verification_status": status,
                    }
                },
            )
            .await?;

        if !matched {
            return Err(DaoError::NotFound);
        }
        self.base.find_by_id(user_id).await
    }
}
