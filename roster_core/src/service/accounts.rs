use chrono::Duration;
use rand::Rng;
use sea_orm::{Condition, DatabaseConnection};
use serde::Serialize;
use thiserror::Error;

use crate::{entity::prelude::*, ids::AccountId};

use super::{non_empty, now, substring_pattern};

#[derive(Debug, Error)]
pub enum AccountsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("account not found")]
    AccountNotFound,

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("invalid or expired session")]
    InvalidSession,

    #[error("{0}")]
    Validation(String),
}

/// Public view of a teacher account, used wherever another record points at one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherSummary {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<AccountModel> for TeacherSummary {
    fn from(account: AccountModel) -> Self {
        let first_name = if account.first_name.is_empty() {
            "Unknown".to_string()
        } else {
            account.first_name
        };

        Self {
            id: account.id,
            first_name,
            last_name: account.last_name,
            email: account.email,
        }
    }
}

#[derive(Clone)]
pub struct AccountsService {
    db: DatabaseConnection,
}

impl AccountsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_account(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        is_admin: bool,
    ) -> Result<AccountModel, AccountsServiceError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AccountsServiceError::Validation(
                "A valid email address is required".to_string(),
            ));
        }

        let first_name = non_empty(Some(first_name)).ok_or_else(|| {
            AccountsServiceError::Validation("First name is required".to_string())
        })?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AccountsServiceError::EmailTaken);
        }

        let account = AccountActiveModel {
            id: Set(AccountId::new()),
            email: Set(email),
            first_name: Set(first_name),
            last_name: Set(last_name.trim().to_string()),
            is_admin: Set(is_admin),
            created_at: Set(now()),
        };

        let account = Account::insert(account)
            .exec_with_returning(&self.db)
            .await?;

        tracing::info!(account_id = %account.id, "created account");
        Ok(account)
    }

    pub async fn get_account(
        &self,
        account_id: AccountId,
    ) -> Result<AccountModel, AccountsServiceError> {
        Account::find_by_id(account_id)
            .one(&self.db)
            .await?
            .ok_or(AccountsServiceError::AccountNotFound)
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountModel>, AccountsServiceError> {
        let account = Account::find()
            .filter(AccountColumn::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await?;

        Ok(account)
    }

    /// Teacher directory ordered by first name. `search` matches a substring of
    /// the first name, last name or email.
    pub async fn list_teachers(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<TeacherSummary>, AccountsServiceError> {
        let mut query = Account::find().order_by_asc(AccountColumn::FirstName);

        if let Some(term) = non_empty(search) {
            query = query.filter(
                Condition::any()
                    .add(AccountColumn::FirstName.like(substring_pattern(&term)))
                    .add(AccountColumn::LastName.like(substring_pattern(&term)))
                    .add(AccountColumn::Email.like(substring_pattern(&term))),
            );
        }

        let teachers = query.all(&self.db).await?;
        Ok(teachers.into_iter().map(TeacherSummary::from).collect())
    }

    /// Mint a session token for the account, valid for `ttl`.
    pub async fn issue_session(
        &self,
        account_id: AccountId,
        ttl: Duration,
    ) -> Result<SessionModel, AccountsServiceError> {
        self.get_account(account_id).await?;

        let created_at = now();
        let session = SessionActiveModel {
            token: Set(generate_token()),
            account_id: Set(account_id),
            created_at: Set(created_at),
            expires_at: Set(created_at + ttl),
        };

        let session = Session::insert(session)
            .exec_with_returning(&self.db)
            .await?;

        tracing::info!(%account_id, expires_at = %session.expires_at, "issued session");
        Ok(session)
    }

    /// Resolve a session token to its account. Expired sessions are removed.
    pub async fn validate_session(
        &self,
        token: &str,
    ) -> Result<AccountModel, AccountsServiceError> {
        let session = Session::find_by_id(token.to_string())
            .one(&self.db)
            .await?
            .ok_or(AccountsServiceError::InvalidSession)?;

        if session.expires_at <= now() {
            Session::delete_by_id(session.token).exec(&self.db).await?;
            return Err(AccountsServiceError::InvalidSession);
        }

        Account::find_by_id(session.account_id)
            .one(&self.db)
            .await?
            .ok_or(AccountsServiceError::InvalidSession)
    }

    pub async fn revoke_session(&self, token: &str) -> Result<(), AccountsServiceError> {
        Session::delete_by_id(token.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AccountsServiceError> {
        let result = Session::delete_many()
            .filter(SessionColumn::ExpiresAt.lte(now()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

/// 32 random bytes, hex encoded.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    async fn setup_test_service() -> AccountsService {
        AccountsService::new(test_utils::setup_test_db().await)
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_create_account_normalizes_email() {
        let service = setup_test_service().await;

        let account = service
            .create_account("  Ada@School.EDU ", "Ada", "Lovelace", false)
            .await
            .unwrap();

        assert_eq!(account.email, "ada@school.edu");
        let found = service.find_by_email("ADA@school.edu").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(account.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let service = setup_test_service().await;
        service
            .create_account("ada@school.edu", "Ada", "Lovelace", false)
            .await
            .unwrap();

        let result = service
            .create_account("ada@school.edu", "Another", "Ada", false)
            .await;
        assert!(matches!(result, Err(AccountsServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_create_account_requires_first_name() {
        let service = setup_test_service().await;

        let result = service
            .create_account("ada@school.edu", "   ", "Lovelace", false)
            .await;
        assert!(matches!(result, Err(AccountsServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let service = setup_test_service().await;
        let account = service
            .create_account("ada@school.edu", "Ada", "Lovelace", false)
            .await
            .unwrap();

        let session = service
            .issue_session(account.id, Duration::hours(1))
            .await
            .unwrap();
        let resolved = service.validate_session(&session.token).await.unwrap();
        assert_eq!(resolved.id, account.id);

        service.revoke_session(&session.token).await.unwrap();
        let result = service.validate_session(&session.token).await;
        assert!(matches!(result, Err(AccountsServiceError::InvalidSession)));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let service = setup_test_service().await;
        let account = service
            .create_account("ada@school.edu", "Ada", "Lovelace", false)
            .await
            .unwrap();

        let session = service
            .issue_session(account.id, Duration::seconds(-5))
            .await
            .unwrap();

        let result = service.validate_session(&session.token).await;
        assert!(matches!(result, Err(AccountsServiceError::InvalidSession)));

        let remaining = Session::find().count(&service.db).await.unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected() {
        let service = setup_test_service().await;
        let result = service.validate_session("nope").await;
        assert!(matches!(result, Err(AccountsServiceError::InvalidSession)));
    }

    #[tokio::test]
    async fn test_list_teachers_search() {
        let service = setup_test_service().await;
        service
            .create_account("grace@school.edu", "Grace", "Hopper", false)
            .await
            .unwrap();
        service
            .create_account("ada@school.edu", "Ada", "Lovelace", false)
            .await
            .unwrap();

        let all = service.list_teachers(None).await.unwrap();
        let names: Vec<_> = all.iter().map(|t| t.first_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Grace"]);

        let hits = service.list_teachers(Some("hopp")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].email, "grace@school.edu");

        assert!(service.list_teachers(Some("%")).await.unwrap().is_empty());

        service
            .create_account("edsger_d@school.edu", "Edsger", "Dijkstra", false)
            .await
            .unwrap();
        let hits = service.list_teachers(Some("r_d")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first_name, "Edsger");
    }
}
