use uuid::Uuid;

use crate::config::{token_expiration_hours, ACCOUNTS_COLLECTION, MIN_PASSWORD_LENGTH, TOKENS_COLLECTION};
use crate::core::db::{get_typed, set_typed, DocumentStore};
use crate::core::errors::{AppError, Result};
use crate::core::helpers::{hash_password, is_email_shaped, now_iso, verify_password};
use crate::models::models::{Account, AuthUser, TokenData};

/// Email/password accounts and bearer tokens kept in the document store.
pub struct Auth<'a> {
    db: &'a dyn DocumentStore,
}

impl<'a> Auth<'a> {
    pub fn new(db: &'a dyn DocumentStore) -> Self {
        Self { db }
    }

    pub fn register(&self, uid: &str, email: &str, password: &str) -> Result<AuthUser> {
        if !is_email_shaped(email) {
            return Err(AppError::Validation("username must be an email address".to_string()));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if get_typed::<Account>(self.db, ACCOUNTS_COLLECTION, email)?.is_some() {
            return Err(AppError::Conflict(format!("account {} exists", email)));
        }

        let account = Account {
            uid: uid.to_string(),
            email: email.to_string(),
            password: hash_password(password)?,
        };
        set_typed(self.db, ACCOUNTS_COLLECTION, email, &account)?;

        Ok(AuthUser { uid: account.uid, email: account.email })
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<(String, AuthUser)> {
        let account = match get_typed::<Account>(self.db, ACCOUNTS_COLLECTION, email)? {
            Some(account) if verify_password(password, &account.password) => account,
            _ => {
                log::warn!("sign-in rejected for {}", email);
                return Err(AppError::InvalidCredentials);
            }
        };

        let token = Uuid::new_v4().to_string();
        let data = TokenData {
            uid: account.uid.clone(),
            email: account.email.clone(),
            created_at: now_iso(),
        };
        set_typed(self.db, TOKENS_COLLECTION, &token, &data)?;

        log::info!("signed in uid={}", account.uid);
        Ok((token, AuthUser { uid: account.uid, email: account.email }))
    }

    pub fn sign_out(&self, token: &str) -> Result<()> {
        self.db.delete(TOKENS_COLLECTION, token)?;
        log::info!("signed out");
        Ok(())
    }

    /// Resolves a bearer token to its account. Expired tokens and tokens
    /// whose account is gone resolve to `None`.
    pub fn current_user(&self, token: &str) -> Result<Option<AuthUser>> {
        let data = match get_typed::<TokenData>(self.db, TOKENS_COLLECTION, token)? {
            Some(data) => data,
            None => return Ok(None),
        };

        // An unreadable timestamp counts as expired.
        let expired = match chrono::DateTime::parse_from_rfc3339(&data.created_at) {
            Ok(created) => {
                let age_hours = (chrono::Utc::now() - created.with_timezone(&chrono::Utc)).num_hours();
                age_hours > token_expiration_hours()
            }
            Err(_) => true,
        };
        if expired {
            return Ok(None);
        }

        if get_typed::<Account>(self.db, ACCOUNTS_COLLECTION, &data.email)?.is_none() {
            return Ok(None);
        }

        Ok(Some(AuthUser { uid: data.uid, email: data.email }))
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::MemoryDocumentStore;

    #[test]
    fn sign_in_round_trip() {
        let db = MemoryDocumentStore::new();
        let auth = Auth::new(&db);
        auth.register("5", "test@example.com", "keyboard").unwrap();

        let (token, user) = auth.sign_in("test@example.com", "keyboard").unwrap();
        assert_eq!(user.uid, "5");
        assert_eq!(auth.current_user(&token).unwrap(), Some(user));

        auth.sign_out(&token).unwrap();
        assert_eq!(auth.current_user(&token).unwrap(), None);
    }

    #[test]
    fn wrong_password_and_unknown_account_are_rejected() {
        let db = MemoryDocumentStore::new();
        let auth = Auth::new(&db);
        auth.register("5", "test@example.com", "keyboard").unwrap();

        assert!(matches!(
            auth.sign_in("test@example.com", "nope"),
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("ghost@example.com", "keyboard"),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn register_validates_and_rejects_duplicates() {
        let db = MemoryDocumentStore::new();
        let auth = Auth::new(&db);
        assert!(matches!(auth.register("1", "capslover", "keyboard"), Err(AppError::Validation(_))));
        assert!(matches!(auth.register("1", "capslover@gmail.com", "k"), Err(AppError::Validation(_))));
        auth.register("1", "capslover@gmail.com", "keyboard").unwrap();
        assert!(matches!(
            auth.register("9", "capslover@gmail.com", "keyboard"),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn expired_token_has_no_user() {
        let db = MemoryDocumentStore::new();
        let auth = Auth::new(&db);
        auth.register("2", "typefan@gmail.com", "keyboard").unwrap();

        let stale = TokenData {
            uid: "2".into(),
            email: "typefan@gmail.com".into(),
            created_at: (chrono::Utc::now() - chrono::Duration::hours(24 * 365)).to_rfc3339(),
        };
        set_typed(&db, TOKENS_COLLECTION, "stale", &stale).unwrap();
        assert_eq!(auth.current_user("stale").unwrap(), None);
    }

    #[test]
    fn token_with_unreadable_timestamp_has_no_user() {
        let db = MemoryDocumentStore::new();
        let auth = Auth::new(&db);
        auth.register("4", "keysetqueen@gmail.com", "keyboard").unwrap();

        let broken = TokenData {
            uid: "4".into(),
            email: "keysetqueen@gmail.com".into(),
            created_at: "yesterday-ish".into(),
        };
        set_typed(&db, TOKENS_COLLECTION, "broken", &broken).unwrap();
        assert_eq!(auth.current_user("broken").unwrap(), None);
    }

    #[test]
    fn token_for_deleted_account_has_no_user() {
        let db = MemoryDocumentStore::new();
        let auth = Auth::new(&db);
        auth.register("3", "switchmaster@gmail.com", "keyboard").unwrap();
        let (token, _) = auth.sign_in("switchmaster@gmail.com", "keyboard").unwrap();

        db.delete(ACCOUNTS_COLLECTION, "switchmaster@gmail.com").unwrap();
        assert_eq!(auth.current_user(&token).unwrap(), None);
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(None), None);
    }
}
