use crate::auth::Auth;
use crate::config::{seed_password, ACCOUNTS_COLLECTION};
use crate::core::db::{get_typed, read_user_doc, write_user_doc, DocumentStore};
use crate::core::errors::Result;
use crate::models::models::{Account, UserDocument};
use crate::store::AppStore;

/// Creates one user document and one account per fixture user. Safe to call on
/// every request: existing documents and accounts are left untouched.
pub fn init_test_data(db: &dyn DocumentStore, app: &AppStore) -> Result<()> {
    let auth = Auth::new(db);
    let password = seed_password();
    let mut created = 0;

    for user in app.users() {
        let uid = user.id.to_string();

        if read_user_doc(db, &uid)?.is_none() {
            let doc = UserDocument {
                username: user.username.clone(),
                posts: app
                    .get_posts_by_user(user.id)
                    .iter()
                    .map(|p| p.id.to_string())
                    .collect(),
                ..UserDocument::default()
            };
            write_user_doc(db, &uid, &doc)?;
            created += 1;
        }

        if get_typed::<Account>(db, ACCOUNTS_COLLECTION, &user.username)?.is_none() {
            auth.register(&uid, &user.username, &password)?;
        }
    }

    if created > 0 {
        log::info!("seeded {} user documents", created);
    }
    Ok(())
}

/// Removes everything [`init_test_data`] creates. Follow state and feeds go with
/// the user documents.
pub fn reset_db_data(db: &dyn DocumentStore, app: &AppStore) -> Result<()> {
    for user in app.users() {
        db.delete(crate::config::USERS_COLLECTION, &user.id.to_string())?;
        db.delete(ACCOUNTS_COLLECTION, &user.username)?;
    }
    Ok(())
}
