use crate::config::USERS_COLLECTION;
use crate::core::db::{read_user_doc, DocumentStore, FieldUpdate};
use crate::core::errors::{AppError, FollowStep, Result};
use crate::models::models::{AuthUser, FollowOutcome, Followers, Followings, UserDocument};

fn at_step<T>(step: FollowStep, result: Result<T>) -> Result<T> {
    result.map_err(|source| AppError::FollowFailed { step, source: Box::new(source) })
}

fn checked_actor<'u>(current_user: Option<&'u AuthUser>, target_user_id: &str) -> Result<&'u AuthUser> {
    let current = current_user.ok_or(AppError::NotAuthenticated)?;
    if target_user_id.is_empty() {
        return Err(AppError::Validation("target user id required".to_string()));
    }
    if target_user_id == current.uid {
        return Err(AppError::Validation("cannot follow yourself".to_string()));
    }
    Ok(current)
}

fn read_target(db: &dyn DocumentStore, target_user_id: &str) -> Result<UserDocument> {
    read_user_doc(db, target_user_id)?
        .ok_or_else(|| AppError::NotFound(USERS_COLLECTION.to_string(), target_user_id.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Link,
    Unlink,
}

impl Edge {
    fn update(self, field: &str, values: Vec<String>) -> FieldUpdate {
        match self {
            Edge::Link => FieldUpdate::array_union(field, values),
            Edge::Unlink => FieldUpdate::array_remove(field, values),
        }
    }
}

/// Runs the three calls shared by follow and unfollow: read the target, update
/// the current user's `following`/`feed`, then the target's `followers`.
/// Nothing is rolled back when a later call fails.
///
/// `changed` compares against the target's `followers` as read in the first
/// call; a concurrent follow of the same pair between that read and the last
/// write can still report `changed` twice.
fn apply_edge(
    db: &dyn DocumentStore,
    current: &AuthUser,
    target_user_id: &str,
    edge: Edge,
) -> Result<FollowOutcome> {
    let target = at_step(FollowStep::ReadTarget, read_target(db, target_user_id))?;
    let was_follower = target.followers.contains(&current.uid);

    at_step(
        FollowStep::UpdateCurrentUser,
        db.update(
            USERS_COLLECTION,
            &current.uid,
            &[
                edge.update("following", vec![target_user_id.to_string()]),
                edge.update("feed", target.posts),
            ],
        ),
    )?;
    at_step(
        FollowStep::UpdateTarget,
        db.update(
            USERS_COLLECTION,
            target_user_id,
            &[edge.update("followers", vec![current.uid.clone()])],
        ),
    )?;

    let changed = match edge {
        Edge::Link => !was_follower,
        Edge::Unlink => was_follower,
    };
    Ok(FollowOutcome { success: true, changed })
}

/// Makes the signed-in user follow `target_user_id`.
///
/// The target and its posts are unioned into the current user's
/// `following`/`feed`, then the current user into the target's `followers`.
/// On failure the error names the step that failed; earlier writes stay.
pub fn follow_user(
    db: &dyn DocumentStore,
    current_user: Option<&AuthUser>,
    target_user_id: &str,
) -> Result<FollowOutcome> {
    let current = checked_actor(current_user, target_user_id)?;

    match apply_edge(db, current, target_user_id, Edge::Link) {
        Ok(outcome) => {
            log::info!("uid={} now follows uid={}", current.uid, target_user_id);
            Ok(outcome)
        }
        Err(err) => {
            log::error!("error following user {}: {}", target_user_id, err);
            Err(err)
        }
    }
}

/// Reverses [`follow_user`] with array removals.
pub fn unfollow_user(
    db: &dyn DocumentStore,
    current_user: Option<&AuthUser>,
    target_user_id: &str,
) -> Result<FollowOutcome> {
    let current = checked_actor(current_user, target_user_id)?;

    match apply_edge(db, current, target_user_id, Edge::Unlink) {
        Ok(outcome) => {
            log::info!("uid={} unfollowed uid={}", current.uid, target_user_id);
            Ok(outcome)
        }
        Err(err) => {
            log::error!("error unfollowing user {}: {}", target_user_id, err);
            Err(err)
        }
    }
}

pub fn get_followings(db: &dyn DocumentStore, user_id: &str) -> Result<Followings> {
    Ok(read_user_doc(db, user_id)?.map(|doc| doc.following).unwrap_or_default())
}

pub fn get_followers(db: &dyn DocumentStore, user_id: &str) -> Result<Followers> {
    Ok(read_user_doc(db, user_id)?.map(|doc| doc.followers).unwrap_or_default())
}

/// Post ids seeded into the user's feed by follows.
pub fn get_feed(db: &dyn DocumentStore, user_id: &str) -> Result<Vec<String>> {
    Ok(read_user_doc(db, user_id)?.map(|doc| doc.feed).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::{write_user_doc, Document, MemoryDocumentStore};
    use std::cell::Cell;

    fn me() -> AuthUser {
        AuthUser { uid: "1".into(), email: "capslover@gmail.com".into() }
    }

    fn seeded() -> MemoryDocumentStore {
        let db = MemoryDocumentStore::new();
        write_user_doc(&db, "1", &UserDocument {
            username: "capslover@gmail.com".into(),
            posts: vec!["1".into(), "3".into()],
            ..UserDocument::default()
        })
        .unwrap();
        write_user_doc(&db, "2", &UserDocument {
            username: "typefan@gmail.com".into(),
            posts: vec!["2".into(), "6".into(), "10".into()],
            ..UserDocument::default()
        })
        .unwrap();
        db
    }

    /// Delegates to a memory store and counts writes; optionally fails
    /// updates to one document.
    struct CountingStore {
        inner: MemoryDocumentStore,
        writes: Cell<usize>,
        reads: Cell<usize>,
        fail_update_of: Option<&'static str>,
    }

    impl CountingStore {
        fn new(inner: MemoryDocumentStore, fail_update_of: Option<&'static str>) -> Self {
            Self { inner, writes: Cell::new(0), reads: Cell::new(0), fail_update_of }
        }
    }

    impl DocumentStore for CountingStore {
        fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            self.reads.set(self.reads.get() + 1);
            self.inner.get(collection, id)
        }

        fn set(&self, collection: &str, id: &str, doc: Document) -> Result<()> {
            self.writes.set(self.writes.get() + 1);
            self.inner.set(collection, id, doc)
        }

        fn update(&self, collection: &str, id: &str, updates: &[FieldUpdate]) -> Result<()> {
            if self.fail_update_of == Some(id) {
                return Err(AppError::Storage("backend unavailable".into()));
            }
            self.writes.set(self.writes.get() + 1);
            self.inner.update(collection, id, updates)
        }

        fn delete(&self, collection: &str, id: &str) -> Result<()> {
            self.writes.set(self.writes.get() + 1);
            self.inner.delete(collection, id)
        }
    }

    #[test]
    fn follow_links_both_documents_and_seeds_feed() {
        let db = seeded();
        let outcome = follow_user(&db, Some(&me()), "2").unwrap();
        assert!(outcome.success);

        let mine = read_user_doc(&db, "1").unwrap().unwrap();
        assert_eq!(mine.following, vec!["2"]);
        assert_eq!(mine.feed, vec!["2", "6", "10"]);
        assert_eq!(get_followers(&db, "2").unwrap(), vec!["1"]);
    }

    #[test]
    fn following_twice_is_idempotent() {
        let db = seeded();
        follow_user(&db, Some(&me()), "2").unwrap();
        follow_user(&db, Some(&me()), "2").unwrap();

        assert_eq!(get_followings(&db, "1").unwrap(), vec!["2"]);
        assert_eq!(get_feed(&db, "1").unwrap().len(), 3);
        assert_eq!(get_followers(&db, "2").unwrap(), vec!["1"]);
    }

    #[test]
    fn unauthenticated_follow_touches_nothing() {
        let store = CountingStore::new(seeded(), None);
        let err = follow_user(&store, None, "2").unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));
        assert_eq!(store.reads.get(), 0);
        assert_eq!(store.writes.get(), 0);
    }

    #[test]
    fn self_follow_is_rejected_before_writes() {
        let store = CountingStore::new(seeded(), None);
        let err = follow_user(&store, Some(&me()), "1").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.writes.get(), 0);
    }

    #[test]
    fn missing_target_fails_at_read() {
        let store = CountingStore::new(seeded(), None);
        let err = follow_user(&store, Some(&me()), "404").unwrap_err();
        match err {
            AppError::FollowFailed { step, source } => {
                assert_eq!(step, FollowStep::ReadTarget);
                assert!(matches!(*source, AppError::NotFound(..)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.writes.get(), 0);
    }

    #[test]
    fn failure_on_target_write_leaves_first_write_in_place() {
        let store = CountingStore::new(seeded(), Some("2"));
        let err = follow_user(&store, Some(&me()), "2").unwrap_err();
        assert!(matches!(err, AppError::FollowFailed { step: FollowStep::UpdateTarget, .. }));

        assert_eq!(get_followings(&store.inner, "1").unwrap(), vec!["2"]);
        assert!(get_followers(&store.inner, "2").unwrap().is_empty());

        // Retrying completes the link and still counts as a new edge.
        let outcome = follow_user(&store.inner, Some(&me()), "2").unwrap();
        assert!(outcome.changed);
        assert_eq!(get_followers(&store.inner, "2").unwrap(), vec!["1"]);
    }

    #[test]
    fn changed_reports_only_new_or_removed_edges() {
        let db = seeded();
        assert!(follow_user(&db, Some(&me()), "2").unwrap().changed);
        assert!(!follow_user(&db, Some(&me()), "2").unwrap().changed);
        assert!(unfollow_user(&db, Some(&me()), "2").unwrap().changed);
        assert!(!unfollow_user(&db, Some(&me()), "2").unwrap().changed);
    }

    #[test]
    fn unfollow_reverses_follow() {
        let db = seeded();
        follow_user(&db, Some(&me()), "2").unwrap();
        unfollow_user(&db, Some(&me()), "2").unwrap();

        assert!(get_followings(&db, "1").unwrap().is_empty());
        assert!(get_feed(&db, "1").unwrap().is_empty());
        assert!(get_followers(&db, "2").unwrap().is_empty());
    }

    #[test]
    fn lists_for_unknown_user_are_empty() {
        let db = seeded();
        assert!(get_followings(&db, "77").unwrap().is_empty());
        assert!(get_followers(&db, "77").unwrap().is_empty());
    }
}
