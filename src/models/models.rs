use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u32,
    pub username: String,
    pub posts_count: u32,
    pub following_count: u32,
    pub followers_count: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u32,
    pub username: String,
    pub user_id: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub content: String,
}

/// Client-side login state. Never reconciled with the auth backend.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_logged_in: bool,
    pub current_user: String,
}

/// Which form the login view shows.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Login,
    Signup,
}

/// Typed view of a `users/{uid}` document. Absent arrays read as empty.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UserDocument {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub posts: Vec<String>,
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default)]
    pub feed: Vec<String>,
}

/// Stored under `accounts/{email}`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Account {
    pub uid: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

#[derive(Serialize, Deserialize)]
pub struct TokenData {
    pub uid: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FollowOutcome {
    pub success: bool,
    /// Whether the edge was created (follow) or removed (unfollow) by this call.
    #[serde(skip)]
    pub changed: bool,
}

pub type Followings = Vec<String>;
pub type Followers = Vec<String>;
