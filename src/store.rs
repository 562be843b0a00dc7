//! Client-side application state: the user and post fixtures, the login
//! session, and the view flags the pages read.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use crate::models::models::{Mode, Post, Session, User};

#[derive(Debug, Clone)]
pub struct AppStore {
    users: Vec<User>,
    posts: Vec<Post>,
    session: Session,
    mode: Mode,
    viewing_user: String,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new(fixture_users(), fixture_posts())
    }
}

impl AppStore {
    pub fn new(users: Vec<User>, posts: Vec<Post>) -> Self {
        Self {
            users,
            posts,
            session: Session::default(),
            mode: Mode::default(),
            viewing_user: String::new(),
        }
    }

    // === Actions ===

    pub fn login(&mut self, username: &str) {
        self.session.current_user = username.to_string();
        self.session.is_logged_in = true;
    }

    pub fn logout(&mut self) {
        self.session.current_user.clear();
        self.session.is_logged_in = false;
    }

    pub fn toggle_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn set_viewing_user(&mut self, username: &str) {
        self.viewing_user = username.to_string();
    }

    /// Returns false when no user has that id.
    pub fn increment_following(&mut self, user_id: u32) -> bool {
        self.user_mut(user_id)
            .map(|u| u.following_count += 1)
            .is_some()
    }

    pub fn increment_followers(&mut self, user_id: u32) -> bool {
        self.user_mut(user_id)
            .map(|u| u.followers_count += 1)
            .is_some()
    }

    pub fn decrement_following(&mut self, user_id: u32) -> bool {
        self.user_mut(user_id)
            .map(|u| u.following_count = u.following_count.saturating_sub(1))
            .is_some()
    }

    pub fn decrement_followers(&mut self, user_id: u32) -> bool {
        self.user_mut(user_id)
            .map(|u| u.followers_count = u.followers_count.saturating_sub(1))
            .is_some()
    }

    /// Replaces the whole fixture set; the only way posts change at runtime.
    pub fn replace(&mut self, users: Vec<User>, posts: Vec<Post>) {
        self.users = users;
        self.posts = posts;
    }

    fn user_mut(&mut self, user_id: u32) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }

    // === Getters ===

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in
    }

    pub fn current_user(&self) -> &str {
        &self.session.current_user
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn get_posts_by_user(&self, user_id: u32) -> Vec<&Post> {
        self.posts.iter().filter(|p| p.user_id == user_id).collect()
    }

    pub fn get_user_by_id(&self, id: u32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn get_user_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn get_post_by_id(&self, id: u32) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn is_login(&self) -> bool {
        self.mode == Mode::Login
    }

    pub fn is_viewing_another_user(&self) -> bool {
        !self.viewing_user.is_empty()
    }

    pub fn posts_newest_first(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.iter().collect();
        posts.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
        posts
    }

    /// Posts grouped by `YYYY-MM`, newest month first, newest post first within a month.
    pub fn archives(&self) -> Vec<(String, Vec<&Post>)> {
        let mut months: BTreeMap<String, Vec<&Post>> = BTreeMap::new();
        for post in self.posts_newest_first() {
            months
                .entry(post.date.format("%Y-%m").to_string())
                .or_default()
                .push(post);
        }
        months.into_iter().rev().collect()
    }
}

fn user(id: u32, username: &str, posts: u32, following: u32, followers: u32) -> User {
    User {
        id,
        username: username.to_string(),
        posts_count: posts,
        following_count: following,
        followers_count: followers,
    }
}

fn post(id: u32, username: &str, user_id: u32, date: (i32, u32, u32), time: (u32, u32, u32), content: &str) -> Post {
    Post {
        id,
        username: username.to_string(),
        user_id,
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap_or_default(),
        time: NaiveTime::from_hms_opt(time.0, time.1, time.2).unwrap_or_default(),
        content: content.to_string(),
    }
}

pub fn fixture_users() -> Vec<User> {
    vec![
        user(1, "capslover@gmail.com", 3, 10, 5),
        user(2, "typefan@gmail.com", 3, 5, 8),
        user(3, "switchmaster@gmail.com", 2, 7, 12),
        user(4, "keysetqueen@gmail.com", 2, 15, 20),
        user(5, "test@example.com", 1, 3, 4),
    ]
}

pub fn fixture_posts() -> Vec<Post> {
    vec![
        post(1, "capslover@gmail.com", 1, (2025, 7, 11), (6, 3, 32),
            "Just finished building my dream keyboard with holy pandas!"),
        post(2, "typefan@gmail.com", 2, (2025, 7, 10), (7, 18, 58),
            "Finally lubed all my switches. Feels so smooth!"),
        post(3, "capslover@gmail.com", 1, (2025, 7, 9), (12, 0, 0),
            "Swapped in some new keycaps today. Loving the new look!"),
        post(4, "switchmaster@gmail.com", 3, (2025, 7, 8), (15, 20, 0),
            "Tried a new spring swap mod today. Game changer!"),
        post(5, "keysetqueen@gmail.com", 4, (2025, 7, 7), (10, 45, 0),
            "Designed a new artisan keycap set. Pre-orders open soon!"),
        post(6, "typefan@gmail.com", 2, (2025, 7, 6), (9, 30, 0),
            "Exploring different plate materials this week."),
        post(7, "test@example.com", 5, (2025, 7, 5), (14, 15, 0),
            "Built a macro pad with OLED screen. Super fun project!"),
        post(8, "keysetqueen@gmail.com", 4, (2025, 7, 4), (11, 0, 0),
            "Working on new desk mat designs to match my keysets."),
        post(9, "switchmaster@gmail.com", 3, (2025, 7, 3), (17, 0, 0),
            "Added foam mod to my board. Feels and sounds amazing!"),
        post(10, "typefan@gmail.com", 2, (2025, 7, 2), (8, 0, 0),
            "Finally finished my keycap collection display wall!"),
    ]
}
