use html_escape::{encode_double_quoted_attribute, encode_text};
use rust_embed::RustEmbed;

use crate::core::errors::{AppError, Result};
use crate::models::models::{Mode, Post};
use crate::router::path_for;
use crate::store::AppStore;

#[derive(RustEmbed)]
#[folder = "templates"]
struct Templates;

fn template(name: &str) -> Result<String> {
    let file = Templates::get(name)
        .ok_or_else(|| AppError::NotFound("template".to_string(), name.to_string()))?;
    String::from_utf8(file.data.to_vec())
        .map_err(|e| AppError::Validation(format!("template {} is not utf-8: {}", name, e)))
}

/// Substitutes every placeholder in one pass over `template`, so text inserted
/// for one placeholder is never scanned for another. The longest key wins when
/// two start at the same offset.
fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut html = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = slots
            .iter()
            .filter_map(|&(key, value)| rest.find(key).map(|at| (at, key, value)))
            .min_by_key(|&(at, key, _)| (at, std::cmp::Reverse(key.len())));

        match next {
            Some((at, key, value)) => {
                html.push_str(&rest[..at]);
                html.push_str(value);
                rest = &rest[at + key.len()..];
            }
            None => {
                html.push_str(rest);
                return html;
            }
        }
    }
}

fn session_banner(app: &AppStore) -> String {
    let session = app.session();
    if !session.is_logged_in {
        return r#"<a href="/login">Log in</a>"#.to_string();
    }

    let name = encode_text(&session.current_user);
    let profile_href = app
        .get_user_by_username(&session.current_user)
        .and_then(|user| path_for("user", &[("id", user.id.to_string().as_str())]));
    match profile_href {
        Some(href) => format!(
            r#"<span class="session">Signed in as <a href="{}">{}</a></span>"#,
            encode_double_quoted_attribute(&href),
            name
        ),
        None => format!(r#"<span class="session">Signed in as {}</span>"#, name),
    }
}

fn layout(app: &AppStore, title: &str, content: &str) -> Result<String> {
    let title = encode_text(title);
    let banner = session_banner(app);
    Ok(fill(
        &template("layout.html")?,
        &[
            ("PAGE_TITLE", &*title),
            ("SESSION_BANNER", banner.as_str()),
            ("PAGE_CONTENT", content),
        ],
    ))
}

fn render_post(post: &Post) -> String {
    let author_id = post.user_id.to_string();
    let author_href = path_for("user", &[("id", author_id.as_str())]).unwrap_or_default();
    format!(
        r#"<article class="post" data-post-id="{id}">
  <a class="post-author" href="{href}">{author}</a>
  <time datetime="{date}T{time}">{date} {time}</time>
  <p class="post-content">{content}</p>
</article>"#,
        id = post.id,
        href = encode_double_quoted_attribute(&author_href),
        author = encode_text(&post.username),
        date = post.date.format("%Y-%m-%d"),
        time = post.time.format("%H:%M:%S"),
        content = encode_text(&post.content),
    )
}

fn render_posts<'p>(posts: impl IntoIterator<Item = &'p Post>) -> String {
    let rendered: Vec<String> = posts.into_iter().map(render_post).collect();
    if rendered.is_empty() {
        r#"<p class="empty">No posts yet.</p>"#.to_string()
    } else {
        rendered.join("\n")
    }
}

pub fn render_home(app: &AppStore) -> Result<String> {
    let content = format!(
        "<h1>Latest posts</h1>\n<section class=\"posts\">\n{}\n</section>",
        render_posts(app.posts_newest_first())
    );
    layout(app, "Home", &content)
}

/// `None` when no user has that id.
pub fn render_user_profile(app: &AppStore, user_id: u32) -> Result<Option<String>> {
    let user = match app.get_user_by_id(user_id) {
        Some(u) => u,
        None => return Ok(None),
    };

    // Follow controls only make sense on someone else's profile.
    let actions = if app.is_logged_in() && app.is_viewing_another_user() {
        format!(
            r#"<div class="profile-actions"><button class="follow" data-target-user-id="{}">Follow</button></div>"#,
            user.id
        )
    } else {
        String::new()
    };

    let user_id = user.id.to_string();
    let username = encode_text(&user.username);
    let posts_count = user.posts_count.to_string();
    let following_count = user.following_count.to_string();
    let followers_count = user.followers_count.to_string();
    let posts = render_posts(app.get_posts_by_user(user.id));
    let content = fill(
        &template("profile.html")?,
        &[
            ("PROFILE_USER_ID", user_id.as_str()),
            ("PROFILE_USERNAME", &*username),
            ("PROFILE_POSTS_COUNT", posts_count.as_str()),
            ("PROFILE_FOLLOWING_COUNT", following_count.as_str()),
            ("PROFILE_FOLLOWERS_COUNT", followers_count.as_str()),
            ("PROFILE_ACTIONS", actions.as_str()),
            ("PROFILE_POSTS", posts.as_str()),
        ],
    );

    layout(app, &user.username, &content).map(Some)
}

pub fn render_login(app: &AppStore) -> Result<String> {
    if app.is_logged_in() {
        let content = format!(
            "<section class=\"login\"><p>You are signed in as {}.</p></section>",
            encode_text(app.current_user())
        );
        return layout(app, "Log in", &content);
    }

    let (title, submit, alt) = match app.mode() {
        Mode::Login => ("Log in", "Log in", "New here? Sign up instead."),
        Mode::Signup => ("Sign up", "Create account", "Already have an account? Log in."),
    };
    let content = fill(
        &template("login.html")?,
        &[("LOGIN_TITLE", title), ("LOGIN_SUBMIT", submit), ("LOGIN_ALT", alt)],
    );
    layout(app, title, &content)
}

pub fn render_archives(app: &AppStore) -> Result<String> {
    let mut content = String::from("<h1>Archives</h1>\n");
    for (month, posts) in app.archives() {
        content.push_str(&format!(
            "<section class=\"archive\" id=\"{month}\">\n<h2>{month}</h2>\n{}\n</section>\n",
            render_posts(posts),
            month = encode_double_quoted_attribute(&month),
        ));
    }
    layout(app, "Archives", &content)
}
