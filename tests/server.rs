use std::net::TcpListener;

use keebs::config::seed_password;
use keebs::server::{build_server, native_context};
use serde_json::json;

fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    let ctx = native_context().expect("seeded context");
    let server = build_server(ctx, listener).expect("server");
    actix_web::rt::spawn(server);
    format!("http://{}", addr)
}

#[actix_web::test]
async fn test_full_follow_flow_over_http() {
    let base_url = spawn_server();
    let client = reqwest::Client::new();

    // 1. Login
    let login_resp = client
        .post(format!("{}/login", base_url))
        .json(&json!({ "username": "test@example.com", "password": seed_password() }))
        .send()
        .await
        .expect("Failed to login");
    assert_eq!(login_resp.status(), 200);
    let token_data = login_resp.json::<serde_json::Value>().await.unwrap();
    assert_eq!(token_data["user_id"], "5");
    let token = token_data["token"].as_str().unwrap().to_string();

    // 2. Follow
    let follow_resp = client
        .post(format!("{}/follow", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "target_user_id": "1" }))
        .send()
        .await
        .expect("Failed to follow");
    assert_eq!(follow_resp.status(), 200);

    // 3. Feed carries the followed user's posts
    let feed = client
        .get(format!("{}/feed", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to fetch feed")
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap();
    let authors: Vec<&str> = feed.iter().map(|p| p["username"].as_str().unwrap()).collect();
    assert_eq!(authors, vec!["capslover@gmail.com", "capslover@gmail.com"]);

    // 4. Follower list
    let followers = client
        .get(format!("{}/followers/1", base_url))
        .send()
        .await
        .unwrap()
        .json::<Vec<String>>()
        .await
        .unwrap();
    assert_eq!(followers, vec!["5".to_string()]);

    // 5. Profile page reflects the new follower count
    let profile = client
        .get(format!("{}/users/1", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(profile.status(), 200);
    assert!(profile.text().await.unwrap().contains(">6</span> followers"));
}

#[actix_web::test]
async fn test_follow_without_token_is_unauthorized() {
    let base_url = spawn_server();
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/follow", base_url))
        .json(&json!({ "target_user_id": "1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body = resp.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
}

#[actix_web::test]
async fn test_unsupported_method_is_bad_request() {
    let base_url = spawn_server();
    let client = reqwest::Client::new();

    let resp = client
        .request(reqwest::Method::TRACE, format!("{}/", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
