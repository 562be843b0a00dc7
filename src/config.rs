pub const USERS_COLLECTION: &str = "users";
pub const ACCOUNTS_COLLECTION: &str = "accounts";
pub const TOKENS_COLLECTION: &str = "tokens";

pub const MIN_PASSWORD_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 254;

pub fn token_expiration_hours() -> i64 {
    std::env::var("KEEBS_TOKEN_EXPIRATION_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(24)
}

pub fn bind_addr() -> String {
    std::env::var("KEEBS_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
}

/// Label of the Spin key-value store backing documents.
pub fn kv_store_label() -> String {
    std::env::var("KEEBS_KV_STORE").unwrap_or_else(|_| "default".to_string())
}

pub fn seed_password() -> String {
    std::env::var("KEEBS_SEED_PASSWORD").unwrap_or_else(|_| "keyboard".to_string())
}

pub fn document_key(collection: &str, id: &str) -> String {
    format!("{}:{}", collection, id)
}
