#[cfg(not(target_arch = "wasm32"))]
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    keebs::server::run(&keebs::config::bind_addr()).await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
