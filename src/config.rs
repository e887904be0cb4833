use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:8000"),
        search_base_url: get_env_or_default("SEARCH_BASE_URL", "https://search.brave.com"),
        request_timeout_secs: get_env_or_default("REQUEST_TIMEOUT_SECS", "10")
            .parse()
            .unwrap_or(10),
    }
});

pub struct Config {
    pub bind_addr: String,
    pub search_base_url: String,
    pub request_timeout_secs: u64,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
