//! Pool configuration mapping; no database needed.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use instalens_core::{AppConfig, Environment};
use instalens_db::PoolConfig;

fn app_config(max: u32, min: u32) -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_owned(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5000),
        log_level: "info".to_owned(),
        db_max_connections: max,
        db_min_connections: min,
        db_acquire_timeout_secs: 9,
        scraper_cookies_path: PathBuf::from("./cookies.json"),
        scraper_request_timeout_secs: 30,
        scraper_user_agent: "ua".to_owned(),
        scraper_max_retries: 2,
        scraper_retry_backoff_base_ms: 1000,
        gemini_api_key: None,
        gemini_model: "gemini-2.5-flash".to_owned(),
        gemini_request_timeout_secs: 60,
        freshness_hours: 24,
        sweep_cron: "0 */10 * * * *".to_owned(),
    }
}

#[test]
fn pool_config_follows_app_config() {
    let pool_config = PoolConfig::from_app_config(&app_config(42, 7));
    assert_eq!(
        pool_config,
        PoolConfig {
            max_connections: 42,
            min_connections: 7,
            acquire_timeout: Duration::from_secs(9),
        }
    );
}

#[test]
fn min_connections_never_exceed_max() {
    let pool_config = PoolConfig::from_app_config(&app_config(2, 5));
    assert_eq!(pool_config.min_connections, 2);
}
