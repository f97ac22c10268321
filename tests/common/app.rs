use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use quizforge_backend::config::{Config, GeneratorConfig, RateLimitConfig};
use quizforge_backend::routes::build_router;
use quizforge_backend::services::generator::QuestionGenerator;
use quizforge_backend::state::AppState;
use quizforge_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

async fn spawn_with_limits(api_limit: u64) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("quizforge-test.sled");

    // Construct the Config directly; set_var would race across parallel tests.
    let test_secret = format!("integration-test-jwt-secret-{}", uuid::Uuid::new_v4());

    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        jwt_secret: test_secret,
        jwt_expires_in_hours: 24,
        cors_origin: "http://localhost:5173".to_string(),
        trust_proxy: false,
        rate_limit: RateLimitConfig {
            window_secs: 60,
            max_requests: api_limit,
        },
        generator: GeneratorConfig {
            enabled: false,
            mock: true,
            api_url: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
        },
    };

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let generator = Arc::new(QuestionGenerator::new(&config.generator));

    let state = AppState::new(store, generator, &config);

    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with_limits(500).await
}

#[allow(dead_code)]
pub async fn spawn_test_app_with_limit(api_limit: u64) -> TestApp {
    spawn_with_limits(api_limit).await
}
