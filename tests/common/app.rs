use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use tempfile::TempDir;
use tokio::sync::broadcast;

use clinic_backend::auth::hash_password;
use clinic_backend::config::{
    BootstrapConfig, Config, LibraryConfig, RateLimitConfig, WorkerConfig,
};
use clinic_backend::routes::build_router;
use clinic_backend::state::AppState;
use clinic_backend::store::operations::users::{Role, User};
use clinic_backend::store::Store;

pub const TEST_PASSWORD: &str = "Passw0rd!";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn item_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.library.item_dir)
    }

    /// 往题库目录写一批可索引的题目文件
    pub fn seed_item_files(&self, names: &[String]) {
        for name in names {
            std::fs::write(self.item_dir().join(name), b"item").expect("write item file");
        }
    }
}

fn seed_user(store: &Store, username: &str, role: Role, center: &str) {
    let now = Utc::now();
    store
        .create_user(&User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            display_name: format!("{username}本人"),
            role,
            training_center: center.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hash test password"),
            created_at: now,
            updated_at: now,
            failed_login_count: 0,
            locked_until: None,
        })
        .expect("seed user");
}

async fn spawn_with_limits(api_limit: u64) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("clinic-test.sled");
    let item_dir = temp_dir.path().join("items");
    let plan_output_dir = temp_dir.path().join("plans");
    std::fs::create_dir_all(&item_dir).expect("item dir");
    std::fs::create_dir_all(&plan_output_dir).expect("plan output dir");

    // 直接构造 Config，避免使用 set_var 造成多线程测试环境变量竞态
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
        worker: WorkerConfig {
            is_leader: false,
            plan_retention_days: 30,
        },
        library: LibraryConfig {
            item_dir: item_dir.to_string_lossy().to_string(),
            plan_output_dir: plan_output_dir.to_string_lossy().to_string(),
        },
        bootstrap: BootstrapConfig {
            admin_username: "admin".to_string(),
            admin_password: TEST_PASSWORD.to_string(),
        },
    };

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    seed_user(&store, "admin", Role::Admin, "总部");
    seed_user(&store, "principal1", Role::Principal, "东区");
    seed_user(&store, "assessor1", Role::Assessor, "东区");
    seed_user(&store, "assessor2", Role::Assessor, "西区");
    seed_user(&store, "teacher1", Role::Teacher, "东区");

    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(store, &config, shutdown_tx);

    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with_limits(10_000).await
}
