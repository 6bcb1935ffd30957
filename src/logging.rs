use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

/// 初始化 tracing：stdout 始终开启，按需叠加按天滚动的 JSON 文件日志。
/// 全局 subscriber 已存在时静默返回（测试环境多次初始化属正常）。
pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);
    let registry = Registry::default().with(env_filter).with(stdout_layer);

    let init_result = if config.enable_file_logs {
        let file_layer = fmt::layer()
            .with_writer(build_file_appender(&config.log_dir))
            .with_ansi(false)
            .json();
        registry.with(file_layer).try_init()
    } else {
        registry.try_init()
    };

    if let Err(e) = init_result {
        let msg = e.to_string();
        if !msg.contains("already been set") {
            panic!("Failed to initialize tracing: {e}");
        }
    }
}

fn build_file_appender(log_dir: &str) -> RollingFileAppender {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("clinic-backend")
        .filename_suffix("log")
        .max_log_files(30)
        .build(log_dir)
        .expect("Failed to create rolling file appender")
}
