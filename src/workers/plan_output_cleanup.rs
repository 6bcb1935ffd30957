use chrono::{Duration, Utc};

use crate::config::LibraryConfig;
use crate::store::Store;

/// 删除超过保留期的方案输出目录，并清掉记录上的目录指针。
/// 方案记录本身保留，只回收磁盘。
pub async fn run(store: &Store, library: &LibraryConfig, retention_days: i64) {
    tracing::debug!(retention_days, "plan_output_cleanup: start");

    let cutoff = Utc::now() - Duration::days(retention_days);
    let stale = match store.list_plans_with_stale_output(cutoff) {
        Ok(stale) => stale,
        Err(e) => {
            tracing::error!(error=%e, "plan_output_cleanup: listing failed");
            return;
        }
    };

    let mut cleaned = 0u32;
    for mut record in stale {
        let Some(output_dir) = record.output_dir.take() else {
            continue;
        };

        // 只清理方案输出根目录下的路径，目录指针被手工改挂到别处时拒绝删除
        if !output_dir.starts_with(&library.plan_output_dir) {
            tracing::warn!(
                plan_id = %record.id,
                output_dir,
                "输出目录不在方案输出根目录下，跳过删除"
            );
            continue;
        }

        match tokio::fs::remove_dir_all(&output_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(plan_id = %record.id, error=%e, "删除方案输出目录失败");
                continue;
            }
        }

        if let Err(e) = store.update_plan(&record) {
            tracing::error!(plan_id = %record.id, error=%e, "更新方案记录失败");
            continue;
        }
        cleaned += 1;
    }

    tracing::info!(cleaned, "plan_output_cleanup: done");
}
