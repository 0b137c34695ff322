use anyhow::Result;
use tracing::{info, warn};

use crate::artifacts::{ArtifactPaths, digest_artifact};
use crate::cli::StatusArgs;
use crate::store::HistoryStore;
use crate::util::resolve_db_path;

pub fn run(args: StatusArgs) -> Result<()> {
    let paths = ArtifactPaths::resolve(&args.storage_root, &args.run_id)?;
    info!(run_id = %args.run_id, run_dir = %paths.run_dir.display(), "status requested");

    let mut missing = 0usize;
    for (role, path) in paths.labelled() {
        if path.is_file() {
            let digest = digest_artifact(role, path)?;
            info!(
                role,
                path = %digest.path,
                bytes = digest.bytes,
                sha256 = %digest.sha256,
                "artifact present"
            );
        } else {
            missing += 1;
            warn!(role, path = %path.display(), "artifact missing");
        }
    }

    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_ref());
    if db_path.exists() {
        let store = HistoryStore::open(&db_path)?;
        match store.recent_runs(Some(&args.run_id), 1)?.first() {
            Some(latest) => info!(
                generated_at = %latest.generated_at,
                failed_metrics = latest.failed_count,
                model_config_checksum = %latest.model_config_checksum,
                "latest stored report"
            ),
            None => info!(path = %db_path.display(), "no stored reports for run"),
        }
    } else {
        warn!(path = %db_path.display(), "history database missing");
    }

    let ready = missing == 0;
    info!(
        run_id = %args.run_id,
        ready,
        missing_artifacts = missing,
        "status completed"
    );
    Ok(())
}
