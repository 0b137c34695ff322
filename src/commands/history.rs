use anyhow::{Result, bail};
use tracing::info;

use crate::cli::HistoryArgs;
use crate::metrics::title_case;
use crate::store::HistoryStore;
use crate::util::{resolve_db_path, write_json_stdout};

pub fn run(args: HistoryArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_ref());
    if !db_path.exists() {
        bail!("history database not found: {}", db_path.display());
    }

    let store = HistoryStore::open(&db_path)?;
    let runs = store.recent_runs(args.run_id.as_deref(), args.limit)?;
    info!(path = %db_path.display(), runs = runs.len(), "loaded report history");

    if args.json {
        return write_json_stdout(&runs);
    }

    for run in &runs {
        println!(
            "{} {} (failed: {}, {} ms)",
            run.generated_at, run.run_id, run.failed_count, run.duration_ms
        );
        for score in &run.scores {
            let value = score
                .score
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| "inf".to_string());
            println!("  {}: {value} [{}]", title_case(&score.key), score.status);
        }
    }

    Ok(())
}
