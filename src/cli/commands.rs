use std::process::ExitCode;

use chrono::NaiveDate;

use crate::app::{AppContext, Result};
use crate::archive::DATE_FORMAT;
use crate::fetcher::pool::RunReport;

/// One mirror pass: fetch every catalog URL, archive what changed and save
/// the metadata store, even when some tasks failed.
pub async fn mirror(ctx: &AppContext, date: NaiveDate) -> Result<RunReport> {
    let tasks = ctx.catalog.prepare_tasks(&ctx.root)?;

    tracing::info!(
        tasks = tasks.len(),
        workers = ctx.pool.workers(),
        date = %date.format(DATE_FORMAT),
        "Starting mirror run"
    );

    let report = ctx
        .pool
        .run_all(tasks, ctx.store.clone(), date)
        .await;

    ctx.store.persist()?;

    tracing::info!(
        downloaded = report.downloaded,
        unchanged = report.unchanged,
        failed = report.failed,
        "Mirror run complete"
    );

    Ok(report)
}

pub fn exit_code(report: &RunReport) -> ExitCode {
    if report.had_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

pub fn list_sources(ctx: &AppContext) -> Result<()> {
    if ctx.catalog.is_empty() {
        println!("No sources");
        return Ok(());
    }

    for (dir, urls) in ctx.catalog.directories() {
        println!("{}/", dir);
        for url in urls {
            if !ctx.store.contains(url) {
                println!("  {} (never fetched)", url);
                continue;
            }
            let meta = ctx.store.get(url);
            println!("  {}", url);
            if let Some(etag) = meta.etag {
                println!("    etag: {}", etag);
            }
            if let Some(last_modified) = meta.last_modified {
                println!("    last-modified: {}", last_modified);
            }
        }
    }

    Ok(())
}
