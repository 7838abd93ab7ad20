use anyhow::{bail, Result};
use camino::Utf8Path;
use gistsync_core::{ChangeState, Visibility};
use gistsync_pipeline::{
    BatchEntry, CheckReport, DefaultSyncEngine, InitOutcome, PullReport, PushOutcome, SyncError,
    SyncOutcome, SyncReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_sync_report(report: &SyncReport) {
    match &report.outcome {
        SyncOutcome::UpToDate => {
            println!("   gist {}: nothing was changed since last sync", report.gist_id)
        }
        SyncOutcome::Pushed(push) => println!(
            "   gist {}: pushed {} files (+{} -{})",
            push.gist_id,
            push.files,
            push.added.len(),
            push.removed.len()
        ),
        SyncOutcome::Pulled(pull) => {
            println!("   gist {}: pulled {} files", pull.gist_id, pull.files)
        }
    }
}

/// Count failures of a batch, printing one line per directory.
fn summarize<T>(entries: &[BatchEntry<T>], describe: impl Fn(&T) -> String) -> usize {
    let mut failed = 0;
    for entry in entries {
        match &entry.result {
            Ok(value) => println!("   {}: {}", entry.dir, describe(value)),
            Err(e) => {
                failed += 1;
                println!("   {}: FAILED: {}", entry.dir, e);
            }
        }
    }
    failed
}

pub async fn cmd_init(engine: &DefaultSyncEngine, parent: &Utf8Path, query: &str) -> Result<PullReport> {
    println!(":: Initializing gist '{}'", query);
    let pb = spinner("Resolving gist...".into());
    let result = engine.init(parent, query).await;
    pb.finish_and_clear();

    let report = result?;
    println!("   Pulled {} files into {}", report.files, report.dir);
    Ok(report)
}

pub async fn cmd_init_all(
    engine: &DefaultSyncEngine,
    parent: &Utf8Path,
) -> Result<Vec<BatchEntry<InitOutcome>>> {
    println!(":: Initializing every gist under {}", parent);
    let pb = spinner("Fetching gists...".into());
    let result = engine.init_all(parent).await;
    pb.finish_and_clear();

    let entries = result?;
    let failed = summarize(&entries, |outcome| match outcome {
        InitOutcome::Pulled(p) => format!("pulled {} files", p.files),
        InitOutcome::AlreadySynced => "already synced, skipped".to_string(),
    });
    if failed > 0 {
        bail!("{} of {} gists failed to initialize", failed, entries.len());
    }
    Ok(entries)
}

/// Sync `dir`, or each synced subdirectory when `dir` itself is not synced.
pub async fn cmd_sync(engine: &DefaultSyncEngine, dir: &Utf8Path) -> Result<Vec<SyncReport>> {
    println!(":: Synchronizing {}", dir);

    if engine.is_synced(dir) {
        let pb = spinner("Comparing with remote...".into());
        let result = engine.sync(dir).await;
        pb.finish_and_clear();
        let report = result?;
        print_sync_report(&report);
        return Ok(vec![report]);
    }

    let pb = spinner("Synchronizing subdirectories...".into());
    let result = engine.sync_all(dir).await;
    pb.finish_and_clear();

    let entries = result?;
    if entries.is_empty() {
        return Err(SyncError::NotASyncedDirectory(dir.to_owned()).into());
    }
    let failed = summarize(&entries, |report| match &report.outcome {
        SyncOutcome::UpToDate => "nothing changed".to_string(),
        SyncOutcome::Pushed(p) => format!("pushed {} files", p.files),
        SyncOutcome::Pulled(p) => format!("pulled {} files", p.files),
    });
    if failed > 0 {
        bail!("{} of {} directories failed to sync", failed, entries.len());
    }
    Ok(entries.into_iter().filter_map(|e| e.result.ok()).collect())
}

pub async fn cmd_push(engine: &DefaultSyncEngine, dir: &Utf8Path, public: bool) -> Result<PushOutcome> {
    println!(":: Pushing {}", dir);
    let pb = spinner("Uploading...".into());
    let result = engine.push(dir, Visibility::from_public_flag(public)).await;
    pb.finish_and_clear();

    let outcome = result?;
    match &outcome {
        PushOutcome::Updated(report) => {
            for name in &report.added {
                println!("   + {}", name);
            }
            for name in &report.removed {
                println!("   - {}", name);
            }
            println!("   gist {}: pushed {} files", report.gist_id, report.files);
        }
        PushOutcome::Created(report) => println!(
            "   Created {} gist {} ({} files): {}",
            if report.visibility.is_public() { "public" } else { "private" },
            report.gist_id,
            report.files,
            report.html_url
        ),
    }
    Ok(outcome)
}

pub async fn cmd_pull(engine: &DefaultSyncEngine, dir: &Utf8Path) -> Result<PullReport> {
    println!(":: Pulling into {}", dir);
    let pb = spinner("Downloading...".into());
    let result = engine.pull(dir).await;
    pb.finish_and_clear();

    let report = result?;
    println!("   gist {}: pulled {} files", report.gist_id, report.files);
    Ok(report)
}

pub async fn cmd_check(engine: &DefaultSyncEngine, dir: &Utf8Path) -> Result<CheckReport> {
    println!(":: Checking {}", dir);
    let pb = spinner("Comparing with remote...".into());
    let result = engine.check(dir).await;
    pb.finish_and_clear();

    let report = result?;
    println!("   gist {}: {}", report.gist_id, report.state);
    if report.state != ChangeState::NoChange {
        for name in &report.diff.added {
            println!("   added:    {}", name);
        }
        for name in &report.diff.modified {
            println!("   modified: {}", name);
        }
        for name in &report.diff.removed {
            println!("   removed:  {}", name);
        }
    }
    Ok(report)
}
