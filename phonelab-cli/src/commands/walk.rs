//! `phonelab walk` command handler

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use phonelab_logfile::{
    DirectoryFailure, DirectoryReport, DirectoryWalker, LogfileError, WalkConfig, parse_directory,
};

use crate::cli::WalkArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `walk` command.
///
/// Every dated directory is parsed by the stock handler. Returns
/// [`CliError::Partial`] after rendering when any file or directory failed.
pub async fn execute(
    args: WalkArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = super::load_walk_config(config_path)?;
    apply_args(&mut config, &args);
    config.validate()?;

    let walker = DirectoryWalker::new(config)?;

    if args.dry_run {
        let root = args.root.clone();
        let dirs = tokio::task::spawn_blocking(move || walker.discover(&root))
            .await
            .map_err(|e| CliError::Command(format!("discovery task failed: {e}")))??;
        let plan = WalkPlan {
            root: args.root.display().to_string(),
            directories: dirs,
        };
        writer.render(&plan)?;
        return Ok(());
    }

    let report = run(&walker, &args.root).await?;
    writer.render(&report)?;

    let failed = report.failed_files + report.failed_directories.len();
    if failed > 0 {
        return Err(CliError::Partial {
            failed,
            total: report.total_files + report.failed_directories.len(),
        });
    }
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_args(config: &mut WalkConfig, args: &WalkArgs) {
    if let Some(workers) = args.workers {
        config.max_concurrent_tasks = workers;
    }
    if args.no_sort {
        config.sort_records = false;
    }
}

/// Walk `root` and parse every dated directory, collecting per-directory reports.
pub async fn run(walker: &DirectoryWalker, root: &Path) -> Result<WalkReport, CliError> {
    info!(
        root = %root.display(),
        workers = walker.config().max_concurrent_tasks,
        "walking log tree"
    );

    let sort = walker.config().sort_records;
    let (tx, mut rx) = mpsc::unbounded_channel::<DirectoryReport>();
    let handler = Arc::new(move |dir: &Path| -> Result<(), LogfileError> {
        let report = parse_directory(dir, sort)?;
        tx.send(report)
            .map_err(|e| LogfileError::Task(format!("report channel closed: {e}")))
    });

    let summary = walker.walk(root, handler).await?;

    let mut directories = Vec::with_capacity(summary.succeeded);
    while let Ok(report) = rx.try_recv() {
        directories.push(report);
    }
    directories.sort_by(|a, b| a.dir.cmp(&b.dir));

    let total_files: usize = directories.iter().map(|d| d.files.len()).sum();
    let failed_files: usize = directories.iter().map(DirectoryReport::failed_files).sum();
    let total_records: usize = directories.iter().map(DirectoryReport::total_records).sum();

    info!(
        directories = summary.dispatched,
        files = total_files,
        records = total_records,
        "walk finished"
    );

    Ok(WalkReport {
        root: root.to_path_buf(),
        dispatched: summary.dispatched,
        total_files,
        failed_files,
        total_records,
        directories,
        failed_directories: summary.failures,
        walk_errors: summary.walk_errors,
    })
}

/// Aggregated result of a walk.
#[derive(Serialize)]
pub struct WalkReport {
    /// Walk root
    pub root: PathBuf,
    /// Dated directories dispatched
    pub dispatched: usize,
    /// Files attempted across all directories
    pub total_files: usize,
    /// Files that failed to parse
    pub failed_files: usize,
    /// Records parsed across all directories
    pub total_records: usize,
    /// Per-directory reports, sorted by path
    pub directories: Vec<DirectoryReport>,
    /// Directory tasks that failed outright
    pub failed_directories: Vec<DirectoryFailure>,
    /// Paths below the root that could not be read
    pub walk_errors: Vec<String>,
}

impl Render for WalkReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Walk: {}", self.root.display().to_string().bold())?;
        writeln!(w)?;

        for dir in &self.directories {
            let status = if dir.failed_files() == 0 {
                "OK".green()
            } else {
                "PARTIAL".yellow()
            };
            writeln!(
                w,
                "{:<8} {} ({} files, {} records)",
                status,
                dir.dir.display(),
                dir.files.len(),
                dir.total_records()
            )?;
            for file in dir.files.iter().filter(|f| !f.is_ok()) {
                let reason = file.error.as_deref().unwrap_or("unknown error");
                writeln!(w, "         {} {}", "x".red(), reason)?;
            }
        }

        for failure in &self.failed_directories {
            writeln!(
                w,
                "{:<8} {} {}",
                "FAILED".red().bold(),
                failure.dir.display(),
                failure.error
            )?;
        }

        for err in &self.walk_errors {
            writeln!(w, "{:<8} {}", "SKIPPED".yellow(), err)?;
        }

        writeln!(w)?;
        writeln!(
            w,
            "{} directories, {} files ({} failed), {} records",
            self.dispatched, self.total_files, self.failed_files, self.total_records
        )?;
        Ok(())
    }
}

/// Directories a walk would dispatch (`--dry-run`).
#[derive(Serialize)]
pub struct WalkPlan {
    /// Walk root
    pub root: String,
    /// Dated directories in discovery order
    pub directories: Vec<PathBuf>,
}

impl Render for WalkPlan {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Walk plan: {}", self.root.bold())?;
        for dir in &self.directories {
            writeln!(w, "  {}", dir.display())?;
        }
        writeln!(w, "{} directories", self.directories.len())?;
        Ok(())
    }
}
