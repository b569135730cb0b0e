use crate::core::{
    classifier::{classify, Classification},
    colors::{colorize_diff_line, format_change_line},
    config::{resolve_token, SyncConfig},
    coordinates::CoordinateOverrides,
    error::{GitSyncerError, Result},
    git::GitRepo,
    git_status::ChangeKind,
    github::GitHubClient,
    model::{BlobEncoding, LocalChangeSet, RenameMode},
    output::{print_info, print_notice, print_section_header, print_success},
    sync::{SyncOptions, SyncOutcome, SyncReport, SyncRun},
};
use clap::Args;
use colored::*;
use std::env;

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Repository name on the remote
    #[arg(short, long)]
    pub repo: String,

    /// Branch to commit onto
    #[arg(short, long)]
    pub branch: String,

    /// Account the sync runs as
    #[arg(short, long)]
    pub username: String,

    /// Repository owner (defaults to config, then the origin remote URL)
    #[arg(long)]
    pub owner: Option<String>,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Create the commit but leave the branch where it is
    #[arg(long)]
    pub no_update_ref: bool,

    /// Only sync changes recorded in the index
    #[arg(long)]
    pub staged_only: bool,

    /// Ignore new and untracked files
    #[arg(long)]
    pub skip_added: bool,

    #[arg(long, value_enum)]
    pub rename_mode: Option<RenameMode>,

    #[arg(long, value_enum)]
    pub encoding: Option<BlobEncoding>,

    /// Show what would be synced without contacting the remote
    #[arg(long)]
    pub dry_run: bool,

    /// Print the diff of every changed file
    #[arg(long)]
    pub show_diff: bool,
}

impl SyncArgs {
    /// Config values with command-line flags laid over them
    fn sync_options(&self, config: &SyncConfig) -> SyncOptions {
        let mut options = config.sync_options();

        if let Some(message) = &self.message {
            options.commit_message = message.clone();
        }
        if self.no_update_ref {
            options.update_ref = false;
        }
        if self.staged_only {
            options.classifier.staged_only = true;
        }
        if self.skip_added {
            options.classifier.include_added = false;
        }
        if let Some(mode) = self.rename_mode {
            options.overlay.rename_mode = mode;
        }
        if let Some(encoding) = self.encoding {
            options.classifier.encoding = encoding;
            options.overlay.encoding = encoding;
        }
        options.classifier.collect_diffs = self.show_diff;
        options
    }

    fn coordinate_overrides(&self, config: &SyncConfig) -> CoordinateOverrides {
        CoordinateOverrides {
            owner: self.owner.clone().or_else(|| config.default_owner.clone()),
            repo: Some(self.repo.clone()),
            branch: Some(self.branch.clone()),
        }
    }
}

pub async fn execute_sync(args: SyncArgs) -> Result<()> {
    let mut config = SyncConfig::load()?;
    let options = args.sync_options(&config);

    let current_dir = env::current_dir()?;
    let git_repo = GitRepo::open(&current_dir)?;

    let changes = match classify(&git_repo, &options.classifier)? {
        Classification::NoChanges => {
            print_notice("No changes to sync.");
            return Ok(());
        }
        Classification::Changes(changes) => changes,
    };

    print_change_set(&changes);
    if args.show_diff {
        print_diffs(&changes);
    }

    if args.dry_run {
        print_info("Dry run: the remote was not contacted.");
        return Ok(());
    }

    let token = resolve_token()?;
    let client = GitHubClient::new(&config.api_base_url, token, config.request_timeout())?;

    if !client.account_exists(&args.username).await? {
        return Err(GitSyncerError::unknown_account(&args.username));
    }

    let overrides = args.coordinate_overrides(&config);
    let outcome = SyncRun::new(&client, overrides, options)
        .run_classified(Classification::Changes(changes), &git_repo)
        .await?;

    match outcome {
        SyncOutcome::NoChanges => print_notice("No changes to sync."),
        SyncOutcome::Committed(report) => {
            print_report(&report);
            if let Err(e) = config.record_sync() {
                log::warn!("Could not record sync time: {e}");
            }
        }
    }

    Ok(())
}

fn print_change_set(changes: &LocalChangeSet) {
    print_section_header(&format!("Changes to sync ({})", changes.len()));

    for change in &changes.modified {
        println!("{}", format_change_line(ChangeKind::Modified, &change.path));
    }
    for change in &changes.added {
        println!("{}", format_change_line(ChangeKind::Added, &change.path));
    }
    for path in &changes.deleted {
        println!("{}", format_change_line(ChangeKind::Deleted, path));
    }
    for rename in &changes.renamed {
        let label = format!("{} -> {}", rename.from, rename.to);
        println!("{}", format_change_line(ChangeKind::Renamed, &label));
    }
}

fn print_diffs(changes: &LocalChangeSet) {
    for (path, diff) in &changes.diffs {
        println!();
        print!("{}", "═══ ".bright_blue().bold());
        print!("{}", path.bright_blue().bold());
        println!("{}", " ═══".bright_blue().bold());
        for line in diff.lines() {
            println!("{}", colorize_diff_line(line));
        }
    }
}

fn print_report(report: &SyncReport) {
    match &report.branch {
        Some(branch) => print_success(&format!(
            "Synced {} change(s) to {}: commit {}",
            report.changes.len(),
            report.coordinates,
            branch.commit.short()
        )),
        None => print_success(&format!(
            "Created commit {} on top of {}; branch '{}' left untouched",
            report.commit.sha,
            report.parent.short(),
            report.coordinates.branch
        )),
    }
    println!(
        "   {} blob(s) uploaded, {} path(s) removed",
        report.tree.uploaded_blobs,
        report.tree.removed.len()
    );
}
