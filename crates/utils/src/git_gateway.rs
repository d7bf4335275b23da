use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use branchbuild_core::{VcsGateway, VcsStatus};
use gix::ThreadSafeRepository;
use tokio::process::Command;
use tracing::{debug, info};

use crate::find_current_git_repo;

pub const AUTOMATION_USER: &str = "automation";
pub const AUTOMATION_EMAIL: &str = "automation@modelingvalue.org";

/// Run `git` in `dir` and return its stdout.
///
/// # Errors
/// Returns error if git cannot be started or exits unsuccessfully; the message carries stderr.
pub async fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    debug!(dir = %dir.display(), "git {}", args.join(" "));
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .context("Failed to run git")?;
    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// `https://github.com/Owner/name.git` → `name`
pub fn repo_name_from_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    let last = url.rsplit(['/', ':']).next().unwrap_or(url);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

fn parse_porcelain_status(output: &str) -> VcsStatus {
    let mut status = VcsStatus::default();
    let mut entries = output.split('\0').filter(|e| !e.is_empty());
    while let Some(entry) = entries.next() {
        if entry.len() < 4 {
            continue;
        }
        let (code, path) = entry.split_at(3);
        let path = PathBuf::from(path);
        let mut chars = code.chars();
        let index = chars.next().unwrap_or(' ');
        let worktree = chars.next().unwrap_or(' ');
        if matches!(index, 'R' | 'C') {
            // the source of a rename follows as a separate entry
            entries.next();
        }
        if index == '?' {
            status.untracked.insert(path);
        } else if worktree == 'D' || index == 'D' {
            status.missing.insert(path);
        } else {
            status.modified.insert(path);
        }
    }
    status
}

/// Version control of one repository: `gix` for reading, the `git` binary for everything that
/// changes the repository or talks to a remote.
pub struct GitGateway {
    root: PathBuf,
    repo: ThreadSafeRepository,
    dry_run: bool,
}

impl GitGateway {
    /// # Errors
    /// Returns error if `dir` is not inside a git working tree.
    pub fn open(dir: &Path, dry_run: bool) -> Result<Self> {
        let repo = find_current_git_repo(dir)?;
        let root = repo
            .work_dir()
            .context("Not a git working directory. Ensure you are inside a git repository.")?
            .to_path_buf();
        Ok(Self {
            root,
            repo,
            dry_run,
        })
    }

    /// Fresh clone of `url` into `dest` with `branch` checked out; the branch is created and
    /// pushed when the remote does not have it yet.
    ///
    /// # Errors
    /// Returns error if cloning, checking out or pushing fails.
    pub async fn clone_branch(url: &str, branch: &str, dest: &Path, dry_run: bool) -> Result<Self> {
        if dest.exists() {
            tokio::fs::remove_dir_all(dest)
                .await
                .context(format!("Failed to remove {}", dest.display()))?;
        }
        let parent = dest.parent().context("Clone destination has no parent")?;
        tokio::fs::create_dir_all(parent).await?;
        let dest_str = dest.to_string_lossy().to_string();
        run_git(parent, &["clone", "--quiet", url, &dest_str]).await?;

        let remote_heads = run_git(dest, &["ls-remote", "--heads", "origin", branch]).await?;
        if remote_heads.trim().is_empty() {
            info!(branch, url, "branch not on remote, creating it");
            run_git(dest, &["checkout", "-b", branch]).await?;
            let mut args = vec!["push", "--set-upstream", "origin", branch];
            if dry_run {
                args.push("--dry-run");
            }
            run_git(dest, &args).await?;
        } else {
            run_git(dest, &["checkout", branch]).await?;
        }
        Self::open(dest, dry_run)
    }

    pub async fn origin_url(&self) -> Result<String> {
        Ok(run_git(&self.root, &["remote", "get-url", "origin"])
            .await?
            .trim()
            .to_string())
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.root, args).await
    }
}

#[async_trait]
impl VcsGateway for GitGateway {
    fn root(&self) -> &Path {
        &self.root
    }

    fn branch(&self) -> Result<Option<String>> {
        let repo = self.repo.to_thread_local();
        Ok(repo.head_name()?.map(|name| name.shorten().to_string()))
    }

    fn tags(&self) -> Result<Vec<String>> {
        let repo = self.repo.to_thread_local();
        let platform = repo.references()?;
        let tags = platform
            .tags()?
            .map(|reference| {
                reference
                    .map(|r| r.name().shorten().to_string())
                    .map_err(|e| anyhow!("{e}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(tags)
    }

    async fn status(&self) -> Result<VcsStatus> {
        let output = self
            .git(&["status", "--porcelain=v1", "-z", "--untracked-files=all"])
            .await?;
        Ok(parse_porcelain_status(&output))
    }

    /// `git add --all`: anything else in the working tree goes into the commit as well
    async fn stage_commit_push(&self, message: &str) -> Result<bool> {
        if self.status().await?.is_clean() {
            info!("nothing to commit");
            return Ok(false);
        }
        self.git(&["add", "--all"]).await?;
        let user = format!("user.name={AUTOMATION_USER}");
        let email = format!("user.email={AUTOMATION_EMAIL}");
        self.git(&["-c", &user, "-c", &email, "commit", "--quiet", "-m", message])
            .await?;
        let mut args = vec!["push", "origin", "HEAD"];
        if self.dry_run {
            args.push("--dry-run");
        }
        self.git(&args).await?;
        info!(message, dry_run = self.dry_run, "pushed corrections");
        Ok(true)
    }

    async fn tag(&self, tag: &str) -> Result<()> {
        self.git(&["tag", "-f", tag]).await?;
        let mut args = vec!["push", "--force", "origin", "--tags"];
        if self.dry_run {
            args.push("--dry-run");
        }
        self.git(&args).await?;
        info!(tag, dry_run = self.dry_run, "tagged");
        Ok(())
    }

    async fn diff(&self, path: &Path) -> Result<String> {
        let path = path.to_string_lossy().to_string();
        self.git(&["diff", "--", &path]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?}: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn commit_all(dir: &Path, message: &str) {
        git(dir, &["add", "--all"]);
        git(
            dir,
            &[
                "-c",
                "user.name=t",
                "-c",
                "user.email=t@t",
                "commit",
                "--allow-empty",
                "-m",
                message,
            ],
        );
    }

    /// A bare remote plus a clone on `master` with one commit
    fn repo_with_remote() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let remote = temp_dir.path().join("remote.git");
        let work = temp_dir.path().join("work");
        fs::create_dir_all(&remote).unwrap();
        fs::create_dir_all(&work).unwrap();
        git(&remote, &["init", "--bare", "-b", "master"]);
        git(&work, &["init", "-b", "master"]);
        git(&work, &["remote", "add", "origin", remote.to_str().unwrap()]);
        fs::write(work.join("a.txt"), "a\n").unwrap();
        commit_all(&work, "init");
        git(&work, &["push", "origin", "master"]);
        (temp_dir, work)
    }

    #[rstest]
    #[case("https://github.com/ModelingValueGroup/sync-proxy.git", "sync-proxy")]
    #[case("https://github.com/ModelingValueGroup/sync-proxy", "sync-proxy")]
    #[case("git@github.com:ModelingValueGroup/dclare.git", "dclare")]
    #[case("/tmp/some/repo/", "repo")]
    fn test_repo_name_from_url(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(repo_name_from_url(url), expected);
    }

    #[test]
    fn test_parse_porcelain_status() {
        let status = parse_porcelain_status(
            " M src/A.java\0?? new.txt\0 D gone.txt\0R  renamed.txt\0old.txt\0A  added.txt\0",
        );
        assert_eq!(
            status.modified,
            BTreeSet::from([
                PathBuf::from("src/A.java"),
                PathBuf::from("renamed.txt"),
                PathBuf::from("added.txt"),
            ])
        );
        assert_eq!(status.untracked, BTreeSet::from([PathBuf::from("new.txt")]));
        assert_eq!(status.missing, BTreeSet::from([PathBuf::from("gone.txt")]));
    }

    #[test]
    fn test_parse_porcelain_status_clean() {
        assert!(parse_porcelain_status("").is_clean());
    }

    #[tokio::test]
    async fn test_branch_tags_and_status() {
        let (_temp_dir, work) = repo_with_remote();
        git(&work, &["tag", "v0.0.1"]);
        git(&work, &["checkout", "-b", "feature/x"]);
        let gateway = GitGateway::open(&work, false).unwrap();

        assert_eq!(gateway.branch().unwrap().as_deref(), Some("feature/x"));
        assert_eq!(gateway.tags().unwrap(), vec!["v0.0.1".to_string()]);
        assert!(gateway.status().await.unwrap().is_clean());

        fs::write(work.join("a.txt"), "changed\n").unwrap();
        fs::write(work.join("b.txt"), "new\n").unwrap();
        let status = gateway.status().await.unwrap();
        assert!(status.modified.contains(Path::new("a.txt")));
        assert!(status.untracked.contains(Path::new("b.txt")));

        let diff = gateway.diff(Path::new("a.txt")).await.unwrap();
        assert!(diff.contains("+changed"));
    }

    #[tokio::test]
    async fn test_stage_commit_push() {
        let (temp_dir, work) = repo_with_remote();
        let gateway = GitGateway::open(&work, false).unwrap();
        assert!(!gateway.stage_commit_push("[no-ci] nothing").await.unwrap());

        fs::write(work.join("a.txt"), "changed\n").unwrap();
        fs::remove_file(work.join("a.txt")).unwrap();
        fs::write(work.join("c.txt"), "new\n").unwrap();
        assert!(gateway.stage_commit_push("[no-ci] updated").await.unwrap());
        assert!(gateway.status().await.unwrap().is_clean());

        let remote = temp_dir.path().join("remote.git");
        let log = run_git(&remote, &["log", "-1", "--format=%s %an", "master"])
            .await
            .unwrap();
        assert_eq!(log.trim(), "[no-ci] updated automation");
        let files = run_git(&remote, &["ls-tree", "--name-only", "master"])
            .await
            .unwrap();
        assert_eq!(files.trim(), "c.txt");
    }

    #[tokio::test]
    async fn test_tag_pushes_tags() {
        let (temp_dir, work) = repo_with_remote();
        let gateway = GitGateway::open(&work, false).unwrap();
        gateway.tag("v1.2.3").await.unwrap();
        // force-tagging again is fine
        gateway.tag("v1.2.3").await.unwrap();
        let remote_tags = run_git(&temp_dir.path().join("remote.git"), &["tag"])
            .await
            .unwrap();
        assert_eq!(remote_tags.trim(), "v1.2.3");
    }

    #[tokio::test]
    async fn test_clone_branch_creates_missing_branch() {
        let (temp_dir, _work) = repo_with_remote();
        let remote = temp_dir.path().join("remote.git");
        let dest = temp_dir.path().join("build").join("dependencies");

        let clone = GitGateway::clone_branch(remote.to_str().unwrap(), "feature/y", &dest, false)
            .await
            .unwrap();
        assert_eq!(clone.branch().unwrap().as_deref(), Some("feature/y"));
        let heads = run_git(&remote, &["branch", "--list"]).await.unwrap();
        assert!(heads.contains("feature/y"));

        // a second clone replaces the first and checks out the now existing branch
        fs::write(dest.join("stale.txt"), "x").unwrap();
        let clone = GitGateway::clone_branch(remote.to_str().unwrap(), "feature/y", &dest, false)
            .await
            .unwrap();
        assert!(!dest.join("stale.txt").exists());
        assert_eq!(clone.origin_url().await.unwrap(), remote.to_str().unwrap());
    }
}
