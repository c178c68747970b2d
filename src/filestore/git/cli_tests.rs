use super::*;
use crate::filestore::config::EffectiveConfig;
use crate::filestore::test_support::{git, git_available, init_repo};
use tempfile::tempdir;

fn repo_at(dir: &Path) -> GitRepo {
    GitRepo::new(dir, GitTimeouts::from_config(&EffectiveConfig::default()))
}

fn commit_file(dir: &Path, name: &str, body: &str, msg: &str) {
    std::fs::write(dir.join(name), body).unwrap();
    git(dir, &["add", "--", name]);
    git(dir, &["commit", "-q", "-m", msg]);
}

#[tokio::test]
async fn non_repository_is_detected() {
    if !git_available() {
        return;
    }
    let tmp = tempdir().unwrap();
    let repo = repo_at(tmp.path());
    assert!(!repo.is_repository().await);
    assert_eq!(repo.head_commit().await, None);
}

#[tokio::test]
async fn unborn_branch_logs_empty() {
    if !git_available() {
        return;
    }
    let tmp = tempdir().unwrap();
    init_repo(tmp.path());
    let repo = repo_at(tmp.path());
    assert!(repo.is_repository().await);
    let (commits, total) = repo.log(&LogQuery::default()).await.unwrap();
    assert!(commits.is_empty());
    assert_eq!(total, 0);
    assert_eq!(repo.head_commit().await, None);
    assert_eq!(repo.current_branch().await.as_deref(), Some("main"));
}

#[tokio::test]
async fn log_pages_and_counts() {
    if !git_available() {
        return;
    }
    let tmp = tempdir().unwrap();
    init_repo(tmp.path());
    for i in 0..5 {
        commit_file(tmp.path(), &format!("f{}.md", i), "x", &format!("commit {} | piped", i));
    }
    let repo = repo_at(tmp.path());
    let q = LogQuery { page: 2, per_page: 2, ..Default::default() };
    let (commits, total) = repo.log(&q).await.unwrap();
    assert_eq!(total, 5);
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].title, "commit 2 | piped");
    assert_eq!(commits[0].author_email, "test@example.com");
    assert_eq!(commits[0].parent_ids.len(), 1);

    let q = LogQuery { path: Some("f4.md".into()), ..Default::default() };
    let (commits, total) = repo.log(&q).await.unwrap();
    assert_eq!((commits.len(), total), (1, 1));

    let q = LogQuery { search: Some("commit 1".into()), ..Default::default() };
    assert_eq!(repo.log(&q).await.unwrap().1, 1);

    let bad = LogQuery { per_page: 500, ..Default::default() };
    assert!(matches!(repo.log(&bad).await, Err(GitError::InvalidQuery(_))));
}

#[tokio::test]
async fn commit_paths_and_side_queries() {
    if !git_available() {
        return;
    }
    let tmp = tempdir().unwrap();
    init_repo(tmp.path());
    let repo = repo_at(tmp.path());
    std::fs::write(tmp.path().join("a.md"), "one\ntwo\n").unwrap();
    assert_eq!(repo.status().await.unwrap()[0].code, "??");

    let opts = CommitOptions { author_name: Some("Ada".into()), ..Default::default() };
    assert!(repo.commit_paths(&["a.md".into()], &[], &opts, "Add a.md").await.unwrap());
    let author = git(tmp.path(), &["log", "-1", "--format=%an <%ae>|%s"]);
    assert_eq!(author.trim(), "Ada <unknown@example.com>|Add a.md");

    // nothing staged
    assert!(!repo.commit("empty", None, None).await.unwrap());

    let head = repo.head_commit().await.unwrap();
    let stats = repo.commit_stats(&head).await.unwrap();
    assert_eq!((stats.additions, stats.deletions, stats.files), (2, 0, 1));
    assert!(repo.commit_stats("--output=x").await.is_err());

    assert_eq!(repo.branches().await.unwrap(), vec!["main"]);
    assert_eq!(repo.config_value("user.name").await.unwrap().as_deref(), Some("Test User"));
    assert_eq!(repo.config_value("no.such.key").await.unwrap(), None);
    assert!(repo.config().await.unwrap().contains_key("user.email"));

    // removal of an untracked path is ignored
    assert_eq!(repo.remove_paths(&["ghost.md".into()]).await, vec!["ghost.md".to_string()]);
}

#[tokio::test]
async fn init_if_absent_creates_main() {
    if !git_available() {
        return;
    }
    let tmp = tempdir().unwrap();
    let repo = repo_at(tmp.path());
    assert!(repo.init_if_absent().await.unwrap());
    assert!(repo.is_repository().await);
    assert!(!repo.init_if_absent().await.unwrap());
    assert_eq!(repo.current_branch().await.as_deref(), Some("main"));
}

#[tokio::test]
async fn add_paths_skips_failures() {
    if !git_available() {
        return;
    }
    let tmp = tempdir().unwrap();
    init_repo(tmp.path());
    std::fs::write(tmp.path().join("ok.md"), "x").unwrap();
    let repo = repo_at(tmp.path());
    let added = repo.add_paths(&["ok.md".into(), "missing.md".into()]).await;
    assert_eq!(added, vec!["ok.md".to_string()]);
    assert!(repo.has_staged_changes().await.unwrap());
    let staged = git(tmp.path(), &["diff", "--cached", "--name-only"]);
    assert_eq!(staged.trim(), "ok.md");
}
