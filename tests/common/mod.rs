//! Shared test fixtures: build small, real Git repositories under a
//! `tempfile::TempDir` by shelling out to the system `git` binary, then
//! exercise the crate against them exactly as a real caller would.

use std::process::Command;
use tempfile::TempDir;

pub struct TestRepo {
    pub dir: TempDir,
}

impl TestRepo {
    pub fn init() -> Self {
        let dir = TempDir::new().expect("tempdir");
        run(dir.path(), &["init", "-q", "-b", "main"]);
        run(dir.path(), &["config", "user.email", "test@example.com"]);
        run(dir.path(), &["config", "user.name", "Test User"]);
        Self { dir }
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    pub fn write(&self, relative_path: &str, contents: &str) {
        let full = self.dir.path().join(relative_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("mkdir -p");
        }
        std::fs::write(full, contents).expect("write file");
    }

    pub fn commit(&self, message: &str) -> String {
        run(self.dir.path(), &["add", "-A"]);
        run(self.dir.path(), &["commit", "-q", "-m", message]);
        self.head_hash()
    }

    pub fn commit_as(&self, message: &str, author_name: &str, author_email: &str) -> String {
        run(self.dir.path(), &["add", "-A"]);
        run(
            self.dir.path(),
            &[
                "-c",
                &format!("user.name={author_name}"),
                "-c",
                &format!("user.email={author_email}"),
                "commit",
                "-q",
                "-m",
                message,
            ],
        );
        self.head_hash()
    }

    pub fn checkout_new_branch(&self, name: &str) {
        run(self.dir.path(), &["checkout", "-q", "-b", name]);
    }

    pub fn checkout(&self, name: &str) {
        run(self.dir.path(), &["checkout", "-q", name]);
    }

    pub fn tag(&self, name: &str) {
        run(self.dir.path(), &["tag", name]);
    }

    pub fn head_hash(&self) -> String {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.dir.path())
            .output()
            .expect("git rev-parse");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }
}

fn run(dir: &std::path::Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap_or_else(|e| panic!("failed to run git {args:?}: {e}"));
    assert!(status.success(), "git {args:?} failed");
}
