//! Direct exercise of the Git Access Layer (spec.md §4.1) against a real,
//! on-disk repository — independent of which searchers currently call
//! each operation, since the layer's contract is owned by spec.md, not by
//! its callers.

mod common;

use common::TestRepo;
use revscope::git::{blame, commits, diff, refs, repo::GitRepo, tree};
use tokio_util::sync::CancellationToken;

#[test]
fn blame_attributes_each_line_to_the_commit_that_introduced_it() {
    let repo = TestRepo::init();
    repo.write("notes.txt", "first\nsecond\n");
    repo.commit("add first two lines");
    repo.write("notes.txt", "first\nsecond\nthird\n");
    let second_hash = repo.commit("append a third line");

    let git_repo = GitRepo::open(repo.path()).expect("open repo");
    let local = git_repo.local();
    let cancel = CancellationToken::new();

    let lines = blame::blame_file(&local, &second_hash, "notes.txt", 100, &cancel).expect("blame");
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2].content, "third");
    assert_eq!(lines[2].commit.hash, second_hash);
    assert_ne!(lines[0].commit.hash, second_hash);
}

#[test]
fn diff_trees_reports_added_and_modified_files() {
    let repo = TestRepo::init();
    repo.write("a.txt", "one");
    let first = repo.commit("add a");
    repo.write("a.txt", "one changed");
    repo.write("b.txt", "two");
    let second = repo.commit("modify a, add b");

    let git_repo = GitRepo::open(repo.path()).expect("open repo");
    let local = git_repo.local();

    let first_id = gix::ObjectId::from_hex(first.as_bytes()).unwrap();
    let second_id = gix::ObjectId::from_hex(second.as_bytes()).unwrap();
    let first_commit = local.find_object(first_id).unwrap().try_into_commit().unwrap();
    let second_commit = local.find_object(second_id).unwrap().try_into_commit().unwrap();

    let changes = diff::diff_trees(&local, &first_commit, &second_commit).expect("diff");
    assert!(changes
        .iter()
        .any(|c| c.path == "a.txt" && c.kind == diff::ChangeKind::Modified));
    assert!(changes
        .iter()
        .any(|c| c.path == "b.txt" && c.kind == diff::ChangeKind::Added));
}

#[test]
fn walk_commits_respects_the_visited_bound() {
    let repo = TestRepo::init();
    for i in 0..5 {
        repo.write("counter.txt", &i.to_string());
        repo.commit(&format!("commit {i}"));
    }

    let git_repo = GitRepo::open(repo.path()).expect("open repo");
    let local = git_repo.local();
    let cancel = CancellationToken::new();

    let bounded = commits::walk_commits(&local, None, Some(2), &cancel).expect("walk");
    assert_eq!(bounded.len(), 2);

    let all = commits::walk_commits(&local, None, None, &cancel).expect("walk");
    assert_eq!(all.len(), 5);
}

#[test]
fn refs_and_tree_reads_see_branches_tags_and_blobs() {
    let repo = TestRepo::init();
    repo.write("src/main.rs", "fn main() {}\n");
    repo.commit("initial");
    repo.tag("v1.0.0");
    repo.checkout_new_branch("feature");
    repo.write("src/feature.rs", "pub fn feature() {}\n");
    repo.commit("add feature");
    repo.checkout("main");

    let git_repo = GitRepo::open(repo.path()).expect("open repo");
    let local = git_repo.local();

    let branches = refs::list_branches(&local).expect("list branches");
    assert!(branches.iter().any(|b| b.name == "feature"));
    assert!(branches.iter().any(|b| b.name == "main"));

    let tags = refs::list_tags(&local).expect("list tags");
    assert!(tags.iter().any(|t| t.name == "v1.0.0"));

    let head_id = local.head_id().expect("head id").detach();
    let head_commit = local.find_object(head_id).unwrap().try_into_commit().unwrap();
    let blobs = tree::list_blobs(&local, &head_commit).expect("list blobs");
    assert!(blobs.iter().any(|e| e.path == "src/main.rs"));
}
