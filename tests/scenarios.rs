//! End-to-end scenarios through the Public Façade (spec.md §8).

mod common;

use common::TestRepo;
use revscope::config::Config;
use revscope::query::{Query, RankingPreference};
use revscope::{CoreError, Facade, Options};

fn facade() -> Facade {
    Facade::new(Config::default())
}

#[tokio::test]
async fn content_match_on_head_returns_ranked_result() {
    let repo = TestRepo::init();
    repo.write("src/lib.rs", "fn greet() {\n    println!(\"hello world\");\n}\n");
    repo.commit("add greeting");

    let mut query = Query::new();
    query.content_pattern = Some("hello world".into());

    let (results, metrics) = facade()
        .search_sync(repo.path(), query, Options::default())
        .await
        .expect("search should succeed");

    assert!(!results.is_empty(), "expected at least one content match");
    assert!(results[0].matched.locator.file_path.as_deref() == Some("src/lib.rs"));
    assert!(!metrics.cancelled);
}

#[tokio::test]
async fn author_and_date_conjunction_filters_to_matching_commits() {
    let repo = TestRepo::init();
    repo.write("a.txt", "one");
    repo.commit_as("first by alice", "Alice", "alice@example.com");
    repo.write("b.txt", "two");
    repo.commit_as("second by bob", "Bob", "bob@example.com");

    let mut query = Query::new();
    query.author_pattern = Some("Alice".into());
    query.date_from = Some(chrono::Utc::now() - chrono::Duration::days(1));
    query.date_to = Some(chrono::Utc::now() + chrono::Duration::days(1));

    let (results, _metrics) = facade()
        .search_sync(repo.path(), query, Options::default())
        .await
        .expect("search should succeed");

    assert!(results
        .iter()
        .all(|r| r.matched.attributes.author_name.as_deref() != Some("Bob")));
}

#[tokio::test]
async fn fuzzy_message_match_tolerates_typos() {
    let repo = TestRepo::init();
    repo.write("a.txt", "one");
    repo.commit("fix authentication bug");

    let mut query = Query::new();
    query.fuzzy = true;
    query.message_pattern = Some("fix authentification bug".into());

    let (results, _metrics) = facade()
        .search_sync(repo.path(), query, Options::default())
        .await
        .expect("search should succeed");

    assert!(!results.is_empty(), "fuzzy match should tolerate the typo");
}

#[tokio::test]
async fn fuzzy_author_match_tolerates_typos() {
    let repo = TestRepo::init();
    repo.write("a.txt", "one");
    repo.commit_as("initial", "Alexandra Smith", "alexandra@example.com");

    let mut query = Query::new();
    query.fuzzy = true;
    query.author_pattern = Some("Alexandera Smith <alexandra@example.com>".into());

    let (results, _metrics) = facade()
        .search_sync(repo.path(), query, Options::default())
        .await
        .expect("search should succeed");

    assert!(!results.is_empty(), "fuzzy author match should tolerate the typo");
}

#[tokio::test]
async fn repeated_query_reuses_the_cache() {
    let repo = TestRepo::init();
    repo.write("a.txt", "needle in a haystack");
    repo.commit("add haystack");

    let facade = facade();
    let mut query = Query::new();
    query.content_pattern = Some("needle".into());

    let (_first, first_metrics) = facade
        .search_sync(repo.path(), query.clone(), Options::default())
        .await
        .expect("first search should succeed");
    assert_eq!(first_metrics.cache_hits, 0);

    let (_second, second_metrics) = facade
        .search_sync(repo.path(), query, Options::default())
        .await
        .expect("second search should succeed");
    assert!(second_metrics.cache_hits >= 1, "second run should hit the cache");
}

#[tokio::test]
async fn cancelling_a_submission_marks_it_truncated() {
    let repo = TestRepo::init();
    repo.write("a.txt", "some content");
    repo.commit("initial");

    let facade = facade();
    let mut query = Query::new();
    query.content_pattern = Some("content".into());

    let mut submission = facade
        .submit(repo.path(), query, Options::default())
        .await
        .expect("submit should succeed");

    facade.cancel(submission.request_id);
    while submission.events.recv().await.is_some() {}
    let metrics = submission.metrics.await.expect("metrics task should not panic");

    assert!(metrics.cancelled || metrics.truncated);
}

#[tokio::test]
async fn unambiguous_commit_hash_prefix_resolves_to_one_match() {
    let repo = TestRepo::init();
    repo.write("a.txt", "one");
    let hash = repo.commit("initial");
    let prefix = &hash[..4];

    let mut query = Query::new();
    query.commit_hash_prefix = Some(prefix.to_string());

    let (results, _metrics) = facade()
        .search_sync(repo.path(), query, Options::default())
        .await
        .expect("search should succeed");

    assert!(results.iter().any(|r| r.matched.locator.commit_hash == hash));
}

#[tokio::test]
async fn ambiguous_commit_hash_prefix_surfaces_zero_matches_and_a_warning() {
    let repo = TestRepo::init();
    repo.write("a.txt", "one");
    repo.commit("first");
    repo.write("a.txt", "two");
    repo.commit("second");

    let mut query = Query::new();
    query.commit_hash_prefix = Some(String::new());

    let (results, metrics) = facade()
        .search_sync(repo.path(), query, Options::default())
        .await
        .expect("search should succeed");

    assert!(results.is_empty(), "an ambiguous prefix must surface zero matches");
    assert!(metrics.warnings.iter().any(|w| w == "ambiguous_commit_prefix"));
}

#[tokio::test]
async fn empty_query_is_rejected_before_opening_the_repository() {
    let repo = TestRepo::init();
    let err = facade()
        .search_sync(repo.path(), Query::new(), Options::default())
        .await
        .expect_err("an empty query must fail validation");
    assert!(matches!(err, CoreError::BadQuery(_)));
}

#[tokio::test]
async fn recency_first_preference_changes_ranking_order() {
    let repo = TestRepo::init();
    repo.write("old.txt", "shared token");
    repo.commit("old commit with shared token");
    repo.write("new.txt", "shared token");
    repo.commit("new commit with shared token");

    let mut query = Query::new();
    query.content_pattern = Some("shared token".into());
    query.ranking_preference = RankingPreference::RecencyFirst;

    let (results, _metrics) = facade()
        .search_sync(repo.path(), query, Options::default())
        .await
        .expect("search should succeed");

    assert!(results.len() >= 2);
    assert!(results[0].final_score >= results[1].final_score);
}
