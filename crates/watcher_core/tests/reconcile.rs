use std::collections::BTreeSet;

use watcher_core::{normalize, reconcile, FetchedBatch, KnownLinks, Link, ReconcileError};

struct SetKnownLinks(BTreeSet<Link>);

impl KnownLinks for SetKnownLinks {
    fn contains(&self, link: &Link) -> bool {
        self.0.contains(link)
    }
}

fn link(s: &str) -> Link {
    normalize(s, None).expect("test link should normalize")
}

fn batch(links: &[&str]) -> FetchedBatch {
    FetchedBatch {
        links: links.iter().map(|s| link(s)).collect(),
        pages_ok: 1,
    }
}

fn init_logging() {
    watch_logging::initialize_for_tests();
}

#[test]
fn unknown_links_are_all_new() {
    init_logging();
    let known = SetKnownLinks(BTreeSet::new());
    let fetched = batch(&["https://x.example/a", "https://x.example/b"]);

    let result = reconcile(&fetched, &known).unwrap();
    assert_eq!(result.fetched_count, 2);
    assert_eq!(result.new_links, fetched.links);
}

#[test]
fn known_links_are_filtered_out() {
    init_logging();
    let known = SetKnownLinks([link("https://x.example/a")].into_iter().collect());
    let fetched = batch(&["https://x.example/a", "https://x.example/b"]);

    let result = reconcile(&fetched, &known).unwrap();
    let expected: BTreeSet<Link> = [link("https://x.example/b")].into_iter().collect();
    assert_eq!(result.new_links, expected);
    assert_eq!(result.fetched_count, 2);
}

#[test]
fn fully_known_batch_yields_empty_new_set() {
    init_logging();
    let known = SetKnownLinks(
        [link("https://x.example/a"), link("https://x.example/b")]
            .into_iter()
            .collect(),
    );
    let fetched = batch(&["https://x.example/a", "https://x.example/b"]);

    let result = reconcile(&fetched, &known).unwrap();
    assert!(result.new_links.is_empty());
}

#[test]
fn empty_fetch_is_an_explicit_error_not_a_silent_empty_set() {
    init_logging();
    let known = SetKnownLinks(BTreeSet::new());
    let fetched = FetchedBatch::default();

    let err = reconcile(&fetched, &known).unwrap_err();
    assert_eq!(err, ReconcileError::EmptyFetch);
}

#[test]
fn duplicate_hrefs_collapse_to_one_entry() {
    init_logging();
    let known = SetKnownLinks(BTreeSet::new());
    // Fragments differ but normalize to the same link, so the set collapses.
    let fetched = FetchedBatch {
        links: [
            link("https://x.example/a"),
            link("https://x.example/a#dup"),
        ]
        .into_iter()
        .collect(),
        pages_ok: 1,
    };

    let result = reconcile(&fetched, &known).unwrap();
    assert_eq!(result.fetched_count, 1);
    assert_eq!(result.new_links.len(), 1);
}

#[test]
fn reconcile_does_not_mutate_inputs() {
    init_logging();
    let known = SetKnownLinks([link("https://x.example/a")].into_iter().collect());
    let fetched = batch(&["https://x.example/a", "https://x.example/b"]);
    let before = fetched.clone();

    let _ = reconcile(&fetched, &known).unwrap();
    assert_eq!(fetched, before);
}
