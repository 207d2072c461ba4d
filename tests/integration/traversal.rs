use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use repowalk::{FetchError, RateLimiter, WalkError, WalkOptions};
use tokio_util::sync::CancellationToken;

use crate::integration::support::{
    concurrent, sequential, walker, walker_with_throttle, FakeRepo, Recorder,
};

const TREE: &[&str] = &["a.txt", "dir/b.txt", "dir/c.txt"];

#[tokio::test]
async fn sequential_walk_visits_files_depth_first_in_listing_order() {
    let repo = Arc::new(FakeRepo::with_files(TREE));
    let walker = walker(&repo, sequential());
    let recorder = Recorder::new();

    walker
        .walk_uri(&CancellationToken::new(), "", recorder.clone())
        .await
        .unwrap();

    assert_eq!(recorder.seen(), vec!["a.txt", "dir/b.txt", "dir/c.txt"]);
    assert_eq!(repo.calls(), vec!["", "a.txt", "dir", "dir/b.txt", "dir/c.txt"]);

    let stats = walker.stats();
    assert_eq!(stats.files, 3);
    assert_eq!(stats.directories, 2);
    assert_eq!(stats.requests, 5);
    assert_eq!(stats.rate_limit_waits, 0);
}

#[tokio::test]
async fn concurrent_walk_visits_the_same_files() {
    let repo = Arc::new(FakeRepo::with_files(TREE).with_latency(Duration::from_millis(5)));
    let walker = walker(&repo, concurrent());
    let recorder = Recorder::new();

    walker
        .walk_uri(&CancellationToken::new(), "/", recorder.clone())
        .await
        .unwrap();

    assert_eq!(recorder.seen_sorted(), vec!["a.txt", "dir/b.txt", "dir/c.txt"]);
    assert_eq!(repo.calls().len(), 5);
}

#[tokio::test]
async fn walking_a_subdirectory_stays_inside_it() {
    let repo = Arc::new(FakeRepo::with_files(TREE));
    let walker = walker(&repo, sequential());
    let recorder = Recorder::new();

    walker
        .walk_uri(&CancellationToken::new(), "/dir/", recorder.clone())
        .await
        .unwrap();

    assert_eq!(recorder.seen(), vec!["dir/b.txt", "dir/c.txt"]);
    assert_eq!(repo.calls_for("a.txt"), 0);
}

#[tokio::test]
async fn single_file_path_invokes_callback_once() {
    let repo = Arc::new(FakeRepo::with_files(TREE));
    let walker = walker(&repo, concurrent());
    let recorder = Recorder::new();

    walker
        .walk_uri(&CancellationToken::new(), "dir/c.txt", recorder.clone())
        .await
        .unwrap();

    assert_eq!(recorder.seen(), vec!["dir/c.txt"]);
    assert_eq!(repo.calls(), vec!["dir/c.txt"]);
}

#[tokio::test]
async fn empty_directory_completes_without_callbacks() {
    let mut repo = FakeRepo::with_files(&[]);
    repo.add_empty_dir("empty");
    let repo = Arc::new(repo);

    for options in [sequential(), concurrent()] {
        let walker = walker(&repo, options);
        let recorder = Recorder::new();
        walker
            .walk_uri(&CancellationToken::new(), "empty", recorder.clone())
            .await
            .unwrap();
        assert!(recorder.seen().is_empty());
    }
}

#[tokio::test]
async fn missing_root_reports_not_found() {
    let repo = Arc::new(FakeRepo::with_files(TREE));
    let walker = walker(&repo, sequential());

    let err = walker
        .walk_uri(&CancellationToken::new(), "nope", Recorder::new())
        .await
        .unwrap_err();

    assert_eq!(err.path(), Some("nope"));
    assert!(matches!(
        err,
        WalkError::Fetch {
            source: FetchError::NotFound { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn sequential_walk_stops_at_first_failure() {
    let repo = Arc::new(FakeRepo::with_files(&["a.txt", "b.txt", "c.txt"]).fail(
        "b.txt",
        FetchError::Status {
            status: 500,
            message: "boom".to_string(),
        },
    ));
    let walker = walker(&repo, sequential());
    let recorder = Recorder::new();

    let err = walker
        .walk_uri(&CancellationToken::new(), "", recorder.clone())
        .await
        .unwrap_err();

    assert_eq!(err.path(), Some("b.txt"));
    assert_eq!(recorder.seen(), vec!["a.txt"]);
    assert_eq!(repo.calls_for("c.txt"), 0);
}

#[tokio::test]
async fn concurrent_walk_returns_the_failing_path() {
    let repo = Arc::new(FakeRepo::with_files(TREE).fail(
        "dir/c.txt",
        FetchError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        },
    ));
    let walker = walker(&repo, concurrent());
    let recorder = Recorder::new();

    let err = walker
        .walk_uri(&CancellationToken::new(), "", recorder.clone())
        .await
        .unwrap_err();

    match err {
        WalkError::Fetch {
            path,
            source: FetchError::Status { status, .. },
        } => {
            assert_eq!(path, "dir/c.txt");
            assert_eq!(status, 502);
        }
        other => panic!("expected fetch failure, got {:?}", other),
    }
    for seen in recorder.seen() {
        assert!(seen == "a.txt" || seen == "dir/b.txt", "unexpected callback for {}", seen);
    }
}

#[tokio::test]
async fn callback_failure_aborts_the_walk() {
    let repo = Arc::new(FakeRepo::with_files(TREE));
    let walker = walker(&repo, sequential());
    let recorder = Recorder::failing_on("dir/b.txt");

    let err = walker
        .walk_uri(&CancellationToken::new(), "", recorder.clone())
        .await
        .unwrap_err();

    match err {
        WalkError::Callback { path, source } => {
            assert_eq!(path, "dir/b.txt");
            assert_eq!(source.to_string(), "refusing dir/b.txt");
        }
        other => panic!("expected callback failure, got {:?}", other),
    }
    assert_eq!(recorder.seen(), vec!["a.txt"]);
    assert_eq!(repo.calls_for("dir/c.txt"), 0);
}

#[tokio::test]
async fn max_in_flight_caps_simultaneous_fetches() {
    let files: Vec<String> = (0..8)
        .flat_map(|d| (0..4).map(move |f| format!("d{}/f{}.txt", d, f)))
        .collect();
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();
    let repo = Arc::new(FakeRepo::with_files(&refs).with_latency(Duration::from_millis(2)));

    let options = WalkOptions {
        concurrent: true,
        wait_on_reset: false,
        max_in_flight: Some(3),
    };
    let walker = walker(&repo, options);
    let recorder = Recorder::new();

    walker
        .walk_uri(&CancellationToken::new(), "", recorder.clone())
        .await
        .unwrap();

    assert_eq!(recorder.seen().len(), 32);
    assert!(repo.peak_in_flight() <= 3, "peak was {}", repo.peak_in_flight());
}

#[tokio::test(start_paused = true)]
async fn throttle_spaces_every_request() {
    let repo = Arc::new(FakeRepo::with_files(TREE));
    let walker = walker_with_throttle(
        &repo,
        concurrent(),
        RateLimiter::with_period(Duration::from_millis(100)),
    );

    let start = tokio::time::Instant::now();
    walker
        .walk_uri(&CancellationToken::new(), "", Recorder::new())
        .await
        .unwrap();

    // five requests: the first is immediate, the rest one period apart
    assert!(start.elapsed() >= Duration::from_millis(400));
    assert!(start.elapsed() < Duration::from_millis(500));
}

fn file_tree() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::vec(prop::collection::vec("[a-c]{1,2}", 1..4), 1..16).prop_map(|paths| {
        let paths: BTreeSet<String> = paths.into_iter().map(|segments| segments.join("/")).collect();
        // a path cannot be both a file and a directory
        paths
            .iter()
            .filter(|p| !paths.iter().any(|other| other.starts_with(&format!("{}/", p))))
            .cloned()
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_file_is_visited_exactly_once(files in file_tree()) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let repo = Arc::new(FakeRepo::with_files(&refs));
        let expected: Vec<String> = files.iter().cloned().collect();

        let sequential_seen = runtime.block_on(async {
            let recorder = Recorder::new();
            walker(&repo, sequential())
                .walk_uri(&CancellationToken::new(), "", recorder.clone())
                .await
                .unwrap();
            recorder.seen()
        });
        prop_assert_eq!(&sequential_seen, &expected);

        let concurrent_seen = runtime.block_on(async {
            let recorder = Recorder::new();
            walker(&repo, concurrent())
                .walk_uri(&CancellationToken::new(), "", recorder.clone())
                .await
                .unwrap();
            recorder.seen_sorted()
        });
        prop_assert_eq!(&concurrent_seen, &expected);
    }
}
