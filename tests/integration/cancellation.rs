use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use repowalk::WalkOptions;
use tokio_util::sync::CancellationToken;

use crate::integration::support::{concurrent, sequential, walker, FakeRepo, Recorder};

const TREE: &[&str] = &["a.txt", "dir/b.txt", "dir/c.txt", "dir/deep/d.txt"];

#[tokio::test]
async fn cancelled_before_start_does_nothing() {
    for options in [sequential(), concurrent()] {
        let repo = Arc::new(FakeRepo::with_files(TREE));
        let walker = walker(&repo, options);
        let recorder = Recorder::new();
        let ctx = CancellationToken::new();
        ctx.cancel();

        walker.walk_uri(&ctx, "", recorder.clone()).await.unwrap();

        assert!(recorder.seen().is_empty());
        assert!(repo.calls().is_empty());
        assert_eq!(walker.stats().requests, 0);
    }
}

#[tokio::test]
async fn cancelling_mid_walk_stops_sequential_descent() {
    let repo = Arc::new(FakeRepo::with_files(TREE));
    let walker = walker(&repo, sequential());
    let ctx = CancellationToken::new();
    let recorder = Recorder::cancelling(ctx.clone());

    walker.walk_uri(&ctx, "", recorder.clone()).await.unwrap();

    assert_eq!(recorder.seen(), vec!["a.txt"]);
    assert_eq!(repo.calls_for("dir"), 0);
}

#[tokio::test]
async fn cancelling_mid_walk_stops_concurrent_descent() {
    let repo = Arc::new(
        FakeRepo::with_files(TREE)
            .with_latency(Duration::from_millis(10))
            .slow("dir", Duration::from_millis(200)),
    );
    let walker = walker(&repo, concurrent());
    let ctx = CancellationToken::new();
    let recorder = Recorder::cancelling(ctx.clone());

    walker.walk_uri(&ctx, "", recorder.clone()).await.unwrap();

    // a.txt resolves while dir is still in flight; nothing below dir is fetched
    assert_eq!(recorder.seen(), vec!["a.txt"]);
    assert_eq!(repo.calls_for("dir"), 1);
    assert_eq!(repo.calls_for("dir/b.txt"), 0);
    assert_eq!(repo.calls_for("dir/deep"), 0);
}

#[tokio::test]
async fn cancellation_interrupts_a_rate_limit_wait() {
    let reset = Utc::now() + chrono::Duration::hours(1);
    let repo = Arc::new(FakeRepo::with_files(TREE).rate_limit_once("", reset));
    let options = WalkOptions {
        concurrent: false,
        wait_on_reset: true,
        max_in_flight: None,
    };
    let walker = walker(&repo, options);
    let ctx = CancellationToken::new();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), walker.walk_uri(&ctx, "", Recorder::new()))
        .await
        .expect("cancellation should end the wait")
        .unwrap();

    assert_eq!(repo.calls_for(""), 1);
    assert_eq!(walker.stats().rate_limit_waits, 1);
}

#[tokio::test]
async fn cancellation_does_not_leak_to_the_caller_token_on_failure() {
    let repo = Arc::new(FakeRepo::with_files(TREE));
    let walker = walker(&repo, concurrent());
    let ctx = CancellationToken::new();

    let _ = walker
        .walk_uri(&ctx, "", Recorder::failing_on("dir/b.txt"))
        .await;

    assert!(!ctx.is_cancelled());
}
