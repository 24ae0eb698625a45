//! End-to-end single-run workflow tests
//!
//! These drive the full select → dedup → publish → reconcile path against
//! a real ledger file and the mock publisher.

use anyhow::Result;
use tempfile::TempDir;

use libdripcast::config::RetryConfig;
use libdripcast::error::{DripcastError, LedgerError, PublishError};
use libdripcast::ledger::Ledger;
use libdripcast::publisher::MockPublisher;
use libdripcast::queue::ContentQueue;
use libdripcast::runner::Runner;
use libdripcast::selector::{SequentialPolicy, SlotPolicy};
use libdripcast::types::{LedgerEntry, RunOutcome};

fn test_ledger() -> (TempDir, Ledger) {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::new(dir.path().join("ledger.txt"));
    (dir, ledger)
}

fn no_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 1,
        retry_rate_limited: false,
    }
}

#[tokio::test]
async fn test_five_sequential_runs_wrap_the_cycle() -> Result<()> {
    let queue = ContentQueue::from_texts(["A", "B", "C", "D"]);
    let (_dir, ledger) = test_ledger();

    let mut observed_counts = Vec::new();
    for _ in 0..5 {
        let publisher = MockPublisher::success("mock");
        let runner = Runner::new(
            &queue,
            &ledger,
            &publisher,
            Box::new(SequentialPolicy),
            no_retry(),
        );
        let report = runner.run().await?;
        assert!(matches!(report.outcome, RunOutcome::Posted { .. }));
        observed_counts.push(report.posted_count);
    }

    // The fifth run exhausts the cycle: clear, then repost the first item
    assert_eq!(observed_counts, vec![1, 2, 3, 4, 1]);

    let entries = ledger.read_all()?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "A");
    Ok(())
}

#[tokio::test]
async fn test_wraparound_reports_cycle_reset() -> Result<()> {
    let queue = ContentQueue::from_texts(["A", "B", "C", "D"]);
    let (_dir, ledger) = test_ledger();
    for i in 0..4 {
        ledger.append(&LedgerEntry::new(format!("{}", i), queue.get(i).unwrap().text.clone()))?;
    }

    let publisher = MockPublisher::success("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &publisher,
        Box::new(SequentialPolicy),
        no_retry(),
    );
    let report = runner.run().await?;

    assert!(report.cycle_reset);
    assert_eq!(report.index, 0);
    assert_eq!(report.text, "A");
    assert_eq!(report.posted_count, 1);
    assert_eq!(report.remaining, 3);
    Ok(())
}

#[tokio::test]
async fn test_idempotence_skips_known_content() -> Result<()> {
    let queue = ContentQueue::from_texts(["A", "B", "C"]);
    let (_dir, ledger) = test_ledger();
    // History says one item posted, but its text is the next candidate's
    ledger.append(&LedgerEntry::new("900", "B"))?;

    let publisher = MockPublisher::success("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &publisher,
        Box::new(SequentialPolicy),
        no_retry(),
    );
    let report = runner.run().await?;

    assert!(matches!(report.outcome, RunOutcome::AlreadyPosted));
    assert_eq!(publisher.publish_call_count(), 0);
    assert_eq!(ledger.read_all()?, vec![LedgerEntry::new("900", "B")]);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_leaves_ledger_unchanged_and_reselects() -> Result<()> {
    let queue = ContentQueue::from_texts(["A", "B", "C"]);
    let (_dir, ledger) = test_ledger();
    ledger.append(&LedgerEntry::new("1", "A"))?;

    let limited = MockPublisher::rate_limited("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &limited,
        Box::new(SequentialPolicy),
        no_retry(),
    );
    let err = runner.run().await.unwrap_err();
    assert!(matches!(
        err,
        DripcastError::Publish(PublishError::RateLimited(_))
    ));
    assert_eq!(ledger.posted_count()?, 1);

    // Next invocation selects the identical candidate
    let publisher = MockPublisher::success("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &publisher,
        Box::new(SequentialPolicy),
        no_retry(),
    );
    let report = runner.run().await?;
    assert_eq!(report.index, 1);
    assert_eq!(report.text, "B");
    Ok(())
}

#[tokio::test]
async fn test_transient_failure_leaves_ledger_unchanged() -> Result<()> {
    let queue = ContentQueue::from_texts(["A", "B"]);
    let (_dir, ledger) = test_ledger();

    let publisher = MockPublisher::failing("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &publisher,
        Box::new(SequentialPolicy),
        no_retry(),
    );
    let err = runner.run().await.unwrap_err();
    assert!(matches!(
        err,
        DripcastError::Publish(PublishError::Transient(_))
    ));
    assert_eq!(ledger.posted_count()?, 0);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_compensation_advances_the_cycle() -> Result<()> {
    let queue = ContentQueue::from_texts(["A", "B", "C"]);
    let (_dir, ledger) = test_ledger();

    let rejecting = MockPublisher::duplicate("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &rejecting,
        Box::new(SequentialPolicy),
        no_retry(),
    );
    let report = runner.run().await?;
    assert!(matches!(report.outcome, RunOutcome::DuplicateCompensated));

    // Exactly one sentinel entry was recorded
    let entries = ledger.read_all()?;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_duplicate_marker());
    assert_eq!(entries[0].text, "A");

    // The next invocation moves past the compensated content
    let publisher = MockPublisher::success("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &publisher,
        Box::new(SequentialPolicy),
        no_retry(),
    );
    let report = runner.run().await?;
    assert_eq!(report.index, 1);
    assert_eq!(report.text, "B");
    Ok(())
}

#[tokio::test]
async fn test_commit_failure_is_loud() -> Result<()> {
    let queue = ContentQueue::from_texts(["A"]);
    let dir = TempDir::new()?;
    // A directory at the ledger path makes the append fail after publish
    let ledger = Ledger::new(dir.path().to_path_buf());

    let publisher = MockPublisher::success("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &publisher,
        Box::new(SequentialPolicy),
        no_retry(),
    );
    let err = runner.run().await.unwrap_err();
    match err {
        DripcastError::Ledger(LedgerError::CommitFailed { external_id, .. }) => {
            assert!(external_id.starts_with("mock:mock-"));
        }
        other => panic!("expected commit failure, got {:?}", other),
    }
    // The publish itself did happen
    assert_eq!(publisher.published_content().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_slot_mode_reports_coordinates() -> Result<()> {
    let queue = ContentQueue::from_texts(["A", "B", "C", "D", "E", "F"]);
    let (_dir, ledger) = test_ledger();
    ledger.append(&LedgerEntry::new("1", "A"))?;
    ledger.append(&LedgerEntry::new("2", "B"))?;

    let publisher = MockPublisher::success("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &publisher,
        Box::new(SlotPolicy::at_hour(8)),
        no_retry(),
    );
    let report = runner.run().await?;

    assert_eq!(report.day, Some(2));
    assert_eq!(report.slot, Some(1));
    assert_eq!(report.index, 2);
    assert_eq!(report.text, "C");
    Ok(())
}

#[tokio::test]
async fn test_preview_makes_no_mutation() -> Result<()> {
    let queue = ContentQueue::from_texts(["A", "B"]);
    let (_dir, ledger) = test_ledger();
    ledger.append(&LedgerEntry::new("1", "A"))?;
    ledger.append(&LedgerEntry::new("2", "B"))?;

    let publisher = MockPublisher::success("mock");
    let runner = Runner::new(
        &queue,
        &ledger,
        &publisher,
        Box::new(SequentialPolicy),
        no_retry(),
    );
    let preview = runner.preview()?;

    // Exhausted cycle: a real run would clear; the preview must not
    assert!(preview.would_reset);
    assert_eq!(preview.status, "would-post");
    assert_eq!(preview.index, 0);
    assert_eq!(ledger.posted_count()?, 2);
    assert_eq!(publisher.publish_call_count(), 0);
    Ok(())
}
