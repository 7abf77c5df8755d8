//! End-to-end mutation session tests.
//!
//! Covers the full lock → load → mutate → fingerprint → persist flow across
//! separate sessions, including lock contention between concurrent callers,
//! index invalidation across structural mutations, and approval gating of
//! destructive operations.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use deck_core::{Frame, PlaceholderRole, Presentation, Shape, ShapeContent, Slide, TextFrame};
use deck_engine::{
    describe_document, fingerprint_document, validate_document, AnchorPoint, ApprovalToken,
    Dimension, EngineConfig, EngineError, MutationSession, Placement, ValidationPolicy,
    SCOPE_DELETE_SLIDE, SCOPE_REMOVE_SHAPE,
};

const KEY: &[u8] = b"integration-test-key";

fn config() -> EngineConfig {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    EngineConfig {
        verification_key: KEY.to_vec(),
        lock_timeout: Duration::from_secs(2),
        lock_poll_interval: Duration::from_millis(10),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs()
}

fn token(scope: &str) -> ApprovalToken {
    let now = unix_now();
    ApprovalToken::signed(KEY, scope, "deck.json", now - 10, now + 600, false)
}

/// Seed a three-shape slide so index invalidation is observable.
fn seed_document(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("deck.json");
    let mut deck = Presentation::default();
    let mut slide = Slide::new("title_and_content");
    slide.add_shape(
        Shape::new(ShapeContent::Text {
            frame: TextFrame::from_text("Roadmap"),
        })
        .with_role(PlaceholderRole::Title)
        .with_frame(Frame::new(0.5, 0.4, 9.0, 1.1)),
    );
    slide.add_shape(
        Shape::new(ShapeContent::Text {
            frame: TextFrame::from_text("First milestone"),
        })
        .with_frame(Frame::new(0.5, 2.0, 9.0, 1.0)),
    );
    slide.add_shape(
        Shape::new(ShapeContent::Text {
            frame: TextFrame::from_text("Second milestone"),
        })
        .with_frame(Frame::new(0.5, 3.5, 9.0, 1.0)),
    );
    deck.add_slide(slide);
    deck_core::save(&deck, &path).expect("seed save");
    path
}

#[test]
fn anchor_placement_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    let placement = Placement::Anchor {
        point: AnchorPoint::BottomRight,
        offset_x: -0.5,
        offset_y: -0.3,
    };
    let report = MutationSession::open(&path, config())
        .expect("open")
        .add_text_box(
            0,
            &placement,
            Dimension::Inches(2.5),
            Dimension::Inches(0.3),
            "Draft",
        )
        .expect("add text box");

    assert_eq!(report.operation, "add_text_box");
    assert_ne!(report.fingerprint_before, report.fingerprint_after);

    let snapshot = describe_document(&path).expect("describe");
    let shape = &snapshot.slides[0].shapes[3];
    assert!((shape.frame.left - 9.5).abs() < 1e-4);
    assert!((shape.frame.top - 7.2).abs() < 1e-4);
    assert!((shape.frame.width - 2.5).abs() < 1e-4);
    assert!((shape.frame.height - 0.3).abs() < 1e-4);
}

#[test]
fn second_session_times_out_while_first_holds_lock() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    let held = MutationSession::open(&path, config()).expect("first open");

    let fast = EngineConfig {
        lock_timeout: Duration::ZERO,
        ..config()
    };
    let err = MutationSession::open(&path, fast).expect_err("contended");
    assert_eq!(err.kind(), "file_lock");
    assert!(matches!(err, EngineError::Lock(_)));

    held.close().expect("close");

    // Lock is free again.
    let reopened = MutationSession::open(
        &path,
        EngineConfig {
            lock_timeout: Duration::ZERO,
            ..config()
        },
    )
    .expect("reopen after close");
    reopened.close().expect("close again");
}

#[test]
fn bounded_wait_wins_after_first_session_finishes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    let session = MutationSession::open(&path, config()).expect("first open");

    let waiter_path = path.clone();
    let waiter = thread::spawn(move || {
        MutationSession::open(&waiter_path, config())
            .and_then(|s| s.add_slide("blank"))
            .expect("waiting session should win after release")
    });

    thread::sleep(Duration::from_millis(100));
    session
        .set_slide_title(0, "Updated while waiter polls")
        .expect("first mutation");

    let report = waiter.join().expect("join");
    assert_eq!(report.operation, "add_slide");

    let snapshot = describe_document(&path).expect("describe");
    assert_eq!(snapshot.slide_count, 2);
    assert_eq!(
        snapshot.slides[0].title.as_deref(),
        Some("Updated while waiter polls")
    );
}

#[test]
fn fingerprint_is_stable_across_noop_save() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    let before = fingerprint_document(&path).expect("fingerprint");

    // A save with no content change must not move the digest.
    let deck = deck_core::load(&path).expect("load");
    deck_core::save(&deck, &path).expect("noop save");

    let after = fingerprint_document(&path).expect("fingerprint again");
    assert_eq!(before, after);
}

#[test]
fn chained_sessions_surface_fingerprint_continuity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    let first = MutationSession::open(&path, config())
        .expect("open")
        .edit_text(0, 1, "Revised milestone")
        .expect("edit");

    let second = MutationSession::open(&path, config())
        .expect("open")
        .add_slide("section_header")
        .expect("add");

    // An orchestrator chaining calls can verify nothing slipped in between.
    assert_eq!(first.fingerprint_after, second.fingerprint_before);
    assert_ne!(second.fingerprint_before, second.fingerprint_after);
}

#[test]
fn removed_shape_invalidates_recorded_indices() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    // Caller records the last shape's index from a fresh read.
    let snapshot = describe_document(&path).expect("describe");
    let recorded = snapshot.slides[0].shapes.len() - 1;
    assert_eq!(recorded, 2);

    let report = MutationSession::open(&path, config())
        .expect("open")
        .delete_shape(0, 0, &token(SCOPE_REMOVE_SHAPE))
        .expect("delete");
    assert!(report.invalidates_indices);

    // The recorded index is now past the end and must fail loudly.
    let err = MutationSession::open(&path, config())
        .expect("open")
        .edit_text(0, recorded, "stale write")
        .expect_err("stale index");
    assert!(matches!(
        err,
        EngineError::ShapeNotFound {
            requested: 2,
            available: 2
        }
    ));

    // Re-deriving from a fresh read works.
    let snapshot = describe_document(&path).expect("fresh read");
    assert_eq!(snapshot.slides[0].shapes.len(), 2);
    assert_eq!(snapshot.generation, report.generation);
    MutationSession::open(&path, config())
        .expect("open")
        .edit_text(0, snapshot.slides[0].shapes[1].index, "fresh write")
        .expect("fresh index works");
}

#[test]
fn destructive_ops_reject_expired_and_mis_scoped_tokens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);
    let now = unix_now();

    let expired = ApprovalToken::signed(
        KEY,
        SCOPE_DELETE_SLIDE,
        "deck.json",
        now - 7200,
        now - 3600,
        false,
    );
    let err = MutationSession::open(&path, config())
        .expect("open")
        .delete_slide(0, &expired)
        .expect_err("expired token");
    assert_eq!(err.kind(), "approval_token");

    let mis_scoped = token(SCOPE_REMOVE_SHAPE);
    let err = MutationSession::open(&path, config())
        .expect("open")
        .delete_slide(0, &mis_scoped)
        .expect_err("scope mismatch");
    assert_eq!(err.kind(), "approval_token");

    // Both rejections left the document intact.
    assert_eq!(describe_document(&path).expect("describe").slide_count, 1);

    MutationSession::open(&path, config())
        .expect("open")
        .delete_slide(0, &token(SCOPE_DELETE_SLIDE))
        .expect("valid token deletes");
    assert_eq!(describe_document(&path).expect("describe").slide_count, 0);
}

#[test]
fn move_slide_reorders_and_bumps_generation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    MutationSession::open(&path, config())
        .expect("open")
        .add_slide("closing")
        .expect("add");

    let before = describe_document(&path).expect("describe");
    let report = MutationSession::open(&path, config())
        .expect("open")
        .move_slide(1, 0)
        .expect("move");

    assert!(report.invalidates_indices);
    assert_eq!(report.generation, before.generation + 1);

    let after = describe_document(&path).expect("describe");
    assert_eq!(after.slides[0].layout, "closing");
    assert_eq!(after.slides[1].layout, "title_and_content");
}

#[test]
fn auto_sized_image_derives_height_from_aspect_ratio() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    MutationSession::open(&path, config())
        .expect("open")
        .add_image(
            0,
            &Placement::Grid {
                row: 7,
                col: 2,
                grid_size: 12,
            },
            Dimension::Inches(4.0),
            Dimension::Auto,
            deck_engine::NewImage {
                source: "banner.png".to_string(),
                alt_text: Some("banner".to_string()),
                aspect_ratio: Some(2.0),
                byte_len: Some(64_000),
            },
        )
        .expect("add image");

    let snapshot = describe_document(&path).expect("describe");
    let image = &snapshot.slides[0].shapes[3];
    assert_eq!(image.kind, "picture");
    assert!((image.frame.width - 4.0).abs() < 1e-4);
    assert!((image.frame.height - 2.0).abs() < 1e-4);
    // Grid cell (row 7, col 2) on a 10x7.5 slide.
    assert!((image.frame.left - (10.0 / 12.0)).abs() < 1e-4);
    assert!((image.frame.top - (6.0 * 7.5 / 12.0)).abs() < 1e-4);
}

#[test]
fn validation_passes_over_a_healthy_deck() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    let run = validate_document(&path, ValidationPolicy::Strict).expect("validate");
    assert!(run.verdict.passed, "issues: {:?}", run.issues);
    assert_eq!(run.verdict.critical_count, 0);
}

#[test]
fn read_only_calls_work_while_lock_is_held() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seed_document(&dir);

    let session = MutationSession::open(&path, config()).expect("open");

    // Fingerprinting and validation bypass the exclusive lock.
    let fp = fingerprint_document(&path).expect("fingerprint under lock");
    assert_eq!(fp.digest(), session.fingerprint_before().digest());
    validate_document(&path, ValidationPolicy::Lenient).expect("validate under lock");
    describe_document(&path).expect("describe under lock");

    session.close().expect("close");
}
