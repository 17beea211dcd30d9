//! End-to-end behaviour of a running bridge driven through the file protocol.

use std::thread;
use std::time::{Duration, Instant};

use rstest::rstest;
use serde_json::{Value, json};

use super::support::{BridgeFixture, Reported, TEST_INTERVAL};
use crate::context::CommandContext;
use crate::handler::HandlerError;
use crate::handlers::{self, CATEGORY_TABLES};
use crate::protocol::{BridgeState, Command, CommandId, CommandSource, Params};
use crate::registry::{Category, CategoryTable, HandlerEntry, HandlerRegistry};

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn explode(_: &CommandContext<'_>, _: CommandId, _: &Params) -> Result<(), HandlerError> {
    panic!("geometry kernel fault");
}

const FAULTY: &[HandlerEntry] = &[HandlerEntry::new("explode", explode)];

fn registry_with_faulty_handler() -> HandlerRegistry {
    let mut tables = CATEGORY_TABLES.to_vec();
    tables.push(CategoryTable {
        category: Category::Basic,
        entries: FAULTY,
    });
    HandlerRegistry::from_tables(&tables)
}

// ---------------------------------------------------------------------------
// Round trips and gating
// ---------------------------------------------------------------------------

#[test]
fn ping_round_trips_without_a_design() {
    let fixture = BridgeFixture::started(None);
    let result = fixture.drive(|mut client| client.send("ping", Params::new()).expect("ping"));

    assert!(result.success);
    assert_eq!(result.command_id, 1);
    assert_eq!(result.result, Some(json!({"message": "pong"})));
    assert!(result.error.is_none());
}

#[test]
fn design_actions_are_gated_but_context_free_ones_run() {
    let fixture = BridgeFixture::started(None);
    let (gated, shown) = fixture.drive(|mut client| {
        let gated = client.send("extrude", Params::new()).expect("extrude");
        let shown = client
            .send("message", params(json!({"text": "hello host"})))
            .expect("message");
        (gated, shown)
    });

    assert!(!gated.success);
    assert_eq!(gated.error.as_deref(), Some("No active design"));
    assert!(shown.success);
    assert_eq!(
        fixture.host.messages().last().map(|(_, text)| text.as_str()),
        Some("hello host")
    );
}

#[test]
fn unknown_actions_fail_and_the_bridge_keeps_going() {
    let fixture = BridgeFixture::started(Some("Bracket"));
    let (unknown, after) = fixture.drive(|mut client| {
        let unknown = client.send("fly", Params::new()).expect("fly");
        let after = client.send("ping", Params::new()).expect("ping");
        (unknown, after)
    });

    assert_eq!(unknown.error.as_deref(), Some("Unknown action: fly"));
    assert!(unknown.result.is_none());
    assert!(after.success);
    assert_eq!(fixture.reporter.completed(), [(1, false), (2, true)]);
}

#[test]
fn handler_panics_become_failure_results() {
    let mut fixture =
        BridgeFixture::with_registry(Some("Bracket"), registry_with_faulty_handler(), TEST_INTERVAL);
    fixture.bridge.start().expect("start");

    let (exploded, after) = fixture.drive(|mut client| {
        let exploded = client.send("explode", Params::new()).expect("explode");
        let after = client.send("get_info", Params::new()).expect("get_info");
        (exploded, after)
    });

    assert!(!exploded.success);
    assert_eq!(
        exploded.error.as_deref(),
        Some("handler panicked: geometry kernel fault")
    );
    assert!(after.success);
    assert!(fixture.bridge.is_running());
}

// ---------------------------------------------------------------------------
// Ordering and redelivery
// ---------------------------------------------------------------------------

#[test]
fn commands_apply_in_submission_order() {
    let fixture = BridgeFixture::started(Some("Bracket"));
    let listed = fixture.drive(|mut client| {
        for (action, args) in [
            ("create_sketch", json!({"plane": "xz"})),
            ("draw_circle", json!({"radius": 2})),
            ("draw_rectangle", json!({"width": 3, "height": 1})),
        ] {
            let result = client.send(action, params(args)).expect(action);
            assert!(result.success, "{action} failed: {:?}", result.error);
        }
        client.send("get_sketches", Params::new()).expect("get_sketches")
    });

    let sketches = listed.result.expect("payload");
    assert_eq!(sketches["count"], json!(1));
    assert_eq!(sketches["sketches"][0]["plane"], json!("xz"));
    assert_eq!(sketches["sketches"][0]["curve_count"], json!(5));
    assert_eq!(sketches["sketches"][0]["profile_count"], json!(2));
    assert_eq!(fixture.bridge.last_processed_id(), 4);
}

#[test]
fn redelivered_and_older_commands_are_not_rerun() {
    let fixture = BridgeFixture::started(Some("Bracket"));
    let listed = fixture.drive(|mut client| {
        let first = client.send("create_sketch", Params::new()).expect("create");
        assert_eq!(first.command_id, 1);
        let second = client.send("create_sketch", Params::new()).expect("create");
        assert_eq!(second.command_id, 2);

        // Rewrite both ids and give the poller several ticks to notice.
        client
            .post(&Command::bare(2, "create_sketch"))
            .expect("repost newest");
        thread::sleep(TEST_INTERVAL * 5);
        client
            .post(&Command::bare(1, "create_sketch"))
            .expect("repost older");
        thread::sleep(TEST_INTERVAL * 5);

        client.send("get_sketches", Params::new()).expect("list")
    });

    assert_eq!(listed.command_id, 3);
    assert_eq!(listed.result.expect("payload")["count"], json!(2));
    assert_eq!(fixture.reporter.completed(), [(1, true), (2, true), (3, true)]);
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn stale_commands_are_cleared_on_start() {
    let mut fixture = BridgeFixture::new(Some("Bracket"));
    CommandSource::new(fixture.paths.commands_path())
        .write(&Command::bare(5, "create_sketch"))
        .expect("stale command");

    fixture.bridge.start().expect("start");
    assert!(!fixture.paths.commands_path().exists());

    let listed = fixture.drive(|client| {
        let mut client = client.with_next_id(5);
        client.send("get_sketches", Params::new()).expect("list")
    });
    assert_eq!(listed.command_id, 5);
    assert_eq!(listed.result.expect("payload")["count"], json!(0));
}

#[test]
fn restarting_resets_the_processed_watermark() {
    let mut fixture = BridgeFixture::started(Some("Bracket"));
    fixture.drive(|mut client| {
        client.send("ping", Params::new()).expect("first");
        client.send("ping", Params::new()).expect("second");
    });
    assert_eq!(fixture.bridge.last_processed_id(), 2);

    fixture.bridge.stop();
    fixture.bridge.start().expect("restart");
    assert_eq!(fixture.bridge.last_processed_id(), 0);

    let replayed = fixture.drive(|mut client| {
        assert_eq!(client.next_id(), 1);
        client.send("get_info", Params::new()).expect("after restart")
    });
    assert!(replayed.success);
    assert_eq!(fixture.bridge.last_processed_id(), 1);
}

#[test]
fn results_from_before_a_restart_are_not_reused() {
    let mut fixture = BridgeFixture::started(Some("Bracket"));
    let unknown = fixture.drive(|mut client| client.send("fly", Params::new()).expect("fly"));
    assert_eq!(unknown.command_id, 1);
    assert!(!unknown.success);

    fixture.bridge.stop();
    fixture.bridge.start().expect("restart");
    assert!(!fixture.paths.results_path().exists());

    let pong = fixture.drive(|mut client| client.send("ping", Params::new()).expect("ping"));
    assert_eq!(pong.command_id, 1);
    assert!(pong.success);
    assert_eq!(pong.result, Some(json!({"message": "pong"})));
}

#[test]
fn status_file_tracks_the_lifecycle() {
    let mut fixture = BridgeFixture::started(None);
    let client = fixture.client();

    let running = client.status().expect("read").expect("status");
    assert_eq!(running.status, BridgeState::Running);
    assert_eq!(running.message, "Bridge active");

    fixture.bridge.stop();
    let stopped = client.status().expect("read").expect("status");
    assert_eq!(stopped.status, BridgeState::Stopped);
    assert_eq!(stopped.message, "Bridge stopped");

    assert_eq!(
        fixture.reporter.events(),
        [
            Reported::Starting,
            Reported::Started,
            Reported::Stopping,
            Reported::Stopped(0),
        ]
    );
}

#[rstest]
#[case::one_second(Duration::from_secs(1))]
#[case::one_minute(Duration::from_secs(60))]
fn stop_does_not_wait_for_the_next_tick(#[case] interval: Duration) {
    let mut fixture = BridgeFixture::with_registry(None, handlers::registry(), interval);
    fixture.bridge.start().expect("start");
    assert!(fixture.bridge.is_running());

    let started = Instant::now();
    fixture.bridge.stop();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(!fixture.bridge.is_running());
}

#[test]
fn dropping_the_bridge_stops_it() {
    let fixture = BridgeFixture::started(None);
    let client = fixture.client();
    let handle = fixture.relay.handle();

    drop(fixture.bridge);

    let status = client.status().expect("read").expect("status");
    assert_eq!(status.status, BridgeState::Stopped);
    // The relay outlives the bridge but no longer knows the check event.
    handle
        .fire(crate::relay::CHECK_COMMANDS_EVENT, crate::relay::CHECK_COMMANDS_PAYLOAD)
        .expect("relay still accepts events");
    assert_eq!(fixture.relay.drain(), 0);
}
