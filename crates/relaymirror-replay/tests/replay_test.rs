//! Capture file and replay tests.

use relaymirror_client::ClientConfig;
use relaymirror_harness::{BufferRow, NickRow, fixtures, pointer_for};
use relaymirror_replay::{
    ReplayConfig, ReplayEntry, ReplayError, load_capture, read_capture, replay, save_capture,
    write_capture,
};

fn session() -> Vec<ReplayEntry> {
    vec![
        // Before any connection: stale.
        ReplayEntry::Message(fixtures::line(pointer_for(0), 1, "too early")),
        ReplayEntry::Connected,
        ReplayEntry::Message(fixtures::buffer_list(&[
            BufferRow::new(pointer_for(0), 1, "core.weechat"),
            BufferRow::new(pointer_for(1), 2, "irc.libera.#rust"),
        ])),
        ReplayEntry::Message(fixtures::line(pointer_for(1), 10, "hello")),
        ReplayEntry::Message(fixtures::line(pointer_for(1), 11, "world")),
        ReplayEntry::Message(fixtures::nicklist(&[
            NickRow::group(pointer_for(1), "root"),
            NickRow::nick(pointer_for(1), "@", "alice"),
            NickRow::nick(pointer_for(1), "", "bob"),
        ])),
        ReplayEntry::Message(fixtures::line(pointer_for(5), 12, "nowhere")),
    ]
}

#[test]
fn capture_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.cbor");

    save_capture(&path, &session()).unwrap();
    assert_eq!(load_capture(&path).unwrap(), session());
}

#[test]
fn truncated_capture_reports_entry_index() {
    let mut bytes = Vec::new();
    write_capture(&mut bytes, &session()).unwrap();
    bytes.truncate(bytes.len() - 3);

    match read_capture(bytes.as_slice()) {
        Err(ReplayError::Decode { index, .. }) => assert_eq!(index, session().len() - 1),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn missing_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.cbor");

    let err = load_capture(&path).unwrap_err();
    assert!(matches!(err, ReplayError::Io { .. }));
    assert!(err.to_string().contains("absent.cbor"));
}

#[test]
fn empty_capture_is_empty() {
    assert!(read_capture(&[][..]).unwrap().is_empty());
}

#[tokio::test]
async fn replay_reports_final_mirror() {
    let summary = replay(session(), ReplayConfig::default()).await.unwrap();

    assert_eq!(summary.entries, 7);
    assert_eq!(summary.buffers, 2);
    assert_eq!(summary.lines, 2);
    assert_eq!(summary.nicks, 2);
    assert_eq!(summary.commands, 4);
    assert_eq!(summary.client.stale_messages, 1);
    assert_eq!(summary.reconcile.dropped_lines, 1);
}

#[tokio::test]
async fn disconnect_clears_unless_kept() {
    let mut entries = session();
    entries.push(ReplayEntry::Disconnected);

    let cleared = replay(entries.clone(), ReplayConfig::default()).await.unwrap();
    assert_eq!(cleared.buffers, 0);

    let config = ReplayConfig { client: ClientConfig { clear_on_disconnect: false, ..Default::default() } };
    let kept = replay(entries, config).await.unwrap();
    assert_eq!(kept.buffers, 2);
    assert_eq!(kept.lines, 2);
}
