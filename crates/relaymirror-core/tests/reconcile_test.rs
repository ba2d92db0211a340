//! Reconciler behavior per message kind.

use relaymirror_core::{
    BufferMirror, MessageKind, NicklistMode, Notification, ReconcileError, Reconciler,
    ReconcilerConfig, UpdateKind,
};
use relaymirror_harness::{BufferRow, LineRow, NickRow, fixtures};
use relaymirror_proto::{Hdata, Message, Object, Pointer, ProtocolError};

fn ptr(raw: &str) -> Pointer {
    Pointer::from(raw)
}

fn line_row(owner: &str, date: i64, prefix: &str, text: &str) -> LineRow {
    LineRow { owner: ptr(owner), date, prefix: prefix.into(), text: text.into() }
}

fn synced() -> (Reconciler, BufferMirror) {
    let mut reconciler = Reconciler::default();
    let mut mirror = BufferMirror::new();
    reconciler
        .apply(
            &mut mirror,
            &fixtures::buffer_list(&[
                BufferRow::new(ptr("0x1"), 1, "core.weechat"),
                BufferRow::new(ptr("0x2"), 2, "#test"),
            ]),
        )
        .unwrap();
    (reconciler, mirror)
}

fn nick_names(mirror: &BufferMirror, pointer: &str) -> Vec<String> {
    mirror.get(&ptr(pointer)).unwrap().nicks.iter().map(|n| format!("{}{}", n.prefix, n.name)).collect()
}

#[test]
fn resync_installs_buffers_in_order() {
    let (_, mirror) = synced();
    let names: Vec<_> = mirror.buffers().iter().map(|b| b.summary.full_name.as_str()).collect();
    assert_eq!(names, ["core.weechat", "#test"]);
}

#[test]
fn resync_discards_previous_lines() {
    let (mut reconciler, mut mirror) = synced();
    reconciler.apply(&mut mirror, &fixtures::line(ptr("0x1"), 1, "hello")).unwrap();
    reconciler
        .apply(&mut mirror, &fixtures::buffer_list(&[BufferRow::new(ptr("0x1"), 1, "core.weechat")]))
        .unwrap();

    assert!(mirror.get(&ptr("0x1")).unwrap().lines.is_empty());
}

#[test]
fn line_routes_to_owner_only() {
    let (mut reconciler, mut mirror) = synced();
    let outcome = reconciler
        .apply(&mut mirror, &fixtures::lines(&[line_row("0x2", 1000, "nick", "hi")]))
        .unwrap();

    assert_eq!(outcome.notifications, [Notification::LineAppended {
        buffer: ptr("0x2"),
        date: 1000,
        prefix: "nick".into(),
        text: "hi".into(),
    }]);
    assert!(mirror.get(&ptr("0x1")).unwrap().lines.is_empty());
    assert_eq!(mirror.get(&ptr("0x2")).unwrap().lines.len(), 1);
}

#[test]
fn live_line_event_appends_to_owner() {
    let (mut reconciler, mut mirror) = synced();
    let outcome =
        reconciler.apply(&mut mirror, &fixtures::live_line(&line_row("0x2", 1000, "nick", "hi"))).unwrap();

    assert_eq!(outcome.kind, MessageKind::Lines);
    assert_eq!(outcome.notifications, [Notification::LineAppended {
        buffer: ptr("0x2"),
        date: 1000,
        prefix: "nick".into(),
        text: "hi".into(),
    }]);
    assert_eq!(mirror.get(&ptr("0x2")).unwrap().lines.len(), 1);
}

#[test]
fn unsolicited_buffer_event_does_not_resync() {
    let (mut reconciler, mut mirror) = synced();
    let opened = fixtures::with_id(
        fixtures::buffer_list(&[BufferRow::new(ptr("0x3"), 3, "#new")]),
        "_buffer_opened",
    );

    let outcome = reconciler.apply(&mut mirror, &opened).unwrap();
    assert_eq!(outcome.kind, MessageKind::Ignored);
    assert_eq!(mirror.len(), 2);
}

#[test]
fn unknown_owner_is_dropped_and_counted() {
    let (mut reconciler, mut mirror) = synced();
    let outcome = reconciler.apply(&mut mirror, &fixtures::line(ptr("0x9"), 1, "lost")).unwrap();

    assert_eq!(outcome.notifications, [Notification::DroppedUpdate {
        kind: UpdateKind::Line,
        identifier: ptr("0x9"),
    }]);
    assert_eq!(reconciler.stats().dropped_lines, 1);
}

#[test]
fn malformed_row_rejects_whole_message() {
    let (mut reconciler, mut mirror) = synced();
    let mut message =
        fixtures::lines(&[line_row("0x1", 1, "", "first"), line_row("0x2", 2, "", "second")]);
    if let Object::Hdata(hdata) = &mut message.objects[0] {
        hdata.items[1].fields.remove("date");
    }

    let err = reconciler.apply(&mut mirror, &message).unwrap_err();
    assert_eq!(err, ReconcileError::MalformedRow {
        kind: MessageKind::Lines,
        row: 1,
        source: ProtocolError::MissingField { field: "date".into() },
    });
    assert!(mirror.get(&ptr("0x1")).unwrap().lines.is_empty());
    assert_eq!(reconciler.stats().rejected_messages, 1);
}

#[test]
fn request_id_without_table_is_rejected() {
    let (mut reconciler, mut mirror) = synced();
    let before = mirror.snapshot();

    let err = reconciler
        .apply(&mut mirror, &Message::new("listbuffers", vec![Object::string("oops")]))
        .unwrap_err();

    assert_eq!(err, ReconcileError::MissingTable { kind: MessageKind::BufferList, path: "buffer" });
    assert_eq!(mirror.snapshot(), before);
    assert_eq!(reconciler.stats().rejected_messages, 1);
    assert_eq!(reconciler.stats().resyncs, 1);
}

#[test]
fn request_id_with_wrong_table_is_rejected() {
    let (mut reconciler, mut mirror) = synced();
    let message = Message::new("nicklist", vec![Object::Hdata(Hdata::new("hotlist"))]);

    let err = reconciler.apply(&mut mirror, &message).unwrap_err();
    assert!(matches!(err, ReconcileError::MissingTable { kind: MessageKind::Nicklist, .. }));
}

#[test]
fn empty_result_table_is_accepted() {
    let (mut reconciler, mut mirror) = synced();
    let message = Message::new("listlines", vec![Object::Hdata(Hdata::new(""))]);

    let outcome = reconciler.apply(&mut mirror, &message).unwrap();
    assert_eq!(outcome.kind, MessageKind::Lines);
    assert!(outcome.notifications.is_empty());
    assert_eq!(reconciler.stats().rejected_messages, 0);
}

#[test]
fn non_positive_number_rejects_resync() {
    let (mut reconciler, mut mirror) = synced();
    let err = reconciler
        .apply(&mut mirror, &fixtures::buffer_list(&[BufferRow::new(ptr("0x3"), 0, "bad")]))
        .unwrap_err();

    assert_eq!(err, ReconcileError::InvalidNumber { row: 0, number: 0 });
    assert_eq!(mirror.len(), 2);
}

#[test]
fn group_and_invisible_rows_add_no_nicks() {
    let (mut reconciler, mut mirror) = synced();
    let ghost = NickRow { visible: false, ..NickRow::nick(ptr("0x2"), "", "ghost") };
    let outcome = reconciler
        .apply(
            &mut mirror,
            &fixtures::nicklist(&[
                NickRow::group(ptr("0x2"), "root"),
                ghost,
                NickRow::nick(ptr("0x2"), "@", "alice"),
            ]),
        )
        .unwrap();

    assert_eq!(outcome.notifications, [
        Notification::NicklistCleared { buffer: ptr("0x2") },
        Notification::NickAdded { buffer: ptr("0x2"), prefix: "@".into(), name: "alice".into() },
    ]);
}

#[test]
fn replace_mode_clears_previous_nicks() {
    let (mut reconciler, mut mirror) = synced();
    reconciler.apply(&mut mirror, &fixtures::nicklist(&[NickRow::nick(ptr("0x2"), "", "alice")])).unwrap();
    reconciler.apply(&mut mirror, &fixtures::nicklist(&[NickRow::nick(ptr("0x2"), "", "bob")])).unwrap();

    assert_eq!(nick_names(&mirror, "0x2"), ["bob"]);
}

#[test]
fn additive_mode_accumulates() {
    let config =
        ReconcilerConfig { nicklist_mode: NicklistMode::Additive, ..ReconcilerConfig::default() };
    let mut reconciler = Reconciler::new(config);
    let mut mirror = BufferMirror::new();
    reconciler.apply(&mut mirror, &fixtures::buffer_list(&[BufferRow::new(ptr("0x2"), 2, "#test")])).unwrap();
    reconciler.apply(&mut mirror, &fixtures::nicklist(&[NickRow::nick(ptr("0x2"), "", "alice")])).unwrap();
    let outcome = reconciler
        .apply(
            &mut mirror,
            &fixtures::nicklist(&[
                NickRow::nick(ptr("0x2"), "", "alice"),
                NickRow::nick(ptr("0x2"), "", "bob"),
            ]),
        )
        .unwrap();

    assert_eq!(mirror.get(&ptr("0x2")).unwrap().nicks.len(), 2);
    assert_eq!(outcome.notifications.len(), 1);
}

#[test]
fn nicklist_diff_applies_without_clearing() {
    let (mut reconciler, mut mirror) = synced();
    reconciler
        .apply(
            &mut mirror,
            &fixtures::nicklist(&[
                NickRow::nick(ptr("0x2"), "@", "alice"),
                NickRow::nick(ptr("0x2"), "", "bob"),
            ]),
        )
        .unwrap();

    let outcome = reconciler
        .apply(
            &mut mirror,
            &fixtures::nicklist_diff(&[
                ('^', NickRow::group(ptr("0x2"), "root")),
                ('-', NickRow::nick(ptr("0x2"), "", "bob")),
                ('+', NickRow::nick(ptr("0x2"), "", "carol")),
                ('*', NickRow::nick(ptr("0x2"), "+", "alice")),
            ]),
        )
        .unwrap();

    assert_eq!(outcome.kind, MessageKind::Nicklist);
    assert_eq!(outcome.notifications, [
        Notification::NickRemoved { buffer: ptr("0x2"), prefix: String::new(), name: "bob".into() },
        Notification::NickAdded { buffer: ptr("0x2"), prefix: String::new(), name: "carol".into() },
        Notification::NickRemoved { buffer: ptr("0x2"), prefix: "@".into(), name: "alice".into() },
        Notification::NickAdded { buffer: ptr("0x2"), prefix: "+".into(), name: "alice".into() },
    ]);
    assert_eq!(nick_names(&mirror, "0x2"), ["carol", "+alice"]);
    assert_eq!(reconciler.stats().nicks_removed, 2);
}

#[test]
fn nicklist_diff_for_unknown_buffer_is_dropped() {
    let (mut reconciler, mut mirror) = synced();
    let outcome = reconciler
        .apply(&mut mirror, &fixtures::nicklist_diff(&[('+', NickRow::nick(ptr("0x9"), "", "eve"))]))
        .unwrap();

    assert_eq!(outcome.notifications, [Notification::DroppedUpdate {
        kind: UpdateKind::Nick,
        identifier: ptr("0x9"),
    }]);
}

#[test]
fn unknown_change_code_rejects_diff() {
    let (mut reconciler, mut mirror) = synced();
    let err = reconciler
        .apply(
            &mut mirror,
            &fixtures::nicklist_diff(&[
                ('+', NickRow::nick(ptr("0x2"), "", "carol")),
                ('?', NickRow::nick(ptr("0x2"), "", "dave")),
            ]),
        )
        .unwrap_err();

    assert_eq!(err, ReconcileError::InvalidNickChange { row: 1, code: i64::from(b'?') });
    assert!(mirror.get(&ptr("0x2")).unwrap().nicks.is_empty());
}

#[test]
fn diagnostic_messages_do_not_touch_mirror() {
    let (mut reconciler, mut mirror) = synced();
    let message = fixtures::as_debug(fixtures::buffer_list(&[BufferRow::new(ptr("0x7"), 7, "other")]));

    let outcome = reconciler.apply(&mut mirror, &message).unwrap();
    assert_eq!(outcome.kind, MessageKind::Diagnostic);
    assert!(outcome.notifications.is_empty());
    assert_eq!(mirror.len(), 2);
}

#[test]
fn strip_applies_to_prefix_and_text() {
    let strip = |text: &str| text.replace('\u{19}', "");
    let mut reconciler = Reconciler::with_strip(ReconcilerConfig::default(), strip);
    let mut mirror = BufferMirror::new();
    reconciler
        .apply(&mut mirror, &fixtures::buffer_list(&[BufferRow::new(ptr("0x1"), 1, "core.weechat")]))
        .unwrap();
    reconciler
        .apply(&mut mirror, &fixtures::lines(&[line_row("0x1", 5, "\u{19}nick", "\u{19}hi")]))
        .unwrap();

    let line = &mirror.get(&ptr("0x1")).unwrap().lines[0];
    assert_eq!((line.prefix.as_str(), line.text.as_str()), ("nick", "hi"));
}

#[test]
fn unrelated_tables_in_known_message_are_skipped() {
    let (mut reconciler, mut mirror) = synced();
    let mut message = fixtures::line(ptr("0x1"), 1, "kept");
    message.objects.push(Object::Hdata(Hdata::new("hotlist")));

    let outcome = reconciler.apply(&mut mirror, &message).unwrap();
    assert_eq!(outcome.notifications.len(), 1);
}
