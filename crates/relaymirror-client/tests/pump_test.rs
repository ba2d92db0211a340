//! Integration tests for the tokio event pump.

#![cfg(feature = "runtime")]

use relaymirror_client::{Client, ClientConfig, ClientEvent, SessionId, runtime::Pump};
use relaymirror_core::{DiagnosticRecord, Notification};
use relaymirror_harness::{BufferRow, fixtures};
use relaymirror_proto::{Command, Message, Pointer};

fn buffer_list() -> Message {
    fixtures::buffer_list(&[BufferRow::new(Pointer::from("0x1"), 1, "core.weechat")])
}

#[tokio::test]
async fn pump_publishes_snapshot_after_each_event() {
    let mut records = Vec::new();
    let sink = move |record: DiagnosticRecord| records.push(record);
    let (pump, mut handles) = Pump::new(Client::new(ClientConfig::default()), sink, 8);
    let task = pump.spawn();

    handles.events.send(ClientEvent::Connected).await.unwrap();
    handles
        .events
        .send(ClientEvent::MessageReceived { session: SessionId(1), message: buffer_list() })
        .await
        .unwrap();
    drop(handles.events);

    let client = task.await.unwrap();
    assert_eq!(client.mirror().len(), 1);

    let snapshot = handles.snapshots.borrow().clone();
    assert!(snapshot.routable);
    assert_eq!(snapshot.buffers[0].summary.full_name, "core.weechat");

    let mut commands = Vec::new();
    while let Ok(command) = handles.commands.try_recv() {
        commands.push(command);
    }
    assert_eq!(commands.last(), Some(&Command::Sync));

    let notification = handles.notifications.try_recv().unwrap();
    assert!(matches!(notification, Notification::MirrorReplaced { buffers } if buffers.len() == 1));
}

#[tokio::test]
async fn rejected_events_do_not_stop_the_pump() {
    let (pump, mut handles) =
        Pump::new(Client::new(ClientConfig::default()), |_: DiagnosticRecord| {}, 4);
    let task = pump.spawn();

    handles.events.send(ClientEvent::RequestResync).await.unwrap();
    handles.events.send(ClientEvent::Connected).await.unwrap();
    drop(handles.events);

    let client = task.await.unwrap();
    assert_eq!(client.session(), Some(SessionId(1)));
    let first = handles.commands.try_recv().unwrap();
    assert!(first.to_string().starts_with("(listbuffers)"));
}
