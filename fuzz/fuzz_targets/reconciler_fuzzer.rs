//! Fuzz target for the reconciler
//!
//! # Strategy
//!
//! - Model operations: arbitrary session traffic, checked against the model
//! - Raw rows: hdata rows with arbitrary field types, missing fields,
//!   unknown nicklist change codes and empty ancestry under each reconciled
//!   path, tagged with request ids or live event ids
//!
//! # Invariants
//!
//! - Model and real client agree on every result and on final state
//! - Mirror invariants hold after every message
//! - A rejected message leaves the mirror exactly as it was
//! - NEVER panic on malformed rows

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use relaymirror_client::ClientConfig;
use relaymirror_core::{BufferMirror, Reconciler};
use relaymirror_harness::{
    Driver, InvariantRegistry, ModelWorld, Operation, SystemSnapshot, pointer_for,
};
use relaymirror_proto::{Hdata, HdataItem, Message, Object, Pointer};

#[derive(Debug, Clone, Arbitrary)]
enum Input {
    ModelOps { clear_on_disconnect: bool, ops: Vec<Operation> },
    RawRows { messages: Vec<RawMessage> },
}

#[derive(Debug, Clone, Arbitrary)]
struct RawMessage {
    id: RawId,
    path: RawPath,
    rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum RawId {
    Buffers,
    Lines,
    Nicklist,
    Debug,
    Unsolicited,
    LiveLine,
    NicklistDiff,
    Other,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum RawPath {
    Buffer,
    LineData,
    LiveLineData,
    NickGroup,
    Hotlist,
    Empty,
}

#[derive(Debug, Clone, Arbitrary)]
struct RawRow {
    ancestry: Vec<u8>,
    fields: Vec<(RawField, RawValue)>,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum RawField {
    Number,
    FullName,
    ShortName,
    Title,
    Date,
    Prefix,
    Message,
    Group,
    Visible,
    Name,
    Diff,
}

#[derive(Debug, Clone, Arbitrary)]
enum RawValue {
    Char(i8),
    Int(i32),
    Long(i64),
    Str(Option<String>),
    Pointer(u8),
    Time(i64),
}

impl RawField {
    fn name(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::FullName => "full_name",
            Self::ShortName => "short_name",
            Self::Title => "title",
            Self::Date => "date",
            Self::Prefix => "prefix",
            Self::Message => "message",
            Self::Group => "group",
            Self::Visible => "visible",
            Self::Name => "name",
            Self::Diff => "_diff",
        }
    }
}

impl RawValue {
    fn into_object(self) -> Object {
        match self {
            Self::Char(v) => Object::Char(v),
            Self::Int(v) => Object::Int(v),
            Self::Long(v) => Object::Long(v),
            Self::Str(v) => Object::Str(v),
            Self::Pointer(slot) => Object::Pointer(pointer_for(slot)),
            Self::Time(v) => Object::Time(v),
        }
    }
}

impl RawMessage {
    fn build(self) -> Message {
        let id = match self.id {
            RawId::Buffers => "listbuffers",
            RawId::Lines => "listlines",
            RawId::Nicklist => "nicklist",
            RawId::Debug => "debug_fuzz",
            RawId::Unsolicited => "_buffer_opened",
            RawId::LiveLine => "_buffer_line_added",
            RawId::NicklistDiff => "_nicklist_diff",
            RawId::Other => "custom",
        };
        let path = match self.path {
            RawPath::Buffer => "buffer",
            RawPath::LineData => "buffer/lines/line/line_data",
            RawPath::LiveLineData => "line_data",
            RawPath::NickGroup => "buffer/nick_group",
            RawPath::Hotlist => "hotlist",
            RawPath::Empty => "",
        };

        let mut hdata = Hdata::new(path);
        for row in self.rows {
            let ancestry: Vec<Pointer> = row.ancestry.into_iter().map(pointer_for).collect();
            let mut item = HdataItem::new(ancestry);
            for (field, value) in row.fields {
                item = item.with(field.name(), value.into_object());
            }
            hdata.items.push(item);
        }
        Message::new(id, vec![Object::Hdata(hdata)])
    }
}

fuzz_target!(|input: Input| {
    let registry = InvariantRegistry::standard();

    match input {
        Input::ModelOps { clear_on_disconnect, ops } => {
            let mut model = ModelWorld::new(clear_on_disconnect);
            let mut real = Driver::new(ClientConfig { clear_on_disconnect, ..Default::default() });

            for op in &ops {
                assert_eq!(model.apply(op), real.apply(op), "divergence at {op:?}");
                if let Err(violations) = registry.check_all(&real.snapshot()) {
                    panic!("after {op:?}: {violations:?}");
                }
            }
            assert_eq!(model.observable_state(), real.observable_state());
        },
        Input::RawRows { messages } => {
            let mut reconciler = Reconciler::default();
            let mut mirror = BufferMirror::new();

            for message in messages {
                let before = mirror.snapshot();
                if reconciler.apply(&mut mirror, &message.build()).is_err() {
                    assert_eq!(mirror.snapshot(), before, "rejected message mutated the mirror");
                }
                let snapshot = SystemSnapshot { mirror: mirror.snapshot(), ..SystemSnapshot::default() };
                if let Err(violations) = registry.check_all(&snapshot) {
                    panic!("{violations:?}");
                }
            }
        },
    }
});
