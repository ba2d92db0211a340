//! Message fixtures.
//!
//! Builders for the three reconciled message shapes, with the same paths,
//! ancestry depth and field types a live relay produces, plus the live
//! events (`_buffer_line_added`, `_nicklist_diff`) that follow a `sync`.

use relaymirror_proto::{Hdata, HdataItem, Message, Object, ObjectType, Pointer, RequestIds};

/// Distinct buffer slots used by generated traffic.
pub const SLOTS: u8 = 8;

/// Pointer for a buffer slot. Slots wrap at [`SLOTS`].
pub fn pointer_for(slot: u8) -> Pointer {
    Pointer::new(format!("0x{:x}", 0x5000 + u32::from(slot % SLOTS)))
}

/// One buffer-list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferRow {
    /// Buffer pointer.
    pub pointer: Pointer,
    /// Buffer number as sent.
    pub number: i32,
    /// Full name.
    pub full_name: String,
    /// Short name; `None` leaves the field out.
    pub short_name: Option<String>,
    /// Title; `None` leaves the field out.
    pub title: Option<String>,
}

impl BufferRow {
    /// Row with only the required fields.
    pub fn new(pointer: Pointer, number: i32, full_name: impl Into<String>) -> Self {
        Self { pointer, number, full_name: full_name.into(), short_name: None, title: None }
    }
}

/// One line row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRow {
    /// Owning buffer.
    pub owner: Pointer,
    /// Unix timestamp.
    pub date: i64,
    /// Prefix.
    pub prefix: String,
    /// Text.
    pub text: String,
}

/// One nicklist row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NickRow {
    /// Owning buffer.
    pub owner: Pointer,
    /// Group header rather than a nick.
    pub group: bool,
    /// Shown in the nicklist.
    pub visible: bool,
    /// Mode prefix.
    pub prefix: String,
    /// Nick or group name.
    pub name: String,
}

impl NickRow {
    /// Visible leaf nick.
    pub fn nick(owner: Pointer, prefix: &str, name: &str) -> Self {
        Self { owner, group: false, visible: true, prefix: prefix.into(), name: name.into() }
    }

    /// Group header.
    pub fn group(owner: Pointer, name: &str) -> Self {
        Self { owner, group: true, visible: true, prefix: String::new(), name: name.into() }
    }
}

/// Buffer-list reply tagged with the default request id.
pub fn buffer_list(rows: &[BufferRow]) -> Message {
    buffer_list_with_id(&RequestIds::default().buffers, rows)
}

/// Buffer-list reply with an explicit id.
pub fn buffer_list_with_id(id: &str, rows: &[BufferRow]) -> Message {
    let mut hdata = Hdata::new("buffer");
    hdata.keys = vec![
        ("number".into(), ObjectType::Int),
        ("full_name".into(), ObjectType::Str),
    ];
    for row in rows {
        let mut item = HdataItem::new([row.pointer.clone()])
            .with("number", Object::Int(row.number))
            .with("full_name", Object::string(row.full_name.as_str()));
        if let Some(short_name) = &row.short_name {
            item = item.with("short_name", Object::string(short_name.as_str()));
        }
        if let Some(title) = &row.title {
            item = item.with("title", Object::string(title.as_str()));
        }
        hdata.items.push(item);
    }
    Message::new(id, vec![Object::Hdata(hdata)])
}

/// Line reply tagged with the default request id.
pub fn lines(rows: &[LineRow]) -> Message {
    let mut hdata = Hdata::new("buffer/lines/line/line_data");
    for (i, row) in rows.iter().enumerate() {
        let line = Pointer::new(format!("0x{:x}", 0x9000 + i));
        hdata.items.push(line_item(row, [row.owner.clone(), line.clone(), line.clone(), line]));
    }
    Message::new(RequestIds::default().lines, vec![Object::Hdata(hdata)])
}

/// Live `_buffer_line_added` event for one line.
pub fn live_line(row: &LineRow) -> Message {
    let mut hdata = Hdata::new("line_data");
    hdata.items.push(line_item(row, [row.owner.clone()]));
    Message::new("_buffer_line_added", vec![Object::Hdata(hdata)])
}

fn line_item(row: &LineRow, ancestry: impl IntoIterator<Item = Pointer>) -> HdataItem {
    HdataItem::new(ancestry)
        .with("date", Object::Time(row.date))
        .with("displayed", Object::Char(1))
        .with("prefix", Object::string(row.prefix.as_str()))
        .with("message", Object::string(row.text.as_str()))
}

/// Single line addressed to `owner`.
pub fn line(owner: Pointer, date: i64, text: &str) -> Message {
    lines(&[LineRow { owner, date, prefix: String::new(), text: text.into() }])
}

/// Nicklist reply tagged with the default request id.
pub fn nicklist(rows: &[NickRow]) -> Message {
    let mut hdata = Hdata::new("buffer/nick_group");
    for (i, row) in rows.iter().enumerate() {
        hdata.items.push(nick_item(row, i));
    }
    Message::new(RequestIds::default().nicklist, vec![Object::Hdata(hdata)])
}

/// Live `_nicklist_diff` event. Each row carries its change code
/// (`^` parent, `+` added, `-` removed, `*` updated).
pub fn nicklist_diff(rows: &[(char, NickRow)]) -> Message {
    let mut hdata = Hdata::new("buffer/nick_group");
    for (i, (code, row)) in rows.iter().enumerate() {
        let code = i8::try_from(u32::from(*code)).unwrap_or(i8::MAX);
        hdata.items.push(nick_item(row, i).with("_diff", Object::Char(code)));
    }
    Message::new("_nicklist_diff", vec![Object::Hdata(hdata)])
}

fn nick_item(row: &NickRow, i: usize) -> HdataItem {
    HdataItem::new([row.owner.clone(), Pointer::new(format!("0x{:x}", 0xa000 + i))])
        .with("group", Object::Char(i8::from(row.group)))
        .with("visible", Object::Char(i8::from(row.visible)))
        .with("level", Object::Int(0))
        .with("prefix", Object::string(row.prefix.as_str()))
        .with("name", Object::string(row.name.as_str()))
}

/// `message` re-tagged as a debug console reply.
pub fn as_debug(message: Message) -> Message {
    let id = format!("debug_{}", message.id);
    with_id(message, &id)
}

/// `message` re-tagged with `id`.
pub fn with_id(mut message: Message, id: &str) -> Message {
    message.id = id.to_string();
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nicklist_path_ends_in_nick_group() {
        let message = nicklist(&[NickRow::group(pointer_for(0), "root")]);
        let tail = message.hdata().next().and_then(|h| h.path_tail().map(str::to_string));
        assert_eq!(tail.as_deref(), Some("nick_group"));
    }

    #[test]
    fn live_line_is_owned_by_its_buffer() {
        let row = LineRow { owner: pointer_for(2), date: 7, prefix: "nick".into(), text: "hi".into() };
        let message = live_line(&row);
        let item = &message.hdata().next().unwrap().items[0];
        assert!(message.is_unsolicited());
        assert_eq!(item.owner().unwrap(), &pointer_for(2));
    }

    #[test]
    fn diff_rows_carry_change_codes() {
        let message = nicklist_diff(&[('-', NickRow::nick(pointer_for(0), "", "bob"))]);
        let item = &message.hdata().next().unwrap().items[0];
        assert_eq!(item.integer("_diff").unwrap(), i64::from(b'-'));
    }

    #[test]
    fn slots_wrap() {
        assert_eq!(pointer_for(1), pointer_for(1 + SLOTS));
    }
}
