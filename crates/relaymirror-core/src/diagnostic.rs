//! Diagnostic echo seam.
//!
//! Debug console traffic is never reconciled. It is handed verbatim to a
//! [`DiagnosticSink`] together with its size and a hex/printable rendering of
//! the raw frame. Outgoing commands are echoed the same way.

use std::fmt::Write as _;

use relaymirror_proto::{Command, Message};

/// Bytes per row in the hex/printable rendering.
pub const HEX_ROW_WIDTH: usize = 20;

/// Traffic direction of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received from the relay.
    In,
    /// Sent to the relay.
    Out,
}

/// Presentation hint for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// Inbound traffic.
    Received,
    /// Outbound traffic.
    Sent,
    /// Connection status change.
    Status,
}

/// One entry for the diagnostic collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// Traffic direction.
    pub direction: Direction,
    /// Short label (`==>`, `<==`, or empty for status lines).
    pub label: String,
    /// Rendered payload.
    pub payload: String,
    /// Presentation hint.
    pub hint: Hint,
}

impl DiagnosticRecord {
    /// Echo of a received message: size, decompressed size, raw rendering and
    /// the decoded structure.
    pub fn inbound(message: &Message) -> Self {
        let mut payload = format!("message ({} bytes)", message.size);
        if let Some(decompression) = message.decompression {
            let _ = write!(payload, ", uncompressed {} bytes", decompression.size_uncompressed);
        }
        if !message.raw.is_empty() {
            payload.push_str(":\n");
            payload.push_str(&render_bytes(&message.raw, HEX_ROW_WIDTH));
        }
        let _ = write!(payload, "\nid={:?} objects={:?}", message.id, message.objects);

        Self { direction: Direction::In, label: "==>".to_string(), payload, hint: Hint::Received }
    }

    /// Echo of a sent command.
    pub fn outbound(command: &Command) -> Self {
        Self {
            direction: Direction::Out,
            label: "<==".to_string(),
            payload: command.to_string(),
            hint: Hint::Sent,
        }
    }

    /// Connection status line.
    pub fn status(text: impl Into<String>) -> Self {
        Self { direction: Direction::In, label: String::new(), payload: text.into(), hint: Hint::Status }
    }
}

/// Write-only consumer of diagnostic records.
pub trait DiagnosticSink {
    /// Accept one record.
    fn record(&mut self, record: DiagnosticRecord);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(DiagnosticRecord),
{
    fn record(&mut self, record: DiagnosticRecord) {
        self(record);
    }
}

/// Sink writing records to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn record(&mut self, record: DiagnosticRecord) {
        tracing::debug!(
            direction = ?record.direction,
            hint = ?record.hint,
            label = %record.label,
            "{}",
            record.payload
        );
    }
}

/// Hex and printable-ASCII rendering, `width` bytes per row.
pub fn render_bytes(raw: &[u8], width: usize) -> String {
    let width = width.max(1);
    raw.chunks(width)
        .map(|chunk| {
            let hex: Vec<String> = chunk.iter().map(|b| hex::encode([*b])).collect();
            let printable: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { char::from(b) } else { '.' })
                .collect();
            format!("{:<pad$}  {printable}", hex.join(" "), pad = width * 3 - 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
