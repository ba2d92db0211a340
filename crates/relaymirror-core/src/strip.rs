//! Color-stripping seam.
//!
//! Line prefixes and texts carry the server's color escape codes. Removing
//! them is the job of an external collaborator; the reconciler only calls it.

/// Removes color/markup escapes from a string.
///
/// Implementations must be total: unknown escapes are passed through or
/// dropped, never reported as errors.
pub trait ColorStrip {
    /// Text with escapes removed.
    fn strip(&self, text: &str) -> String;
}

impl<F> ColorStrip for F
where
    F: Fn(&str) -> String,
{
    fn strip(&self, text: &str) -> String {
        self(text)
    }
}

/// Pass-through policy: text is kept exactly as received.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl ColorStrip for Verbatim {
    fn strip(&self, text: &str) -> String {
        text.to_string()
    }
}
