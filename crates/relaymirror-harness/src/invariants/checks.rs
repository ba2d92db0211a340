//! Standard invariant checks.
//!
//! These invariants capture structural properties of the mirror that must
//! hold after every fully processed event.

use std::collections::HashSet;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// No two buffers share a pointer.
pub struct UniqueBufferPointers;

impl Invariant for UniqueBufferPointers {
    fn name(&self) -> &'static str {
        "unique_buffer_pointers"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for (pos, buffer) in state.mirror.buffers.iter().enumerate() {
            if !seen.insert(&buffer.summary.pointer) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("pointer {} repeated at position {pos}", buffer.summary.pointer),
                });
            }
        }
        Ok(())
    }
}

/// Every buffer number is positive.
pub struct PositiveBufferNumbers;

impl Invariant for PositiveBufferNumbers {
    fn name(&self) -> &'static str {
        "positive_buffer_numbers"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        match state.mirror.buffers.iter().find(|b| b.summary.number == 0) {
            Some(buffer) => Err(Violation {
                invariant: self.name(),
                message: format!("buffer {} has number 0", buffer.summary.pointer),
            }),
            None => Ok(()),
        }
    }
}

/// While routable, routes map each pointer to exactly its mirror position;
/// while unroutable, there are no routes at all.
pub struct RoutingAgreement;

impl Invariant for RoutingAgreement {
    fn name(&self) -> &'static str {
        "routing_agreement"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mirror = &state.mirror;
        let violation = |message: String| Err(Violation { invariant: self.name(), message });

        if !mirror.routable {
            if !mirror.routes.is_empty() {
                return violation(format!("unroutable mirror still has {} routes", mirror.routes.len()));
            }
            return Ok(());
        }

        if mirror.routes.len() != mirror.buffers.len() {
            return violation(format!(
                "{} routes for {} buffers",
                mirror.routes.len(),
                mirror.buffers.len()
            ));
        }
        for (pointer, &pos) in &mirror.routes {
            let actual = mirror.buffers.get(pos).map(|b| &b.summary.pointer);
            if actual != Some(pointer) {
                return violation(format!("route {pointer} -> {pos} points at {actual:?}"));
            }
        }
        Ok(())
    }
}

/// No buffer holds more lines than the configured cap.
pub struct LineCapRespected;

impl Invariant for LineCapRespected {
    fn name(&self) -> &'static str {
        "line_cap_respected"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(cap) = state.line_cap else {
            return Ok(());
        };
        match state.mirror.buffers.iter().find(|b| b.line_count > cap) {
            Some(buffer) => Err(Violation {
                invariant: self.name(),
                message: format!(
                    "buffer {} holds {} lines, cap is {cap}",
                    buffer.summary.pointer, buffer.line_count
                ),
            }),
            None => Ok(()),
        }
    }
}

/// Session ids never decrease.
pub struct SessionMonotonicity;

impl Invariant for SessionMonotonicity {
    fn name(&self) -> &'static str {
        "session_monotonicity"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for window in state.session_history.windows(2) {
            if window[1] < window[0] {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("session went from {} to {}", window[0], window[1]),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use relaymirror_client::SessionId;
    use relaymirror_core::{BufferSnapshot, BufferSummary, MirrorSnapshot};
    use relaymirror_proto::Pointer;

    use super::*;

    fn buffer(ptr: &str, number: u32, line_count: usize) -> BufferSnapshot {
        BufferSnapshot {
            summary: BufferSummary {
                pointer: Pointer::from(ptr),
                number,
                full_name: ptr.to_string(),
                short_name: None,
                title: None,
            },
            line_count,
            nick_count: 0,
        }
    }

    fn snapshot(buffers: Vec<BufferSnapshot>, routes: &[(&str, usize)]) -> SystemSnapshot {
        SystemSnapshot {
            mirror: MirrorSnapshot {
                routable: true,
                buffers,
                routes: routes.iter().map(|(p, i)| (Pointer::from(*p), *i)).collect::<BTreeMap<_, _>>(),
            },
            ..SystemSnapshot::default()
        }
    }

    #[test]
    fn duplicate_pointer_detected() {
        let state = snapshot(vec![buffer("0x1", 1, 0), buffer("0x1", 2, 0)], &[("0x1", 1)]);
        assert!(UniqueBufferPointers.check(&state).is_err());
    }

    #[test]
    fn misrouted_pointer_detected() {
        let state = snapshot(vec![buffer("0x1", 1, 0), buffer("0x2", 2, 0)], &[
            ("0x1", 1),
            ("0x2", 0),
        ]);
        let violation = RoutingAgreement.check(&state).unwrap_err();
        assert_eq!(violation.invariant, "routing_agreement");
    }

    #[test]
    fn zero_number_detected() {
        let state = snapshot(vec![buffer("0x1", 0, 0)], &[("0x1", 0)]);
        assert!(PositiveBufferNumbers.check(&state).is_err());
    }

    #[test]
    fn line_cap_only_checked_when_set() {
        let mut state = snapshot(vec![buffer("0x1", 1, 10)], &[("0x1", 0)]);
        assert!(LineCapRespected.check(&state).is_ok());
        state.line_cap = Some(5);
        assert!(LineCapRespected.check(&state).is_err());
    }

    #[test]
    fn session_regression_detected() {
        let state = SystemSnapshot::empty().with_sessions([SessionId(2), SessionId(1)]);
        assert!(SessionMonotonicity.check(&state).is_err());
    }
}
