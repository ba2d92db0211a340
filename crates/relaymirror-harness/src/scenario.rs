//! Seeded traffic scenarios.
//!
//! Generates operation sequences that look like a real session (connect,
//! resync, then mostly line and nick traffic with the odd reconnect) from a
//! single seed. The same seed always yields the same sequence.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    fixtures::SLOTS,
    model::{ModelBufferRow, Operation},
};

/// Scenario generator.
#[derive(Debug, Clone)]
pub struct Scenario {
    rng: ChaCha8Rng,
    connected: bool,
}

impl Scenario {
    /// Generator for `seed`.
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), connected: false }
    }

    /// `steps` operations, starting with a connect and a resync.
    pub fn generate(seed: u64, steps: usize) -> Vec<Operation> {
        let mut scenario = Self::new(seed);
        let mut ops = vec![Operation::Connect, scenario.resync()];
        scenario.connected = true;
        ops.extend((0..steps).map(|_| scenario.next_op()));
        ops
    }

    fn slot(&mut self) -> u8 {
        self.rng.gen_range(0..SLOTS)
    }

    fn resync(&mut self) -> Operation {
        let len = self.rng.gen_range(1..=usize::from(SLOTS));
        let rows = (0..len)
            .map(|_| ModelBufferRow { slot: self.slot(), number: self.rng.gen_range(1..=200) })
            .collect();
        Operation::Resync { rows }
    }

    fn next_op(&mut self) -> Operation {
        if !self.connected {
            self.connected = true;
            return Operation::Connect;
        }

        match self.rng.gen_range(0..100u32) {
            0..=34 => Operation::Line { slot: self.slot(), seed: self.rng.r#gen() },
            35..=49 => Operation::LiveLine { slot: self.slot(), seed: self.rng.r#gen() },
            50..=69 => Operation::Nick {
                slot: self.slot(),
                group: self.rng.gen_bool(0.2),
                visible: self.rng.gen_bool(0.9),
                seed: self.rng.r#gen(),
            },
            70..=79 => self.resync(),
            80..=84 => Operation::Debug { slot: self.slot() },
            85..=88 => Operation::Input { slot: self.slot() },
            89..=91 => Operation::StaleLine { slot: self.slot() },
            92..=93 => Operation::Malformed { slot: self.slot() },
            94..=96 => Operation::Connect,
            _ => {
                self.connected = false;
                Operation::Disconnect
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_scenario() {
        assert_eq!(Scenario::generate(7, 50), Scenario::generate(7, 50));
    }

    #[test]
    fn scenario_opens_with_connect_and_resync() {
        let ops = Scenario::generate(1, 0);
        assert_eq!(ops[0], Operation::Connect);
        assert!(matches!(ops[1], Operation::Resync { .. }));
    }
}
