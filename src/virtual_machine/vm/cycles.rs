use crate::virtual_machine::isa::{GROUP_COUNT, Group};

/// Cycles spent per instruction group.
///
/// Backed by a flat array indexed by the [`Group`] discriminant.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CycleProfile {
    counts: [u64; GROUP_COUNT],
    instructions: u64,
}

impl CycleProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed instruction.
    #[inline(always)]
    pub fn add(&mut self, group: Group, cycles: u64) {
        let slot = &mut self.counts[group as usize];
        *slot = slot.saturating_add(cycles);
        self.instructions += 1;
    }

    pub fn get(&self, group: Group) -> u64 {
        self.counts[group as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    /// Number of instructions recorded.
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    pub fn iter(&self) -> impl Iterator<Item = (Group, u64)> {
        Group::ALL.into_iter().zip(self.counts)
    }
}
