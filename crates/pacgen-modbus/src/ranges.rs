//! Merging of contiguous register/address pairs into link blocks

/// A run of consecutive registers mapped to consecutive Modbus addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkBlock {
    /// First %R offset
    pub register: u32,
    /// First Modbus address
    pub address: u32,
    /// Number of registers in the run
    pub count: u32,
}

impl LinkBlock {
    fn extends_with(&self, register: u32, address: u32) -> bool {
        register.checked_sub(self.register) == Some(self.count)
            && address.checked_sub(self.address) == Some(self.count)
    }
}

/// Merge (register, address) pairs into the fewest link blocks
///
/// Pairs are sorted by register first; a block grows while both the register
/// and the address go up by exactly one.
pub fn merge_ranges(pairs: &[(u32, u32)]) -> Vec<LinkBlock> {
    let mut sorted = pairs.to_vec();
    sorted.sort_unstable();

    let mut blocks: Vec<LinkBlock> = Vec::new();

    for (register, address) in sorted {
        match blocks.last_mut() {
            Some(block) if block.extends_with(register, address) => block.count += 1,
            _ => blocks.push(LinkBlock {
                register,
                address,
                count: 1,
            }),
        }
    }

    blocks
}
