//! Banked memory shared by every lane.
//!
//! The machine owns four banks: code, data, stack and io. Each bank is a whole
//! number of 256-byte pages. Instructions address a bank through an 8-bit page
//! selector (`cb`, `sb`, `db`) and an 8-bit offset, so the effective address is
//! `page * PAGE_SIZE + offset`. Indexed forms may carry into the next page, but
//! nothing ever wraps: an access that ends past the bank capacity is
//! [`Fault::OutOfBounds`].
//!
//! Each bank keeps the image it was created with (plus anything a host loaded
//! through [`Memory::load_image`]) so NUKE can restore it.

use crate::virtual_machine::errors::{ConfigError, Fault};
use std::fmt::Display;

/// Bytes per bank page.
pub const PAGE_SIZE: usize = 256;

/// Granularity of the block-copy cost model.
pub const BLOCK_SIZE: usize = 8;

/// Returns the effective address of `offset` within `page`.
#[inline]
pub const fn address(page: u8, offset: usize) -> usize {
    page as usize * PAGE_SIZE + offset
}

/// Returns the number of started [`BLOCK_SIZE`] blocks covering `len` bytes.
#[inline]
pub const fn blocks(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE)
}

/// The four banks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum BankKind {
    Code,
    Data,
    Stack,
    Io,
}

impl BankKind {
    pub const ALL: [BankKind; 4] = [BankKind::Code, BankKind::Data, BankKind::Stack, BankKind::Io];

    pub const fn as_str(&self) -> &'static str {
        match self {
            BankKind::Code => "code",
            BankKind::Data => "data",
            BankKind::Stack => "stack",
            BankKind::Io => "io",
        }
    }
}

impl Display for BankKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounds-checked bank.
#[derive(Clone, Debug)]
pub struct Bank {
    kind: BankKind,
    bytes: Vec<u8>,
    initial: Vec<u8>,
}

impl Bank {
    /// Creates a zero-filled bank of `pages` pages.
    pub fn new(kind: BankKind, pages: usize) -> Result<Self, ConfigError> {
        if pages == 0 || pages > PAGE_SIZE {
            return Err(ConfigError::BankPages { bank: kind, pages });
        }
        let bytes = vec![0; pages * PAGE_SIZE];
        Ok(Self {
            kind,
            initial: bytes.clone(),
            bytes,
        })
    }

    pub fn kind(&self) -> BankKind {
        self.kind
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Number of pages.
    pub fn pages(&self) -> usize {
        self.bytes.len() / PAGE_SIZE
    }

    fn check(&self, address: usize, len: usize) -> Result<std::ops::Range<usize>, Fault> {
        let end = address.checked_add(len).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => Ok(address..end),
            None => Err(Fault::OutOfBounds {
                bank: self.kind,
                address,
                len,
                capacity: self.bytes.len(),
            }),
        }
    }

    /// Reads `len` bytes starting at `address`.
    pub fn read(&self, address: usize, len: usize) -> Result<&[u8], Fault> {
        let range = self.check(address, len)?;
        Ok(&self.bytes[range])
    }

    /// Writes `data` starting at `address`.
    pub fn write(&mut self, address: usize, data: &[u8]) -> Result<(), Fault> {
        let range = self.check(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    #[inline]
    pub fn read_byte(&self, address: usize) -> Result<u8, Fault> {
        Ok(self.read(address, 1)?[0])
    }

    #[inline]
    pub fn write_byte(&mut self, address: usize, value: u8) -> Result<(), Fault> {
        self.write(address, &[value])
    }

    /// Writes `data` into both the live contents and the initial image.
    fn load_image(&mut self, address: usize, data: &[u8]) -> Result<(), ConfigError> {
        let range = self
            .check(address, data.len())
            .map_err(|_| ConfigError::ImageTooLarge {
                bank: self.kind,
                address,
                len: data.len(),
                capacity: self.bytes.len(),
            })?;
        self.bytes[range.clone()].copy_from_slice(data);
        self.initial[range].copy_from_slice(data);
        Ok(())
    }

    /// Restores the initial image.
    pub fn reset(&mut self) {
        self.bytes.copy_from_slice(&self.initial);
    }
}

/// Page counts for the four banks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BankLayout {
    pub code_pages: usize,
    pub data_pages: usize,
    pub stack_pages: usize,
    pub io_pages: usize,
}

/// The full bank set.
#[derive(Clone, Debug)]
pub struct Memory {
    code: Bank,
    data: Bank,
    stack: Bank,
    io: Bank,
}

impl Memory {
    pub fn new(layout: BankLayout) -> Result<Self, ConfigError> {
        Ok(Self {
            code: Bank::new(BankKind::Code, layout.code_pages)?,
            data: Bank::new(BankKind::Data, layout.data_pages)?,
            stack: Bank::new(BankKind::Stack, layout.stack_pages)?,
            io: Bank::new(BankKind::Io, layout.io_pages)?,
        })
    }

    pub fn bank(&self, kind: BankKind) -> &Bank {
        match kind {
            BankKind::Code => &self.code,
            BankKind::Data => &self.data,
            BankKind::Stack => &self.stack,
            BankKind::Io => &self.io,
        }
    }

    pub fn bank_mut(&mut self, kind: BankKind) -> &mut Bank {
        match kind {
            BankKind::Code => &mut self.code,
            BankKind::Data => &mut self.data,
            BankKind::Stack => &mut self.stack,
            BankKind::Io => &mut self.io,
        }
    }

    /// Reads `len` bytes from `bank` at `address`.
    pub fn read(&self, bank: BankKind, address: usize, len: usize) -> Result<&[u8], Fault> {
        self.bank(bank).read(address, len)
    }

    /// Writes `data` to `bank` at `address`.
    pub fn write(&mut self, bank: BankKind, address: usize, data: &[u8]) -> Result<(), Fault> {
        self.bank_mut(bank).write(address, data)
    }

    /// Copies `len` bytes between banks. Both ranges are checked before anything is written.
    pub fn copy(
        &mut self,
        src: BankKind,
        src_address: usize,
        dst: BankKind,
        dst_address: usize,
        len: usize,
    ) -> Result<(), Fault> {
        self.bank(dst).check(dst_address, len)?;
        let data = self.read(src, src_address, len)?.to_vec();
        self.write(dst, dst_address, &data)
    }

    /// Loads a host-provided image; it becomes part of what NUKE restores.
    pub fn load_image(&mut self, bank: BankKind, address: usize, data: &[u8]) -> Result<(), ConfigError> {
        self.bank_mut(bank).load_image(address, data)
    }

    /// Restores every bank to its initial image.
    pub fn reset(&mut self) {
        for kind in BankKind::ALL {
            self.bank_mut(kind).reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> BankLayout {
        BankLayout {
            code_pages: 1,
            data_pages: 2,
            stack_pages: 1,
            io_pages: 1,
        }
    }

    #[test]
    fn effective_address_carries_into_next_page() {
        assert_eq!(address(0, 0), 0);
        assert_eq!(address(1, 3), 259);
        assert_eq!(address(0, 255 + 10), 265);
    }

    #[test]
    fn block_count_rounds_up() {
        assert_eq!(blocks(0), 0);
        assert_eq!(blocks(1), 1);
        assert_eq!(blocks(8), 1);
        assert_eq!(blocks(9), 2);
        assert_eq!(blocks(255), 32);
    }

    #[test]
    fn page_count_is_validated() {
        assert_eq!(
            Bank::new(BankKind::Data, 0).unwrap_err(),
            ConfigError::BankPages {
                bank: BankKind::Data,
                pages: 0
            }
        );
        assert!(Bank::new(BankKind::Data, 257).is_err());
        assert_eq!(Bank::new(BankKind::Io, 256).unwrap().capacity(), 65_536);
    }

    #[test]
    fn read_write_within_bounds() {
        let mut memory = Memory::new(layout()).unwrap();
        memory.write(BankKind::Data, 300, &[1, 2, 3]).unwrap();
        assert_eq!(memory.read(BankKind::Data, 300, 3).unwrap(), &[1, 2, 3]);
        assert_eq!(memory.bank(BankKind::Data).pages(), 2);
    }

    #[test]
    fn access_past_capacity_faults() {
        let mut memory = Memory::new(layout()).unwrap();
        let err = memory.write(BankKind::Stack, 255, &[1, 2]).unwrap_err();
        assert_eq!(
            err,
            Fault::OutOfBounds {
                bank: BankKind::Stack,
                address: 255,
                len: 2,
                capacity: 256
            }
        );
        assert!(memory.read(BankKind::Io, 256, 1).is_err());
        assert!(memory.read(BankKind::Io, usize::MAX, 2).is_err());
        // Nothing partially written.
        assert_eq!(memory.read(BankKind::Stack, 255, 1).unwrap(), &[0]);
    }

    #[test]
    fn copy_checks_destination_first() {
        let mut memory = Memory::new(layout()).unwrap();
        memory.write(BankKind::Io, 0, &[9; 16]).unwrap();
        assert!(memory.copy(BankKind::Io, 0, BankKind::Stack, 250, 16).is_err());
        assert_eq!(memory.read(BankKind::Stack, 250, 6).unwrap(), &[0; 6]);
        memory.copy(BankKind::Io, 0, BankKind::Data, 500, 12).unwrap();
        assert_eq!(memory.read(BankKind::Data, 500, 12).unwrap(), &[9; 12]);
    }

    #[test]
    fn reset_restores_loaded_image() {
        let mut memory = Memory::new(layout()).unwrap();
        memory.load_image(BankKind::Data, 4, &[7, 7]).unwrap();
        memory.write(BankKind::Data, 0, &[1; 8]).unwrap();
        memory.write(BankKind::Io, 10, &[5]).unwrap();
        memory.reset();
        assert_eq!(memory.read(BankKind::Data, 0, 8).unwrap(), &[0, 0, 0, 0, 7, 7, 0, 0]);
        assert_eq!(memory.read(BankKind::Io, 10, 1).unwrap(), &[0]);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let mut memory = Memory::new(layout()).unwrap();
        let err = memory
            .load_image(BankKind::Code, 0, &[0; PAGE_SIZE + 1])
            .unwrap_err();
        assert!(matches!(err, ConfigError::ImageTooLarge { bank: BankKind::Code, .. }));
    }
}
