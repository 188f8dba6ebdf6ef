//! Bit-field read-modify-write on a 32-bit control word.
//!
//! These helpers know nothing about which values are legal for a field; they
//! write exactly the requested pattern. Geometry that runs past bit 31 is a
//! contract violation and leaves the word untouched.

use crate::error::ClockError;

/// A `(offset, width)` slice of a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitField {
    pub name: &'static str,
    pub offset: u8,
    pub width: u8,
}

impl BitField {
    pub const fn new(name: &'static str, offset: u8, width: u8) -> Self {
        BitField {
            name,
            offset,
            width,
        }
    }

    pub const fn bit(name: &'static str, offset: u8) -> Self {
        BitField::new(name, offset, 1)
    }

    /// Mask of the field in place, or a contract error for bad geometry.
    pub fn mask(self) -> Result<u32, ClockError> {
        let end = u32::from(self.offset) + u32::from(self.width);
        if self.width == 0 || end > 32 {
            return Err(ClockError::FieldOutOfBounds {
                field: self.name,
                offset: self.offset,
                width: self.width,
            });
        }
        let ones = if self.width == 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        };
        Ok(ones << self.offset)
    }

    /// Largest value the field can hold.
    pub fn max_value(self) -> Result<u32, ClockError> {
        Ok(self.mask()? >> self.offset)
    }
}

pub fn clear_field(word: &mut u32, field: BitField) -> Result<(), ClockError> {
    let mask = field.mask()?;
    *word &= !mask;
    Ok(())
}

pub fn set_field(word: &mut u32, field: BitField, value: u32) -> Result<(), ClockError> {
    let mask = field.mask()?;
    if value & !(mask >> field.offset) != 0 {
        return Err(ClockError::ValueTooWide {
            field: field.name,
            value,
        });
    }
    *word = (*word & !mask) | (value << field.offset);
    Ok(())
}

pub fn read_field(word: u32, field: BitField) -> Result<u32, ClockError> {
    let mask = field.mask()?;
    Ok((word & mask) >> field.offset)
}
