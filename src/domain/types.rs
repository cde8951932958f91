//! Shared value types for the sales generator

use chrono::NaiveDateTime;
use serde::Serialize;
use smallvec::SmallVec;

/// Largest number of stores (and registers per store) addressable by a letter code
pub const MAX_UNITS: usize = 26;

/// Newtype wrapper for store indices; displayed as an uppercase letter (`A`, `B`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct StoreId(pub u8);

impl StoreId {
    /// Zero-based position of the store in the chain configuration
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn code(&self) -> char {
        (b'A' + self.0) as char
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Newtype wrapper for register indices within a store; displayed as a lowercase letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct RegisterId(pub u8);

impl RegisterId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn code(&self) -> char {
        (b'a' + self.0) as char
    }
}

impl std::fmt::Display for RegisterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A sellable item. Built once per process and never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub category_key: u16,
    pub item_key: u16,
    pub price: u32,
    pub discount: f64,
}

/// One line of a receipt. `quantity` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceiptLine {
    pub item: Item,
    pub quantity: u32,
}

/// Lines of one receipt; most baskets are small enough to stay inline
pub type Basket = SmallVec<[ReceiptLine; 4]>;

/// A single sale at one register
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub time: NaiveDateTime,
    pub lines: Basket,
}

impl Receipt {
    pub fn new(time: NaiveDateTime, lines: Basket) -> Self {
        Self { time, lines }
    }

    /// Total number of units sold on this receipt
    pub fn units(&self) -> u64 {
        self.lines.iter().map(|l| l.quantity as u64).sum()
    }
}
