//! Common MySQL protocol types.

/// Server status flags sent in OK, EOF and result-set terminator packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct StatusFlags(u16);

impl StatusFlags {
    /// A transaction is active
    pub const IN_TRANS: Self = Self(0x0001);
    /// Autocommit mode is enabled
    pub const AUTOCOMMIT: Self = Self(0x0002);
    /// More result sets follow
    pub const MORE_RESULTS_EXISTS: Self = Self(0x0008);
    pub const NO_GOOD_INDEX_USED: Self = Self(0x0010);
    pub const NO_INDEX_USED: Self = Self(0x0020);
    /// A read-only cursor is open for the statement
    pub const CURSOR_EXISTS: Self = Self(0x0040);
    /// The last row of an open cursor has been sent
    pub const LAST_ROW_SENT: Self = Self(0x0080);
    pub const DB_DROPPED: Self = Self(0x0100);
    pub const NO_BACKSLASH_ESCAPES: Self = Self(0x0200);
    pub const METADATA_CHANGED: Self = Self(0x0400);
    pub const QUERY_WAS_SLOW: Self = Self(0x0800);
    pub const PS_OUT_PARAMS: Self = Self(0x1000);
    /// A read-only transaction is active
    pub const IN_TRANS_READONLY: Self = Self(0x2000);
    pub const SESSION_STATE_CHANGED: Self = Self(0x4000);

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Create from the raw 16-bit value.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Get the raw 16-bit value.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for StatusFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<u16> for StatusFlags {
    fn from(value: u16) -> Self {
        Self::from_bits(value)
    }
}

/// Transaction status derived from the server status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionStatus {
    /// Not in a transaction block
    #[default]
    Idle,
    /// In a transaction block
    InTransaction,
}

impl TransactionStatus {
    /// Derive the status from the `IN_TRANS` flag.
    pub fn from_flags(flags: StatusFlags) -> Self {
        if flags.contains(StatusFlags::IN_TRANS) {
            TransactionStatus::InTransaction
        } else {
            TransactionStatus::Idle
        }
    }

    /// Returns true if currently in a transaction.
    pub fn in_transaction(self) -> bool {
        matches!(self, TransactionStatus::InTransaction)
    }
}

/// Cursor type requested by COM_STMT_EXECUTE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CursorType {
    /// Rows are sent in full with the execute reply
    #[default]
    NoCursor = 0x00,
    /// Server keeps a read-only cursor; rows are pulled with COM_STMT_FETCH
    ReadOnly = 0x01,
}
