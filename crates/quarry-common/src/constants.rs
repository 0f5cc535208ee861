//! System-wide constants for QuarryDB.

// =============================================================================
// Page Constants
// =============================================================================

/// Default page size in bytes (8 KB).
///
/// Balances per-page overhead against forwarding churn: larger pages mean
/// fewer relocations, smaller pages mean cheaper scans.
pub const DEFAULT_PAGE_SIZE: usize = 8 * 1024;

/// Smallest page size worth allocating in production (512 B).
pub const MIN_PAGE_SIZE: usize = 512;

/// Maximum page size in bytes. Slot offsets and the header's free-space
/// fields are u16, so a page never exceeds the u16 range.
pub const MAX_PAGE_SIZE: usize = u16::MAX as usize;

/// Page header size in bytes.
///
/// The header contains: magic (2), slot_count (2), free_space_offset (2),
/// free_space_end (2), page_id (8) = 16 bytes.
pub const PAGE_HEADER_SIZE: usize = 16;

/// Slot size in the page slot directory.
///
/// Each slot contains: offset (2), length (2) = 4 bytes.
pub const SLOT_SIZE: usize = 4;

/// On-page row header size in bytes.
///
/// Every stored record starts with: row_id (8), flags (1),
/// forward_page (8), forward_slot (2) = 19 bytes.
pub const ROW_HEADER_SIZE: usize = 19;

// =============================================================================
// Value Limits
// =============================================================================

/// Maximum serialized row payload, leaving room for the headers and a slot.
pub const MAX_ROW_SIZE: usize = MAX_PAGE_SIZE - PAGE_HEADER_SIZE - SLOT_SIZE - ROW_HEADER_SIZE;

/// Length prefix size for variable-length column values.
pub const VARLEN_PREFIX_SIZE: usize = 4;

/// Size of the presence byte carried by nullable columns.
pub const NULL_PREFIX_SIZE: usize = 1;

// =============================================================================
// Timeouts and Retries
// =============================================================================

/// Default tree-container lock timeout in milliseconds.
pub const DEFAULT_CONTAINER_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Default cap on new-page retries after `NoRoomOnTree`.
pub const DEFAULT_MAX_CAPACITY_RETRIES: u32 = 16;
