//! The slotted row page.
//!
//! A row page stores variable-length serialized rows behind a slot
//! directory. The directory grows down from the header while record bytes
//! grow up from the end of the page:
//!
//! ```text
//! +----------------------+
//! |    Page Header       |  16 bytes (see header.rs)
//! +----------------------+
//! |    Slot Directory    |  4 bytes per slot, grows downward
//! +----------------------+
//! |    Free Space        |
//! +----------------------+
//! |    Record Data       |  grows upward from end of page
//! +----------------------+
//! ```
//!
//! Every record starts with a 19-byte row header carrying the stable row
//! ID, a tombstone flag, and a forwarding marker. A *canonical* record
//! holds the row's serialized payload after the header; a *forward stub*
//! holds only the header, with its target `(page, slot)` filled in.
//!
//! Deletes are logical: slots are never reused and record space is never
//! reclaimed. A page that forwarded a row within itself keeps both the
//! stub slot and the canonical slot, which is exactly the
//! "forwarded on the same page" state the tree container's update
//! protocol distinguishes.

mod header;

pub use header::{PageHeader, PageHeaderRef, PAGE_MAGIC};

use crate::error::{StorageError, StorageResult};

use quarry_common::constants::{MAX_PAGE_SIZE, PAGE_HEADER_SIZE, ROW_HEADER_SIZE, SLOT_SIZE};
use quarry_common::types::{PageId, RowId, SlotId};

/// Marker for a slot that holds no record (reserved, currently unused
/// because slots are append-only).
const SLOT_DEAD: u16 = 0xFFFF;

/// Row header flag: the record is logically deleted.
const FLAG_DELETED: u8 = 0b0000_0001;

/// Row header flag: the record is a forward stub, not a canonical copy.
const FLAG_FORWARD_STUB: u8 = 0b0000_0010;

/// A slot directory entry: record offset and total record length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    offset: u16,
    length: u16,
}

impl Slot {
    #[inline]
    const fn new(offset: u16, length: u16) -> Self {
        Self { offset, length }
    }

    #[inline]
    fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= SLOT_SIZE);
        Self {
            offset: u16::from_le_bytes([bytes[0], bytes[1]]),
            length: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }

    #[inline]
    fn to_bytes(self) -> [u8; SLOT_SIZE] {
        let mut bytes = [0u8; SLOT_SIZE];
        bytes[0..2].copy_from_slice(&self.offset.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.length.to_le_bytes());
        bytes
    }

    #[inline]
    const fn is_dead(self) -> bool {
        self.offset == SLOT_DEAD
    }
}

/// The per-record header preceding every stored row or stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHeader {
    /// The stable row ID.
    pub row_id: RowId,
    /// Logical-delete tombstone.
    pub deleted: bool,
    /// Whether this record is a forward stub.
    pub forward_stub: bool,
    /// Target page when `forward_stub` is set.
    pub forward_page: PageId,
    /// Target slot when `forward_stub` is set.
    pub forward_slot: SlotId,
}

impl RowHeader {
    /// Creates the header for a fresh canonical record.
    #[must_use]
    pub fn canonical(row_id: RowId) -> Self {
        Self {
            row_id,
            deleted: false,
            forward_stub: false,
            forward_page: PageId::INVALID,
            forward_slot: 0,
        }
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= ROW_HEADER_SIZE);
        let row_id = RowId::new(u64::from_le_bytes(bytes[0..8].try_into().expect("8 bytes")));
        let flags = bytes[8];
        let forward_page =
            PageId::new(u64::from_le_bytes(bytes[9..17].try_into().expect("8 bytes")));
        let forward_slot = u16::from_le_bytes(bytes[17..19].try_into().expect("2 bytes"));
        Self {
            row_id,
            deleted: flags & FLAG_DELETED != 0,
            forward_stub: flags & FLAG_FORWARD_STUB != 0,
            forward_page,
            forward_slot,
        }
    }

    fn to_bytes(self) -> [u8; ROW_HEADER_SIZE] {
        let mut bytes = [0u8; ROW_HEADER_SIZE];
        bytes[0..8].copy_from_slice(&self.row_id.as_u64().to_le_bytes());
        let mut flags = 0u8;
        if self.deleted {
            flags |= FLAG_DELETED;
        }
        if self.forward_stub {
            flags |= FLAG_FORWARD_STUB;
        }
        bytes[8] = flags;
        bytes[9..17].copy_from_slice(&self.forward_page.as_u64().to_le_bytes());
        bytes[17..19].copy_from_slice(&self.forward_slot.to_le_bytes());
        bytes
    }
}

/// Where a row stands relative to one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPresence {
    /// The page holds no live record for the row.
    Absent,
    /// The page holds the canonical copy and no stubs.
    CanonicalOnly {
        /// Slot of the canonical record.
        slot: SlotId,
    },
    /// The page holds the canonical copy *and* at least one stub pointing
    /// at it: the row has been relocated within this page before.
    CanonicalForwardedSamePage {
        /// Slot of the canonical record.
        slot: SlotId,
    },
    /// The page holds only stubs; the canonical copy lives elsewhere.
    ForwardedToOtherPage {
        /// Target page of the stub.
        to_page: PageId,
        /// Target slot of the stub.
        to_slot: SlotId,
    },
}

/// Outcome of rewriting a row's payload on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The new payload fit in the existing record.
    InPlace,
    /// The new payload was appended elsewhere on the same page; the old
    /// slot is now a stub pointing at the returned slot.
    RelocatedWithinPage(SlotId),
    /// The page cannot hold the new payload; the caller must relocate the
    /// row to another page.
    NoRoom,
}

/// A fixed-capacity page of serialized rows.
pub struct RowPage {
    data: Vec<u8>,
}

impl RowPage {
    /// Creates an empty page of `size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size` is smaller than the header or larger than the
    /// u16 offset space.
    #[must_use]
    pub fn new(page_id: PageId, size: usize) -> Self {
        assert!(size >= PAGE_HEADER_SIZE + SLOT_SIZE + ROW_HEADER_SIZE);
        assert!(size <= MAX_PAGE_SIZE);
        let mut data = vec![0u8; size];
        PageHeader::new(&mut data).initialize(page_id);
        Self { data }
    }

    /// Wraps existing page bytes (as supplied by a storage collaborator).
    pub fn from_bytes(data: Vec<u8>) -> StorageResult<Self> {
        if data.len() < PAGE_HEADER_SIZE || !PageHeaderRef::new(&data).has_magic() {
            return Err(StorageError::MalformedPayload {
                reason: "buffer is not a row page".to_string(),
            });
        }
        Ok(Self { data })
    }

    /// Returns the raw page bytes.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the page size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the page ID.
    #[inline]
    #[must_use]
    pub fn page_id(&self) -> PageId {
        self.header().page_id()
    }

    /// Returns the number of slot directory entries.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> u16 {
        self.header().slot_count()
    }

    /// Returns the free bytes between the slot directory and record data.
    #[must_use]
    pub fn free_space(&self) -> usize {
        let header = self.header();
        let offset = header.free_space_offset() as usize;
        let end = header.free_space_end() as usize;
        end.saturating_sub(offset)
    }

    /// Returns true if a payload of `payload_len` bytes fits, counting
    /// its slot and row header.
    #[must_use]
    pub fn can_fit(&self, payload_len: usize) -> bool {
        self.free_space() >= SLOT_SIZE + ROW_HEADER_SIZE + payload_len
    }

    /// The capacity check every add/update must consult first.
    #[inline]
    #[must_use]
    pub fn is_full(&self, payload_len: usize) -> bool {
        !self.can_fit(payload_len)
    }

    /// Inserts a canonical record for `row_id`.
    pub fn insert_row(&mut self, row_id: RowId, payload: &[u8]) -> StorageResult<SlotId> {
        if !self.can_fit(payload.len()) {
            return Err(StorageError::PageFull {
                page_id: self.page_id(),
                required: SLOT_SIZE + ROW_HEADER_SIZE + payload.len(),
                available: self.free_space(),
            });
        }
        Ok(self.append_record(RowHeader::canonical(row_id), payload))
    }

    /// Rewrites the payload of the canonical record at `slot`.
    pub fn rewrite_row(&mut self, slot: SlotId, payload: &[u8]) -> StorageResult<RewriteOutcome> {
        let entry = self.slot(slot).ok_or(StorageError::SlotNotFound {
            page_id: self.page_id(),
            slot,
        })?;
        let header = self.row_header_at(entry);
        if header.deleted || header.forward_stub {
            return Err(StorageError::SlotNotFound {
                page_id: self.page_id(),
                slot,
            });
        }

        let capacity = entry.length as usize - ROW_HEADER_SIZE;
        if payload.len() <= capacity {
            let start = entry.offset as usize + ROW_HEADER_SIZE;
            self.data[start..start + payload.len()].copy_from_slice(payload);
            self.set_slot(
                slot,
                Slot::new(entry.offset, (ROW_HEADER_SIZE + payload.len()) as u16),
            );
            return Ok(RewriteOutcome::InPlace);
        }

        if !self.can_fit(payload.len()) {
            return Ok(RewriteOutcome::NoRoom);
        }

        // Append the new version, then turn the old slot into a stub that
        // forwards to it on this same page.
        let new_slot = self.append_record(RowHeader::canonical(header.row_id), payload);
        let own_page = self.page_id();
        self.make_stub(slot, own_page, new_slot)?;
        Ok(RewriteOutcome::RelocatedWithinPage(new_slot))
    }

    /// Converts the record at `slot` into a forward stub targeting
    /// `(to_page, to_slot)`.
    pub fn make_stub(&mut self, slot: SlotId, to_page: PageId, to_slot: SlotId) -> StorageResult<()> {
        let entry = self.slot(slot).ok_or(StorageError::SlotNotFound {
            page_id: self.page_id(),
            slot,
        })?;
        let mut header = self.row_header_at(entry);
        header.forward_stub = true;
        header.forward_page = to_page;
        header.forward_slot = to_slot;
        self.write_row_header(entry, header);
        // The old payload bytes are abandoned, not reclaimed.
        self.set_slot(slot, Slot::new(entry.offset, ROW_HEADER_SIZE as u16));
        Ok(())
    }

    /// Points every live stub for `row_id` at a new target. Returns the
    /// number of stubs retargeted.
    pub fn retarget_stubs(&mut self, row_id: RowId, to_page: PageId, to_slot: SlotId) -> usize {
        let mut count = 0;
        for slot in 0..self.slot_count() {
            let Some(entry) = self.slot(slot) else { continue };
            let mut header = self.row_header_at(entry);
            if header.row_id == row_id && header.forward_stub && !header.deleted {
                header.forward_page = to_page;
                header.forward_slot = to_slot;
                self.write_row_header(entry, header);
                count += 1;
            }
        }
        count
    }

    /// Tombstones every record (canonical and stubs) for `row_id`.
    ///
    /// Returns true if a live canonical record was tombstoned.
    pub fn delete_row(&mut self, row_id: RowId) -> bool {
        let mut deleted_canonical = false;
        for slot in 0..self.slot_count() {
            let Some(entry) = self.slot(slot) else { continue };
            let mut header = self.row_header_at(entry);
            if header.row_id == row_id && !header.deleted {
                if !header.forward_stub {
                    deleted_canonical = true;
                }
                header.deleted = true;
                self.write_row_header(entry, header);
            }
        }
        deleted_canonical
    }

    /// Returns the row header at `slot`, if the slot exists.
    #[must_use]
    pub fn row_header(&self, slot: SlotId) -> Option<RowHeader> {
        self.slot(slot).map(|entry| self.row_header_at(entry))
    }

    /// Returns the payload of the canonical record at `slot`.
    ///
    /// Stubs and tombstoned records yield `None`.
    #[must_use]
    pub fn payload(&self, slot: SlotId) -> Option<&[u8]> {
        let entry = self.slot(slot)?;
        let header = self.row_header_at(entry);
        if header.deleted || header.forward_stub {
            return None;
        }
        let start = entry.offset as usize + ROW_HEADER_SIZE;
        let end = entry.offset as usize + entry.length as usize;
        self.data.get(start..end)
    }

    /// Returns the absolute byte offset of the payload at `slot`.
    #[must_use]
    pub fn payload_offset(&self, slot: SlotId) -> Option<usize> {
        let entry = self.slot(slot)?;
        Some(entry.offset as usize + ROW_HEADER_SIZE)
    }

    /// Reads `len` bytes at an absolute page offset (value-address reads).
    #[must_use]
    pub fn read_at(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.data.get(offset..offset + len)
    }

    /// Returns the slot of the live canonical record for `row_id`.
    #[must_use]
    pub fn canonical_slot(&self, row_id: RowId) -> Option<SlotId> {
        (0..self.slot_count()).find(|&slot| {
            self.slot(slot)
                .map(|entry| {
                    let h = self.row_header_at(entry);
                    h.row_id == row_id && !h.deleted && !h.forward_stub
                })
                .unwrap_or(false)
        })
    }

    /// Classifies this page's relationship to `row_id`.
    #[must_use]
    pub fn row_presence(&self, row_id: RowId) -> RowPresence {
        let mut canonical = None;
        let mut stub_target = None;
        for slot in 0..self.slot_count() {
            let Some(entry) = self.slot(slot) else { continue };
            let header = self.row_header_at(entry);
            if header.row_id != row_id || header.deleted {
                continue;
            }
            if header.forward_stub {
                stub_target.get_or_insert((header.forward_page, header.forward_slot));
            } else {
                canonical = Some(slot);
            }
        }
        match (canonical, stub_target) {
            (Some(slot), None) => RowPresence::CanonicalOnly { slot },
            (Some(slot), Some(_)) => RowPresence::CanonicalForwardedSamePage { slot },
            (None, Some((to_page, to_slot))) => RowPresence::ForwardedToOtherPage { to_page, to_slot },
            (None, None) => RowPresence::Absent,
        }
    }

    /// Returns true if the page holds any live record (canonical or stub)
    /// for `row_id`.
    #[must_use]
    pub fn references_row(&self, row_id: RowId) -> bool {
        !matches!(self.row_presence(row_id), RowPresence::Absent)
    }

    /// Iterates over live canonical rows: `(slot, row_id, payload)`.
    pub fn live_rows(&self) -> impl Iterator<Item = (SlotId, RowId, &[u8])> {
        (0..self.slot_count()).filter_map(move |slot| {
            let entry = self.slot(slot)?;
            let header = self.row_header_at(entry);
            if header.deleted || header.forward_stub {
                return None;
            }
            let start = entry.offset as usize + ROW_HEADER_SIZE;
            let end = entry.offset as usize + entry.length as usize;
            Some((slot, header.row_id, self.data.get(start..end)?))
        })
    }

    /// Returns the number of live canonical rows.
    #[must_use]
    pub fn live_row_count(&self) -> usize {
        self.live_rows().count()
    }

    /// Returns the highest row ID referenced on this page, if any.
    #[must_use]
    pub fn max_row_id(&self) -> Option<RowId> {
        (0..self.slot_count())
            .filter_map(|slot| self.row_header(slot))
            .filter(|h| !h.deleted)
            .map(|h| h.row_id)
            .max()
    }

    // =========================================================================
    // Private helpers
    // =========================================================================

    fn header(&self) -> PageHeaderRef<'_> {
        PageHeaderRef::new(&self.data)
    }

    fn slot_offset(slot: SlotId) -> usize {
        PAGE_HEADER_SIZE + (slot as usize) * SLOT_SIZE
    }

    fn slot(&self, slot: SlotId) -> Option<Slot> {
        if slot >= self.slot_count() {
            return None;
        }
        let offset = Self::slot_offset(slot);
        let entry = Slot::from_bytes(&self.data[offset..offset + SLOT_SIZE]);
        if entry.is_dead() {
            None
        } else {
            Some(entry)
        }
    }

    fn set_slot(&mut self, slot: SlotId, entry: Slot) {
        let offset = Self::slot_offset(slot);
        self.data[offset..offset + SLOT_SIZE].copy_from_slice(&entry.to_bytes());
    }

    fn row_header_at(&self, entry: Slot) -> RowHeader {
        let start = entry.offset as usize;
        RowHeader::from_bytes(&self.data[start..start + ROW_HEADER_SIZE])
    }

    fn write_row_header(&mut self, entry: Slot, header: RowHeader) {
        let start = entry.offset as usize;
        self.data[start..start + ROW_HEADER_SIZE].copy_from_slice(&header.to_bytes());
    }

    /// Appends a record; the caller has already checked capacity.
    fn append_record(&mut self, header: RowHeader, payload: &[u8]) -> SlotId {
        let record_len = ROW_HEADER_SIZE + payload.len();
        let slot_count = self.slot_count();
        let record_offset = self.header().free_space_end() as usize - record_len;

        self.data[record_offset..record_offset + ROW_HEADER_SIZE]
            .copy_from_slice(&header.to_bytes());
        self.data[record_offset + ROW_HEADER_SIZE..record_offset + record_len]
            .copy_from_slice(payload);

        let slot_dir_end = Self::slot_offset(slot_count) + SLOT_SIZE;
        {
            let mut page_header = PageHeader::new(&mut self.data);
            page_header.set_slot_count(slot_count + 1);
            page_header.set_free_space_offset(slot_dir_end as u16);
            page_header.set_free_space_end(record_offset as u16);
        }
        self.set_slot(slot_count, Slot::new(record_offset as u16, record_len as u16));
        slot_count
    }
}

impl std::fmt::Debug for RowPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowPage")
            .field("page_id", &self.page_id())
            .field("size", &self.size())
            .field("slots", &self.slot_count())
            .field("live_rows", &self.live_row_count())
            .field("free", &self.free_space())
            .finish()
    }
}
