//! Page header format.
//!
//! Every row page starts with a 16-byte header.
//!
//! # Header Layout (16 bytes)
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//!   0       2   magic (0x5142 = "QB")
//!   2       2   slot_count (number of slot directory entries)
//!   4       2   free_space_offset (end of slot directory)
//!   6       2   free_space_end (start of record data)
//!   8       8   page_id
//! ```

use quarry_common::constants::PAGE_HEADER_SIZE;
use quarry_common::types::PageId;

/// Magic number identifying a QuarryDB row page.
pub const PAGE_MAGIC: u16 = 0x5142;

const MAGIC_OFFSET: usize = 0;
const SLOT_COUNT_OFFSET: usize = 2;
const FREE_SPACE_OFFSET_OFFSET: usize = 4;
const FREE_SPACE_END_OFFSET: usize = 6;
const PAGE_ID_OFFSET: usize = 8;

/// Mutable view over a page's header bytes.
pub struct PageHeader<'a> {
    data: &'a mut [u8],
}

impl<'a> PageHeader<'a> {
    /// Creates a header view into the given buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is smaller than [`PAGE_HEADER_SIZE`].
    #[inline]
    pub fn new(data: &'a mut [u8]) -> Self {
        assert!(data.len() >= PAGE_HEADER_SIZE, "buffer too small for header");
        Self { data }
    }

    /// Initializes the header for an empty page of the buffer's size.
    pub fn initialize(&mut self, page_id: PageId) {
        let size = self.data.len();
        self.write_u16(MAGIC_OFFSET, PAGE_MAGIC);
        self.write_u16(SLOT_COUNT_OFFSET, 0);
        self.write_u16(FREE_SPACE_OFFSET_OFFSET, PAGE_HEADER_SIZE as u16);
        self.write_u16(FREE_SPACE_END_OFFSET, size as u16);
        self.data[PAGE_ID_OFFSET..PAGE_ID_OFFSET + 8].copy_from_slice(&page_id.as_u64().to_le_bytes());
    }

    /// Sets the slot count.
    pub fn set_slot_count(&mut self, count: u16) {
        self.write_u16(SLOT_COUNT_OFFSET, count);
    }

    /// Sets the end of the slot directory.
    pub fn set_free_space_offset(&mut self, offset: u16) {
        self.write_u16(FREE_SPACE_OFFSET_OFFSET, offset);
    }

    /// Sets the start of record data.
    pub fn set_free_space_end(&mut self, end: u16) {
        self.write_u16(FREE_SPACE_END_OFFSET, end);
    }

    fn write_u16(&mut self, offset: usize, value: u16) {
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }
}

/// Read-only header accessors over raw page bytes.
pub struct PageHeaderRef<'a> {
    data: &'a [u8],
}

impl<'a> PageHeaderRef<'a> {
    /// Creates a read-only header view.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is smaller than [`PAGE_HEADER_SIZE`].
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        assert!(data.len() >= PAGE_HEADER_SIZE, "buffer too small for header");
        Self { data }
    }

    /// Returns true if the buffer carries the row-page magic.
    #[inline]
    pub fn has_magic(&self) -> bool {
        self.read_u16(MAGIC_OFFSET) == PAGE_MAGIC
    }

    /// Returns the number of slot directory entries.
    #[inline]
    pub fn slot_count(&self) -> u16 {
        self.read_u16(SLOT_COUNT_OFFSET)
    }

    /// Returns the end of the slot directory.
    #[inline]
    pub fn free_space_offset(&self) -> u16 {
        self.read_u16(FREE_SPACE_OFFSET_OFFSET)
    }

    /// Returns the start of record data.
    #[inline]
    pub fn free_space_end(&self) -> u16 {
        self.read_u16(FREE_SPACE_END_OFFSET)
    }

    /// Returns the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        let bytes: [u8; 8] = self.data[PAGE_ID_OFFSET..PAGE_ID_OFFSET + 8]
            .try_into()
            .expect("8-byte slice");
        PageId::new(u64::from_le_bytes(bytes))
    }

    fn read_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes(
            self.data[offset..offset + 2]
                .try_into()
                .expect("2-byte slice"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_and_read() {
        let mut buffer = vec![0u8; 256];
        PageHeader::new(&mut buffer).initialize(PageId::new(9));

        let header = PageHeaderRef::new(&buffer);
        assert!(header.has_magic());
        assert_eq!(header.page_id(), PageId::new(9));
        assert_eq!(header.slot_count(), 0);
        assert_eq!(header.free_space_offset() as usize, PAGE_HEADER_SIZE);
        assert_eq!(header.free_space_end() as usize, 256);
    }

    #[test]
    fn test_mutations() {
        let mut buffer = vec![0u8; 256];
        {
            let mut header = PageHeader::new(&mut buffer);
            header.initialize(PageId::new(1));
            header.set_slot_count(3);
            header.set_free_space_end(200);
        }
        let header = PageHeaderRef::new(&buffer);
        assert_eq!(header.slot_count(), 3);
        assert_eq!(header.free_space_end(), 200);
    }
}
