//! Pages for MiniSQL
//!
//! A page is a fixed-capacity container of row slots belonging to
//! exactly one table for its lifetime. Mutation marks the page dirty;
//! the flag is cleared when the page is flushed to the backing file.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};
use crate::storage::row::Row;

pub type PageId = u32;

/// Row slots per page
pub const PAGE_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    table: String,
    rows: Vec<Row>,
    dirty: bool,
}

impl Page {
    pub fn new(id: PageId, table: impl Into<String>) -> Self {
        Page {
            id,
            table: table.into(),
            rows: Vec::new(),
            dirty: false,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn capacity(&self) -> usize {
        PAGE_CAPACITY
    }

    pub fn used_slots(&self) -> usize {
        self.rows.len()
    }

    pub fn free_slots(&self) -> usize {
        PAGE_CAPACITY - self.rows.len()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= PAGE_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row into the next free slot.
    pub fn insert_row(&mut self, row: Row) -> Result<()> {
        if self.is_full() {
            return Err(Error::PageFull(self.id));
        }
        self.rows.push(row);
        self.dirty = true;
        Ok(())
    }

    /// Mutable access to one slot; marks the page dirty.
    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.dirty = true;
        self.rows.get_mut(index)
    }

    /// Remove the rows at the given slot indices, compacting the
    /// remainder in order. Returns how many were removed.
    pub fn remove_at(&mut self, indices: &[usize]) -> usize {
        if indices.is_empty() {
            return 0;
        }
        let before = self.rows.len();
        let mut slot = 0;
        self.rows.retain(|_| {
            let keep = !indices.contains(&slot);
            slot += 1;
            keep
        });
        self.dirty = true;
        before - self.rows.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u32(self.id);
        buf.put_u16(self.table.len() as u16);
        buf.put_slice(self.table.as_bytes());
        buf.put_u16(self.rows.len() as u16);
        for row in &self.rows {
            row.encode(&mut buf);
        }
        buf
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Page> {
        if buf.remaining() < 6 {
            return Err(Error::CorruptFile("truncated page header".to_string()));
        }
        let id = buf.get_u32();
        let name_len = buf.get_u16() as usize;
        if buf.remaining() < name_len {
            return Err(Error::CorruptFile("truncated page header".to_string()));
        }
        let mut name = vec![0u8; name_len];
        buf.copy_to_slice(&mut name);
        let table = String::from_utf8(name)
            .map_err(|_| Error::CorruptFile("invalid utf-8 in page header".to_string()))?;
        if buf.remaining() < 2 {
            return Err(Error::CorruptFile("truncated page header".to_string()));
        }
        let count = buf.get_u16() as usize;
        let mut rows = Vec::with_capacity(count);
        for _ in 0..count {
            rows.push(Row::decode(buf)?);
        }
        Ok(Page {
            id,
            table,
            rows,
            dirty: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::row::Value;

    fn row(id: i64) -> Row {
        let mut row = Row::new();
        row.set("id", Value::Integer(id));
        row
    }

    #[test]
    fn test_capacity() {
        let mut page = Page::new(0, "t");
        for i in 0..PAGE_CAPACITY as i64 {
            page.insert_row(row(i)).unwrap();
        }
        assert!(page.is_full());
        assert_eq!(page.free_slots(), 0);
        let err = page.insert_row(row(99)).unwrap_err();
        assert!(matches!(err, Error::PageFull(0)));
    }

    #[test]
    fn test_remove_compacts_in_order() {
        let mut page = Page::new(1, "t");
        for i in 0..5 {
            page.insert_row(row(i)).unwrap();
        }
        let removed = page.remove_at(&[1, 3]);
        assert_eq!(removed, 2);
        let ids: Vec<_> = page
            .rows()
            .iter()
            .map(|r| r.get("id").cloned().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec![Value::Integer(0), Value::Integer(2), Value::Integer(4)]
        );
    }

    #[test]
    fn test_dirty_tracking() {
        let mut page = Page::new(2, "t");
        assert!(!page.is_dirty());
        page.insert_row(row(1)).unwrap();
        assert!(page.is_dirty());
        page.clear_dirty();
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_codec_round_trip() {
        let mut page = Page::new(7, "student");
        page.insert_row(row(1)).unwrap();
        page.insert_row(row(2)).unwrap();
        let buf = page.encode();
        let decoded = Page::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.id(), 7);
        assert_eq!(decoded.table(), "student");
        assert_eq!(decoded.used_slots(), 2);
        assert!(!decoded.is_dirty());
    }
}
