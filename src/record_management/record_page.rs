/**********************************************
  > File Name		: record_page.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Wed 14 Apr 2021 09:36:02 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Slotted page layout.
 *
 *     +--------+-----------------------------+
 *     | header | record 0 | record 1 | ...   |
 *     +--------+-----------------------------+
 *     |        free space                    |
 *     +--------------------------------------+
 *     |            ... | slot 1 | slot 0     |
 *     +--------------------------------------+
 *
 * Page header: free_space(u16) | num_slots(u16).
 * Records grow from the header towards the end of the page, the slot
 * directory grows from the end of the page towards the records. Record
 * bytes are always kept contiguous, so the end of the last record (the
 * frontier) can be computed from the header and free_space is exactly
 * the gap between the frontier and the slot directory.
 *
 * Slot entry: word(u32) | aux(u16) | length(i16).
 *   length == -1              tombstone, the slot can be reused.
 *   length == PAGE_SIZE + 1   forwarding slot, word is the page number and
 *                             aux the slot number of the record body.
 *   otherwise                 word is the offset of the record. aux is
 *                             RELOCATED if the record is the body of a
 *                             forwarded record, whose RID is elsewhere.
 *
 * This is the only place that knows about the bytes of a page.
 */

use super::Rid;
use crate::errors::RecordError;
use crate::page_management::page_file::{PageData, PAGE_SIZE};

pub const PAGE_HEADER_SIZE: usize = 4;
pub const SLOT_SIZE: usize = 8;
pub const MAX_RECORD_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE - SLOT_SIZE;

const TOMBSTONE_LENGTH: i16 = -1;
const FORWARDED_LENGTH: i16 = PAGE_SIZE as i16 + 1;
const RELOCATED: u16 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Slot {
    Live { offset: u16, length: u16 },
    Relocated { offset: u16, length: u16 },
    Forwarded(Rid),
    Tombstone,
}

impl Slot {
    fn from_bytes(raw: &[u8]) -> Slot {
        let word = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let aux = u16::from_le_bytes([raw[4], raw[5]]);
        let length = i16::from_le_bytes([raw[6], raw[7]]);
        match length {
            TOMBSTONE_LENGTH => Slot::Tombstone,
            FORWARDED_LENGTH => Slot::Forwarded(Rid::new(word, aux)),
            _ if aux == RELOCATED => Slot::Relocated {
                offset: word as u16,
                length: length as u16,
            },
            _ => Slot::Live {
                offset: word as u16,
                length: length as u16,
            },
        }
    }

    fn to_bytes(&self) -> [u8; SLOT_SIZE] {
        let (word, aux, length) = match *self {
            Slot::Live { offset, length } => (offset as u32, 0, length as i16),
            Slot::Relocated { offset, length } => (offset as u32, RELOCATED, length as i16),
            Slot::Forwarded(rid) => (rid.get_page_num(), rid.get_slot_num(), FORWARDED_LENGTH),
            Slot::Tombstone => (0, 0, TOMBSTONE_LENGTH),
        };
        let mut raw = [0u8; SLOT_SIZE];
        raw[0..4].copy_from_slice(&word.to_le_bytes());
        raw[4..6].copy_from_slice(&aux.to_le_bytes());
        raw[6..8].copy_from_slice(&length.to_le_bytes());
        raw
    }

    //(offset, length) of the bytes held by the slot.
    pub fn body(&self) -> Option<(usize, usize)> {
        match *self {
            Slot::Live { offset, length } | Slot::Relocated { offset, length } => {
                Some((offset as usize, length as usize))
            }
            Slot::Forwarded(_) | Slot::Tombstone => None,
        }
    }

    fn with_body(&self, offset: usize, length: usize) -> Slot {
        let (offset, length) = (offset as u16, length as u16);
        match self {
            Slot::Relocated { .. } => Slot::Relocated { offset, length },
            _ => Slot::Live { offset, length },
        }
    }
}

#[derive(Clone)]
pub struct RecordPage {
    data: Box<PageData>,
}

impl RecordPage {
    pub fn initial() -> Self {
        let mut page = RecordPage {
            data: Box::new([0u8; PAGE_SIZE]),
        };
        page.set_page_information(PAGE_SIZE - PAGE_HEADER_SIZE, 0);
        page
    }

    pub fn from_bytes(data: Box<PageData>) -> Result<Self, RecordError> {
        let page = RecordPage { data };
        let used = page.num_slots() as usize * SLOT_SIZE + page.free_space();
        if used > PAGE_SIZE - PAGE_HEADER_SIZE {
            return Err(RecordError::IoError(format!(
                "corrupt page header: {} slots, {} bytes free",
                page.num_slots(),
                page.free_space()
            )));
        }
        Ok(page)
    }

    pub fn as_bytes(&self) -> &PageData {
        &self.data
    }

    fn get_u16(&self, offs: usize) -> u16 {
        u16::from_le_bytes([self.data[offs], self.data[offs + 1]])
    }

    fn set_u16(&mut self, offs: usize, v: u16) {
        self.data[offs..offs + 2].copy_from_slice(&v.to_le_bytes());
    }

    pub fn free_space(&self) -> usize {
        self.get_u16(0) as usize
    }

    pub fn num_slots(&self) -> u16 {
        self.get_u16(2)
    }

    pub fn set_page_information(&mut self, free_space: usize, num_slots: u16) {
        self.set_u16(0, free_space as u16);
        self.set_u16(2, num_slots);
    }

    fn slot_offset(index: u16) -> usize {
        PAGE_SIZE - (index as usize + 1) * SLOT_SIZE
    }

    //None if the slot was never allocated.
    pub fn slot(&self, index: u16) -> Option<Slot> {
        if index >= self.num_slots() {
            return None;
        }
        let offs = Self::slot_offset(index);
        Some(Slot::from_bytes(&self.data[offs..offs + SLOT_SIZE]))
    }

    pub fn set_slot(&mut self, index: u16, slot: Slot) {
        debug_assert!(index < self.num_slots());
        let offs = Self::slot_offset(index);
        self.data[offs..offs + SLOT_SIZE].copy_from_slice(&slot.to_bytes());
    }

    //end of the last record.
    pub fn frontier(&self) -> usize {
        PAGE_SIZE - self.num_slots() as usize * SLOT_SIZE - self.free_space()
    }

    /*
     * Returns the slot to use for a new record and the offset to write it
     * at. Tombstoned slots are reused before the directory grows, only the
     * index is reused.
     */
    pub fn find_empty_slot(&self) -> (u16, usize) {
        let n = self.num_slots();
        let index = (0..n)
            .find(|&i| matches!(self.slot(i), Some(Slot::Tombstone)))
            .unwrap_or(n);
        (index, self.frontier())
    }

    //room for a record and one more slot entry.
    pub fn can_hold(&self, len: usize) -> bool {
        self.free_space() >= len + SLOT_SIZE
    }

    pub fn place(&mut self, bytes: &[u8], relocated: bool) -> Option<u16> {
        if !self.can_hold(bytes.len()) {
            return None;
        }
        let (index, offset) = self.find_empty_slot();
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);

        let mut num_slots = self.num_slots();
        let mut free_space = self.free_space() - bytes.len();
        if index == num_slots {
            num_slots += 1;
            free_space -= SLOT_SIZE;
        }
        self.set_page_information(free_space, num_slots);

        let (offset, length) = (offset as u16, bytes.len() as u16);
        let slot = if relocated {
            Slot::Relocated { offset, length }
        } else {
            Slot::Live { offset, length }
        };
        self.set_slot(index, slot);
        Some(index)
    }

    /*
     * Write a record into an already allocated slot, at the frontier.
     * The slot must not hold any bytes.
     */
    pub fn place_in_slot(&mut self, index: u16, bytes: &[u8]) -> bool {
        debug_assert!(self.slot(index).and_then(|s| s.body()).is_none());
        if self.free_space() < bytes.len() {
            return false;
        }
        let offset = self.frontier();
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.set_page_information(self.free_space() - bytes.len(), self.num_slots());
        self.set_slot(
            index,
            Slot::Live {
                offset: offset as u16,
                length: bytes.len() as u16,
            },
        );
        true
    }

    pub fn record(&self, index: u16) -> Option<&[u8]> {
        let (offset, length) = self.slot(index)?.body()?;
        Some(&self.data[offset..offset + length])
    }

    /*
     * Move every record byte in [boundary, frontier) by delta and fix the
     * offsets of the slots pointing there. A negative delta closes a gap
     * left before boundary, a positive one opens a hole of delta bytes at
     * boundary and needs delta bytes of free space.
     * Lengths never change, the order of the records is kept.
     */
    pub fn shift_records(&mut self, boundary: usize, delta: isize, except: Option<u16>) {
        if delta == 0 {
            return;
        }
        let frontier = self.frontier();
        debug_assert!(delta <= self.free_space() as isize);
        let dest = (boundary as isize + delta) as usize;
        if boundary < frontier {
            self.data.copy_within(boundary..frontier, dest);
        }

        for i in 0..self.num_slots() {
            if Some(i) == except {
                continue;
            }
            let slot = match self.slot(i) {
                Some(v) => v,
                None => continue,
            };
            if let Some((offset, length)) = slot.body() {
                if offset >= boundary {
                    let moved = (offset as isize + delta) as usize;
                    self.set_slot(i, slot.with_body(moved, length));
                }
            }
        }

        let free_space = (self.free_space() as isize - delta) as usize;
        self.set_page_information(free_space, self.num_slots());
    }

    /*
     * Tombstone a slot and give its bytes back to the free space.
     * Returns false if the slot holds no record bytes.
     */
    pub fn remove(&mut self, index: u16) -> bool {
        let (offset, length) = match self.slot(index).and_then(|s| s.body()) {
            Some(v) => v,
            None => return false,
        };
        self.set_slot(index, Slot::Tombstone);
        self.shift_records(offset + length, -(length as isize), Some(index));
        true
    }

    /*
     * Rewrite the record of a slot with new bytes of any length, shifting
     * the records after it. Returns false, leaving the page untouched, if
     * the page lacks the free space to grow it.
     */
    pub fn resize(&mut self, index: u16, bytes: &[u8]) -> bool {
        let slot = match self.slot(index) {
            Some(v) => v,
            None => return false,
        };
        let (offset, length) = match slot.body() {
            Some(v) => v,
            None => return false,
        };
        let new_length = bytes.len();
        if new_length > length && new_length - length > self.free_space() {
            return false;
        }

        self.shift_records(
            offset + length,
            new_length as isize - length as isize,
            Some(index),
        );
        self.data[offset..offset + new_length].copy_from_slice(bytes);
        self.set_slot(index, slot.with_body(offset, new_length));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(fill: u8, len: usize) -> Vec<u8> {
        vec![fill; len]
    }

    #[test]
    fn initial_page() {
        let page = RecordPage::initial();
        assert_eq!(page.free_space(), PAGE_SIZE - PAGE_HEADER_SIZE);
        assert_eq!(page.num_slots(), 0);
        assert_eq!(page.frontier(), PAGE_HEADER_SIZE);
        assert_eq!(page.find_empty_slot(), (0, PAGE_HEADER_SIZE));
        assert_eq!(page.slot(0), None);
    }

    #[test]
    fn slot_encoding() {
        let mut page = RecordPage::initial();
        for _ in 0..4 {
            page.place(&[], false).unwrap();
        }
        let slots = [
            Slot::Live { offset: 12, length: 0 },
            Slot::Relocated { offset: 300, length: 4000 },
            Slot::Forwarded(Rid::new(70000, 513)),
            Slot::Tombstone,
        ];
        for (i, slot) in slots.iter().enumerate() {
            page.set_slot(i as u16, *slot);
        }
        let copy = RecordPage::from_bytes(Box::new(*page.as_bytes())).unwrap();
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(copy.slot(i as u16), Some(*slot));
        }
    }

    #[test]
    fn place_and_read() {
        let mut page = RecordPage::initial();
        assert_eq!(page.place(&bytes(1, 10), false), Some(0));
        assert_eq!(page.place(&bytes(2, 20), false), Some(1));
        assert_eq!(page.record(0).unwrap(), &bytes(1, 10)[..]);
        assert_eq!(page.record(1).unwrap(), &bytes(2, 20)[..]);
        assert_eq!(page.frontier(), PAGE_HEADER_SIZE + 30);
        assert_eq!(page.free_space(), PAGE_SIZE - PAGE_HEADER_SIZE - 30 - 2 * SLOT_SIZE);
    }

    #[test]
    fn page_fills_up() {
        let mut page = RecordPage::initial();
        assert!(page.place(&bytes(9, MAX_RECORD_SIZE), false).is_some());
        assert_eq!(page.free_space(), 0);
        assert!(page.place(&[], false).is_none());

        let mut page = RecordPage::initial();
        assert!(page.place(&bytes(9, MAX_RECORD_SIZE + 1), false).is_none());
    }

    #[test]
    fn remove_compacts_and_reuses_slot() {
        let mut page = RecordPage::initial();
        page.place(&bytes(1, 10), false).unwrap();
        page.place(&bytes(2, 20), false).unwrap();
        page.place(&bytes(3, 30), false).unwrap();
        let free = page.free_space();

        assert!(page.remove(1));
        assert!(!page.remove(1));
        assert_eq!(page.slot(1), Some(Slot::Tombstone));
        assert_eq!(page.free_space(), free + 20);
        assert_eq!(page.record(0).unwrap(), &bytes(1, 10)[..]);
        assert_eq!(page.record(2).unwrap(), &bytes(3, 30)[..]);
        assert_eq!(
            page.slot(2),
            Some(Slot::Live { offset: (PAGE_HEADER_SIZE + 10) as u16, length: 30 })
        );

        assert_eq!(page.find_empty_slot(), (1, PAGE_HEADER_SIZE + 40));
        assert_eq!(page.place(&bytes(4, 5), false), Some(1));
        assert_eq!(page.num_slots(), 3);
        assert_eq!(page.record(1).unwrap(), &bytes(4, 5)[..]);
    }

    #[test]
    fn resize_in_place() {
        let mut page = RecordPage::initial();
        page.place(&bytes(1, 10), false).unwrap();
        page.place(&bytes(2, 20), true).unwrap();
        page.place(&bytes(3, 30), false).unwrap();
        let free = page.free_space();

        //grow the middle record.
        assert!(page.resize(1, &bytes(5, 50)));
        assert_eq!(page.free_space(), free - 30);
        assert_eq!(page.record(1).unwrap(), &bytes(5, 50)[..]);
        assert_eq!(page.record(2).unwrap(), &bytes(3, 30)[..]);
        assert!(matches!(page.slot(1), Some(Slot::Relocated { length: 50, .. })));

        //shrink it.
        assert!(page.resize(1, &bytes(6, 4)));
        assert_eq!(page.free_space(), free + 16);
        assert_eq!(page.record(0).unwrap(), &bytes(1, 10)[..]);
        assert_eq!(page.record(1).unwrap(), &bytes(6, 4)[..]);
        assert_eq!(page.record(2).unwrap(), &bytes(3, 30)[..]);
        assert_eq!(page.frontier(), PAGE_HEADER_SIZE + 44);

        //no room to grow.
        let before = page.as_bytes().to_vec();
        let too_long = bytes(7, 10 + page.free_space() + 1);
        assert!(!page.resize(0, &too_long));
        assert_eq!(page.as_bytes().to_vec(), before);
    }

    #[test]
    fn empty_records_keep_their_place() {
        let mut page = RecordPage::initial();
        page.place(&[], false).unwrap();
        page.place(&bytes(1, 8), false).unwrap();
        page.place(&[], false).unwrap();

        assert!(page.resize(0, &bytes(2, 3)));
        assert_eq!(page.record(0).unwrap(), &bytes(2, 3)[..]);
        assert_eq!(page.record(1).unwrap(), &bytes(1, 8)[..]);
        assert_eq!(page.record(2).unwrap(), &[] as &[u8]);
        assert_eq!(page.slot(2).unwrap().body(), Some((PAGE_HEADER_SIZE + 11, 0)));
    }

    #[test]
    fn place_in_tombstoned_slot() {
        let mut page = RecordPage::initial();
        page.place(&bytes(1, 10), false).unwrap();
        page.place(&bytes(2, 10), false).unwrap();
        page.set_slot(0, Slot::Forwarded(Rid::new(3, 4)));
        page.shift_records(PAGE_HEADER_SIZE + 10, -10, Some(0));
        assert_eq!(page.record(1).unwrap(), &bytes(2, 10)[..]);

        assert!(page.place_in_slot(0, &bytes(3, 12)));
        assert_eq!(page.record(0).unwrap(), &bytes(3, 12)[..]);
        assert_eq!(page.frontier(), PAGE_HEADER_SIZE + 22);
    }
}
