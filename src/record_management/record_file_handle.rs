/**********************************************
  > File Name		: record_file_handle.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Mon 12 Apr 2021 11:01:57 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

use log::debug;

use super::record;
use super::record_page::{RecordPage, Slot, MAX_RECORD_SIZE};
use super::record_scan::RecordScan;
use super::{attr_index, Attribute, CompOp, Rid, Value};
use crate::errors::RecordError;
use crate::page_management::page_file::PageFileHandle;

/*
 * A RecordFileHandle is an open record file. Every operation reads the
 * pages it needs from the page file, modifies them in memory and writes
 * them back as whole pages; nothing is cached between two calls.
 *
 * Records of a file may have different sizes, a record can be up to
 * MAX_RECORD_SIZE bytes long.
 */
#[derive(Debug)]
pub struct RecordFileHandle {
    pfh: PageFileHandle,
}

impl RecordFileHandle {
    pub fn new(pfh: PageFileHandle) -> Self {
        Self { pfh }
    }

    pub(crate) fn page_file_handle_mut(&mut self) -> &mut PageFileHandle {
        &mut self.pfh
    }

    pub fn get_number_of_pages(&self) -> u32 {
        self.pfh.get_number_of_pages()
    }

    pub fn collect_counter_values(&self) -> (u32, u32, u32) {
        self.pfh.collect_counter_values()
    }

    pub(crate) fn read_record_page(&mut self, page_num: u32) -> Result<RecordPage, RecordError> {
        RecordPage::from_bytes(self.pfh.read_page(page_num)?)
    }

    fn write_record_page(&mut self, page_num: u32, page: &RecordPage) -> Result<(), RecordError> {
        self.pfh.write_page(page_num, page.as_bytes())?;
        Ok(())
    }

    /*
     * Cut the record out of the caller's data, which may be longer than
     * the record itself.
     */
    fn measure<'a>(descriptor: &[Attribute], data: &'a [u8]) -> Result<&'a [u8], RecordError> {
        let len = record::record_length(descriptor, data)?;
        if len > MAX_RECORD_SIZE {
            return Err(RecordError::RecordTooLarge(len));
        }
        Ok(&data[..len])
    }

    /*
     * Find a page for a new record: the last page first, then all pages
     * from the first one. If none of them has room, a new page is
     * appended.
     */
    fn place_record(&mut self, bytes: &[u8], relocated: bool) -> Result<Rid, RecordError> {
        let num_pages = self.pfh.get_number_of_pages();
        if num_pages > 0 {
            let last = num_pages - 1;
            for page_num in std::iter::once(last).chain(0..last) {
                let mut page = self.read_record_page(page_num)?;
                if let Some(slot_num) = page.place(bytes, relocated) {
                    self.write_record_page(page_num, &page)?;
                    let rid = Rid::new(page_num, slot_num);
                    debug!("placed {} bytes at {}", bytes.len(), rid);
                    return Ok(rid);
                }
            }
        }

        let mut page = RecordPage::initial();
        let slot_num = match page.place(bytes, relocated) {
            Some(v) => v,
            None => return Err(RecordError::RecordTooLarge(bytes.len())),
        };
        let page_num = self.pfh.append_page(page.as_bytes())?;
        let rid = Rid::new(page_num, slot_num);
        debug!("placed {} bytes at {} on a new page", bytes.len(), rid);
        Ok(rid)
    }

    /*
     * Bytes of the body a forwarding slot points to.
     */
    pub(crate) fn fetch_relocated(&mut self, target: Rid) -> Result<Vec<u8>, RecordError> {
        let page = self.read_record_page(target.get_page_num())?;
        match page.slot(target.get_slot_num()) {
            Some(Slot::Relocated { .. }) => match page.record(target.get_slot_num()) {
                Some(bytes) => Ok(bytes.to_vec()),
                None => Err(dangling(target)),
            },
            _ => Err(dangling(target)),
        }
    }

    fn fetch(&mut self, rid: Rid) -> Result<Vec<u8>, RecordError> {
        let page = self.read_record_page(rid.get_page_num())?;
        match page.slot(rid.get_slot_num()) {
            Some(Slot::Live { .. }) => match page.record(rid.get_slot_num()) {
                Some(bytes) => Ok(bytes.to_vec()),
                None => Err(RecordError::RecordNotFound(rid)),
            },
            Some(Slot::Forwarded(target)) => self.fetch_relocated(target),
            _ => Err(RecordError::RecordNotFound(rid)),
        }
    }

    //free a relocated body and compact its page.
    fn remove_relocated(&mut self, target: Rid) -> Result<(), RecordError> {
        let mut page = self.read_record_page(target.get_page_num())?;
        match page.slot(target.get_slot_num()) {
            Some(Slot::Relocated { .. }) => {
                page.remove(target.get_slot_num());
                self.write_record_page(target.get_page_num(), &page)
            }
            _ => Err(dangling(target)),
        }
    }

    pub fn slot_info(&mut self, rid: Rid) -> Result<Slot, RecordError> {
        let page = self.read_record_page(rid.get_page_num())?;
        page.slot(rid.get_slot_num())
            .ok_or(RecordError::RecordNotFound(rid))
    }

    pub fn insert_record(&mut self, descriptor: &[Attribute], data: &[u8]) -> Result<Rid, RecordError> {
        let bytes = Self::measure(descriptor, data)?;
        self.place_record(bytes, false)
    }

    pub fn read_record(&mut self, descriptor: &[Attribute], rid: Rid) -> Result<Vec<u8>, RecordError> {
        let bytes = self.fetch(rid)?;
        //the stored record must agree with the descriptor.
        let len = record::record_length(descriptor, &bytes)?;
        if len != bytes.len() {
            return Err(RecordError::MalformedInput(format!(
                "record {} has {} bytes, descriptor describes {}",
                rid,
                bytes.len(),
                len
            )));
        }
        Ok(bytes)
    }

    /*
     * Returns a one field record: a one byte null bitmap and the value.
     */
    pub fn read_attribute(
        &mut self,
        descriptor: &[Attribute],
        rid: Rid,
        attr_name: &str,
    ) -> Result<Vec<u8>, RecordError> {
        let index = attr_index(descriptor, attr_name)
            .ok_or_else(|| RecordError::AttributeNotFound(attr_name.to_string()))?;
        let bytes = self.fetch(rid)?;
        record::project(descriptor, &bytes, &[index])
    }

    pub fn delete_record(&mut self, _descriptor: &[Attribute], rid: Rid) -> Result<(), RecordError> {
        let page_num = rid.get_page_num();
        let slot_num = rid.get_slot_num();
        let mut page = self.read_record_page(page_num)?;
        match page.slot(slot_num) {
            Some(Slot::Live { .. }) => {
                page.remove(slot_num);
            }
            Some(Slot::Forwarded(target)) => {
                debug_assert_ne!(target.get_page_num(), page_num);
                self.remove_relocated(target)?;
                page.set_slot(slot_num, Slot::Tombstone);
            }
            _ => return Err(RecordError::RecordNotFound(rid)),
        }
        debug!("deleted record {}", rid);
        self.write_record_page(page_num, &page)
    }

    /*
     * Update a record, keeping its RID:
     * 1. If the home page can hold the new version, the record is
     *    rewritten in place, shifting the records after it.
     * 2. Otherwise the new version is stored as a relocated body on
     *    another page, and the home slot becomes a forwarding slot.
     *
     * A forwarded record first gives back its old body. Then it moves
     * home if it fits there again, or gets a new body, so there is never
     * more than one hop between a RID and its bytes.
     *
     * A new body is written before the home page. If writing the home
     * page fails, the body is left unreferenced: scans skip it and its
     * space is not reclaimed, but no slot ever points at missing bytes.
     */
    pub fn update_record(
        &mut self,
        descriptor: &[Attribute],
        data: &[u8],
        rid: Rid,
    ) -> Result<(), RecordError> {
        let bytes = Self::measure(descriptor, data)?;
        let page_num = rid.get_page_num();
        let slot_num = rid.get_slot_num();
        let mut page = self.read_record_page(page_num)?;

        match page.slot(slot_num) {
            Some(Slot::Live { .. }) => {
                if !page.resize(slot_num, bytes) {
                    let target = self.place_record(bytes, true)?;
                    page.remove(slot_num);
                    page.set_slot(slot_num, Slot::Forwarded(target));
                    debug!("record {} forwarded to {}", rid, target);
                }
            }
            Some(Slot::Forwarded(old)) => {
                self.remove_relocated(old)?;
                if page.place_in_slot(slot_num, bytes) {
                    debug!("record {} moved back home from {}", rid, old);
                } else {
                    let target = self.place_record(bytes, true)?;
                    page.set_slot(slot_num, Slot::Forwarded(target));
                    debug!("record {} forwarded from {} to {}", rid, old, target);
                }
            }
            _ => return Err(RecordError::RecordNotFound(rid)),
        }
        self.write_record_page(page_num, &page)
    }

    /*
     * Scan all records of the file. See RecordScan.
     */
    pub fn scan<'a>(
        &'a mut self,
        descriptor: &[Attribute],
        condition_attr: &str,
        comp_op: CompOp,
        value: &Value,
        projected: &[&str],
    ) -> Result<RecordScan<'a>, RecordError> {
        RecordScan::new(self, descriptor, condition_attr, comp_op, value, projected)
    }
}

fn dangling(target: Rid) -> RecordError {
    RecordError::IoError(format!("forwarding slot points to no record body at {}", target))
}
