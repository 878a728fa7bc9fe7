/**********************************************
  > File Name		: record_scan.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Sat 17 Apr 2021 03:20:51 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * RecordScan goes through all records of a file, one record per call:
 *
 *     let mut scan = rfh.scan(&descriptor, "age", CompOp::Gt, &Value::Int(25), &["name"])?;
 *     while let Some((rid, data)) = scan.get_next_record()? {
 *         process the data;
 *     }
 *     scan.close();
 *
 * Records are never kept in memory: only the page under the cursor is.
 * The cursor walks the slots of a page in order, then the next page, up
 * to the number of pages the file had when the scan started. A forwarding
 * slot is followed to the record body, but the RID returned is the one of
 * the forwarding slot, so a record is seen once under its own RID.
 *
 * The returned data has the record format of the projected attributes,
 * in the order they were asked for.
 */

use std::cmp::Ordering;

use log::debug;

use super::record;
use super::record_file_handle::RecordFileHandle;
use super::record_page::{RecordPage, Slot};
use super::{attr_index, Attribute, CompOp, Rid, Value};
use crate::errors::RecordError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    Exhausted,
    Closed,
}

#[derive(Debug, Clone)]
struct Condition {
    index: usize,
    comp_op: CompOp,
    value: Value,
}

/*
 * Int and Real compare as numbers, VarChar byte by byte.
 * None if the values are not comparable, null and NaN included.
 */
fn compare(field: &Value, value: &Value) -> Option<Ordering> {
    match (field, value) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
        (Value::VarChar(a), Value::VarChar(b)) => Some(a.as_slice().cmp(b.as_slice())),
        _ => None,
    }
}

impl Condition {
    fn holds(&self, descriptor: &[Attribute], bytes: &[u8]) -> Result<bool, RecordError> {
        let field = record::field_value(descriptor, bytes, self.index)?;
        let ord = match compare(&field, &self.value) {
            Some(v) => v,
            //NaN is unequal to every real, and to itself.
            None => {
                return Ok(self.comp_op == CompOp::Ne
                    && matches!((&field, &self.value), (Value::Real(_), Value::Real(_))))
            }
        };
        Ok(match self.comp_op {
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Le => ord != Ordering::Greater,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::Ge => ord != Ordering::Less,
            CompOp::Ne => ord != Ordering::Equal,
            CompOp::NoOp => true,
        })
    }
}

pub struct RecordScan<'a> {
    rfh: Option<&'a mut RecordFileHandle>,
    descriptor: Vec<Attribute>,
    condition: Option<Condition>,
    projection: Vec<usize>,
    num_pages: u32,
    page_num: u32,
    slot_num: u16,
    page: Option<RecordPage>,
    state: ScanState,
}

impl<'a> RecordScan<'a> {
    pub(crate) fn new(
        rfh: &'a mut RecordFileHandle,
        descriptor: &[Attribute],
        condition_attr: &str,
        comp_op: CompOp,
        value: &Value,
        projected: &[&str],
    ) -> Result<Self, RecordError> {
        //an empty condition attribute means no condition, like NoOp.
        let condition = match comp_op {
            CompOp::NoOp => None,
            _ if condition_attr.is_empty() => None,
            _ => {
                let index = attr_index(descriptor, condition_attr)
                    .ok_or_else(|| RecordError::AttributeNotFound(condition_attr.to_string()))?;
                //a null value is accepted and matches nothing.
                match value.attr_type() {
                    Some(t) if t != descriptor[index].attr_type => {
                        return Err(RecordError::MalformedInput(format!(
                            "cannot compare {} of type {:?} with {:?}",
                            condition_attr, descriptor[index].attr_type, value
                        )));
                    }
                    _ => {}
                }
                Some(Condition {
                    index,
                    comp_op,
                    value: value.clone(),
                })
            }
        };

        let projection = projected
            .iter()
            .map(|name| {
                attr_index(descriptor, name)
                    .ok_or_else(|| RecordError::AttributeNotFound(name.to_string()))
            })
            .collect::<Result<Vec<usize>, RecordError>>()?;

        let num_pages = rfh.get_number_of_pages();
        debug!(
            "scan of {} pages, condition {:?}, projection {:?}",
            num_pages, condition, projection
        );

        Ok(RecordScan {
            rfh: Some(rfh),
            descriptor: descriptor.to_vec(),
            condition,
            projection,
            num_pages,
            page_num: 0,
            slot_num: 0,
            page: None,
            state: ScanState::Scanning,
        })
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /*
     * Ok(None) is the end of the scan, returned again on every later call.
     */
    pub fn get_next_record(&mut self) -> Result<Option<(Rid, Vec<u8>)>, RecordError> {
        match self.state {
            ScanState::Closed => return Err(RecordError::InvalidState("scan is closed")),
            ScanState::Exhausted => return Ok(None),
            ScanState::Scanning => {}
        }
        let rfh = match self.rfh.as_mut() {
            Some(v) => v,
            None => return Err(RecordError::InvalidState("scan is closed")),
        };

        loop {
            let page = match self.page.take() {
                Some(v) => v,
                None => {
                    if self.page_num >= self.num_pages {
                        self.state = ScanState::Exhausted;
                        debug!("scan exhausted");
                        return Ok(None);
                    }
                    rfh.read_record_page(self.page_num)?
                }
            };
            if self.slot_num >= page.num_slots() {
                self.page_num += 1;
                self.slot_num = 0;
                continue;
            }

            let rid = Rid::new(self.page_num, self.slot_num);
            self.slot_num += 1;
            let bytes = match page.slot(rid.get_slot_num()) {
                Some(Slot::Live { .. }) => page.record(rid.get_slot_num()).map(|b| b.to_vec()),
                Some(Slot::Forwarded(target)) => Some(rfh.fetch_relocated(target)?),
                //relocated bodies are reached through their forwarding slot.
                _ => None,
            };
            self.page = Some(page);

            let bytes = match bytes {
                Some(v) => v,
                None => continue,
            };
            if let Some(condition) = &self.condition {
                if !condition.holds(&self.descriptor, &bytes)? {
                    continue;
                }
            }
            let data = record::project(&self.descriptor, &bytes, &self.projection)?;
            return Ok(Some((rid, data)));
        }
    }

    //releases the file handle, valid in any state.
    pub fn close(&mut self) {
        self.rfh = None;
        self.page = None;
        self.state = ScanState::Closed;
    }
}

impl<'a> Iterator for RecordScan<'a> {
    type Item = Result<(Rid, Vec<u8>), RecordError>;

    //an error ends the iteration.
    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ScanState::Closed {
            return None;
        }
        match self.get_next_record() {
            Ok(Some(v)) => Some(Ok(v)),
            Ok(None) => None,
            Err(e) => {
                self.state = ScanState::Exhausted;
                self.page = None;
                Some(Err(e))
            }
        }
    }
}
