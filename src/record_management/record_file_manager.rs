/**********************************************
  > File Name		: record_file_manager.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Mon 12 Apr 2021 09:48:43 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

use log::info;

use super::record;
use super::record_file_handle::RecordFileHandle;
use super::Attribute;
use crate::errors::RecordError;
use crate::page_management::page_file::PageFileManager;

/*
 * RecordFileManager is an encapsulation of PageFileManager, as records
 * module use page_file to store records.
 * A record file starts without any page, pages are appended as records
 * are inserted.
 */
#[derive(Debug, Clone)]
pub struct RecordFileManager {
    pfm: PageFileManager,
}

impl RecordFileManager {
    pub fn new(pfm: PageFileManager) -> Self {
        Self { pfm }
    }

    pub fn create_file(&self, file_name: &str) -> Result<(), RecordError> {
        self.pfm.create_file(file_name)?;
        info!("created record file {}", file_name);
        Ok(())
    }

    pub fn destroy_file(&self, file_name: &str) -> Result<(), RecordError> {
        self.pfm.destroy_file(file_name)?;
        Ok(())
    }

    pub fn open_file(&self, file_name: &str) -> Result<RecordFileHandle, RecordError> {
        let pfh = self.pfm.open_file(file_name)?;
        Ok(RecordFileHandle::new(pfh))
    }

    pub fn close_file(&self, rfh: &mut RecordFileHandle) -> Result<(), RecordError> {
        self.pfm.close_file(rfh.page_file_handle_mut())?;
        Ok(())
    }

    /*
     * Print a record in the format
     *     field1-name: field1-value  field2-name: field2-value ...
     * with NULL for null fields. For debugging only.
     */
    pub fn print_record(descriptor: &[Attribute], data: &[u8]) -> Result<(), RecordError> {
        println!("{}", record::format_record(descriptor, data)?);
        Ok(())
    }
}
