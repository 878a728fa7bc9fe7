/**********************************************
  > File Name		: lib.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Fri 16 Apr 2021 10:02:11 AM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * A record based file manager: variable-length records with null
 * fields, stored in slotted pages of paged files.
 *
 * page_management: paged files, read and written a page at a time.
 * record_management: records, RIDs and scans on top of paged files.
 */

pub mod errors;
pub mod page_management;
pub mod record_management;

pub use errors::{PageFileError, RecordError};
pub use page_management::page_file::{PageFileHandle, PageFileManager, PAGE_SIZE};
pub use record_management::record_file_handle::RecordFileHandle;
pub use record_management::record_file_manager::RecordFileManager;
pub use record_management::record_scan::{RecordScan, ScanState};
pub use record_management::{AttrType, Attribute, CompOp, Rid, Value};
