/**********************************************
  > File Name		: errors.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Tue 02 Mar 2021 11:05:17 AM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Define some erros enum for global usage.
 */

use thiserror::Error;

use crate::record_management::Rid;

#[derive(Debug, Error)]
pub enum PageFileError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("file already exists: {0}")]
    FileAlreadyExists(String),
    //returns when a handle is used after close_file.
    #[error("page file handle is not open")]
    InvalidState,
    #[error("page {page_num} out of range, file has {num_pages} pages")]
    PageOutOfRange { page_num: u32, num_pages: u32 },
    //file length is not header + a whole number of pages.
    #[error("corrupt page file: {0}")]
    CorruptFile(String),
    #[error("unix io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("file already exists: {0}")]
    FileAlreadyExists(String),
    //closed file handle or closed scan.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("page {page_num} out of range, file has {num_pages} pages")]
    PageOutOfRange { page_num: u32, num_pages: u32 },
    //tombstoned or never existed.
    #[error("record {0} not found")]
    RecordNotFound(Rid),
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("record of {0} bytes does not fit in a page")]
    RecordTooLarge(usize),
    #[error("io error: {0}")]
    IoError(String),
}

impl From<PageFileError> for RecordError {
    fn from(e: PageFileError) -> Self {
        match e {
            PageFileError::FileNotFound(name) => RecordError::FileNotFound(name),
            PageFileError::FileAlreadyExists(name) => RecordError::FileAlreadyExists(name),
            PageFileError::InvalidState => RecordError::InvalidState("page file handle is not open"),
            PageFileError::PageOutOfRange { page_num, num_pages } => {
                RecordError::PageOutOfRange { page_num, num_pages }
            }
            PageFileError::CorruptFile(msg) => RecordError::IoError(msg),
            PageFileError::Io(e) => {
                log::error!("page file io failure: {}", e);
                RecordError::IoError(e.to_string())
            }
        }
    }
}
