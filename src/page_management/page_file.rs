/**********************************************
  > File Name		: page_file.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Mon 01 Mar 2021 07:31:48 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Introduction:
 *
 * The page_file component provides facilities for higer-level
 * components to perform file I/O in terms of pages.
 *
 * In the page_file component, methods are provided to create,
 * destroy, open and close paged files, to read and write a specific
 * page of a given file and to append new pages at the end of it.
 *
 * There is no buffer pool: every read_page hands out a freshly read
 * copy of the page, and the caller owns it until it writes the page
 * back with write_page or drops it.
 *
 * File layout: file header | page 0 | page 1 | ...
 * The file header only keeps the operation counters of the file, the
 * number of pages is derived from the file length.
 */

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::errors::PageFileError;

pub const PAGE_FILE_HEADER_SIZE: usize = 40;
pub const PAGE_SIZE: usize = 4096;

pub type PageData = [u8; PAGE_SIZE];

/*
 * Counters of page operations, persisted in the file header so they
 * survive close and reopen.
 */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PageFileHeader {
    read_count: u32,
    write_count: u32,
    append_count: u32,
}

impl PageFileHeader {
    fn to_bytes(&self) -> [u8; PAGE_FILE_HEADER_SIZE] {
        let mut buf = [0u8; PAGE_FILE_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.read_count.to_le_bytes());
        buf[4..8].copy_from_slice(&self.write_count.to_le_bytes());
        buf[8..12].copy_from_slice(&self.append_count.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8; PAGE_FILE_HEADER_SIZE]) -> Self {
        let word = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        PageFileHeader {
            read_count: word(0),
            write_count: word(4),
            append_count: word(8),
        }
    }
}

/*
 * The PageFileManager handles the creation, deletion, opening,
 * and closing of paged files. All files live under the root directory
 * given at construction.
 */
#[derive(Debug, Clone)]
pub struct PageFileManager {
    root: PathBuf,
}

impl PageFileManager {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        PageFileManager { root: root.into() }
    }

    fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn create_file(&self, file_name: &str) -> Result<(), PageFileError> {
        let fp = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(self.path_of(file_name))
        {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(PageFileError::FileAlreadyExists(file_name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        fp.write_all_at(&PageFileHeader::default().to_bytes(), 0)?;
        fp.sync_all()?;
        info!("created page file {}", file_name);
        Ok(())
    }

    pub fn destroy_file(&self, file_name: &str) -> Result<(), PageFileError> {
        match fs::remove_file(self.path_of(file_name)) {
            Ok(()) => {
                info!("destroyed page file {}", file_name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PageFileError::FileNotFound(file_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn open_file(&self, file_name: &str) -> Result<PageFileHandle, PageFileError> {
        let fp = match OpenOptions::new().read(true).write(true).open(self.path_of(file_name)) {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PageFileError::FileNotFound(file_name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let len = fp.metadata()?.len() as usize;
        if len < PAGE_FILE_HEADER_SIZE || (len - PAGE_FILE_HEADER_SIZE) % PAGE_SIZE != 0 {
            return Err(PageFileError::CorruptFile(format!(
                "{} has length {}, not a header plus whole pages",
                file_name, len
            )));
        }

        let mut buf = [0u8; PAGE_FILE_HEADER_SIZE];
        fp.read_exact_at(&mut buf, 0)?;
        let num_pages = ((len - PAGE_FILE_HEADER_SIZE) / PAGE_SIZE) as u32;
        info!("opened page file {} with {} pages", file_name, num_pages);

        Ok(PageFileHandle {
            file_name: file_name.to_string(),
            fp: Some(fp),
            header: PageFileHeader::from_bytes(&buf),
            num_pages,
        })
    }

    pub fn close_file(&self, handle: &mut PageFileHandle) -> Result<(), PageFileError> {
        handle.close()
    }
}

/*
 * The PageFileHandle provides access to the pages of an open file.
 * Once closed, every page operation fails with InvalidState.
 */
#[derive(Debug)]
pub struct PageFileHandle {
    file_name: String,
    fp: Option<File>,
    header: PageFileHeader,
    num_pages: u32,
}

impl PageFileHandle {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn is_open(&self) -> bool {
        self.fp.is_some()
    }

    fn file(&self) -> Result<&File, PageFileError> {
        self.fp.as_ref().ok_or(PageFileError::InvalidState)
    }

    fn check_range(&self, page_num: u32) -> Result<(), PageFileError> {
        if page_num >= self.num_pages {
            return Err(PageFileError::PageOutOfRange {
                page_num,
                num_pages: self.num_pages,
            });
        }
        Ok(())
    }

    fn get_page_offset(page_num: u32) -> u64 {
        (PAGE_FILE_HEADER_SIZE + page_num as usize * PAGE_SIZE) as u64
    }

    pub fn read_page(&mut self, page_num: u32) -> Result<Box<PageData>, PageFileError> {
        let fp = self.file()?;
        self.check_range(page_num)?;
        let mut data = Box::new([0u8; PAGE_SIZE]);
        fp.read_exact_at(&mut data[..], Self::get_page_offset(page_num))?;
        self.header.read_count += 1;
        debug!("read page {} of {}", page_num, self.file_name);
        Ok(data)
    }

    pub fn write_page(&mut self, page_num: u32, data: &PageData) -> Result<(), PageFileError> {
        let fp = self.file()?;
        self.check_range(page_num)?;
        fp.write_all_at(&data[..], Self::get_page_offset(page_num))?;
        self.header.write_count += 1;
        Ok(())
    }

    //returns the number of the new page.
    pub fn append_page(&mut self, data: &PageData) -> Result<u32, PageFileError> {
        let fp = self.file()?;
        let page_num = self.num_pages;
        fp.write_all_at(&data[..], Self::get_page_offset(page_num))?;
        self.num_pages += 1;
        self.header.append_count += 1;
        info!("appended page {} to {}", page_num, self.file_name);
        Ok(page_num)
    }

    pub fn get_number_of_pages(&self) -> u32 {
        self.num_pages
    }

    //(read_count, write_count, append_count)
    pub fn collect_counter_values(&self) -> (u32, u32, u32) {
        (
            self.header.read_count,
            self.header.write_count,
            self.header.append_count,
        )
    }

    fn save_header(&self) -> Result<(), PageFileError> {
        let fp = self.file()?;
        fp.write_all_at(&self.header.to_bytes(), 0)?;
        fp.sync_all()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PageFileError> {
        self.save_header()?;
        self.fp = None;
        info!("closed page file {}", self.file_name);
        Ok(())
    }
}

impl Drop for PageFileHandle {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.save_header() {
                warn!("lost counters of {} on drop: {}", self.file_name, e);
            }
        }
    }
}
