/**********************************************
  > File Name		: page_management/tests.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Fri 26 Mar 2021 10:20:35 AM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

use super::page_file::*;
use crate::errors::PageFileError;
use tempfile::TempDir;

fn init() -> (TempDir, PageFileManager) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().expect("create temp dir failed");
    let pfm = PageFileManager::new(dir.path());
    (dir, pfm)
}

fn filled(byte: u8) -> Box<PageData> {
    Box::new([byte; PAGE_SIZE])
}

#[test]
fn create_and_destroy_file() {
    let (_dir, pfm) = init();
    pfm.create_file("t1").unwrap();
    match pfm.create_file("t1") {
        Err(PageFileError::FileAlreadyExists(name)) => assert_eq!(name, "t1"),
        other => panic!("expected FileAlreadyExists, got {:?}", other),
    }
    pfm.destroy_file("t1").unwrap();
    assert!(matches!(pfm.destroy_file("t1"), Err(PageFileError::FileNotFound(_))));
    assert!(matches!(pfm.open_file("t1"), Err(PageFileError::FileNotFound(_))));
}

/*
 * Append 3 pages, overwrite the middle one and read all of them back.
 */
#[test]
fn page_file_test1() {
    let (_dir, pfm) = init();
    pfm.create_file("t2").unwrap();
    let mut pfh = pfm.open_file("t2").unwrap();
    assert_eq!(pfh.get_number_of_pages(), 0);

    for i in 0..3u8 {
        let page_num = pfh.append_page(&filled(i)).unwrap();
        assert_eq!(page_num, i as u32);
    }
    assert_eq!(pfh.get_number_of_pages(), 3);

    pfh.write_page(1, &filled(0xab)).unwrap();
    assert_eq!(pfh.read_page(0).unwrap()[..], filled(0)[..]);
    assert_eq!(pfh.read_page(1).unwrap()[..], filled(0xab)[..]);
    assert_eq!(pfh.read_page(2).unwrap()[..], filled(2)[..]);

    assert_eq!(pfh.collect_counter_values(), (3, 1, 3));
    pfm.close_file(&mut pfh).unwrap();
}

#[test]
fn page_out_of_range() {
    let (_dir, pfm) = init();
    pfm.create_file("t3").unwrap();
    let mut pfh = pfm.open_file("t3").unwrap();
    pfh.append_page(&filled(1)).unwrap();

    match pfh.read_page(1) {
        Err(PageFileError::PageOutOfRange { page_num, num_pages }) => {
            assert_eq!(page_num, 1);
            assert_eq!(num_pages, 1);
        }
        other => panic!("expected PageOutOfRange, got {:?}", other.map(|_| ())),
    }
    assert!(matches!(
        pfh.write_page(5, &filled(1)),
        Err(PageFileError::PageOutOfRange { .. })
    ));
    //failed operations are not counted.
    assert_eq!(pfh.collect_counter_values(), (0, 0, 1));
}

#[test]
fn counters_survive_reopen() {
    let (_dir, pfm) = init();
    pfm.create_file("t4").unwrap();
    let mut pfh = pfm.open_file("t4").unwrap();
    pfh.append_page(&filled(7)).unwrap();
    pfh.append_page(&filled(8)).unwrap();
    pfh.read_page(0).unwrap();
    pfh.write_page(1, &filled(9)).unwrap();
    pfm.close_file(&mut pfh).unwrap();

    let mut pfh = pfm.open_file("t4").unwrap();
    assert_eq!(pfh.get_number_of_pages(), 2);
    assert_eq!(pfh.collect_counter_values(), (1, 1, 2));
    assert_eq!(pfh.read_page(1).unwrap()[..], filled(9)[..]);
    assert_eq!(pfh.collect_counter_values(), (2, 1, 2));
    pfm.close_file(&mut pfh).unwrap();
}

#[test]
fn closed_handle_is_invalid() {
    let (_dir, pfm) = init();
    pfm.create_file("t5").unwrap();
    let mut pfh = pfm.open_file("t5").unwrap();
    pfm.close_file(&mut pfh).unwrap();

    assert!(!pfh.is_open());
    assert!(matches!(pfh.read_page(0), Err(PageFileError::InvalidState)));
    assert!(matches!(pfh.append_page(&filled(0)), Err(PageFileError::InvalidState)));
    assert!(matches!(pfm.close_file(&mut pfh), Err(PageFileError::InvalidState)));
}
