/**********************************************
  > File Name		: record_file.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Sun 18 Apr 2021 04:12:09 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * A mixed workload of inserts, updates and deletes over many pages,
 * checked against an in-memory copy of the table.
 */

use std::collections::BTreeMap;

use rbfm::record_management::record;
use rbfm::{
    Attribute, CompOp, PageFileManager, RecordError, RecordFileHandle, RecordFileManager, Rid,
    Value,
};
use tempfile::TempDir;

fn descriptor() -> Vec<Attribute> {
    vec![
        Attribute::int("id"),
        Attribute::varchar("note", 2000),
        Attribute::real("score"),
    ]
}

fn row(id: i32, note_len: usize) -> Vec<u8> {
    let note = "n".repeat(note_len);
    let score = if id % 7 == 0 {
        Value::Null
    } else {
        Value::Real(id as f32 / 2.0)
    };
    record::encode(&descriptor(), &[Value::Int(id), Value::from(note.as_str()), score]).unwrap()
}

fn check(rfh: &mut RecordFileHandle, table: &BTreeMap<Rid, Vec<u8>>) {
    let desc = descriptor();
    for (rid, data) in table.iter() {
        assert_eq!(&rfh.read_record(&desc, *rid).unwrap(), data, "record {}", rid);
    }

    let scanned: BTreeMap<Rid, Vec<u8>> = rfh
        .scan(&desc, "", CompOp::NoOp, &Value::Null, &["id", "note", "score"])
        .unwrap()
        .collect::<Result<_, RecordError>>()
        .unwrap();
    assert_eq!(&scanned, table);
}

#[test]
fn mixed_workload() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().expect("create temp dir failed");
    let rfm = RecordFileManager::new(PageFileManager::new(dir.path()));
    let desc = descriptor();

    rfm.create_file("workload").unwrap();
    let mut rfh = rfm.open_file("workload").unwrap();
    let mut table = BTreeMap::new();
    let mut rids = Vec::new();

    for id in 0..300 {
        let data = row(id, (id as usize * 13) % 700);
        let rid = rfh.insert_record(&desc, &data).unwrap();
        assert!(table.insert(rid, data).is_none(), "rid {} given twice", rid);
        rids.push(rid);
    }
    check(&mut rfh, &table);

    for (i, rid) in rids.iter().enumerate().filter(|(i, _)| i % 3 == 0) {
        let data = row(i as i32, (i * 37) % 1500);
        rfh.update_record(&desc, &data, *rid).unwrap();
        table.insert(*rid, data);
    }
    check(&mut rfh, &table);

    for (_, rid) in rids.iter().enumerate().filter(|(i, _)| i % 5 == 0) {
        rfh.delete_record(&desc, *rid).unwrap();
        table.remove(rid);
    }
    check(&mut rfh, &table);

    //shrink everything left, bringing forwarded records home where they fit.
    for (rid, data) in table.iter_mut() {
        let id = match record::field_value(&desc, data, 0).unwrap() {
            Value::Int(v) => v,
            other => panic!("id of {} is {:?}", rid, other),
        };
        *data = row(id, 3);
        rfh.update_record(&desc, data, *rid).unwrap();
    }
    check(&mut rfh, &table);

    let num_pages = rfh.get_number_of_pages();
    rfm.close_file(&mut rfh).unwrap();

    let mut rfh = rfm.open_file("workload").unwrap();
    assert_eq!(rfh.get_number_of_pages(), num_pages);
    check(&mut rfh, &table);

    let high: Vec<Rid> = rfh
        .scan(&desc, "id", CompOp::Ge, &Value::Int(290), &["id"])
        .unwrap()
        .map(|v| v.unwrap().0)
        .collect();
    //scans go in page and slot order.
    let mut expected: Vec<Rid> = rids[290..]
        .iter()
        .filter(|rid| table.contains_key(*rid))
        .cloned()
        .collect();
    expected.sort();
    assert_eq!(high, expected);

    rfm.close_file(&mut rfh).unwrap();
    rfm.destroy_file("workload").unwrap();
}
