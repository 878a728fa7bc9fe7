/**********************************************
  > File Name		: main.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Fri 16 Apr 2021 10:40:27 AM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Small walk through the record file manager:
 *     rbfm [root directory]
 * Log level is taken from RUST_LOG.
 */

use log::{error, info};
use rbfm::record_management::record;
use rbfm::{Attribute, CompOp, PageFileManager, RecordError, RecordFileManager, Value};

const TABLE_NAME: &str = "demo_table";

fn run(root: &str) -> Result<(), RecordError> {
    let rfm = RecordFileManager::new(PageFileManager::new(root));
    let descriptor = vec![
        Attribute::varchar("name", 50),
        Attribute::int("age"),
        Attribute::real("height"),
        Attribute::int("salary"),
    ];

    if let Err(RecordError::FileAlreadyExists(_)) = rfm.create_file(TABLE_NAME) {
        rfm.destroy_file(TABLE_NAME)?;
        rfm.create_file(TABLE_NAME)?;
    }
    let mut rfh = rfm.open_file(TABLE_NAME)?;

    let people = [
        ("Anteater", Value::Int(24), Value::Real(6.1), Value::Int(9000)),
        ("Bison", Value::Null, Value::Real(7.5), Value::Int(7500)),
        ("Cheetah", Value::Int(31), Value::Null, Value::Int(12000)),
    ];
    let mut rids = Vec::new();
    for (name, age, height, salary) in people.iter() {
        let data = record::encode(
            &descriptor,
            &[Value::from(*name), age.clone(), height.clone(), salary.clone()],
        )?;
        rids.push(rfh.insert_record(&descriptor, &data)?);
    }

    //a name long enough to push the record off its page.
    let long_name = "Bison".repeat(800);
    let data = record::encode(
        &descriptor,
        &[Value::from(long_name.as_str()), Value::Int(40), Value::Real(7.5), Value::Int(7600)],
    )?;
    rfh.update_record(&descriptor, &data, rids[1])?;
    info!("record {} is now {:?}", rids[1], rfh.slot_info(rids[1])?);

    for rid in rids.iter() {
        let data = rfh.read_record(&descriptor, *rid)?;
        RecordFileManager::print_record(&descriptor, &data)?;
    }

    let projected = ["name", "salary"];
    let out = vec![Attribute::varchar("name", 50), Attribute::int("salary")];
    let mut scan = rfh.scan(&descriptor, "salary", CompOp::Ge, &Value::Int(7600), &projected)?;
    while let Some((rid, data)) = scan.get_next_record()? {
        print!("{} ", rid);
        RecordFileManager::print_record(&out, &data)?;
    }
    scan.close();

    let (reads, writes, appends) = rfh.collect_counter_values();
    info!("{} reads, {} writes, {} appends", reads, writes, appends);
    rfm.close_file(&mut rfh)?;
    Ok(())
}

fn main() {
    env_logger::init();
    let root = std::env::args().nth(1).unwrap_or_else(|| String::from("."));
    if let Err(e) = run(&root) {
        error!("{}", e);
        std::process::exit(1);
    }
}
