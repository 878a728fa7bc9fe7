/**********************************************
  > File Name		: mod.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time     : Wed Mar 10 07:25:33 PM CST 2021
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * The Record Management component provides classes and methods for managing
 * files of unordered, variable-length records.
 *
 * We store records in paged files provided by the page_management
 * component. Every page of a record file is a slotted page, there is no
 * header page: the schema of the records (a list of attributes) is given
 * by the caller on every call and never persisted here.
 *
 * A record is identified by its RID, the page and the slot where it was
 * first inserted. The RID stays valid until the record is deleted, even if
 * an update moves the record body to another page.
 */

pub mod record;
pub mod record_file_handle;
pub mod record_file_manager;
pub mod record_page;
pub mod record_scan;


use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rid {
    page_num: u32,
    slot_num: u16, //slot_num represents the location of a record in a page.
}

impl Rid {
    pub fn new(page_num: u32, slot_num: u16) -> Self {
        Rid { page_num, slot_num }
    }

    pub fn get_page_num(&self) -> u32 {
        self.page_num
    }

    pub fn get_slot_num(&self) -> u16 {
        self.slot_num
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.page_num, self.slot_num)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttrType {
    Int,
    Real,
    VarChar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub attr_type: AttrType,
    pub length: u32, //declared max length for VarChar, 4 otherwise.
}

impl Attribute {
    pub fn new(name: &str, attr_type: AttrType, length: u32) -> Self {
        Attribute {
            name: name.to_string(),
            attr_type,
            length,
        }
    }

    pub fn int(name: &str) -> Self {
        Self::new(name, AttrType::Int, 4)
    }

    pub fn real(name: &str) -> Self {
        Self::new(name, AttrType::Real, 4)
    }

    pub fn varchar(name: &str, length: u32) -> Self {
        Self::new(name, AttrType::VarChar, length)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Real(f32),
    VarChar(Vec<u8>),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    //None for Null, which fits any attribute.
    pub fn attr_type(&self) -> Option<AttrType> {
        match self {
            Value::Int(_) => Some(AttrType::Int),
            Value::Real(_) => Some(AttrType::Real),
            Value::VarChar(_) => Some(AttrType::VarChar),
            Value::Null => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::VarChar(s.as_bytes().to_vec())
    }
}

//comparison operators of a scan condition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
    NoOp,
}

/*
 * Position of an attribute in a descriptor.
 */
pub(crate) fn attr_index(descriptor: &[Attribute], name: &str) -> Option<usize> {
    descriptor.iter().position(|attr| attr.name == name)
}
