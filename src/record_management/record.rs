/**********************************************
  > File Name		: record.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Tue 13 Apr 2021 08:12:40 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Record wire format.
 *
 * The same format is used for the data passed to insert_record and
 * update_record, the data returned by read_record, read_attribute and
 * scans, and the bytes stored in a page:
 *
 *     null bitmap | value of field 0 | value of field 1 | ...
 *
 * 1. The null bitmap takes ceil(n / 8) bytes for n fields. The k-th bit
 *    from the left (0-based, MSB first in every byte) is set if the k-th
 *    field is null. Null fields take no bytes in the value part.
 * 2. Int and Real take 4 bytes, little endian.
 * 3. VarChar takes a 4 bytes length followed by the raw characters.
 *
 * Lengths are advisory: a VarChar longer than its declared length is
 * stored as is.
 */

use std::fmt::Write;

use super::{AttrType, Attribute, Value};
use crate::errors::RecordError;

//mask of field 0 in the first bitmap byte.
pub const NULL_BIT_MSB: u8 = 0x80;

const FIXED_SIZE: usize = 4;
const VARCHAR_PREFIX_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullBitmap {
    bits: Vec<bool>,
}

impl NullBitmap {
    pub fn new(num_fields: usize) -> Self {
        NullBitmap {
            bits: vec![false; num_fields],
        }
    }

    pub fn bytes_for(num_fields: usize) -> usize {
        (num_fields + 7) / 8
    }

    fn mask(index: usize) -> u8 {
        NULL_BIT_MSB >> (index % 8)
    }

    pub fn from_bytes(bytes: &[u8], num_fields: usize) -> Result<Self, RecordError> {
        let size = Self::bytes_for(num_fields);
        if bytes.len() < size {
            return Err(RecordError::MalformedInput(format!(
                "null bitmap needs {} bytes, got {}",
                size,
                bytes.len()
            )));
        }
        let bits = (0..num_fields)
            .map(|i| bytes[i / 8] & Self::mask(i) != 0)
            .collect();
        Ok(NullBitmap { bits })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; Self::bytes_for(self.bits.len())];
        for (i, _) in self.bits.iter().enumerate().filter(|(_, null)| **null) {
            bytes[i / 8] |= Self::mask(i);
        }
        bytes
    }

    pub fn is_null(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn set_null(&mut self, index: usize, null: bool) {
        self.bits[index] = null;
    }
}

fn truncated(attr: &Attribute, pos: usize) -> RecordError {
    RecordError::MalformedInput(format!(
        "record ends inside field {} at byte {}",
        attr.name, pos
    ))
}

/*
 * Encoded size of the non-null field starting at pos.
 */
fn field_len(attr: &Attribute, bytes: &[u8], pos: usize) -> Result<usize, RecordError> {
    let len = match attr.attr_type {
        AttrType::Int | AttrType::Real => FIXED_SIZE,
        AttrType::VarChar => {
            let prefix = bytes
                .get(pos..pos + VARCHAR_PREFIX_SIZE)
                .ok_or_else(|| truncated(attr, pos))?;
            let n = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
            VARCHAR_PREFIX_SIZE + n as usize
        }
    };
    if pos + len > bytes.len() {
        return Err(truncated(attr, pos));
    }
    Ok(len)
}

/*
 * Total encoded size of a record, without decoding any value.
 * Trailing bytes after the last field are not part of the record.
 */
pub fn record_length(descriptor: &[Attribute], bytes: &[u8]) -> Result<usize, RecordError> {
    let bitmap = NullBitmap::from_bytes(bytes, descriptor.len())?;
    let mut pos = NullBitmap::bytes_for(descriptor.len());
    for (i, attr) in descriptor.iter().enumerate() {
        if !bitmap.is_null(i) {
            pos += field_len(attr, bytes, pos)?;
        }
    }
    Ok(pos)
}

/*
 * Locate the encoded bytes of one field, None if it is null.
 * Only the fields before it are walked.
 */
pub fn field_bytes<'a>(
    descriptor: &[Attribute],
    bytes: &'a [u8],
    index: usize,
) -> Result<Option<&'a [u8]>, RecordError> {
    let bitmap = NullBitmap::from_bytes(bytes, descriptor.len())?;
    let mut pos = NullBitmap::bytes_for(descriptor.len());
    for (i, attr) in descriptor.iter().enumerate().take(index + 1) {
        if bitmap.is_null(i) {
            if i == index {
                return Ok(None);
            }
            continue;
        }
        let len = field_len(attr, bytes, pos)?;
        if i == index {
            return Ok(Some(&bytes[pos..pos + len]));
        }
        pos += len;
    }
    Err(RecordError::MalformedInput(format!(
        "field index {} out of {} fields",
        index,
        descriptor.len()
    )))
}

fn decode_field(attr: &Attribute, raw: &[u8]) -> Value {
    match attr.attr_type {
        AttrType::Int => Value::Int(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        AttrType::Real => Value::Real(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        AttrType::VarChar => Value::VarChar(raw[VARCHAR_PREFIX_SIZE..].to_vec()),
    }
}

pub fn field_value(
    descriptor: &[Attribute],
    bytes: &[u8],
    index: usize,
) -> Result<Value, RecordError> {
    Ok(match field_bytes(descriptor, bytes, index)? {
        Some(raw) => decode_field(&descriptor[index], raw),
        None => Value::Null,
    })
}

pub fn encode(descriptor: &[Attribute], values: &[Value]) -> Result<Vec<u8>, RecordError> {
    if values.len() != descriptor.len() {
        return Err(RecordError::MalformedInput(format!(
            "{} values for {} attributes",
            values.len(),
            descriptor.len()
        )));
    }

    let mut bitmap = NullBitmap::new(descriptor.len());
    let mut body = Vec::new();
    for (i, (attr, value)) in descriptor.iter().zip(values).enumerate() {
        match (attr.attr_type, value) {
            (_, Value::Null) => bitmap.set_null(i, true),
            (AttrType::Int, Value::Int(v)) => body.extend_from_slice(&v.to_le_bytes()),
            (AttrType::Real, Value::Real(v)) => body.extend_from_slice(&v.to_le_bytes()),
            (AttrType::VarChar, Value::VarChar(s)) => {
                body.extend_from_slice(&(s.len() as u32).to_le_bytes());
                body.extend_from_slice(s);
            }
            (expected, got) => {
                return Err(RecordError::MalformedInput(format!(
                    "attribute {} is {:?}, got {:?}",
                    attr.name, expected, got
                )));
            }
        }
    }

    let mut data = bitmap.to_bytes();
    data.append(&mut body);
    Ok(data)
}

pub fn decode(descriptor: &[Attribute], bytes: &[u8]) -> Result<Vec<Value>, RecordError> {
    let bitmap = NullBitmap::from_bytes(bytes, descriptor.len())?;
    let mut pos = NullBitmap::bytes_for(descriptor.len());
    let mut values = Vec::with_capacity(descriptor.len());
    for (i, attr) in descriptor.iter().enumerate() {
        if bitmap.is_null(i) {
            values.push(Value::Null);
            continue;
        }
        let len = field_len(attr, bytes, pos)?;
        values.push(decode_field(attr, &bytes[pos..pos + len]));
        pos += len;
    }
    Ok(values)
}

/*
 * Re-encode a subset of the fields, in the order of indices, copying the
 * encoded bytes of every field.
 */
pub fn project(
    descriptor: &[Attribute],
    bytes: &[u8],
    indices: &[usize],
) -> Result<Vec<u8>, RecordError> {
    let mut bitmap = NullBitmap::new(indices.len());
    let mut body = Vec::new();
    for (i, &index) in indices.iter().enumerate() {
        match field_bytes(descriptor, bytes, index)? {
            Some(raw) => body.extend_from_slice(raw),
            None => bitmap.set_null(i, true),
        }
    }
    let mut data = bitmap.to_bytes();
    data.append(&mut body);
    Ok(data)
}

/*
 * Human readable dump of a record, for debugging:
 *     age: 24  height: 6.1  name: NULL
 */
pub fn format_record(descriptor: &[Attribute], bytes: &[u8]) -> Result<String, RecordError> {
    let values = decode(descriptor, bytes)?;
    let mut line = String::new();
    for (i, (attr, value)) in descriptor.iter().zip(values).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let _ = match value {
            Value::Int(v) => write!(line, "{}: {}", attr.name, v),
            Value::Real(v) => write!(line, "{}: {}", attr.name, v),
            Value::VarChar(s) => write!(line, "{}: {}", attr.name, String::from_utf8_lossy(&s)),
            Value::Null => write!(line, "{}: NULL", attr.name),
        };
    }
    Ok(line)
}
