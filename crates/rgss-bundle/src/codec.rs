//! Container encode/decode

use std::collections::HashSet;

use crate::allocator::SectionIdAllocator;
use crate::error::{Error, Result};
use crate::marshal::{Reader, Value, Writer};
use crate::record::{RecordShape, ScriptRecord};

/// Decode a container into its records, in file order.
///
/// Records without a trusted section id receive a fresh one that does not
/// collide with any id present in the container.
pub fn decode(bytes: &[u8]) -> Result<Vec<ScriptRecord>> {
    decode_with(bytes, &mut SectionIdAllocator::new())
}

/// Decode using a caller-supplied allocator.
pub fn decode_with(bytes: &[u8], allocator: &mut SectionIdAllocator) -> Result<Vec<ScriptRecord>> {
    let mut reader = Reader::new(bytes);
    reader.read_header()?;
    let count = reader.read_array_header()?;

    let mut shapes = Vec::with_capacity(count.min(bytes.len()));
    for index in 0..count {
        let offset = reader.position();
        let value = reader.read_value()?;
        shapes.push(classify(value, index, offset)?);
    }
    if !reader.is_empty() {
        tracing::warn!(
            offset = reader.position(),
            trailing = bytes.len() - reader.position(),
            "ignoring trailing bytes after script container"
        );
    }

    for shape in &shapes {
        if let Some(id) = shape.section_id()
            && !allocator.reserve(id)
        {
            tracing::warn!(section_id = id, "duplicate section id in container");
        }
    }

    let records = shapes
        .into_iter()
        .map(|shape| shape.into_record(|| allocator.next()))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(records = records.len(), "decoded script container");
    Ok(records)
}

/// Encode records into a container.
///
/// Titles are written as UTF-8 tagged strings and payloads as raw bytes.
/// Section ids must be distinct.
pub fn encode(records: &[ScriptRecord]) -> Result<Vec<u8>> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.section_id) {
            return Err(Error::DuplicateSectionId {
                section_id: record.section_id,
            });
        }
    }

    let mut writer = Writer::new();
    writer.write_array_header(records.len());
    for record in records {
        writer.write_array_header(3);
        writer.write_integer(i64::from(record.section_id));
        writer.write_utf8(&record.title);
        writer.write_bytes(&record.payload);
    }

    let bytes = writer.into_bytes();
    tracing::debug!(records = records.len(), bytes = bytes.len(), "encoded script container");
    Ok(bytes)
}

fn classify(value: Value, index: usize, offset: usize) -> Result<RecordShape> {
    let Value::Array(fields) = value else {
        return Err(Error::corrupt(
            offset,
            format!("record {} is a {}, expected an array", index, value.kind()),
        ));
    };

    match <[Value; 3]>::try_from(fields) {
        Ok([id, title, payload]) => Ok(RecordShape::Tagged {
            section_id: section_id(id, index, offset)?,
            title: string_field(title, "title", index, offset)?,
            payload: string_field(payload, "payload", index, offset)?,
        }),
        Err(fields) => match <[Value; 2]>::try_from(fields) {
            Ok([title, payload]) => Ok(RecordShape::Legacy {
                title: string_field(title, "title", index, offset)?,
                payload: string_field(payload, "payload", index, offset)?,
            }),
            Err(fields) => match <[Value; 1]>::try_from(fields) {
                Ok([inner]) => match classify(inner, index, offset)? {
                    RecordShape::Tagged { title, payload, .. } => {
                        Ok(RecordShape::Nested { title, payload })
                    }
                    _ => Err(Error::corrupt(
                        offset,
                        format!("record {} wraps a record without a section id", index),
                    )),
                },
                Err(fields) => Err(Error::corrupt(
                    offset,
                    format!("record {} has {} fields", index, fields.len()),
                )),
            },
        },
    }
}

fn section_id(value: Value, index: usize, offset: usize) -> Result<i32> {
    match value {
        Value::Int(id) => i32::try_from(id).map_err(|_| {
            Error::corrupt(
                offset,
                format!("record {} section id {} is out of range", index, id),
            )
        }),
        other => Err(Error::corrupt(
            offset,
            format!("record {} section id is a {}", index, other.kind()),
        )),
    }
}

fn string_field(value: Value, field: &str, index: usize, offset: usize) -> Result<Vec<u8>> {
    match value {
        Value::Str(bytes) => Ok(bytes),
        Value::Nil => Ok(Vec::new()),
        other => Err(Error::corrupt(
            offset,
            format!("record {} {} is a {}", index, field, other.kind()),
        )),
    }
}
