//! Ruby Marshal 4.8 subset used by script containers.
//!
//! Only the value kinds a script container can hold are supported: arrays,
//! fixnums, bignums, byte strings (optionally wrapped with instance
//! variables), symbols, object links and the nil/true/false singletons.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Marshal format version written and accepted.
pub const MARSHAL_MAJOR: u8 = 4;
pub const MARSHAL_MINOR: u8 = 8;

/// Values outside `[-2^30, 2^30)` are written as bignums.
const FIXNUM_MIN: i64 = -(1 << 30);
const FIXNUM_MAX: i64 = (1 << 30) - 1;

/// Nesting deeper than this is rejected instead of recursing.
const MAX_DEPTH: usize = 64;

const TAG_NIL: u8 = b'0';
const TAG_TRUE: u8 = b'T';
const TAG_FALSE: u8 = b'F';
const TAG_FIXNUM: u8 = b'i';
const TAG_BIGNUM: u8 = b'l';
const TAG_STRING: u8 = b'"';
const TAG_IVAR: u8 = b'I';
const TAG_SYMBOL: u8 = b':';
const TAG_SYMLINK: u8 = b';';
const TAG_LINK: u8 = b'@';
const TAG_ARRAY: u8 = b'[';

/// A decoded Marshal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Vec<u8>),
    Symbol(String),
    Array(Vec<Value>),
}

impl Value {
    /// Short name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Array(_) => "array",
        }
    }
}

/// Streaming reader over a Marshal byte stream.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    symbols: Vec<String>,
    /// Object table for `@` links. Arrays occupy a slot but cannot be
    /// linked to, which keeps decoding linear in the input size.
    objects: Vec<Option<Value>>,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            symbols: Vec::new(),
            objects: Vec::new(),
        }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Consume and check the `\x04\x08` version header.
    pub fn read_header(&mut self) -> Result<()> {
        let major = self.read_u8()?;
        let minor = self.read_u8()?;
        if major != MARSHAL_MAJOR || minor != MARSHAL_MINOR {
            return Err(Error::corrupt(
                0,
                format!("unsupported marshal version {}.{}", major, minor),
            ));
        }
        Ok(())
    }

    /// Read the header of an array: its tag and element count.
    ///
    /// The array is registered in the object table as a placeholder so
    /// later object links keep their indices.
    pub fn read_array_header(&mut self) -> Result<usize> {
        let offset = self.pos;
        let tag = self.read_u8()?;
        if tag != TAG_ARRAY {
            return Err(Error::corrupt(
                offset,
                format!("expected array, found tag {:?}", tag as char),
            ));
        }
        self.objects.push(None);
        self.read_len()
    }

    /// Read one complete value.
    pub fn read_value(&mut self) -> Result<Value> {
        self.read_value_at_depth(0)
    }

    fn read_value_at_depth(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(Error::corrupt(self.pos, "values nested too deeply"));
        }
        let offset = self.pos;
        let tag = self.read_u8()?;
        match tag {
            TAG_NIL => Ok(Value::Nil),
            TAG_TRUE => Ok(Value::Bool(true)),
            TAG_FALSE => Ok(Value::Bool(false)),
            TAG_FIXNUM => Ok(Value::Int(self.read_long()?)),
            TAG_BIGNUM => {
                let value = Value::Int(self.read_bignum()?);
                self.objects.push(Some(value.clone()));
                Ok(value)
            }
            TAG_STRING => {
                let value = Value::Str(self.read_raw_bytes()?.to_vec());
                self.objects.push(Some(value.clone()));
                Ok(value)
            }
            TAG_SYMBOL | TAG_SYMLINK => {
                self.pos = offset;
                Ok(Value::Symbol(self.read_symbol()?))
            }
            TAG_IVAR => {
                let value = self.read_value_at_depth(depth + 1)?;
                let count = self.read_len()?;
                for _ in 0..count {
                    self.read_symbol()?;
                    self.read_value_at_depth(depth + 1)?;
                }
                Ok(value)
            }
            TAG_LINK => {
                let index = self.read_len()?;
                match self.objects.get(index) {
                    Some(Some(value)) => Ok(value.clone()),
                    Some(None) => Err(Error::corrupt(
                        offset,
                        format!("object link {} points at an array", index),
                    )),
                    None => Err(Error::corrupt(
                        offset,
                        format!("object link {} out of range", index),
                    )),
                }
            }
            TAG_ARRAY => {
                self.objects.push(None);
                let len = self.read_len()?;
                let mut items = Vec::with_capacity(len.min(self.remaining()));
                for _ in 0..len {
                    items.push(self.read_value_at_depth(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            other => Err(Error::corrupt(
                offset,
                format!("unsupported marshal tag {:?} (0x{:02x})", other as char, other),
            )),
        }
    }

    fn read_symbol(&mut self) -> Result<String> {
        let offset = self.pos;
        match self.read_u8()? {
            TAG_SYMBOL => {
                let name = String::from_utf8_lossy(self.read_raw_bytes()?).into_owned();
                self.symbols.push(name.clone());
                Ok(name)
            }
            TAG_SYMLINK => {
                let index = self.read_len()?;
                self.symbols.get(index).cloned().ok_or_else(|| {
                    Error::corrupt(offset, format!("symbol link {} out of range", index))
                })
            }
            other => Err(Error::corrupt(
                offset,
                format!("expected symbol, found tag {:?}", other as char),
            )),
        }
    }

    fn read_bignum(&mut self) -> Result<i64> {
        let offset = self.pos;
        let sign = self.read_u8()?;
        let shorts = self.read_len()?;
        let len = shorts
            .checked_mul(2)
            .ok_or_else(|| Error::corrupt(offset, "bignum length overflows"))?;
        let bytes = self.read_bytes(len)?;

        let mut magnitude: u64 = 0;
        for (i, byte) in bytes.iter().enumerate() {
            if *byte == 0 {
                continue;
            }
            if i >= 8 {
                return Err(Error::corrupt(offset, "bignum exceeds 64 bits"));
            }
            magnitude |= u64::from(*byte) << (8 * i);
        }
        let magnitude = i64::try_from(magnitude)
            .map_err(|_| Error::corrupt(offset, "bignum exceeds 64 bits"))?;

        match sign {
            b'+' => Ok(magnitude),
            b'-' => Ok(-magnitude),
            other => Err(Error::corrupt(
                offset,
                format!("invalid bignum sign {:?}", other as char),
            )),
        }
    }

    /// Read a packed long (`w_long` in the reference writer).
    fn read_long(&mut self) -> Result<i64> {
        let c = self.read_u8()? as i8;
        match c {
            0 => Ok(0),
            5..=i8::MAX => Ok(i64::from(c) - 5),
            i8::MIN..=-5 => Ok(i64::from(c) + 5),
            1..=4 => {
                let n = c as usize;
                let bytes = self.read_bytes(n)?;
                let mut x: i64 = 0;
                for (i, byte) in bytes.iter().enumerate() {
                    x |= i64::from(*byte) << (8 * i);
                }
                Ok(x)
            }
            -4..=-1 => {
                let n = c.unsigned_abs() as usize;
                let bytes = self.read_bytes(n)?;
                let mut x: i64 = -1;
                for (i, byte) in bytes.iter().enumerate() {
                    x &= !(0xff << (8 * i));
                    x |= i64::from(*byte) << (8 * i);
                }
                Ok(x)
            }
        }
    }

    fn read_len(&mut self) -> Result<usize> {
        let offset = self.pos;
        let len = self.read_long()?;
        usize::try_from(len).map_err(|_| Error::corrupt(offset, format!("negative length {}", len)))
    }

    fn read_raw_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::corrupt(self.pos, "unexpected end of data"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::corrupt(
                self.pos,
                format!(
                    "unexpected end of data (need {} bytes, have {})",
                    n,
                    self.remaining()
                ),
            ));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }
}

/// Builds a Marshal byte stream.
pub struct Writer {
    buf: Vec<u8>,
    symbols: HashMap<String, usize>,
}

impl Writer {
    /// Create a writer with the version header already emitted.
    pub fn new() -> Self {
        Self {
            buf: vec![MARSHAL_MAJOR, MARSHAL_MINOR],
            symbols: HashMap::new(),
        }
    }

    pub fn write_nil(&mut self) {
        self.buf.push(TAG_NIL);
    }

    pub fn write_array_header(&mut self, len: usize) {
        self.buf.push(TAG_ARRAY);
        self.write_long(len as i64);
    }

    pub fn write_integer(&mut self, value: i64) {
        if (FIXNUM_MIN..=FIXNUM_MAX).contains(&value) {
            self.buf.push(TAG_FIXNUM);
            self.write_long(value);
            return;
        }

        self.buf.push(TAG_BIGNUM);
        self.buf.push(if value < 0 { b'-' } else { b'+' });
        let mut magnitude = value.unsigned_abs();
        let mut bytes = Vec::with_capacity(8);
        while magnitude > 0 {
            bytes.push((magnitude & 0xff) as u8);
            magnitude >>= 8;
        }
        if bytes.len() % 2 == 1 {
            bytes.push(0);
        }
        self.write_long((bytes.len() / 2) as i64);
        self.buf.extend_from_slice(&bytes);
    }

    /// Write a binary string with no encoding attached.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.push(TAG_STRING);
        self.write_long(bytes.len() as i64);
        self.buf.extend_from_slice(bytes);
    }

    /// Write a string flagged as UTF-8 (`E = true`).
    pub fn write_utf8(&mut self, bytes: &[u8]) {
        self.buf.push(TAG_IVAR);
        self.write_bytes(bytes);
        self.write_long(1);
        self.write_symbol("E");
        self.buf.push(TAG_TRUE);
    }

    pub fn write_symbol(&mut self, name: &str) {
        if let Some(index) = self.symbols.get(name).copied() {
            self.buf.push(TAG_SYMLINK);
            self.write_long(index as i64);
            return;
        }
        let index = self.symbols.len();
        self.symbols.insert(name.to_string(), index);
        self.buf.push(TAG_SYMBOL);
        self.write_long(name.len() as i64);
        self.buf.extend_from_slice(name.as_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_long(&mut self, mut x: i64) {
        if x == 0 {
            self.buf.push(0);
            return;
        }
        if 0 < x && x < 123 {
            self.buf.push((x + 5) as u8);
            return;
        }
        if -124 < x && x < 0 {
            self.buf.push(((x - 5) & 0xff) as u8);
            return;
        }

        let mut bytes = [0u8; 8];
        for i in 1..=8usize {
            bytes[i - 1] = (x & 0xff) as u8;
            x >>= 8;
            if x == 0 {
                self.buf.push(i as u8);
                self.buf.extend_from_slice(&bytes[..i]);
                return;
            }
            if x == -1 {
                self.buf.push((-(i as i8)) as u8);
                self.buf.extend_from_slice(&bytes[..i]);
                return;
            }
        }
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
