//! Canonical bencode writer.
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` |
//! | Byte string | `<length>:<data>` | `4:spam` |
//! | List | `l<items>e` | `l4:spami42ee` |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` |
//!
//! Dictionary keys must be written in strictly increasing byte order. The
//! encoder never sorts: it only compares each key with the one before it at
//! the same nesting level and rejects out-of-order keys.

use std::io::Write;

use crate::error::EncodeError;

enum Frame {
    List,
    Dict {
        last_key: Option<Vec<u8>>,
        awaiting_value: bool,
    },
}

/// Streaming bencode writer over any [`Write`] sink.
///
/// ```
/// use createtorrent::bencode::Encoder;
///
/// let mut enc = Encoder::new(Vec::new());
/// enc.begin_dict().unwrap();
/// enc.key(b"length").unwrap();
/// enc.integer(42u64).unwrap();
/// enc.key(b"name").unwrap();
/// enc.bytes(b"a.txt").unwrap();
/// enc.end().unwrap();
/// assert_eq!(enc.into_inner(), b"d6:lengthi42e4:name5:a.txte");
/// ```
pub struct Encoder<W> {
    writer: W,
    stack: Vec<Frame>,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            stack: Vec::new(),
        }
    }

    /// Write `i<value>e`.
    pub fn integer(&mut self, value: impl Into<i128>) -> Result<(), EncodeError> {
        self.before_value()?;
        write!(self.writer, "i{}e", value.into())?;
        Ok(())
    }

    /// Write `<len>:<bytes>`. The length is a byte count.
    pub fn bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.before_value()?;
        self.write_raw_bytes(value)
    }

    pub fn begin_list(&mut self) -> Result<(), EncodeError> {
        self.before_value()?;
        self.writer.write_all(b"l")?;
        self.stack.push(Frame::List);
        Ok(())
    }

    pub fn begin_dict(&mut self) -> Result<(), EncodeError> {
        self.before_value()?;
        self.writer.write_all(b"d")?;
        self.stack.push(Frame::Dict {
            last_key: None,
            awaiting_value: false,
        });
        Ok(())
    }

    /// Write a dictionary key. It must sort strictly after the previous key
    /// of the innermost open dictionary.
    pub fn key(&mut self, key: &[u8]) -> Result<(), EncodeError> {
        match self.stack.last_mut() {
            Some(Frame::Dict {
                last_key,
                awaiting_value,
            }) => {
                if *awaiting_value {
                    let pending = last_key.as_deref().unwrap_or_default();
                    return Err(EncodeError::MissingValue(lossy(pending)));
                }
                if let Some(previous) = last_key.as_deref() {
                    if key <= previous {
                        return Err(EncodeError::KeyOrder {
                            previous: lossy(previous),
                            key: lossy(key),
                        });
                    }
                }
                *last_key = Some(key.to_vec());
                *awaiting_value = true;
            }
            _ => return Err(EncodeError::KeyOutsideDict),
        }
        self.write_raw_bytes(key)
    }

    /// Close the innermost list or dictionary.
    pub fn end(&mut self) -> Result<(), EncodeError> {
        match self.stack.pop() {
            Some(Frame::Dict {
                last_key,
                awaiting_value: true,
            }) => Err(EncodeError::MissingValue(lossy(
                last_key.as_deref().unwrap_or_default(),
            ))),
            Some(_) => {
                self.writer.write_all(b"e")?;
                Ok(())
            }
            None => Err(EncodeError::Unbalanced),
        }
    }

    /// Number of lists and dictionaries currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn before_value(&mut self) -> Result<(), EncodeError> {
        if let Some(Frame::Dict { awaiting_value, .. }) = self.stack.last_mut() {
            if !*awaiting_value {
                return Err(EncodeError::MissingKey);
            }
            *awaiting_value = false;
        }
        Ok(())
    }

    fn write_raw_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        write!(self.writer, "{}:", value.len())?;
        self.writer.write_all(value)?;
        Ok(())
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// An owned bencode value. Dictionary entries keep the order they were
/// given in; encoding fails if that order is not strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Dict(Vec<(Vec<u8>, Value)>),
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::Bytes(s.as_bytes().to_vec())
    }

    /// Build a dictionary from `(key, value)` pairs, preserving their order.
    pub fn dict<K: AsRef<[u8]>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_vec(), v))
                .collect(),
        )
    }

    /// Stream this value into an encoder.
    pub fn write_to<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<(), EncodeError> {
        match self {
            Value::Integer(i) => encoder.integer(*i),
            Value::Bytes(b) => encoder.bytes(b),
            Value::List(items) => {
                encoder.begin_list()?;
                for item in items {
                    item.write_to(encoder)?;
                }
                encoder.end()
            }
            Value::Dict(entries) => {
                encoder.begin_dict()?;
                for (key, value) in entries {
                    encoder.key(key)?;
                    value.write_to(encoder)?;
                }
                encoder.end()
            }
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Encode a value to a fresh buffer.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = Encoder::new(Vec::new());
    value.write_to(&mut encoder)?;
    Ok(encoder.into_inner())
}
