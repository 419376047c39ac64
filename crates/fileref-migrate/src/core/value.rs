//! Stored value shapes and the legacy list wire format.
//!
//! Multi-valued columns store an ordered list of byte strings in the
//! legacy serialized-array format, e.g. `a:2:{i:0;s:2:"42";i:1;s:1:"7";}`.
//! Element lengths are byte-exact, so the format is binary safe and can
//! carry resolved 16-byte identifiers unescaped.

/// Raw stored value for one row and column: one scalar, or an ordered
/// sequence of scalars for multi-valued attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyValue {
    Single(Vec<u8>),
    Many(Vec<Vec<u8>>),
}

/// Strip trailing NUL padding left by fixed-width storage.
pub fn strip_trailing_nul(raw: &[u8]) -> &[u8] {
    let mut end = raw.len();
    while end > 0 && raw[end - 1] == 0 {
        end -= 1;
    }
    &raw[..end]
}

/// Decode stored bytes into the shape the attribute declares.
///
/// A multi-valued column that does not hold a parseable list degrades to a
/// one-element list holding the raw bytes; decoding never fails a row.
pub fn decode_value(raw: &[u8], multiple: bool) -> LegacyValue {
    if multiple {
        match decode_list(raw) {
            Some(items) => LegacyValue::Many(items),
            None => LegacyValue::Many(vec![raw.to_vec()]),
        }
    } else {
        LegacyValue::Single(raw.to_vec())
    }
}

/// Encode a value back into its stored form.
pub fn encode_value(value: &LegacyValue) -> Vec<u8> {
    match value {
        LegacyValue::Single(bytes) => bytes.clone(),
        LegacyValue::Many(items) => encode_list(items),
    }
}

/// Parse a serialized list of byte strings.
///
/// Returns `None` for anything that is not exactly a flat list of strings
/// with integer keys, including trailing garbage.
pub fn decode_list(raw: &[u8]) -> Option<Vec<Vec<u8>>> {
    let mut cur = Cursor { buf: raw, pos: 0 };

    cur.expect(b"a:")?;
    let count = cur.digits()?;
    cur.expect(b":{")?;

    let mut items = Vec::new();
    for _ in 0..count {
        cur.expect(b"i:")?;
        // Keys are re-numbered sequentially on encode.
        let _key = cur.digits()?;
        cur.expect(b";s:")?;
        let len = cur.digits()?;
        cur.expect(b":\"")?;
        let bytes = cur.take(len)?;
        cur.expect(b"\";")?;
        items.push(bytes.to_vec());
    }

    cur.expect(b"}")?;
    if cur.pos == raw.len() {
        Some(items)
    } else {
        None
    }
}

/// Serialize a list of byte strings with sequential zero-based keys.
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("a:{}:{{", items.len()).as_bytes());
    for (i, item) in items.iter().enumerate() {
        out.extend_from_slice(format!("i:{};s:{}:\"", i, item.len()).as_bytes());
        out.extend_from_slice(item);
        out.extend_from_slice(b"\";");
    }
    out.push(b'}');
    out
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn expect(&mut self, lit: &[u8]) -> Option<()> {
        if self.buf[self.pos..].starts_with(lit) {
            self.pos += lit.len();
            Some(())
        } else {
            None
        }
    }

    /// Read a run of ASCII digits as a usize. At least one digit required.
    fn digits(&mut self) -> Option<usize> {
        let start = self.pos;
        let mut value: usize = 0;
        while let Some(&b) = self.buf.get(self.pos) {
            if !b.is_ascii_digit() {
                break;
            }
            value = value
                .checked_mul(10)?
                .checked_add((b - b'0') as usize)?;
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            Some(value)
        }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        if end > self.buf.len() {
            return None;
        }
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Some(bytes)
    }
}
