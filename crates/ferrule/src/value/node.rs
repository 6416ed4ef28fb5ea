//! Heap node payloads: boxed scalars, text, binary, sequences, maps, closures

use indexmap::IndexMap;

use super::Value;

/// A heap-boxed integer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegerNode(pub i64);

/// A heap-boxed float.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FloatNode(pub f64);

/// A character string.
///
/// Offsets used by [`Text::splice`] count characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text(String);

impl Text {
    /// Create a text node
    pub fn new(s: impl Into<String>) -> Self {
        Text(s.into())
    }

    /// Borrow the contents
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Append to the end
    pub fn push_str(&mut self, s: &str) {
        self.0.push_str(s);
    }

    /// Remove a character range and insert `replacement` in its place.
    ///
    /// Returns the removed characters.
    pub fn splice(&mut self, offset: i64, length: Option<i64>, replacement: &str) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let (start, end) = splice_bounds(chars.len(), offset, length);
        let removed: String = chars[start..end].iter().collect();
        let mut out: String = chars[..start].iter().collect();
        out.push_str(replacement);
        out.extend(chars[end..].iter());
        self.0 = out;
        removed
    }

    /// Boolean coercion: the leading integer is non-zero.
    pub fn as_bool(&self) -> bool {
        self.as_int() != 0
    }

    /// Integer coercion: the leading integer prefix, 0 if there is none.
    pub fn as_int(&self) -> i64 {
        leading_int(&self.0)
    }

    /// Float coercion: the leading float prefix, 0.0 if there is none.
    pub fn as_float(&self) -> f64 {
        leading_float(&self.0)
    }
}

/// A binary blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binary(Vec<u8>);

impl Binary {
    /// Create a binary node
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Binary(bytes.into())
    }

    /// Borrow the bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append bytes
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// A growable sequence of values.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    items: Vec<Value>,
}

impl Sequence {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if there are no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an element
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Borrow all elements
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Iterate over elements
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Consume into the element vector
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    /// One past the largest index a sequence can address.
    pub const MAX_LEN: usize = isize::MAX as usize / std::mem::size_of::<Value>();

    /// Mutable access to an element, growing the sequence with `Nothing`
    /// so that `index` exists.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`Sequence::MAX_LEN`].
    pub fn entry_mut(&mut self, index: usize) -> &mut Value {
        if index >= self.items.len() {
            self.items.resize(index + 1, Value::Nothing);
        }
        &mut self.items[index]
    }

    /// Mutable access to an existing element
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    /// Append at the end
    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    /// Insert at the front
    pub fn unshift(&mut self, value: Value) {
        self.items.insert(0, value);
    }

    /// Remove the last element
    pub fn pop(&mut self) -> Option<Value> {
        self.items.pop()
    }

    /// Remove the first element
    pub fn shift(&mut self) -> Option<Value> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    /// Take an element out, leaving `Nothing` behind. Taking the last
    /// element shrinks the sequence.
    pub fn take_entry(&mut self, index: usize) -> Option<Value> {
        if index >= self.items.len() {
            return None;
        }
        if index + 1 == self.items.len() {
            return self.items.pop();
        }
        Some(std::mem::take(&mut self.items[index]))
    }

    /// Append every element of `other`
    pub fn extend(&mut self, other: impl IntoIterator<Item = Value>) {
        self.items.extend(other);
    }

    /// Remove a range and insert `replacement` in its place.
    ///
    /// Returns the removed elements.
    pub fn splice(
        &mut self,
        offset: i64,
        length: Option<i64>,
        replacement: Vec<Value>,
    ) -> Vec<Value> {
        let (start, end) = splice_bounds(self.items.len(), offset, length);
        self.items.splice(start..end, replacement).collect()
    }
}

impl From<Vec<Value>> for Sequence {
    fn from(items: Vec<Value>) -> Self {
        Self { items }
    }
}

impl FromIterator<Value> for Sequence {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// An insertion-ordered map from string keys to values.
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: IndexMap<String, Value>,
}

impl Map {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// True if the key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Mutable access to a key's value, inserting `Nothing` if absent
    pub fn entry_mut(&mut self, key: &str) -> &mut Value {
        self.entries.entry(key.to_string()).or_default()
    }

    /// Insert, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Iterate over keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consume into owned entries
    pub fn into_entries(self) -> impl Iterator<Item = (String, Value)> {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A closure: a named callable together with the values it captured.
///
/// The body lives with the evaluator; the value core only tracks what the
/// closure keeps alive.
#[derive(Debug, Clone)]
pub struct Closure {
    /// Function name (or "<anonymous>")
    pub name: String,

    /// Captured values, in capture order
    pub captures: Vec<Value>,
}

impl Closure {
    /// Create a closure with no captures
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            captures: Vec::new(),
        }
    }

    /// Add a captured value (builder pattern)
    pub fn capture(mut self, value: Value) -> Self {
        self.captures.push(value);
        self
    }
}

/// Resolve a splice offset/length pair against a container of `len` items.
///
/// A negative offset counts from the end; a missing length runs to the end;
/// a negative length stops that many items before the end.
fn splice_bounds(len: usize, offset: i64, length: Option<i64>) -> (usize, usize) {
    let len_i = len as i64;
    let start = if offset < 0 {
        (len_i + offset).max(0)
    } else {
        offset.min(len_i)
    };
    let end = match length {
        None => len_i,
        Some(n) if n < 0 => (len_i + n).max(start),
        Some(n) => start.saturating_add(n).min(len_i),
    };
    (start as usize, end as usize)
}

/// Parse the leading integer of a string the way `strtoll` does:
/// optional whitespace and sign, then digits; saturates on overflow.
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut acc: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        acc = match acc.checked_mul(10).and_then(|a| {
            if negative {
                a.checked_sub(d)
            } else {
                a.checked_add(d)
            }
        }) {
            Some(a) => a,
            None => return if negative { i64::MIN } else { i64::MAX },
        };
    }
    acc
}

/// Parse the leading float of a string: sign, digits, fraction, exponent.
fn leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut saw_digits = end > int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || saw_digits {
            saw_digits = true;
            end = frac_end;
        }
    }
    if !saw_digits {
        return 0.0;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-') | Some(b'+')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}
