//! Case-insensitive header storage.
//!
//! Headers live in an ordered list rather than a map: lookups walk the list
//! comparing names ASCII case-insensitively, while each entry remembers the
//! spelling it was registered with. Replacing a header adopts the new
//! spelling and moves the entry to the end of the list; appending keeps the
//! registered spelling and position.

use super::MessageError;

/// One or more raw values handed to a header mutator.
///
/// Accepts a single string or a list of strings through `From`, so call
/// sites can pass `"text/html"` and `["no-cache", "no-store"]` alike.
#[derive(Clone, Debug)]
pub struct HeaderValues(Vec<String>);

impl HeaderValues {
    fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for HeaderValues {
    fn from(value: &str) -> Self {
        Self(vec![value.to_owned()])
    }
}

impl From<String> for HeaderValues {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for HeaderValues {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<Vec<&str>> for HeaderValues {
    fn from(values: Vec<&str>) -> Self {
        Self(values.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for HeaderValues {
    fn from(values: &[&str]) -> Self {
        Self(values.iter().map(|v| (*v).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderValues {
    fn from(values: [&str; N]) -> Self {
        Self(values.into_iter().map(str::to_owned).collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct HeaderEntry {
    /// The spelling the header was registered with.
    name: String,
    values: Vec<String>,
}

/// Ordered collection of headers with case-insensitive names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderBag {
    entries: Vec<HeaderEntry>,
}

impl HeaderBag {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The spelling the header was registered with, if present.
    pub fn registered_name(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.entries[index].name.as_str())
    }

    /// All values of the header, or an empty slice when absent.
    pub fn values(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(index) => &self.entries[index].values,
            None => &[],
        }
    }

    /// All values of the header joined with `,`, empty when absent.
    ///
    /// The join is lossy for values that contain a literal comma.
    pub fn line(&self, name: &str) -> String {
        self.values(name).join(",")
    }

    /// Iterates over the headers in insertion order, registered spelling
    /// first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Replaces the header, validating the name and every value.
    ///
    /// The entry adopts the spelling of `name` and moves to the end of the
    /// list. Any previously registered spelling is forgotten.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidHeaderName`], [`MessageError::InvalidHeaderValue`]
    /// and [`MessageError::EmptyHeaderValues`].
    pub fn insert<V: Into<HeaderValues>>(&mut self, name: &str, values: V) -> Result<(), MessageError> {
        let values = normalize(name, values.into())?;
        self.remove(name);
        self.entries.push(HeaderEntry { name: name.to_owned(), values });
        Ok(())
    }

    /// Appends values to the header, creating it when absent.
    ///
    /// An existing entry keeps its registered spelling and position.
    ///
    /// # Errors
    ///
    /// Same as [`HeaderBag::insert`].
    pub fn append<V: Into<HeaderValues>>(&mut self, name: &str, values: V) -> Result<(), MessageError> {
        let values = normalize(name, values.into())?;
        match self.position(name) {
            Some(index) => self.entries[index].values.extend(values),
            None => self.entries.push(HeaderEntry { name: name.to_owned(), values }),
        }
        Ok(())
    }

    /// Removes the header; returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replaces the header with a single value and moves it to the front of
    /// the list.
    ///
    /// An existing entry keeps its registered spelling; otherwise
    /// `default_name` is used. The value is stored as given, callers are
    /// expected to supply one that is already valid.
    pub fn promote_first(&mut self, default_name: &str, value: String) {
        let name = match self.position(default_name) {
            Some(index) => self.entries.remove(index).name,
            None => default_name.to_owned(),
        };
        self.entries.insert(0, HeaderEntry { name, values: vec![value] });
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name.eq_ignore_ascii_case(name))
    }
}

/// Validates the header name and every value, returning the values with
/// surrounding spaces and tabs trimmed.
fn normalize(name: &str, values: HeaderValues) -> Result<Vec<String>, MessageError> {
    validate_name(name)?;

    let values = values.into_vec();
    if values.is_empty() {
        return Err(MessageError::empty_header_values(name));
    }

    values
        .into_iter()
        .map(|value| {
            validate_value(name, &value)?;
            Ok(value.trim_matches([' ', '\t']).to_owned())
        })
        .collect()
}

/// A header name is a non-empty RFC 7230 token.
fn validate_name(name: &str) -> Result<(), MessageError> {
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        return Err(MessageError::invalid_header_name(name));
    }
    Ok(())
}

const fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
                | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}

/// A header value may contain visible ASCII, spaces, tabs and opaque bytes
/// above 0x7F. Control bytes, CR and LF included, are rejected.
fn validate_value(name: &str, value: &str) -> Result<(), MessageError> {
    let valid = value
        .bytes()
        .all(|byte| matches!(byte, b' ' | b'\t' | 0x21..=0x7E | 0x80..));
    if !valid {
        return Err(MessageError::invalid_header_value(name, value));
    }
    Ok(())
}
