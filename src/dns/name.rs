use std::fmt;
use std::str::FromStr;

use super::ParseError;

/// Maximum length of a single label in octets (RFC 1035 2.3.4)
pub const MAX_LABEL_LEN: usize = 63;

/// Maximum length of a name in wire format (RFC 1035 2.3.4)
pub const MAX_NAME_LEN: usize = 255;

/// A domain name in canonical form: lowercase labels, root is the empty sequence.
///
/// Every name entering the crate (from the wire, the command line or a trust anchor)
/// goes through this type, so comparisons never see case or trailing-dot differences.
/// Labels are raw octets; only ASCII letters are folded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    labels: Vec<Vec<u8>>,
}

impl Name {
    /// The root name `.`
    pub fn root() -> Self {
        Self { labels: Vec::new() }
    }

    /// Parse a presentation-format name. A trailing dot is optional.
    ///
    /// `\DDD` and `\X` escapes are understood, so anything `Display` prints parses back.
    pub fn from_ascii(text: &str) -> Result<Self, ParseError> {
        if text.is_empty() || text == "." {
            return Ok(Self::root());
        }
        Self::from_labels(split_presentation(text)?)
    }

    /// Build a name from labels ordered leftmost first.
    ///
    /// A single empty trailing label (the wire root terminator) is tolerated.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut out: Vec<Vec<u8>> = Vec::new();
        let mut wire_len = 1;
        let mut saw_root = false;

        for label in labels {
            let label = label.as_ref();
            if saw_root {
                return Err(ParseError::InvalidLabel);
            }
            if label.is_empty() {
                saw_root = true;
                continue;
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(ParseError::InvalidLabel);
            }
            wire_len += label.len() + 1;
            out.push(label.to_ascii_lowercase());
        }

        if wire_len > MAX_NAME_LEN {
            return Err(ParseError::InvalidLabel);
        }
        Ok(Self { labels: out })
    }

    pub fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn first_label(&self) -> Option<&[u8]> {
        self.labels.first().map(Vec::as_slice)
    }

    /// True if `self` equals `other` or lies below it.
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        if other.labels.len() > self.labels.len() {
            return false;
        }
        let offset = self.labels.len() - other.labels.len();
        self.labels[offset..] == other.labels[..]
    }

    /// The name one label up, or `None` for the root.
    pub fn parent(&self) -> Option<Name> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            labels: self.labels[1..].to_vec(),
        })
    }

    /// Walk one label from `self` toward `target`.
    ///
    /// Returns `None` unless `target` is a strict descendant of `self`.
    pub fn child_toward(&self, target: &Name) -> Option<Name> {
        if !target.is_subdomain_of(self) || target.label_count() == self.label_count() {
            return None;
        }
        let skip = target.label_count() - self.label_count() - 1;
        Some(Self {
            labels: target.labels[skip..].to_vec(),
        })
    }

    /// Prepend a label, e.g. an NSEC3 hash in front of its zone.
    pub fn prepend(&self, label: impl AsRef<[u8]>) -> Result<Name, ParseError> {
        Self::from_labels(
            std::iter::once(label.as_ref()).chain(self.labels.iter().map(Vec::as_slice)),
        )
    }

    /// The last `count` labels of this name.
    pub fn suffix(&self, count: usize) -> Name {
        let start = self.labels.len().saturating_sub(count);
        Self {
            labels: self.labels[start..].to_vec(),
        }
    }

    /// Canonical wire form: uncompressed, lowercase, root-terminated.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_len());
        self.write_wire(&mut out);
        out
    }

    pub fn write_wire(&self, out: &mut Vec<u8>) {
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
    }

    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }
}

/// Split presentation text on unescaped dots, resolving escapes.
fn split_presentation(text: &str) -> Result<Vec<Vec<u8>>, ParseError> {
    let mut labels = Vec::new();
    let mut current = Vec::new();
    let mut bytes = text.bytes();

    while let Some(b) = bytes.next() {
        match b {
            b'.' => labels.push(std::mem::take(&mut current)),
            b'\\' => {
                let first = bytes.next().ok_or(ParseError::InvalidLabel)?;
                if first.is_ascii_digit() {
                    let mut value = u32::from(first - b'0');
                    for _ in 0..2 {
                        let digit = bytes
                            .next()
                            .filter(u8::is_ascii_digit)
                            .ok_or(ParseError::InvalidLabel)?;
                        value = value * 10 + u32::from(digit - b'0');
                    }
                    current.push(u8::try_from(value).map_err(|_| ParseError::InvalidLabel)?);
                } else {
                    current.push(first);
                }
            }
            _ => current.push(b),
        }
    }
    labels.push(current);
    Ok(labels)
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, ".");
        }
        for label in &self.labels {
            for &b in label {
                match b {
                    b'.' | b'\\' => write!(f, "\\{}", b as char)?,
                    0x21..=0x7E => write!(f, "{}", b as char)?,
                    _ => write!(f, "\\{:03}", b)?,
                }
            }
            write!(f, ".")?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ascii(s)
    }
}
