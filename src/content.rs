// Copyright 2020 The Jujutsu Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The opaque content carrier stored at each path of a [`crate::content_area::ContentArea`].
//!
//! A [`Content`] is deliberately thin: the kernel never interprets the bytes
//! it carries, it only compares them for equality and threads them through
//! the [`ByteArrayIndex`](crate::byte_array_index::ByteArrayIndex). Building a
//! `Content` from raw bytes is an external collaborator's job, performed by a
//! [`ContentFactory`] supplied by the host.

use std::rc::Rc;

/// The character set used to decode a [`ContentKind::String`] or
/// [`ContentKind::EncodedString`] entry at construction time. Equality of
/// `Content` is always byte equality, regardless of charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// UTF-8, the default for all string content.
    #[default]
    Utf8,
    /// A named charset other than UTF-8, used only by the encoded-string
    /// content-area variant.
    Other(&'static str),
}

/// The polymorphic "kind" tag carried alongside a [`Content`]'s bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Opaque binary content; `toString` (via [`Content::repr`]) is not a
    /// quoted string.
    Bytes,
    /// UTF-8 text content.
    String,
    /// Text content in a caller-specified, non-default charset.
    EncodedString(Charset),
}

/// An opaque `{bytes, kind}` pair. Equality is byte equality; the `kind` is
/// carried only for rendering (see [`Content::repr`]) and for reconstruction
/// via a [`ContentFactory`] on checkout.
#[derive(Debug, Clone)]
pub struct Content {
    bytes: Rc<[u8]>,
    kind: ContentKind,
}

impl Content {
    /// Wraps raw bytes as opaque binary content.
    pub fn bytes(bytes: impl Into<Rc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            kind: ContentKind::Bytes,
        }
    }

    /// Wraps a UTF-8 string as string content.
    pub fn string(value: impl AsRef<str>) -> Self {
        Self {
            bytes: Rc::from(value.as_ref().as_bytes()),
            kind: ContentKind::String,
        }
    }

    /// Wraps a string as encoded-string content tagged with `charset`.
    ///
    /// The charset is recorded only for round-tripping via a
    /// [`ContentFactory`]; bytes are still stored as given.
    pub fn encoded_string(value: impl AsRef<str>, charset: Charset) -> Self {
        Self {
            bytes: Rc::from(value.as_ref().as_bytes()),
            kind: ContentKind::EncodedString(charset),
        }
    }

    /// Wraps already-interned bytes with an explicit kind, used when
    /// reconstructing content from a commit snapshot.
    pub fn from_parts(bytes: Rc<[u8]>, kind: ContentKind) -> Self {
        Self { bytes, kind }
    }

    /// Borrows the underlying byte sequence.
    pub fn as_byte_array(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns a cheaply-cloneable handle to the underlying bytes, suitable
    /// for passing through a [`ByteArrayIndex`](crate::byte_array_index::ByteArrayIndex).
    pub fn byte_array_handle(&self) -> Rc<[u8]> {
        self.bytes.clone()
    }

    /// The content kind tag.
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Renders this content the way [`crate::content_area::ContentArea::as_list_string`]
    /// does: `'value'` for string-like content (valid UTF-8), otherwise a
    /// debug rendering of the raw bytes.
    pub fn repr(&self) -> String {
        match self.kind {
            ContentKind::String | ContentKind::EncodedString(_) => {
                match std::str::from_utf8(&self.bytes) {
                    Ok(s) => format!("'{s}'"),
                    Err(_) => format!("{:?}", &*self.bytes),
                }
            }
            ContentKind::Bytes => format!("{:?}", &*self.bytes),
        }
    }
}

impl PartialEq for Content {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Content {}

/// Re-wraps raw bytes (as produced by a checkout) back into a [`Content`] of
/// the appropriate kind. Supplied by the host; the kernel never constructs
/// content on its own initiative.
pub trait ContentFactory {
    /// Builds a `Content` for `bytes` tagged with `kind`.
    fn make(&self, bytes: Rc<[u8]>, kind: ContentKind) -> Content;
}

/// The default [`ContentFactory`]: reconstructs content exactly as
/// [`Content::from_parts`] would, preserving whatever kind was recorded.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultContentFactory;

impl ContentFactory for DefaultContentFactory {
    fn make(&self, bytes: Rc<[u8]>, kind: ContentKind) -> Content {
        Content::from_parts(bytes, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_byte_equality_regardless_of_kind() {
        let a = Content::bytes(b"hi".to_vec());
        let b = Content::string("hi");
        assert_eq!(a, b);
    }

    #[test]
    fn repr_quotes_string_content() {
        assert_eq!(Content::string("abc").repr(), "'abc'");
    }

    #[test]
    fn repr_debug_formats_bytes_content() {
        assert_eq!(Content::bytes(vec![1, 2, 3]).repr(), "[1, 2, 3]");
    }

    #[test]
    fn default_factory_round_trips_kind() {
        let c = Content::string("x");
        let rebuilt = DefaultContentFactory.make(c.byte_array_handle(), c.kind());
        assert_eq!(c, rebuilt);
        assert_eq!(rebuilt.repr(), "'x'");
    }
}
