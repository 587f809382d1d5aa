//! Shared lopdf helpers used by the XFA extractor.

use lopdf::{Dictionary, Document, Object};

/// Follow `value` if it is an indirect reference, otherwise return it as is.
pub fn resolve<'a>(document: &'a Document, value: &'a Object) -> lopdf::Result<&'a Object> {
    match value.as_reference() {
        Ok(id) => document.get_object(id),
        Err(_) => Ok(value),
    }
}

/// Look up `key` in `dict` and resolve it through the document.
///
/// Returns `None` if the key is absent or the reference dangles.
pub fn get_resolved<'a>(
    document: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let value = dict.get(key).ok()?;
    resolve(document, value).ok()
}

/// Read a PDF string or name object as text.
///
/// XFA arrays label their packets with strings, but some producers use names.
pub fn object_text(object: &Object) -> Option<String> {
    object
        .as_str()
        .or_else(|_| object.as_name())
        .ok()
        .map(|s| String::from_utf8_lossy(s).into_owned())
}

/// Return the decoded content of a stream, falling back to the raw bytes when
/// the stream has no filter or the filter cannot be applied.
pub fn stream_bytes(stream: &lopdf::Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}
