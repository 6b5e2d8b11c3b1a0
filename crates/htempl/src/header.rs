/*
 * header.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Splitting a document into its metadata block and template body.
//!
//! A document may start with a YAML block delimited by a `---` line and a
//! `...` line:
//!
//! ```text
//! ---
//! hello: "world"
//! ...
//! {{ hello }}
//! ```
//!
//! The splitter reads the stream line by line and never reads past the
//! first body line, so the body can be handed on as a forward-only reader.

use std::io::{BufRead, Chain, Cursor, Read};

use crate::error::{HtemplError, Result};

const METADATA_START: &[u8] = b"---";
const METADATA_END: &[u8] = b"...";

/// Template body left over after the metadata block.
///
/// Bytes already pulled from the stream while looking for the start marker
/// are replayed before the rest of the stream.
pub type Body<R> = Chain<Cursor<Vec<u8>>, R>;

/// A document split into its two segments.
#[derive(Debug)]
pub struct SplitDocument<R> {
    /// The raw metadata segment, if the document has one.
    ///
    /// Includes the newline preceding the end marker, but neither marker.
    pub metadata: Option<Vec<u8>>,

    /// The template body.
    pub body: Body<R>,
}

/// Split a document stream into metadata segment and template body.
///
/// If the first line is not exactly `---`, the whole stream is the body.
/// Otherwise every line up to the first `...` line is metadata. Running out
/// of input before that line is an [`HtemplError::UnterminatedHeader`].
pub fn split_header<R: BufRead>(source_id: &str, mut reader: R) -> Result<SplitDocument<R>> {
    let mut first = Vec::new();
    reader
        .read_until(b'\n', &mut first)
        .map_err(|e| HtemplError::io(source_id, e))?;

    if !is_marker_line(&first, METADATA_START) {
        return Ok(SplitDocument {
            metadata: None,
            body: Cursor::new(first).chain(reader),
        });
    }

    let mut metadata = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| HtemplError::io(source_id, e))?;
        if read == 0 {
            return Err(HtemplError::UnterminatedHeader {
                source_id: source_id.to_string(),
            });
        }
        if is_marker_line(&line, METADATA_END) {
            break;
        }
        metadata.extend_from_slice(&line);
    }

    Ok(SplitDocument {
        metadata: Some(metadata),
        body: Cursor::new(Vec::new()).chain(reader),
    })
}

/// A line consisting of exactly `marker`, with an optional line ending.
fn is_marker_line(line: &[u8], marker: &[u8]) -> bool {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line == marker
}
