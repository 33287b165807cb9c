//! CARv1 decoding.
//!
//! A CAR stream is a header followed by frames:
//!
//! ```text
//! varint(len) || dag-cbor { "roots": [tag42(cid)...], "version": 1 }
//! varint(len) || cid || block bytes
//! varint(len) || cid || block bytes
//! ...
//! ```
//!
//! [`CarDecoder`] does no I/O. Callers push bytes in whatever chunks the
//! transport delivers and pull the header, then blocks, back out. Once the
//! transport reports end-of-stream, [`CarDecoder::finish`] checks that no
//! partial frame is left behind.

use bytes::{Buf, Bytes, BytesMut};
use ciborium::value::Value;

use crate::block::Block;
use crate::error::CoreError;
use crate::identifier::ContentIdentifier;

/// The only CAR version this decoder accepts.
pub const CAR_VERSION: u64 = 1;

/// CBOR tag for an IPLD link.
const CID_TAG: u64 = 42;

/// Decoder limits.
pub mod limits {
    /// Max encoded header length.
    pub const MAX_HEADER_LEN: usize = 1 << 20;
    /// Max length of one (cid, block) frame.
    pub const MAX_FRAME_LEN: usize = 8 << 20;
    /// Max bytes in a length prefix.
    pub const MAX_VARINT_LEN: usize = 10;
}

/// The decoded CAR header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarHeader {
    pub version: u64,
    pub roots: Vec<ContentIdentifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Header,
    Blocks,
    Failed,
}

/// Push-based CARv1 decoder.
#[derive(Debug)]
pub struct CarDecoder {
    buf: BytesMut,
    state: DecoderState,
    header: Option<CarHeader>,
}

impl CarDecoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
            state: DecoderState::Header,
            header: None,
        }
    }

    /// Append bytes received from the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// The header, once decoded.
    pub fn header(&self) -> Option<&CarHeader> {
        self.header.as_ref()
    }

    /// Bytes buffered but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Try to decode the header.
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    pub fn decode_header(&mut self) -> Result<Option<&CarHeader>, CoreError> {
        match self.state {
            DecoderState::Blocks => return Ok(self.header.as_ref()),
            DecoderState::Failed => return Err(CoreError::container("decoder already failed")),
            DecoderState::Header => {}
        }

        let frame = match self.take_frame(limits::MAX_HEADER_LEN, "header") {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(None),
            Err(e) => return Err(self.fail(e)),
        };

        let header = match parse_header(&frame) {
            Ok(header) => header,
            Err(e) => return Err(self.fail(e)),
        };

        self.state = DecoderState::Blocks;
        self.header = Some(header);
        Ok(self.header.as_ref())
    }

    /// Try to decode the next block.
    ///
    /// Returns `Ok(None)` when more bytes are needed (or the stream is done;
    /// call [`CarDecoder::finish`] to tell the two apart).
    pub fn decode_block(&mut self) -> Result<Option<Block>, CoreError> {
        match self.state {
            DecoderState::Header => {
                return Err(self.fail(CoreError::container("block requested before header")))
            }
            DecoderState::Failed => return Err(CoreError::container("decoder already failed")),
            DecoderState::Blocks => {}
        }

        let frame = match self.take_frame(limits::MAX_FRAME_LEN, "frame") {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(None),
            Err(e) => return Err(self.fail(e)),
        };

        match parse_frame(frame) {
            Ok(block) => Ok(Some(block)),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Declare end-of-stream.
    ///
    /// Fails if the header never arrived or a frame was cut short.
    pub fn finish(&mut self) -> Result<(), CoreError> {
        match self.state {
            DecoderState::Failed => Err(CoreError::container("decoder already failed")),
            DecoderState::Header if self.buf.is_empty() => {
                Err(self.fail(CoreError::container("empty stream: missing CAR header")))
            }
            DecoderState::Header => {
                Err(self.fail(CoreError::container("stream ended inside CAR header")))
            }
            DecoderState::Blocks if !self.buf.is_empty() => Err(self.fail(CoreError::container(
                format!("truncated frame: {} trailing bytes", self.buf.len()),
            ))),
            DecoderState::Blocks => Ok(()),
        }
    }

    fn fail(&mut self, err: CoreError) -> CoreError {
        self.state = DecoderState::Failed;
        self.buf.clear();
        err
    }

    /// Split one length-prefixed frame off the buffer, if it is complete.
    fn take_frame(&mut self, max: usize, what: &str) -> Result<Option<Bytes>, CoreError> {
        let Some((len, prefix)) = read_varint(&self.buf)? else {
            return Ok(None);
        };

        let len = usize::try_from(len)
            .ok()
            .filter(|&len| len <= max)
            .ok_or_else(|| {
                CoreError::container(format!("{what} length {len} exceeds limit of {max} bytes"))
            })?;

        if len == 0 {
            return Err(CoreError::container(format!("empty {what}")));
        }
        if self.buf.len() < prefix + len {
            return Ok(None);
        }

        self.buf.advance(prefix);
        Ok(Some(self.buf.split_to(len).freeze()))
    }
}

impl Default for CarDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an unsigned LEB128 varint from the front of `buf`.
///
/// Returns `Ok(None)` if `buf` ends before the varint does.
pub fn read_varint(buf: &[u8]) -> Result<Option<(u64, usize)>, CoreError> {
    let mut value: u64 = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if i >= limits::MAX_VARINT_LEN {
            break;
        }
        let bits = u64::from(byte & 0x7f);
        if i == limits::MAX_VARINT_LEN - 1 && bits > 1 {
            return Err(CoreError::container("varint overflows u64"));
        }
        value |= bits << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }

    if buf.len() >= limits::MAX_VARINT_LEN {
        Err(CoreError::container("varint longer than 10 bytes"))
    } else {
        Ok(None)
    }
}

/// Encode an unsigned LEB128 varint.
pub fn write_varint(buf: &mut Vec<u8>, mut n: u64) {
    while n >= 0x80 {
        buf.push((n as u8) | 0x80);
        n >>= 7;
    }
    buf.push(n as u8);
}

fn parse_header(bytes: &[u8]) -> Result<CarHeader, CoreError> {
    let value: Value = ciborium::from_reader(bytes)
        .map_err(|e| CoreError::container(format!("invalid header CBOR: {e}")))?;

    let Value::Map(entries) = value else {
        return Err(CoreError::container("header is not a map"));
    };

    let mut version = None;
    let mut roots = None;

    for (key, value) in entries {
        match (key, value) {
            (Value::Text(key), Value::Integer(v)) if key == "version" => {
                let v: i128 = v.into();
                version = u64::try_from(v).ok();
            }
            (Value::Text(key), Value::Array(items)) if key == "roots" => {
                roots = Some(
                    items
                        .iter()
                        .map(parse_link)
                        .collect::<Result<Vec<_>, _>>()?,
                );
            }
            _ => {}
        }
    }

    let version = version.ok_or_else(|| CoreError::container("header missing version"))?;
    if version != CAR_VERSION {
        return Err(CoreError::container(format!(
            "unsupported CAR version {version}"
        )));
    }
    let roots = roots.ok_or_else(|| CoreError::container("header missing roots"))?;

    Ok(CarHeader { version, roots })
}

/// Decode a tag-42 link. The byte string carries a leading 0x00
/// (identity multibase) before the binary CID.
fn parse_link(value: &Value) -> Result<ContentIdentifier, CoreError> {
    let Value::Tag(CID_TAG, inner) = value else {
        return Err(CoreError::container("root is not a CID link"));
    };
    let Value::Bytes(bytes) = &**inner else {
        return Err(CoreError::container("CID link is not a byte string"));
    };
    match bytes.split_first() {
        Some((0x00, cid_bytes)) => {
            let (cid, used) = ContentIdentifier::read_bytes(cid_bytes)?;
            if used != cid_bytes.len() {
                return Err(CoreError::container("trailing bytes after root CID"));
            }
            Ok(cid)
        }
        _ => Err(CoreError::container("CID link missing multibase prefix")),
    }
}

fn parse_frame(frame: Bytes) -> Result<Block, CoreError> {
    let (cid, used) = ContentIdentifier::read_bytes(&frame)?;
    Ok(Block::new(cid, frame.slice(used..)))
}

/// Encode a CARv1 header. Used to build fixtures; the checker never
/// produces CAR streams itself.
pub fn encode_header(roots: &[ContentIdentifier]) -> Vec<u8> {
    let links = roots
        .iter()
        .map(|root| {
            let mut bytes = vec![0x00];
            bytes.extend_from_slice(&root.to_bytes());
            Value::Tag(CID_TAG, Box::new(Value::Bytes(bytes)))
        })
        .collect();

    let header = Value::Map(vec![
        (Value::Text("roots".into()), Value::Array(links)),
        (
            Value::Text("version".into()),
            Value::Integer(CAR_VERSION.into()),
        ),
    ]);

    let mut cbor = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = ciborium::into_writer(&header, &mut cbor);

    let mut out = Vec::with_capacity(cbor.len() + 2);
    write_varint(&mut out, cbor.len() as u64);
    out.extend_from_slice(&cbor);
    out
}

/// Encode one (cid, bytes) frame.
pub fn encode_frame(cid: &ContentIdentifier, data: &[u8]) -> Vec<u8> {
    let cid_bytes = cid.to_bytes();
    let mut out = Vec::with_capacity(cid_bytes.len() + data.len() + 4);
    write_varint(&mut out, (cid_bytes.len() + data.len()) as u64);
    out.extend_from_slice(&cid_bytes);
    out.extend_from_slice(data);
    out
}

/// Synchronous iterator over the blocks of a complete CAR buffer.
pub struct CarBlocks {
    decoder: CarDecoder,
    done: bool,
}

impl CarBlocks {
    /// Decode the header of `bytes` and prepare to iterate its blocks.
    pub fn new(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut decoder = CarDecoder::new();
        decoder.push(bytes);
        if decoder.decode_header()?.is_none() {
            decoder.finish()?;
        }
        Ok(Self {
            decoder,
            done: false,
        })
    }

    pub fn header(&self) -> Option<&CarHeader> {
        self.decoder.header()
    }
}

impl Iterator for CarBlocks {
    type Item = Result<Block, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decoder.decode_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                self.decoder.finish().err().map(Err)
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
