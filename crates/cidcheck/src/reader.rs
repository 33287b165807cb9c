//! Async CAR block reader over a probe response body.
//!
//! Pull-based and single-pass: blocks are decoded as chunks arrive, and
//! nothing is read ahead of the block being asked for. Restarting means
//! fetching the source again.

use cidcheck_core::{Block, CarDecoder, CarHeader, CoreError};
use cidcheck_probe::Body;
use futures::StreamExt;

use crate::error::{CheckError, Result};

/// Reads [`Block`]s from a streamed CAR body.
pub struct CarBlockReader {
    body: Body,
    decoder: CarDecoder,
    header: CarHeader,
    done: bool,
}

impl CarBlockReader {
    /// Read until the CAR header is decoded.
    ///
    /// Fails if the body ends, errors, or carries a malformed header before
    /// a valid header is seen.
    pub async fn open(mut body: Body) -> Result<Self> {
        let mut decoder = CarDecoder::new();

        loop {
            if let Some(header) = decoder.decode_header()? {
                let header = header.clone();
                return Ok(Self {
                    body,
                    decoder,
                    header,
                    done: false,
                });
            }

            match body.next().await {
                Some(chunk) => decoder.push(&chunk?),
                None => {
                    let err = decoder.finish().err().unwrap_or_else(|| {
                        CoreError::ContainerParse("stream ended before CAR header".into())
                    });
                    return Err(err.into());
                }
            }
        }
    }

    pub fn header(&self) -> &CarHeader {
        &self.header
    }

    /// The next block, an error, or `None` at end-of-stream.
    ///
    /// After an error every further call returns `None`.
    pub async fn next_block(&mut self) -> Option<Result<Block>> {
        if self.done {
            return None;
        }

        loop {
            match self.decoder.decode_block() {
                Ok(Some(block)) => return Some(Ok(block)),
                Ok(None) => {}
                Err(e) => return self.stop(e.into()),
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk),
                Some(Err(e)) => return self.stop(e.into()),
                None => {
                    self.done = true;
                    return self.decoder.finish().err().map(|e| Err(e.into()));
                }
            }
        }
    }

    fn stop(&mut self, err: CheckError) -> Option<Result<Block>> {
        self.done = true;
        Some(Err(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use cidcheck_core::car::{encode_frame, encode_header};
    use cidcheck_core::registry::codes;
    use cidcheck_core::{ContentIdentifier, HashFunction};
    use cidcheck_probe::ProbeError;

    fn raw_cid(data: &[u8]) -> ContentIdentifier {
        let digest = HashFunction::Sha2_256.digest(data);
        ContentIdentifier::new_v1(codes::RAW, codes::SHA2_256, &digest).unwrap()
    }

    fn body(bytes: Vec<u8>, chunk: usize) -> Body {
        let chunks: Vec<_> = bytes
            .chunks(chunk)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        futures::stream::iter(chunks).boxed()
    }

    fn car(blocks: &[&[u8]]) -> Vec<u8> {
        let root = raw_cid(blocks[0]);
        let mut out = encode_header(&[root]);
        for data in blocks {
            out.extend(encode_frame(&raw_cid(data), data));
        }
        out
    }

    #[tokio::test]
    async fn test_reads_blocks_across_chunk_boundaries() {
        for chunk in [1, 3, 7, 1024] {
            let mut reader = CarBlockReader::open(body(car(&[b"one", b"two"]), chunk))
                .await
                .unwrap();
            assert_eq!(reader.header().roots, vec![raw_cid(b"one")]);

            let first = reader.next_block().await.unwrap().unwrap();
            assert_eq!(&first.data[..], b"one");
            let second = reader.next_block().await.unwrap().unwrap();
            assert_eq!(second.cid, raw_cid(b"two"));
            assert!(reader.next_block().await.is_none());
        }
    }

    #[tokio::test]
    async fn test_empty_body_fails_open() {
        let err = CarBlockReader::open(body(Vec::new(), 1)).await.err().unwrap();
        assert!(matches!(err, CheckError::Core(CoreError::ContainerParse(_))));
    }

    #[tokio::test]
    async fn test_garbage_header_fails_open() {
        let err = CarBlockReader::open(body(vec![0x05, 1, 2, 3, 4, 5], 2))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CheckError::Core(CoreError::ContainerParse(_))));
    }

    #[tokio::test]
    async fn test_truncated_frame_then_none() {
        let mut bytes = car(&[b"block"]);
        bytes.truncate(bytes.len() - 2);

        let mut reader = CarBlockReader::open(body(bytes, 4)).await.unwrap();
        let err = reader.next_block().await.unwrap().unwrap_err();
        assert!(matches!(err, CheckError::Core(CoreError::ContainerParse(_))));
        assert!(reader.next_block().await.is_none());
    }

    #[tokio::test]
    async fn test_body_error_surfaces() {
        let mut chunks: Vec<std::result::Result<Bytes, ProbeError>> =
            vec![Ok(Bytes::from(encode_header(&[raw_cid(b"x")])))];
        chunks.push(Err(ProbeError::Body("reset".into())));

        let mut reader = CarBlockReader::open(futures::stream::iter(chunks).boxed())
            .await
            .unwrap();
        let err = reader.next_block().await.unwrap().unwrap_err();
        assert!(matches!(err, CheckError::Probe(ProbeError::Body(_))));
        assert!(reader.next_block().await.is_none());
    }
}
