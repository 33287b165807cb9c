//! Test fixtures and helpers.
//!
//! Builders for blocks, CAR bodies and scripted gateways, shared by the
//! integration tests.

use bytes::Bytes;
use cidcheck_core::car::{encode_frame, encode_header};
use cidcheck_core::registry::codes;
use cidcheck_core::{Block, ContentIdentifier, HashFunction};
use cidcheck_probe::{MemoryGateway, ScriptedResponse};

/// The gateways a default run probes, in order.
pub const SOURCES: [&str; 3] = ["ipfs.io", "bifrost-gateway.ipfs.io", "strn.pl"];

/// CIDv1 for `data` under `codec`, hashed with `hash`.
pub fn cid_for(codec: u64, hash: HashFunction, data: &[u8]) -> ContentIdentifier {
    ContentIdentifier::new_v1(codec, hash.code(), &hash.digest(data))
        .unwrap_or_else(|e| panic!("fixture CID: {e}"))
}

/// Raw-codec, sha2-256 CID for `data`.
pub fn raw_cid(data: &[u8]) -> ContentIdentifier {
    cid_for(codes::RAW, HashFunction::Sha2_256, data)
}

/// A correctly addressed raw block.
pub fn raw_block(data: &[u8]) -> Block {
    Block::new(raw_cid(data), Bytes::copy_from_slice(data))
}

/// Builder for CARv1 bodies.
///
/// The header roots default to the first block's CID.
#[derive(Debug, Clone, Default)]
pub struct CarFixture {
    roots: Option<Vec<ContentIdentifier>>,
    blocks: Vec<Block>,
}

impl CarFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block as-is, addressed or not.
    pub fn block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Append a correctly addressed raw block.
    pub fn raw(self, data: &[u8]) -> Self {
        self.block(raw_block(data))
    }

    /// Override the header roots.
    pub fn roots(mut self, roots: Vec<ContentIdentifier>) -> Self {
        self.roots = Some(roots);
        self
    }

    /// The CID a test should request: the first block's.
    pub fn root(&self) -> ContentIdentifier {
        match self.blocks.first() {
            Some(block) => block.cid.clone(),
            None => raw_cid(b""),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Total payload bytes.
    pub fn size(&self) -> u64 {
        self.blocks.iter().map(|b| b.len() as u64).sum()
    }

    /// Encode header and frames.
    pub fn to_bytes(&self) -> Vec<u8> {
        let roots = self.roots.clone().unwrap_or_else(|| vec![self.root()]);
        let mut out = encode_header(&roots);
        for block in &self.blocks {
            out.extend(encode_frame(&block.cid, &block.data));
        }
        out
    }
}

/// A gateway where every source in `sources` answers `response` for `cid`.
pub fn uniform_gateway(sources: &[&str], cid: &str, response: ScriptedResponse) -> MemoryGateway {
    sources.iter().fold(MemoryGateway::new(), |gateway, source| {
        gateway.respond(source, cid, response.clone())
    })
}

/// A 200 response carrying `body`, with a cache header.
pub fn hit(body: impl Into<Bytes>) -> ScriptedResponse {
    ScriptedResponse::ok(body).cache("HIT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cidcheck_core::Verifier;
    use cidcheck_probe::{Format, GatewayProbe};

    #[test]
    fn test_car_fixture_validates() {
        let car = CarFixture::new().raw(b"root").raw(b"leaf");
        let summary = Verifier::default()
            .validate_car_bytes(&car.root(), &car.to_bytes())
            .unwrap();
        assert_eq!(summary.size, car.size());
        assert_eq!(summary.block_count, 2);
    }

    #[test]
    fn test_cid_for_other_hashes() {
        let cid = cid_for(codes::DAG_CBOR, HashFunction::Blake3, b"x");
        assert_eq!(cid.codec(), codes::DAG_CBOR);
        assert_eq!(cid.multihash_code(), codes::BLAKE3);
        Verifier::default().validate_block(&cid, b"x").unwrap();
    }

    #[tokio::test]
    async fn test_uniform_gateway() {
        let gateway = uniform_gateway(&SOURCES, "cid", hit("body"));
        for source in SOURCES {
            let response = gateway.fetch(source, "cid", Format::Raw).await.unwrap();
            assert_eq!(response.cache_status.as_deref(), Some("HIT"));
        }
        assert_eq!(gateway.total_probes().await, 3);
    }
}
