//! Golden CID vectors.
//!
//! Each vector pins the decoded fields of a well-known identifier, so any
//! change in parsing or canonical formatting shows up as a test failure.

use cidcheck_core::registry::codes;
use cidcheck_core::ContentIdentifier;

/// A golden CID vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Input text.
    pub input: &'static str,
    /// Canonical string form after parsing.
    pub canonical: &'static str,
    pub version: u64,
    pub codec: u64,
    pub multihash_code: u64,
    /// Expected digest (hex).
    pub digest: &'static str,
    /// Payload the digest was computed over, when known.
    pub payload: Option<&'static [u8]>,
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "raw sha2-256 of \"hello world\"",
            input: "bafkreifzjut3te2nhyekklss27nh3k72ysco7y32koao5eei66wof36n5e",
            canonical: "bafkreifzjut3te2nhyekklss27nh3k72ysco7y32koao5eei66wof36n5e",
            version: 1,
            codec: codes::RAW,
            multihash_code: codes::SHA2_256,
            digest: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
            payload: Some(b"hello world"),
        },
        GoldenVector {
            name: "raw sha2-256 of empty payload",
            input: "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku",
            canonical: "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku",
            version: 1,
            codec: codes::RAW,
            multihash_code: codes::SHA2_256,
            digest: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            payload: Some(b""),
        },
        GoldenVector {
            name: "raw blake2b-256 of \"hello world\"",
            input: "bafk2bzaceaswza5ss4iu2ia3galz6pyo6dfm5f4dmiw2lf2de22dmf4k533ba",
            canonical: "bafk2bzaceaswza5ss4iu2ia3galz6pyo6dfm5f4dmiw2lf2de22dmf4k533ba",
            version: 1,
            codec: codes::RAW,
            multihash_code: codes::BLAKE2B_256,
            digest: "256c83b297114d201b30179f3f0ef0cace9783622da5974326b436178aeef610",
            payload: Some(b"hello world"),
        },
        GoldenVector {
            name: "dag-cbor sha2-256 of {\"a\": 1}",
            input: "bafyreihltcnuuyqp2jm24aqydpnlj7b6w3ogwrplomrjtg5rifv44mmjey",
            canonical: "bafyreihltcnuuyqp2jm24aqydpnlj7b6w3ogwrplomrjtg5rifv44mmjey",
            version: 1,
            codec: codes::DAG_CBOR,
            multihash_code: codes::SHA2_256,
            digest: "eb989b4a620fd259ae02181bdab4fc3eb6dc6b45eb7322999bb1416bce318926",
            payload: Some(&[0xa1, 0x61, 0x61, 0x01]),
        },
        GoldenVector {
            name: "CIDv0 empty unixfs directory",
            input: "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn",
            canonical: "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn",
            version: 0,
            codec: codes::DAG_PB,
            multihash_code: codes::SHA2_256,
            digest: "59948439065f29619ef41280cbb932be52c56d99c5966b65e0111239f098bbef",
            payload: None,
        },
        GoldenVector {
            name: "CIDv1 of the same directory with a path",
            input: "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354/index.html",
            canonical: "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354/index.html",
            version: 1,
            codec: codes::DAG_PB,
            multihash_code: codes::SHA2_256,
            digest: "59948439065f29619ef41280cbb932be52c56d99c5966b65e0111239f098bbef",
            payload: None,
        },
    ]
}

/// Check one vector, returning a description of the first mismatch.
pub fn check_vector(vector: &GoldenVector) -> Result<ContentIdentifier, String> {
    let cid = ContentIdentifier::parse(vector.input).map_err(|e| e.to_string())?;

    let checks = [
        ("canonical", cid.to_string(), vector.canonical.to_string()),
        ("version", cid.version().to_string(), vector.version.to_string()),
        ("codec", cid.codec().to_string(), vector.codec.to_string()),
        (
            "multihash",
            cid.multihash_code().to_string(),
            vector.multihash_code.to_string(),
        ),
        ("digest", hex::encode(cid.digest()), vector.digest.to_string()),
    ];
    for (field, actual, expected) in checks {
        if actual != expected {
            return Err(format!(
                "{}: {field} is {actual}, expected {expected}",
                vector.name
            ));
        }
    }
    Ok(cid)
}

/// Verify all golden vectors, returning failures.
pub fn verify_all_vectors() -> Vec<String> {
    all_vectors()
        .iter()
        .filter_map(|vector| check_vector(vector).err())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cidcheck_core::Verifier;

    #[test]
    fn test_all_vectors_pass() {
        let failures = verify_all_vectors();
        assert!(failures.is_empty(), "golden vector failures: {failures:#?}");
    }

    #[test]
    fn test_payload_vectors_verify() {
        let verifier = Verifier::default();
        for vector in all_vectors() {
            let Some(payload) = vector.payload else {
                continue;
            };
            let cid = check_vector(&vector).unwrap();
            verifier
                .validate_block(&cid, payload)
                .unwrap_or_else(|e| panic!("{}: {e}", vector.name));
        }
    }

    #[test]
    fn test_v0_and_v1_compare_equal() {
        let vectors = all_vectors();
        let v0 = check_vector(&vectors[4]).unwrap();
        let v1 = check_vector(&vectors[5]).unwrap();
        assert_eq!(v0, v1.root());
    }
}
