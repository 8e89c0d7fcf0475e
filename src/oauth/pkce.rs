//! Usage: PKCE verifier/challenge and CSRF state generation for the authorization code flow.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub(crate) struct PkcePair {
    pub(crate) code_verifier: String,
    pub(crate) code_challenge: String,
}

fn random_urlsafe(len: usize) -> String {
    let mut random = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut random);
    URL_SAFE_NO_PAD.encode(random)
}

pub(crate) fn generate_pkce_pair() -> PkcePair {
    let code_verifier = random_urlsafe(VERIFIER_BYTES);
    let code_challenge = code_challenge_s256(&code_verifier);

    PkcePair {
        code_verifier,
        code_challenge,
    }
}

pub(crate) fn generate_state() -> String {
    random_urlsafe(STATE_BYTES)
}

pub(crate) fn code_challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
