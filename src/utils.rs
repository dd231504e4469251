use crate::error::HookError;
use crate::{RepoConfig, ReposConfig};
use tracing::{self, debug};

// For signature verification
use hex::decode as hex_decode;
use hmac::{Hmac, Mac};
use sha1::Sha1;
type HmacSha1 = Hmac<Sha1>;

/// Verifies a GitHub `X-Hub-Signature` header (`sha1=<hex>`) against the raw body.
///
/// The digest after the `=` delimiter is compared in constant time with the
/// HMAC-SHA1 of `payload` keyed by `secret`.
pub fn verify_github_signature(
    secret: &str,
    payload: &[u8],
    signature_header: &str,
) -> Result<(), HookError> {
    let (algorithm, git_signature) = signature_header
        .split_once('=')
        .ok_or_else(|| HookError::MalformedSignature(signature_header.to_string()))?;
    debug!("Verifying {} signature", algorithm);

    let git_signature_bytes = hex_decode(git_signature).map_err(|_| HookError::SignatureMismatch)?;

    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| HookError::ConfigError(format!("Invalid webhook secret: {}", e)))?;
    mac.update(payload);

    // verify_slice compares in constant time
    mac.verify_slice(&git_signature_bytes)
        .map_err(|_| HookError::SignatureMismatch)
}

/// Key for a repository, optionally qualified by branch.
pub fn repo_key(owner: &str, name: &str, branch: Option<&str>) -> String {
    match branch {
        Some(branch) => format!("{}/{}/branch:{}", owner, name, branch),
        None => format!("{}/{}", owner, name),
    }
}

/// Finds the repository entry for a push, preferring the branch-qualified key.
/// Returns the matched key alongside the entry.
pub fn find_matching_repo<'a>(
    repos: &'a ReposConfig,
    owner: &str,
    name: &str,
    branch: Option<&str>,
) -> Option<(String, &'a RepoConfig)> {
    let branch_match = branch.and_then(|branch| {
        let key = repo_key(owner, name, Some(branch));
        repos.get(&key).map(|repo| (key, repo))
    });

    branch_match.or_else(|| {
        let key = repo_key(owner, name, None);
        repos.get(&key).map(|repo| (key, repo))
    })
}
