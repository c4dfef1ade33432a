//! AWS Signature Version 4, query-string flavour.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::StorageError;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

pub struct Credentials<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
}

pub struct PresignRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    /// Already URI-encoded, starting with `/`
    pub path: &'a str,
    /// Extra query parameters, unencoded
    pub params: &'a [(&'a str, String)],
    pub expires_secs: u64,
}

fn hmac(key: &[u8], data: &str) -> Result<Vec<u8>, StorageError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| StorageError::Signing(e.to_string()))?;
    mac.update(data.as_bytes());

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn uri_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Encodes each path segment, keeping the separators.
pub fn encode_path(key: &str) -> String {
    key.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

fn signing_key(credentials: &Credentials<'_>, date: &str) -> Result<Vec<u8>, StorageError> {
    let k_date = hmac(
        format!("AWS4{}", credentials.secret_access_key).as_bytes(),
        date,
    )?;
    let k_region = hmac(&k_date, credentials.region)?;
    let k_service = hmac(&k_region, SERVICE)?;

    hmac(&k_service, "aws4_request")
}

/// Returns the signed query string (without the leading `?`).
pub fn presign_query(
    credentials: &Credentials<'_>,
    request: &PresignRequest<'_>,
    now: DateTime<Utc>,
) -> Result<String, StorageError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/{SERVICE}/aws4_request", credentials.region);

    let mut params: Vec<(String, String)> = vec![
        ("X-Amz-Algorithm".to_owned(), ALGORITHM.to_owned()),
        (
            "X-Amz-Credential".to_owned(),
            format!("{}/{scope}", credentials.access_key_id),
        ),
        ("X-Amz-Date".to_owned(), amz_date.clone()),
        ("X-Amz-Expires".to_owned(), request.expires_secs.to_string()),
        ("X-Amz-SignedHeaders".to_owned(), "host".to_owned()),
    ];
    params.extend(
        request
            .params
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone())),
    );

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(name, value)| (uri_encode(name), uri_encode(value)))
        .collect();
    encoded.sort();

    let canonical_query = encoded
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_request = format!(
        "{}\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
        request.method, request.path, canonical_query, request.host
    );

    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let signature = hex::encode(hmac(
        &signing_key(credentials, &date)?,
        &string_to_sign,
    )?);

    Ok(format!("{canonical_query}&X-Amz-Signature={signature}"))
}
