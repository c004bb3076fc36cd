//! Myra API request signature
//!
//! ```text
//! signing_string = md5_hex(body) # METHOD # request_uri # content_type # date
//! date_key       = hex(HMAC-SHA256("MYRA" + secret, date))
//! signing_key    = hex(HMAC-SHA256(date_key, "myra-api-request"))
//! signature      = base64(HMAC-SHA512(signing_key, signing_string))
//! Authorization: MYRA <api_key>:<signature>
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::{Sha256, Sha512};

use crate::error::ApiError;
use crate::utils::log_sanitizer::mask_secret;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Content type every request is signed with.
pub const CONTENT_TYPE: &str = "application/json";

const KEY_PREFIX: &str = "MYRA";
const SIGNING_KEY_DATA: &str = "myra-api-request";

/// API credentials plus the signing routine.
#[derive(Clone)]
pub struct Signer {
    api_key: String,
    secret: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("api_key", &mask_secret(&self.api_key))
            .field("secret", &"***")
            .finish()
    }
}

impl Signer {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Compute the `Authorization` header value.
    ///
    /// `request_uri` is the path plus query string exactly as sent,
    /// `date` the value of the `Date` header (RFC 3339).
    pub fn authorization(
        &self,
        method: &str,
        request_uri: &str,
        body: &str,
        date: &str,
    ) -> Result<String, ApiError> {
        let content_hash = hex::encode(Md5::digest(body.as_bytes()));
        let signing_string =
            format!("{content_hash}#{method}#{request_uri}#{CONTENT_TYPE}#{date}");

        let date_key = hex::encode(hmac_sha256(
            format!("{KEY_PREFIX}{}", self.secret).as_bytes(),
            date.as_bytes(),
        )?);
        let signing_key = hex::encode(hmac_sha256(
            date_key.as_bytes(),
            SIGNING_KEY_DATA.as_bytes(),
        )?);
        let signature = BASE64.encode(hmac_sha512(
            signing_key.as_bytes(),
            signing_string.as_bytes(),
        )?);

        Ok(format!("{KEY_PREFIX} {}:{signature}", self.api_key))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ApiError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| ApiError::SerializationError {
        detail: format!("HMAC key rejected: {e}"),
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ApiError> {
    let mut mac = HmacSha512::new_from_slice(key).map_err(|e| ApiError::SerializationError {
        detail: format!("HMAC key rejected: {e}"),
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
