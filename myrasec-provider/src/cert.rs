//! Certificate / private key cross-check
//!
//! Runs before an SSL certificate is uploaded: the PEM certificate must
//! decode, the private key must be PKCS#1 (`RSA PRIVATE KEY`), PKCS#8
//! (`PRIVATE KEY`) or SEC1 (`EC PRIVATE KEY`), and its public half must equal
//! the certificate's public key. RSA compares modulus and exponent, ECDSA
//! compares the curve and both point coordinates.
//!
//! EC points are compared uncompressed. On P-256 and P-384 the private key's
//! public point is derived from the scalar, so SEC1 keys without an embedded
//! public key and compressed points are both accepted.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{AssociatedOid, PrivateKeyInfo};
use sec1::EcPrivateKey;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::public_key::PublicKey as SpkiKey;

use crate::error::{ProviderError, ProviderResult};

/// Named curve of an EC key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Curve {
    P256,
    P384,
    /// Any other curve, by dotted OID. Points are compared as encoded.
    Other(String),
}

impl Curve {
    fn from_id(id: String) -> Self {
        if id == p256::NistP256::OID.to_string() {
            Self::P256
        } else if id == p384::NistP384::OID.to_string() {
            Self::P384
        } else {
            Self::Other(id)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::Other(id) => id,
        }
    }

    /// Affine coordinates of a SEC1 encoded point.
    fn decode_point(&self, bytes: &[u8]) -> Result<(Vec<u8>, Vec<u8>), String> {
        match self {
            Self::P256 => {
                let key = p256::PublicKey::from_sec1_bytes(bytes)
                    .map_err(|e| format!("invalid P-256 point: {e}"))?;
                let point = key.to_encoded_point(false);
                coordinates(point.x().map(|x| x.as_slice()), point.y().map(|y| y.as_slice()))
            }
            Self::P384 => {
                let key = p384::PublicKey::from_sec1_bytes(bytes)
                    .map_err(|e| format!("invalid P-384 point: {e}"))?;
                let point = key.to_encoded_point(false);
                coordinates(point.x().map(|x| x.as_slice()), point.y().map(|y| y.as_slice()))
            }
            Self::Other(id) => match bytes.split_first() {
                Some((0x04, xy)) if !xy.is_empty() && xy.len() % 2 == 0 => {
                    let (x, y) = xy.split_at(xy.len() / 2);
                    Ok((x.to_vec(), y.to_vec()))
                }
                _ => Err(format!("only uncompressed points are supported on curve {id}")),
            },
        }
    }

    /// Public point of the private scalar `scalar`.
    fn derive_point(&self, scalar: &[u8]) -> Result<(Vec<u8>, Vec<u8>), String> {
        match self {
            Self::P256 => {
                let secret = p256::SecretKey::from_slice(scalar)
                    .map_err(|e| format!("invalid P-256 private key: {e}"))?;
                let point = secret.public_key().to_encoded_point(false);
                coordinates(point.x().map(|x| x.as_slice()), point.y().map(|y| y.as_slice()))
            }
            Self::P384 => {
                let secret = p384::SecretKey::from_slice(scalar)
                    .map_err(|e| format!("invalid P-384 private key: {e}"))?;
                let point = secret.public_key().to_encoded_point(false);
                coordinates(point.x().map(|x| x.as_slice()), point.y().map(|y| y.as_slice()))
            }
            Self::Other(id) => Err(format!(
                "EC private key on curve {id} carries no public key"
            )),
        }
    }
}

fn coordinates(x: Option<&[u8]>, y: Option<&[u8]>) -> Result<(Vec<u8>, Vec<u8>), String> {
    match (x, y) {
        (Some(x), Some(y)) => Ok((x.to_vec(), y.to_vec())),
        _ => Err("EC point is the identity".to_string()),
    }
}

/// Public key material extracted from a certificate or a private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa {
        modulus: Vec<u8>,
        exponent: Vec<u8>,
    },
    Ec {
        curve: Curve,
        x: Vec<u8>,
        y: Vec<u8>,
    },
}

impl PublicKey {
    fn rsa(modulus: &[u8], exponent: &[u8]) -> Self {
        Self::Rsa {
            modulus: unsigned(modulus),
            exponent: unsigned(exponent),
        }
    }

    fn ec(curve: Curve, (x, y): (Vec<u8>, Vec<u8>)) -> Self {
        Self::Ec { curve, x, y }
    }

    /// Human readable algorithm name for log and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Rsa { modulus, .. } => format!("RSA-{}", modulus.len() * 8),
            Self::Ec { curve, .. } => curve.name().to_string(),
        }
    }
}

/// Big-endian integer without sign padding.
fn unsigned(int: &[u8]) -> Vec<u8> {
    int.iter().copied().skip_while(|&b| b == 0).collect()
}

// ==================== Certificate ====================

/// Public key of the first certificate in `cert_pem`.
pub fn certificate_public_key(cert_pem: &str) -> ProviderResult<PublicKey> {
    let (_, pem) = parse_x509_pem(cert_pem.trim_start().as_bytes())
        .map_err(|e| ProviderError::InvalidCertPem(format!("no PEM block: {e}")))?;
    if pem.label != "CERTIFICATE" {
        return Err(ProviderError::InvalidCertPem(format!(
            "unexpected PEM block '{}'",
            pem.label
        )));
    }
    let (_, cert) = X509Certificate::from_der(&pem.contents)
        .map_err(|e| ProviderError::InvalidCertPem(format!("invalid X.509 certificate: {e}")))?;

    let spki = cert.public_key();
    let parsed = spki
        .parsed()
        .map_err(|e| ProviderError::InvalidCertPem(format!("unreadable public key: {e}")))?;
    match parsed {
        SpkiKey::RSA(rsa) => Ok(PublicKey::rsa(rsa.modulus, rsa.exponent)),
        SpkiKey::EC(point) => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|p| p.as_oid().ok())
                .map(|oid| Curve::from_id(oid.to_id_string()))
                .ok_or_else(|| ProviderError::InvalidCertPem("EC key names no curve".into()))?;
            let xy = curve
                .decode_point(point.data())
                .map_err(ProviderError::InvalidCertPem)?;
            Ok(PublicKey::ec(curve, xy))
        }
        _ => Err(ProviderError::InvalidCertPem(
            "unsupported public key algorithm".into(),
        )),
    }
}

// ==================== Private key ====================

fn pkcs1_public(der: &[u8]) -> Result<PublicKey, String> {
    let key = pkcs1::RsaPrivateKey::try_from(der).map_err(|e| e.to_string())?;
    Ok(PublicKey::rsa(
        key.modulus.as_bytes(),
        key.public_exponent.as_bytes(),
    ))
}

/// `outer_curve` comes from the PKCS#8 wrapper, which may omit the curve inside.
fn sec1_public(der: &[u8], outer_curve: Option<Curve>) -> Result<PublicKey, String> {
    let key = EcPrivateKey::try_from(der).map_err(|e| e.to_string())?;
    let curve = key
        .parameters
        .and_then(|p| p.named_curve())
        .map(|oid| Curve::from_id(oid.to_string()))
        .or(outer_curve)
        .ok_or("EC private key names no curve")?;
    let xy = match (&curve, key.public_key) {
        (Curve::Other(_), Some(point)) => curve.decode_point(point)?,
        _ => curve.derive_point(key.private_key)?,
    };
    Ok(PublicKey::ec(curve, xy))
}

fn pkcs8_public(der: &[u8]) -> Result<PublicKey, String> {
    let info = PrivateKeyInfo::try_from(der).map_err(|e| e.to_string())?;
    let algorithm = info.algorithm.oid;
    if algorithm == pkcs1::ALGORITHM_OID {
        pkcs1_public(info.private_key)
    } else if algorithm == p256::elliptic_curve::ALGORITHM_OID {
        let curve = info
            .algorithm
            .parameters_oid()
            .map_err(|e| format!("EC private key names no curve: {e}"))?;
        sec1_public(info.private_key, Some(Curve::from_id(curve.to_string())))
    } else {
        Err(format!("unsupported private key algorithm {algorithm}"))
    }
}

/// Public half of the private key in `key_pem`.
pub fn private_key_public_key(key_pem: &str) -> ProviderResult<PublicKey> {
    let (_, pem) = parse_x509_pem(key_pem.trim_start().as_bytes())
        .map_err(|e| ProviderError::UnsupportedKeyFormat(format!("no PEM block: {e}")))?;
    let parsed = match pem.label.as_str() {
        "RSA PRIVATE KEY" => pkcs1_public(&pem.contents),
        "PRIVATE KEY" => pkcs8_public(&pem.contents),
        "EC PRIVATE KEY" => sec1_public(&pem.contents, None),
        other => return Err(ProviderError::UnsupportedKeyFormat(other.to_string())),
    };
    parsed.map_err(|e| ProviderError::parse("key", e))
}

/// Confirm that `key_pem` is the private key of `cert_pem`.
pub fn validate_key_pair(cert_pem: &str, key_pem: &str) -> ProviderResult<()> {
    let cert_key = certificate_public_key(cert_pem)?;
    let private = private_key_public_key(key_pem)?;
    if cert_key == private {
        Ok(())
    } else {
        log::debug!(
            "[cert] key mismatch: certificate {}, private key {}",
            cert_key.describe(),
            private.describe()
        );
        Err(ProviderError::KeyCertificateMismatch)
    }
}
