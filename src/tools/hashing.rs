//! Hash generator

use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use super::{ToolError, ToolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl std::str::FromStr for HashAlgorithm {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(Self::Md5),
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(ToolError::invalid_input(format!("unsupported algorithm '{}'", other))),
        }
    }
}

/// Hash the UTF-8 bytes of `text`, returning lowercase hex
pub fn digest(algorithm: HashAlgorithm, text: &str) -> String {
    let bytes = text.as_bytes();
    match algorithm {
        HashAlgorithm::Md5 => format!("{:x}", md5::compute(bytes)),
        HashAlgorithm::Sha224 => HEXLOWER.encode(&Sha224::digest(bytes)),
        HashAlgorithm::Sha256 => HEXLOWER.encode(&Sha256::digest(bytes)),
        HashAlgorithm::Sha384 => HEXLOWER.encode(&Sha384::digest(bytes)),
        HashAlgorithm::Sha512 => HEXLOWER.encode(&Sha512::digest(bytes)),
    }
}
