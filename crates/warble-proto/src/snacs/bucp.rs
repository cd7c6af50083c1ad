//! BUCP food group (0x17): MD5-challenge login.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, tlv::TlvBlock, wire};

/// Subgroup codes.
pub mod sub {
    /// Error response.
    pub const ERR: u16 = 0x0001;
    /// Login request with hashed credentials.
    pub const LOGIN_REQUEST: u16 = 0x0002;
    /// Login response (cookie or error subcode).
    pub const LOGIN_RESPONSE: u16 = 0x0003;
    /// Challenge request naming the screen name.
    pub const CHALLENGE_REQUEST: u16 = 0x0006;
    /// Challenge response carrying the auth key.
    pub const CHALLENGE_RESPONSE: u16 = 0x0007;
}

/// TLV tags used across BUCP bodies.
pub mod tags {
    /// Screen name (request and response).
    pub const SCREEN_NAME: u16 = 0x0001;
    /// URL with details for a login error.
    pub const ERROR_URL: u16 = 0x0004;
    /// Main-service address, `"host:port"`.
    pub const RECONNECT_HERE: u16 = 0x0005;
    /// Authorization cookie to present at main-service signon.
    pub const AUTHORIZATION_COOKIE: u16 = 0x0006;
    /// Login error subcode (u16).
    pub const ERROR_SUBCODE: u16 = 0x0008;
    /// MD5 password hash.
    pub const PASSWORD_HASH: u16 = 0x0025;
}

/// Error subcode for unknown screen name or bad password.
pub const ERR_INVALID_CREDENTIALS: u16 = 0x0001;

/// Salt string mixed into the login hash, fixed by the protocol.
pub const HASH_SALT: &[u8] = b"AOL Instant Messenger (SM)";

/// `ChallengeRequest` (0x06): TLV body naming the account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeRequest {
    /// Request TLVs; [`tags::SCREEN_NAME`] selects the account.
    pub tlvs: TlvBlock,
}

impl ChallengeRequest {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}

/// `ChallengeResponse` (0x07): the account's auth key as a 16-bit
/// length-prefixed string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeResponse {
    /// Per-account salt the client mixes into its password hash.
    pub auth_key: String,
}

impl ChallengeResponse {
    /// Decode the auth key.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { auth_key: wire::read_string16(buf)? })
    }

    /// Encode the auth key.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        wire::write_string16(buf, &self.auth_key)
    }
}

/// `LoginRequest` (0x02): screen name plus password hash TLVs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginRequest {
    /// Request TLVs; [`tags::SCREEN_NAME`] and [`tags::PASSWORD_HASH`] are
    /// required for a login attempt.
    pub tlvs: TlvBlock,
}

impl LoginRequest {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}

/// `LoginResponse` (0x03): cookie TLVs on success, error subcode otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginResponse {
    /// Response TLVs.
    pub tlvs: TlvBlock,
}

impl LoginResponse {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}
