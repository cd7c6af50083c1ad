//! BUCP login and cookie validation.
//!
//! The main endpoint serves two kinds of connections: a signon carrying an
//! authorization-cookie TLV attaches to the session BUCP previously created,
//! and a bare signon enters BUCP mode for the challenge/login exchange. The
//! chat endpoint validates a [`ChatCookie`] against a pre-bound room session
//! instead.

use std::sync::Arc;

use bytes::Bytes;
use warble_core::{
    ChatRegistry, Environment, ScreenName, Session, SessionRegistry, User, UserStore,
};
use warble_proto::{
    ChatCookie, SnacBody, SnacMessage, Tlv, TlvBlock,
    snacs::bucp::{
        self, ChallengeRequest, ChallengeResponse, ERR_INVALID_CREDENTIALS, LoginRequest,
        LoginResponse,
    },
};

use crate::{config::Config, error::ServerError};

/// Password given to stub users materialized under `disable_auth`.
///
/// The value itself is arbitrary; what matters is that the stub user's hash
/// is derived from it and a fresh random auth key, so the login request that
/// triggered materialization verifies on retry.
const STUB_PASSWORD: &str = "welcome1";

/// BUCP challenge/login plus signon cookie validation.
pub struct AuthService<E, U> {
    env: E,
    users: Arc<U>,
    registry: Arc<SessionRegistry>,
    chat_registry: Arc<ChatRegistry>,
    config: Config,
}

impl<E: Environment, U: UserStore> AuthService<E, U> {
    /// Service over the account store and both registries.
    pub fn new(
        env: E,
        users: Arc<U>,
        registry: Arc<SessionRegistry>,
        chat_registry: Arc<ChatRegistry>,
        config: Config,
    ) -> Self {
        Self { env, users, registry, chat_registry, config }
    }

    /// Handle a BUCP challenge request.
    ///
    /// Known accounts get their stored auth key. Unknown accounts get a fresh
    /// stub key under `disable_auth`, or an error-subcode response otherwise.
    pub async fn challenge(
        &self,
        request_id: u32,
        request: &ChallengeRequest,
    ) -> Result<SnacMessage, ServerError> {
        let screen_name = request
            .tlvs
            .string(bucp::tags::SCREEN_NAME)
            .transpose()?
            .ok_or(warble_proto::ProtocolError::TagNotFound(bucp::tags::SCREEN_NAME))?;

        let auth_key = match self.users.get_user(&ScreenName::new(&*screen_name).ident()).await? {
            Some(user) => user.auth_key,
            None if self.config.disable_auth => self.env.new_uuid(),
            None => {
                tracing::info!(%screen_name, "challenge for unknown screen name");
                return Ok(login_error(request_id, &screen_name));
            },
        };

        Ok(SnacMessage::reply(
            request_id,
            SnacBody::BucpChallengeResponse(ChallengeResponse { auth_key }),
        ))
    }

    /// Handle a BUCP login request.
    ///
    /// On success a session is created in the main registry and the response
    /// carries the screen name, the main-service address, and the session id
    /// as the authorization cookie.
    pub async fn login(
        &self,
        request_id: u32,
        request: &LoginRequest,
    ) -> Result<SnacMessage, ServerError> {
        let screen_name = request
            .tlvs
            .string(bucp::tags::SCREEN_NAME)
            .transpose()?
            .ok_or(warble_proto::ProtocolError::TagNotFound(bucp::tags::SCREEN_NAME))?;
        let candidate_hash = request
            .tlvs
            .bytes(bucp::tags::PASSWORD_HASH)
            .ok_or(warble_proto::ProtocolError::TagNotFound(bucp::tags::PASSWORD_HASH))?;

        let name = ScreenName::new(&*screen_name);
        let user = self.users.get_user(&name.ident()).await?;

        let authenticated = match user {
            Some(user) if user.hash_matches(&candidate_hash) => true,
            _ if self.config.disable_auth => {
                // Materialize a stub account so the same request verifies on
                // future logins.
                let mut key_raw = [0u8; 8];
                self.env.random_bytes(&mut key_raw);
                let auth_key: String = key_raw.iter().map(|b| format!("{b:02x}")).collect();
                let stub = User::with_password(name.clone(), auth_key, STUB_PASSWORD);
                self.users.upsert_user(stub).await?;
                tracing::info!(%screen_name, "materialized stub user");
                true
            },
            _ => false,
        };

        if !authenticated {
            tracing::info!(%screen_name, "login rejected: bad credentials");
            return Ok(login_error(request_id, &screen_name));
        }

        let session_id = self.env.new_uuid();
        let now = self.env.wall_clock_secs();
        self.registry.add(session_id.clone(), name, now);
        tracing::info!(%screen_name, session_id, "login succeeded");

        let tlvs = TlvBlock::from_tlvs(vec![
            Tlv::string(bucp::tags::SCREEN_NAME, &screen_name),
            Tlv::string(bucp::tags::RECONNECT_HERE, self.config.bos_address()),
            Tlv::string(bucp::tags::AUTHORIZATION_COOKIE, &session_id),
        ]);
        Ok(SnacMessage::reply(request_id, SnacBody::BucpLoginResponse(LoginResponse { tlvs })))
    }

    /// Resolve a main-service signon cookie to its session.
    pub fn attach_main(&self, cookie: &str) -> Result<Arc<Session>, ServerError> {
        self.registry
            .retrieve(cookie)
            .ok_or_else(|| ServerError::UnknownSession(cookie.to_string()))
    }

    /// Resolve a chat-service signon cookie to its pre-bound room session.
    ///
    /// The user must still hold a main session, the room must exist, and the
    /// session id must have been pre-bound into the room's registry by the
    /// service-request handoff.
    pub fn attach_chat(
        &self,
        raw_cookie: &[u8],
    ) -> Result<(Arc<Session>, warble_core::ChatRoom), ServerError> {
        let mut buf = Bytes::copy_from_slice(raw_cookie);
        let cookie = ChatCookie::decode(&mut buf)?;

        // The chat session rides on the main login; a signed-off user's
        // handoff cookie is dead.
        self.registry
            .retrieve(&cookie.session_id)
            .ok_or_else(|| ServerError::UnknownSession(cookie.session_id.clone()))?;

        let (room, participants) = self.chat_registry.retrieve(&cookie.room_cookie)?;
        let session = participants
            .retrieve(&cookie.session_id)
            .ok_or_else(|| ServerError::UnknownSession(cookie.session_id.clone()))?;
        Ok((session, room))
    }
}

fn login_error(request_id: u32, screen_name: &str) -> SnacMessage {
    let tlvs = TlvBlock::from_tlvs(vec![
        Tlv::string(bucp::tags::SCREEN_NAME, screen_name),
        Tlv::u16(bucp::tags::ERROR_SUBCODE, ERR_INVALID_CREDENTIALS),
    ]);
    SnacMessage::reply(request_id, SnacBody::BucpLoginResponse(LoginResponse { tlvs }))
}

#[cfg(test)]
mod tests {
    use warble_core::{MemoryUserStore, compute_password_hash, env::test_utils::MockEnv};

    use super::*;

    fn service(disable_auth: bool) -> (AuthService<MockEnv, MemoryUserStore>, Arc<MemoryUserStore>) {
        let users = Arc::new(MemoryUserStore::new());
        let service = AuthService::new(
            MockEnv::at(1_000_000),
            Arc::clone(&users),
            Arc::new(SessionRegistry::new()),
            Arc::new(ChatRegistry::new()),
            Config { disable_auth, ..Config::default() },
        );
        (service, users)
    }

    fn challenge_request(screen_name: &str) -> ChallengeRequest {
        ChallengeRequest {
            tlvs: TlvBlock::from_tlvs(vec![Tlv::string(bucp::tags::SCREEN_NAME, screen_name)]),
        }
    }

    fn login_request(screen_name: &str, hash: &[u8]) -> LoginRequest {
        LoginRequest {
            tlvs: TlvBlock::from_tlvs(vec![
                Tlv::string(bucp::tags::SCREEN_NAME, screen_name),
                Tlv::new(bucp::tags::PASSWORD_HASH, hash.to_vec()),
            ]),
        }
    }

    #[tokio::test]
    async fn challenge_returns_stored_auth_key() {
        let (service, users) = service(false);
        users
            .upsert_user(User::with_password(ScreenName::new("alice"), "K", "pw"))
            .await
            .unwrap();

        let reply = service.challenge(1, &challenge_request("alice")).await.unwrap();
        match reply.body {
            SnacBody::BucpChallengeResponse(r) => assert_eq!(r.auth_key, "K"),
            other => panic!("expected challenge response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn challenge_for_unknown_user_errors_when_auth_enforced() {
        let (service, _) = service(false);
        let reply = service.challenge(1, &challenge_request("ghost")).await.unwrap();
        match reply.body {
            SnacBody::BucpLoginResponse(r) => {
                assert_eq!(
                    r.tlvs.u16(bucp::tags::ERROR_SUBCODE).unwrap().unwrap(),
                    ERR_INVALID_CREDENTIALS
                );
            },
            other => panic!("expected login error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn challenge_for_unknown_user_stubs_key_when_auth_disabled() {
        let (service, _) = service(true);
        let reply = service.challenge(1, &challenge_request("ghost")).await.unwrap();
        assert!(matches!(reply.body, SnacBody::BucpChallengeResponse(_)));
    }

    #[tokio::test]
    async fn login_mismatch_materializes_stub_when_auth_disabled() {
        let (service, users) = service(true);

        let reply = service.login(1, &login_request("newuser", b"garbage")).await.unwrap();
        match reply.body {
            SnacBody::BucpLoginResponse(r) => {
                assert!(r.tlvs.has(bucp::tags::AUTHORIZATION_COOKIE));
            },
            other => panic!("expected login response, got {other:?}"),
        }

        let stub = users.get_user(&ScreenName::new("newuser").ident()).await.unwrap().unwrap();
        assert!(stub.hash_matches(&compute_password_hash(&stub.auth_key, STUB_PASSWORD)));
    }
}
