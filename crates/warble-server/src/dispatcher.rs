//! Per-connection state machines and SNAC routing.
//!
//! Every connection moves through signon → ready → closed. Signon is the
//! FLAP handshake plus cookie validation; ready reads one SNAC at a time and
//! routes it on its decoded body; closed runs signout. Routing is static per
//! endpoint: the main table covers OService, Locate, Buddy, ICBM, ChatNav,
//! Feedbag, and Alert, the chat table covers OService and Chat.
//!
//! Handlers run inline in the reader task, so requests on one session are
//! processed in arrival order, and a handler's fan-out is enqueued before its
//! own response.

use std::sync::Arc;

use tokio::{
    io::BufReader,
    net::{TcpStream, tcp::OwnedReadHalf},
};
use warble_core::{
    ChatRegistry, ChatRoom, Environment, FeedbagStore, MemoryFeedbagStore, MemoryProfileStore,
    MemoryUserStore, ProfileStore, Session, SessionRegistry, UserStore,
};
use warble_proto::{
    ErrorCode, FlapType, ProtocolError, SnacBody, SnacFrame, SnacMessage, TAG_LOGIN_COOKIE,
};

use crate::{
    config::Config,
    error::ServerError,
    presence::PresenceNotifier,
    services::{
        AlertService, AuthService, BuddyService, ChatNavService, ChatService, FeedbagService,
        IcbmService, LocateService, OService,
        oservice::{BOS_FOOD_GROUPS, CHAT_FOOD_GROUPS, host_online},
    },
    system_env::SystemEnv,
    transport::{FlapWriter, read_frame_deadline, run_writer, signon_exchange},
};

/// Every service plus the shared registries, parameterized over environment
/// and store implementations.
pub struct ServerState<E, U, F, P> {
    /// Environment for time and randomness.
    pub env: E,
    /// Runtime configuration.
    pub config: Config,
    /// Main session registry.
    pub registry: Arc<SessionRegistry>,
    /// Chat room registry.
    pub chat_registry: Arc<ChatRegistry>,
    /// Presence fan-out engine.
    pub presence: Arc<PresenceNotifier<F>>,
    /// BUCP and cookie validation.
    pub auth: AuthService<E, U>,
    /// Connection-wide handlers.
    pub oservice: OService<E, F>,
    /// Buddy-list handlers.
    pub feedbag: FeedbagService<E, F>,
    /// Messaging handlers.
    pub icbm: IcbmService<E, F>,
    /// Profile handlers.
    pub locate: LocateService<E, F, P>,
    /// Buddy rights handler.
    pub buddy: BuddyService,
    /// Alert handler.
    pub alert: AlertService,
    /// Room creation and lookup.
    pub chat_nav: ChatNavService<E>,
    /// In-room messaging.
    pub chat: ChatService<E>,
}

/// State with the production environment and in-memory stores.
pub type MemoryServerState =
    ServerState<SystemEnv, MemoryUserStore, MemoryFeedbagStore, MemoryProfileStore>;

impl<E, U, F, P> ServerState<E, U, F, P>
where
    E: Environment,
    U: UserStore,
    F: FeedbagStore,
    P: ProfileStore,
{
    /// Wire every service to shared registries and the given stores.
    pub fn new(
        env: E,
        config: Config,
        users: Arc<U>,
        feedbag: Arc<F>,
        profiles: Arc<P>,
    ) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let chat_registry = Arc::new(ChatRegistry::new());
        let presence =
            Arc::new(PresenceNotifier::new(Arc::clone(&registry), Arc::clone(&feedbag)));

        Self {
            auth: AuthService::new(
                env.clone(),
                users,
                Arc::clone(&registry),
                Arc::clone(&chat_registry),
                config.clone(),
            ),
            oservice: OService::new(
                env.clone(),
                Arc::clone(&registry),
                Arc::clone(&chat_registry),
                Arc::clone(&presence),
                Arc::clone(&feedbag),
                config.clone(),
            ),
            feedbag: FeedbagService::new(
                env.clone(),
                Arc::clone(&registry),
                Arc::clone(&feedbag),
                Arc::clone(&presence),
            ),
            icbm: IcbmService::new(
                env.clone(),
                Arc::clone(&registry),
                Arc::clone(&feedbag),
                Arc::clone(&presence),
            ),
            locate: LocateService::new(
                env.clone(),
                Arc::clone(&registry),
                Arc::clone(&feedbag),
                profiles,
                Arc::clone(&presence),
            ),
            buddy: BuddyService,
            alert: AlertService,
            chat_nav: ChatNavService::new(env.clone(), Arc::clone(&chat_registry)),
            chat: ChatService::new(env.clone(), Arc::clone(&chat_registry)),
            presence,
            registry,
            chat_registry,
            env,
            config,
        }
    }

    fn fresh_sequence(&self) -> u16 {
        let mut seed = [0u8; 2];
        self.env.random_bytes(&mut seed);
        u16::from_be_bytes(seed)
    }

    /// Serve one main-service connection to completion.
    ///
    /// A signon carrying an authorization cookie attaches to the session
    /// BUCP created; a bare signon runs the BUCP exchange instead.
    pub async fn serve_bos_connection(self: &Arc<Self>, stream: TcpStream) {
        let peer = stream.peer_addr().ok();
        tracing::debug!(?peer, "main connection accepted");

        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = FlapWriter::new(write_half, self.fresh_sequence());

        let signon = match signon_exchange(&mut reader, &mut writer, &self.config).await {
            Ok(signon) => signon,
            Err(e) => {
                tracing::debug!(?peer, "signon failed: {e}");
                return;
            },
        };

        let result = match signon.tlvs.string(TAG_LOGIN_COOKIE) {
            Some(Ok(cookie)) => match self.auth.attach_main(&cookie) {
                Ok(session) => self.run_bos_session(session, reader, writer).await,
                Err(e) => {
                    let _ = writer.write_signoff().await;
                    Err(e)
                },
            },
            Some(Err(e)) => Err(e.into()),
            None => self.run_bucp(reader, writer).await,
        };

        if let Err(e) = result {
            tracing::debug!(?peer, "main connection ended: {e}");
        }
    }

    /// BUCP mode: serve challenge/login over a cookie-less connection.
    ///
    /// The client closes and reconnects with its cookie after a successful
    /// login, so this loop only ever writes directly; no session exists yet.
    async fn run_bucp(
        &self,
        mut reader: BufReader<OwnedReadHalf>,
        mut writer: FlapWriter<tokio::net::tcp::OwnedWriteHalf>,
    ) -> Result<(), ServerError> {
        let result = self.bucp_loop(&mut reader, &mut writer).await;
        if matches!(result, Err(ServerError::Protocol(_) | ServerError::Store(_))) {
            let _ = writer.write_error().await;
        }
        result
    }

    async fn bucp_loop(
        &self,
        reader: &mut BufReader<OwnedReadHalf>,
        writer: &mut FlapWriter<tokio::net::tcp::OwnedWriteHalf>,
    ) -> Result<(), ServerError> {
        loop {
            let frame = read_frame_deadline(reader, &self.config).await?;
            match frame.frame_type {
                FlapType::Data => {},
                FlapType::KeepAlive => continue,
                FlapType::Signoff => return Ok(()),
                FlapType::Signon | FlapType::Error => return Ok(()),
            }

            let mut payload = frame.payload;
            let snac = SnacFrame::decode(&mut payload)?;
            let reply = match SnacBody::decode(snac, &mut payload) {
                Ok(SnacBody::BucpChallengeRequest(request)) => {
                    self.auth.challenge(snac.request_id, &request).await?
                },
                Ok(SnacBody::BucpLoginRequest(request)) => {
                    self.auth.login(snac.request_id, &request).await?
                },
                Ok(_) => unsupported(snac),
                Err(ProtocolError::UnsupportedSnac { .. }) => unsupported(snac),
                Err(e) => return Err(e.into()),
            };
            writer.write_snac(&reply).await?;
        }
    }

    /// Ready state for an authenticated main-service session.
    async fn run_bos_session(
        self: &Arc<Self>,
        session: Arc<Session>,
        mut reader: BufReader<OwnedReadHalf>,
        writer: FlapWriter<tokio::net::tcp::OwnedWriteHalf>,
    ) -> Result<(), ServerError> {
        let Some(outbound) = session.take_outbound() else {
            // A second connection presented the same cookie; the first one
            // owns the queue.
            return Err(ServerError::UnknownSession(session.id().to_string()));
        };
        let writer_task = tokio::spawn(run_writer(writer, outbound));

        tracing::info!(screen_name = %session.ident(), "signed on");
        session.send(host_online(&BOS_FOOD_GROUPS)).await;

        let result = self.bos_read_loop(&session, &mut reader).await;
        if matches!(result, Err(ServerError::Protocol(_) | ServerError::Store(_))) {
            session.abort();
        }

        // Signout: departure fan-out, then drop the session. Store failures
        // here only cost the fan-out.
        if let Err(e) = self.presence.broadcast_departure(&session).await {
            tracing::warn!(screen_name = %session.ident(), "departure fan-out failed: {e}");
        }
        self.registry.remove(session.id());
        tracing::info!(screen_name = %session.ident(), "signed off");

        let _ = writer_task.await;
        result
    }

    async fn bos_read_loop(
        self: &Arc<Self>,
        session: &Arc<Session>,
        reader: &mut BufReader<OwnedReadHalf>,
    ) -> Result<(), ServerError> {
        let mut closed = session.closed_watch();
        loop {
            let frame = tokio::select! {
                biased;
                _ = closed.changed() => return Ok(()),
                frame = read_frame_deadline(reader, &self.config) => frame?,
            };

            match frame.frame_type {
                FlapType::Data => {},
                FlapType::KeepAlive => continue,
                FlapType::Signoff => return Ok(()),
                FlapType::Signon | FlapType::Error => return Ok(()),
            }

            let mut payload = frame.payload;
            let snac = SnacFrame::decode(&mut payload)?;
            let responses = match SnacBody::decode(snac, &mut payload) {
                Ok(body) => self.route_bos(session, snac, body).await?,
                Err(ProtocolError::UnsupportedSnac { .. }) => vec![unsupported(snac)],
                Err(e) => return Err(e.into()),
            };
            for response in responses {
                session.send(response).await;
            }
        }
    }

    /// Main-service routing table.
    async fn route_bos(
        self: &Arc<Self>,
        session: &Arc<Session>,
        snac: SnacFrame,
        body: SnacBody,
    ) -> Result<Vec<SnacMessage>, ServerError> {
        let rid = snac.request_id;
        match body {
            // OService
            SnacBody::ClientVersions(v) => Ok(vec![self.oservice.client_versions(rid, &v)]),
            SnacBody::RateParamsQuery => Ok(vec![self.oservice.rate_params_query(rid)]),
            SnacBody::RateParamsSubAdd(_) => Ok(Vec::new()),
            SnacBody::UserInfoQuery => Ok(vec![self.oservice.user_info_query(session, rid)]),
            SnacBody::SetUserInfoFields(b) => {
                self.oservice.set_user_info_fields(session, &b).await?;
                Ok(Vec::new())
            },
            SnacBody::IdleNotification(b) => {
                self.oservice.idle_notification(session, b).await?;
                Ok(Vec::new())
            },
            SnacBody::ServiceRequest(b) => {
                Ok(vec![self.oservice.service_request(session, rid, &b).await?])
            },
            SnacBody::ClientOnline(_) => {
                self.oservice.client_online_bos(session).await?;
                Ok(Vec::new())
            },

            // Locate
            SnacBody::LocateRightsQuery(_) => Ok(vec![self.locate.rights_query(rid)]),
            SnacBody::SetInfo(b) => {
                self.locate.set_info(session, &b).await?;
                Ok(Vec::new())
            },
            SnacBody::UserInfoQuery2(b) => {
                Ok(vec![self.locate.user_info_query2(session, rid, &b).await?])
            },
            SnacBody::SetDirInfo(_) => Ok(vec![self.locate.set_dir_info(rid)]),
            SnacBody::SetKeywordInfo(_) => Ok(vec![self.locate.set_keyword_info(rid)]),

            // Buddy
            SnacBody::BuddyRightsQuery(_) => Ok(vec![self.buddy.rights_query(rid)]),

            // ICBM
            SnacBody::IcbmAddParameters(_) => Ok(Vec::new()),
            SnacBody::IcbmParameterQuery => Ok(vec![self.icbm.parameter_query(rid)]),
            SnacBody::ChannelMsgToHost(b) => {
                self.icbm.channel_msg_to_host(session, rid, &b).await
            },
            SnacBody::ClientEvent(b) => {
                self.icbm.client_event(session, &b).await?;
                Ok(Vec::new())
            },
            SnacBody::EvilRequest(b) => self.icbm.evil_request(session, rid, &b).await,

            // Feedbag
            SnacBody::FeedbagRightsQuery(_) => Ok(vec![self.feedbag.rights_query(rid)]),
            SnacBody::FeedbagQuery => Ok(vec![self.feedbag.query(session, rid).await?]),
            SnacBody::FeedbagQueryIfModified(b) => {
                Ok(vec![self.feedbag.query_if_modified(session, rid, b).await?])
            },
            SnacBody::FeedbagInsertItem(b) => {
                Ok(vec![self.feedbag.insert_item(session, rid, &b).await?])
            },
            SnacBody::FeedbagUpdateItem(b) => {
                Ok(vec![self.feedbag.update_item(session, rid, &b).await?])
            },
            SnacBody::FeedbagDeleteItem(b) => {
                Ok(vec![self.feedbag.delete_item(session, rid, &b).await?])
            },
            SnacBody::FeedbagUse
            | SnacBody::FeedbagStartCluster(_)
            | SnacBody::FeedbagEndCluster => Ok(Vec::new()),

            // ChatNav
            SnacBody::RequestChatRights => Ok(vec![self.chat_nav.request_chat_rights(rid)]),
            SnacBody::CreateRoom(b) => Ok(vec![self.chat_nav.create_room(session, rid, &b)?]),
            SnacBody::RequestRoomInfo(b) => Ok(vec![self.chat_nav.request_room_info(rid, &b)?]),

            // Alert
            SnacBody::AlertNotifyCapabilities(b)
            | SnacBody::AlertNotifyDisplayCapabilities(b) => {
                self.alert.notify(session, &b);
                Ok(Vec::new())
            },

            // Anything else is a known body arriving on the wrong endpoint
            // or direction.
            _ => Ok(vec![unsupported(snac)]),
        }
    }

    /// Serve one chat-service connection to completion.
    ///
    /// The signon cookie must be a chat handoff cookie naming a registered
    /// room and a pre-bound session.
    pub async fn serve_chat_connection(self: &Arc<Self>, stream: TcpStream) {
        let peer = stream.peer_addr().ok();
        tracing::debug!(?peer, "chat connection accepted");

        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = FlapWriter::new(write_half, self.fresh_sequence());

        let signon = match signon_exchange(&mut reader, &mut writer, &self.config).await {
            Ok(signon) => signon,
            Err(e) => {
                tracing::debug!(?peer, "chat signon failed: {e}");
                return;
            },
        };

        let attached = signon
            .tlvs
            .bytes(TAG_LOGIN_COOKIE)
            .ok_or(ServerError::Protocol(ProtocolError::TagNotFound(TAG_LOGIN_COOKIE)))
            .and_then(|raw| self.auth.attach_chat(&raw));
        let (session, room) = match attached {
            Ok(attached) => attached,
            Err(e) => {
                tracing::debug!(?peer, "chat cookie rejected: {e}");
                let _ = writer.write_signoff().await;
                return;
            },
        };

        if let Err(e) = self.run_chat_session(session, room, reader, writer).await {
            tracing::debug!(?peer, "chat connection ended: {e}");
        }
    }

    async fn run_chat_session(
        self: &Arc<Self>,
        session: Arc<Session>,
        room: ChatRoom,
        mut reader: BufReader<OwnedReadHalf>,
        writer: FlapWriter<tokio::net::tcp::OwnedWriteHalf>,
    ) -> Result<(), ServerError> {
        let Some(outbound) = session.take_outbound() else {
            return Err(ServerError::UnknownSession(session.id().to_string()));
        };
        let writer_task = tokio::spawn(run_writer(writer, outbound));

        tracing::info!(screen_name = %session.ident(), room = %room.cookie, "entered room");
        session.send(host_online(&CHAT_FOOD_GROUPS)).await;

        let result = self.chat_read_loop(&session, &room, &mut reader).await;
        if matches!(result, Err(ServerError::Protocol(_) | ServerError::Store(_))) {
            session.abort();
        }

        // Room signout: announce, unbind, delete the room if it emptied.
        if let Ok((_, participants)) = self.chat_registry.retrieve(&room.cookie) {
            self.chat.leave(&session, &room.cookie, &participants);
        }
        tracing::info!(screen_name = %session.ident(), room = %room.cookie, "left room");

        let _ = writer_task.await;
        result
    }

    async fn chat_read_loop(
        self: &Arc<Self>,
        session: &Arc<Session>,
        room: &ChatRoom,
        reader: &mut BufReader<OwnedReadHalf>,
    ) -> Result<(), ServerError> {
        let mut closed = session.closed_watch();
        loop {
            let frame = tokio::select! {
                biased;
                _ = closed.changed() => return Ok(()),
                frame = read_frame_deadline(reader, &self.config) => frame?,
            };

            match frame.frame_type {
                FlapType::Data => {},
                FlapType::KeepAlive => continue,
                FlapType::Signoff => return Ok(()),
                FlapType::Signon | FlapType::Error => return Ok(()),
            }

            let mut payload = frame.payload;
            let snac = SnacFrame::decode(&mut payload)?;
            let responses = match SnacBody::decode(snac, &mut payload) {
                Ok(body) => self.route_chat(session, room, snac, body)?,
                Err(ProtocolError::UnsupportedSnac { .. }) => vec![unsupported(snac)],
                Err(e) => return Err(e.into()),
            };
            for response in responses {
                session.send(response).await;
            }
        }
    }

    /// Chat-service routing table.
    fn route_chat(
        self: &Arc<Self>,
        session: &Arc<Session>,
        room: &ChatRoom,
        snac: SnacFrame,
        body: SnacBody,
    ) -> Result<Vec<SnacMessage>, ServerError> {
        let rid = snac.request_id;
        match body {
            SnacBody::ClientVersions(v) => Ok(vec![self.oservice.client_versions(rid, &v)]),
            SnacBody::RateParamsQuery => Ok(vec![self.oservice.rate_params_query(rid)]),
            SnacBody::RateParamsSubAdd(_) => Ok(Vec::new()),
            SnacBody::UserInfoQuery => Ok(vec![self.oservice.user_info_query(session, rid)]),
            SnacBody::ClientOnline(_) => {
                let (_, participants) = self.chat_registry.retrieve(&room.cookie)?;
                Ok(self.oservice.client_online_chat(session, room, &participants))
            },
            SnacBody::ChatChannelMsgToHost(b) => {
                let (_, participants) = self.chat_registry.retrieve(&room.cookie)?;
                self.chat.channel_msg_to_host(session, &participants, rid, &b)
            },
            _ => Ok(vec![unsupported(snac)]),
        }
    }
}

/// Error SNAC for a routing miss, in the request's food group.
fn unsupported(snac: SnacFrame) -> SnacMessage {
    SnacMessage::reply(
        snac.request_id,
        SnacBody::Error { food_group: snac.food_group, code: ErrorCode::InvalidSnac },
    )
}
