//! FLAP transport over TCP.
//!
//! One reader and one writer per connection. The writer owns the outgoing
//! sequence counter and drains a session's outbound queue; the reader decodes
//! frames under the configured idle deadline. Both sides of the signon
//! exchange live here too, since they happen before a session is attached.

use bytes::Bytes;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    time::timeout,
};
use warble_core::session::Outbound;
use warble_proto::{FlapFrame, FlapHeader, FlapType, SignonFrame, SnacMessage};

use crate::{config::Config, error::ServerError};

/// Sequenced FLAP writer owning one half of a connection.
pub struct FlapWriter<W> {
    writer: W,
    sequence: u16,
}

impl<W: AsyncWrite + Unpin> FlapWriter<W> {
    /// Writer starting at a server-chosen sequence number.
    pub fn new(writer: W, start_sequence: u16) -> Self {
        Self { writer, sequence: start_sequence }
    }

    async fn write_frame(&mut self, frame_type: FlapType, payload: Bytes) -> Result<(), ServerError> {
        let frame = FlapFrame::new(frame_type, self.sequence, payload);
        self.sequence = self.sequence.wrapping_add(1);

        let mut wire = Vec::with_capacity(FlapHeader::SIZE + frame.payload.len());
        frame.encode(&mut wire)?;
        self.writer.write_all(&wire).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Marshal a SNAC into a Data frame and send it.
    pub async fn write_snac(&mut self, msg: &SnacMessage) -> Result<(), ServerError> {
        let mut body = Vec::new();
        msg.encode(&mut body)?;
        self.write_frame(FlapType::Data, Bytes::from(body)).await
    }

    /// Send a Signon frame with the given payload.
    pub async fn write_signon(&mut self, signon: &SignonFrame) -> Result<(), ServerError> {
        let mut payload = Vec::new();
        signon.encode(&mut payload)?;
        self.write_frame(FlapType::Signon, Bytes::from(payload)).await
    }

    /// Send an empty Signoff frame.
    pub async fn write_signoff(&mut self) -> Result<(), ServerError> {
        self.write_frame(FlapType::Signoff, Bytes::new()).await
    }

    /// Send an Error frame; the connection is about to close.
    pub async fn write_error(&mut self) -> Result<(), ServerError> {
        self.write_frame(FlapType::Error, Bytes::new()).await
    }
}

/// Read one complete FLAP frame.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<FlapFrame, ServerError> {
    let mut header_raw = [0u8; FlapHeader::SIZE];
    reader.read_exact(&mut header_raw).await?;
    let header = FlapHeader::decode(&header_raw)?;

    let mut payload = vec![0u8; usize::from(header.payload_len)];
    reader.read_exact(&mut payload).await?;

    Ok(FlapFrame {
        frame_type: header.frame_type,
        sequence: header.sequence,
        payload: Bytes::from(payload),
    })
}

/// Read one frame under the configured idle deadline.
pub async fn read_frame_deadline<R: AsyncRead + Unpin>(
    reader: &mut R,
    config: &Config,
) -> Result<FlapFrame, ServerError> {
    match timeout(config.read_timeout, read_frame(reader)).await {
        Ok(result) => result,
        Err(_) => Err(ServerError::ReadTimeout),
    }
}

/// Run the signon exchange from the server side.
///
/// Sends the opening Signon frame, then returns the TLVs from the client's
/// Signon reply. The reply is read under the idle deadline so an unresponsive
/// client cannot pin the connection in signon forever.
pub async fn signon_exchange<R, W>(
    reader: &mut R,
    writer: &mut FlapWriter<W>,
    config: &Config,
) -> Result<SignonFrame, ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_signon(&SignonFrame::default()).await?;

    let frame = read_frame_deadline(reader, config).await?;
    if frame.frame_type != FlapType::Signon {
        return Err(ServerError::Protocol(warble_proto::ProtocolError::Malformed(
            "expected signon frame",
        )));
    }

    let mut payload = frame.payload;
    Ok(SignonFrame::decode(&mut payload)?)
}

/// Drain a session's outbound queue onto the connection.
///
/// Runs until the queue yields [`Outbound::Terminate`], every sender is
/// dropped, or a write fails. Terminate produces a best-effort Signoff frame
/// before the writer half drops and the socket closes.
pub async fn run_writer<W: AsyncWrite + Unpin>(
    mut writer: FlapWriter<W>,
    mut rx: mpsc::Receiver<Outbound>,
) {
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Message(msg) => {
                if let Err(e) = writer.write_snac(&msg).await {
                    tracing::debug!("outbound write failed: {e}");
                    break;
                }
            },
            Outbound::Terminate => {
                let _ = writer.write_signoff().await;
                break;
            },
            Outbound::Abort => {
                let _ = writer.write_error().await;
                break;
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use warble_proto::{SnacBody, Tlv, TlvBlock};

    use super::*;

    #[tokio::test]
    async fn snac_frames_round_trip_over_duplex() {
        let (client, server) = tokio::io::duplex(4096);
        let (mut client_read, _client_write) = tokio::io::split(client);
        let (_server_read, server_write) = tokio::io::split(server);

        let mut writer = FlapWriter::new(server_write, 0x0100);
        let msg = SnacMessage::reply(7, SnacBody::FeedbagQuery);
        writer.write_snac(&msg).await.unwrap();

        let frame = read_frame(&mut client_read).await.unwrap();
        assert_eq!(frame.frame_type, FlapType::Data);
        assert_eq!(frame.sequence, 0x0100);

        let mut payload = frame.payload;
        let parsed = SnacMessage::decode(&mut payload).unwrap();
        assert_eq!(parsed, msg);
    }

    #[tokio::test]
    async fn sequence_increments_per_frame() {
        let (client, server) = tokio::io::duplex(4096);
        let (mut client_read, _cw) = tokio::io::split(client);
        let (_sr, server_write) = tokio::io::split(server);

        let mut writer = FlapWriter::new(server_write, 0xFFFF);
        writer.write_signoff().await.unwrap();
        writer.write_signoff().await.unwrap();

        let first = read_frame(&mut client_read).await.unwrap();
        let second = read_frame(&mut client_read).await.unwrap();
        assert_eq!(first.sequence, 0xFFFF);
        assert_eq!(second.sequence, 0x0000); // wraps modulo 2^16
    }

    #[tokio::test]
    async fn signon_exchange_returns_client_tlvs() {
        let (client, server) = tokio::io::duplex(4096);
        let (mut client_read, client_write) = tokio::io::split(client);
        let (mut server_read, server_write) = tokio::io::split(server);

        let config = Config::default();
        let server_task = tokio::spawn(async move {
            let mut writer = FlapWriter::new(server_write, 1);
            signon_exchange(&mut server_read, &mut writer, &config).await
        });

        // Client: read the server's signon, reply with a cookie TLV.
        let opening = read_frame(&mut client_read).await.unwrap();
        assert_eq!(opening.frame_type, FlapType::Signon);

        let reply = SignonFrame::new(TlvBlock::from_tlvs(vec![Tlv::string(
            warble_proto::TAG_LOGIN_COOKIE,
            "sid-123",
        )]));
        let mut client_writer = FlapWriter::new(client_write, 1);
        client_writer.write_signon(&reply).await.unwrap();

        let signon = server_task.await.unwrap().unwrap();
        assert_eq!(
            signon.tlvs.string(warble_proto::TAG_LOGIN_COOKIE).unwrap().unwrap(),
            "sid-123"
        );
    }
}
