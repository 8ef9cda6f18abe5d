//! Type-state SMTP client.

use std::marker::PhantomData;

use base64::Engine;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use super::ServerInfo;
use super::stream::{TlsStream, upgrade};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::message::Envelope;
use crate::parser::{is_last_line, parse_reply};
use crate::types::{Reply, ReplyCode};

/// Type-state marker: greeting received.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker: EHLO accepted.
#[derive(Debug)]
pub struct Greeted;

/// Type-state marker: authenticated (or authentication skipped), ready to send.
#[derive(Debug)]
pub struct Ready;

/// SMTP client over any async byte stream.
#[derive(Debug)]
pub struct Client<T, State> {
    stream: BufReader<T>,
    info: ServerInfo,
    client_name: String,
    _state: PhantomData<State>,
}

impl<T, S> Client<T, S>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns what the server advertised.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.info
    }

    fn into_state<N>(self) -> Client<T, N> {
        Client {
            stream: self.stream,
            info: self.info,
            client_name: self.client_name,
            _state: PhantomData,
        }
    }

    async fn command(&mut self, cmd: Command<'_>) -> Result<Reply> {
        trace!("C: {}", cmd.redacted());
        self.stream.write_all(&cmd.to_bytes()).await?;
        self.stream.flush().await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            if self.stream.read_line(&mut line).await? == 0 {
                return Err(Error::Closed);
            }
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            trace!("S: {line}");
            let last = is_last_line(&line);
            lines.push(line);
            if last {
                break;
            }
        }
        parse_reply(&lines)
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects QUIT.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.command(Command::Quit).await?;
        if reply.code != ReplyCode::CLOSING {
            reply.expect_success()?;
        }
        Ok(())
    }
}

impl<T> Client<T, Connected>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is missing or not 220.
    pub async fn from_stream(stream: T) -> Result<Self> {
        let mut client = Self {
            stream: BufReader::new(stream),
            info: ServerInfo::default(),
            client_name: String::new(),
            _state: PhantomData,
        };

        let greeting = client.read_reply().await?.expect_code(ReplyCode::SERVICE_READY)?;
        client.info.hostname = greeting
            .lines
            .first()
            .and_then(|l| l.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        debug!("Connected to SMTP server {}", client.info.hostname);
        Ok(client)
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if EHLO is rejected.
    pub async fn ehlo(mut self, client_name: &str) -> Result<Client<T, Greeted>> {
        let reply = self.command(Command::Ehlo(client_name)).await?.expect_success()?;
        self.info = std::mem::take(&mut self.info).with_ehlo(&reply.lines);
        self.client_name = client_name.to_string();
        Ok(self.into_state())
    }
}

impl Client<TcpStream, Greeted> {
    /// Upgrades the connection with STARTTLS and repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if STARTTLS is not advertised, or an
    /// error if the handshake or the second EHLO fails.
    pub async fn starttls(mut self, hostname: &str) -> Result<Client<TlsStream, Greeted>> {
        if !self.info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }
        self.command(Command::StartTls)
            .await?
            .expect_code(ReplyCode::SERVICE_READY)?;

        let tls = upgrade(self.stream.into_inner(), hostname).await?;
        debug!("Upgraded SMTP connection to TLS");

        let client: Client<TlsStream, Connected> = Client {
            stream: BufReader::new(tls),
            info: ServerInfo {
                hostname: self.info.hostname,
                extensions: Vec::new(),
            },
            client_name: String::new(),
            _state: PhantomData,
        };
        client.ehlo(&self.client_name).await
    }
}

impl<T> Client<T, Greeted>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Authenticates with AUTH PLAIN.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials.
    pub async fn auth_plain(mut self, username: &str, password: &str) -> Result<Client<T, Ready>> {
        let response = base64::engine::general_purpose::STANDARD
            .encode(format!("\0{username}\0{password}"));
        self.command(Command::AuthPlain(&response))
            .await?
            .expect_code(ReplyCode::AUTH_OK)?;
        debug!("SMTP authentication succeeded");
        Ok(self.into_state())
    }

    /// Proceeds without authentication (relays that trust the client).
    #[must_use]
    pub fn without_auth(self) -> Client<T, Ready> {
        self.into_state()
    }
}

impl<T> Client<T, Ready>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs one MAIL / RCPT / DATA transaction.
    ///
    /// Line endings in `message` are normalized to CRLF, lines starting with
    /// `.` are dot-stuffed and the terminating `.` line is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if any command is rejected.
    pub async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        if envelope.to.is_empty() {
            return Err(Error::InvalidAddress("no recipients".into()));
        }

        self.command(Command::MailFrom(&envelope.from))
            .await?
            .expect_success()?;
        for rcpt in &envelope.to {
            self.command(Command::RcptTo(rcpt)).await?.expect_success()?;
        }
        self.command(Command::Data)
            .await?
            .expect_code(ReplyCode::START_DATA)?;

        self.stream.write_all(&encode_data(message)).await?;
        self.stream.flush().await?;
        self.read_reply().await?.expect_success()?;

        debug!("Delivered message to {} recipient(s)", envelope.to.len());
        Ok(())
    }
}

/// Normalizes line endings, dot-stuffs and terminates a DATA payload.
fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 16);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    if !body.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }
    out.extend_from_slice(b".\r\n");
    out
}
