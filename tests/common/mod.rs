#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use tokio::sync::Notify;

use vanguard_recon_bot::bot::Bot;
use vanguard_recon_bot::bot::event::{ChatId, Event, EventKind, MessageId, PrincipalId};
use vanguard_recon_bot::bot::gate::{Gated, MemberStatus, MembershipDirectory, MembershipGate};
use vanguard_recon_bot::bot::router::Router;
use vanguard_recon_bot::bot::session::SessionStore;
use vanguard_recon_bot::bot::transport::{Keyboard, Transport};
use vanguard_recon_bot::core::models::{HostInfo, IpMetadata, PortScanReport, SubdomainReport};
use vanguard_recon_bot::core::scanner::Recon;
use vanguard_recon_bot::errors::{MembershipError, ResolveError, TransportError};

pub const CHAT: ChatId = 500;
pub const USER: PrincipalId = 42;
pub const JOIN_URL: &str = "https://t.me/test-group";

/// One outbound call seen by the recording transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { id: MessageId, text: String, keyboard: Option<Keyboard> },
    Edit { id: MessageId, text: String, keyboard: Option<Keyboard> },
    Delete { id: MessageId },
    File { path: PathBuf, existed: bool, file_name: String, caption: String, contents: String },
    Answer { callback_id: String },
}

impl Sent {
    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Text { text, .. } | Sent::Edit { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Records everything instead of talking to a chat service.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
    next_id: AtomicI64,
    pub fail_files: bool,
}

impl RecordingTransport {
    pub fn failing_files() -> Self {
        Self { fail_files: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().iter().filter_map(|s| s.text().map(str::to_string)).collect()
    }

    pub fn last_text(&self) -> String {
        self.texts().pop().unwrap_or_default()
    }

    fn push(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, _: ChatId, text: &str, keyboard: Option<&Keyboard>) -> Result<MessageId, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.push(Sent::Text { id, text: text.to_string(), keyboard: keyboard.cloned() });
        Ok(id)
    }

    async fn edit_text(&self, _: ChatId, id: MessageId, text: &str, keyboard: Option<&Keyboard>) -> Result<(), TransportError> {
        self.push(Sent::Edit { id, text: text.to_string(), keyboard: keyboard.cloned() });
        Ok(())
    }

    async fn delete_message(&self, _: ChatId, id: MessageId) -> Result<(), TransportError> {
        self.push(Sent::Delete { id });
        Ok(())
    }

    async fn send_file(&self, _: ChatId, path: &Path, file_name: &str, caption: &str) -> Result<(), TransportError> {
        self.push(Sent::File {
            path: path.to_path_buf(),
            existed: path.exists(),
            file_name: file_name.to_string(),
            caption: caption.to_string(),
            contents: std::fs::read_to_string(path).unwrap_or_default(),
        });
        if self.fail_files {
            Err(TransportError::Api("Request Entity Too Large".into()))
        } else {
            Ok(())
        }
    }

    async fn answer_button(&self, callback_id: &str) -> Result<(), TransportError> {
        self.push(Sent::Answer { callback_id: callback_id.to_string() });
        Ok(())
    }
}

/// Answers every membership lookup the same way.
pub struct StubDirectory {
    pub answer: Result<MemberStatus, String>,
    pub lookups: AtomicUsize,
}

impl StubDirectory {
    pub fn new(answer: Result<MemberStatus, String>) -> Self {
        Self { answer, lookups: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl MembershipDirectory for StubDirectory {
    async fn status(&self, _: i64, _: PrincipalId) -> Result<MemberStatus, MembershipError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(MembershipError::Api)
    }
}

/// Canned engine answers, with call counting.
pub struct StubRecon {
    pub hosts: Vec<String>,
    pub address: Option<IpAddr>,
    /// When set, every lookup fails inside the resolver rather than finding nothing.
    pub resolver_fault: bool,
    pub open_ports: Vec<u16>,
    pub calls: AtomicUsize,
    /// When set, `enumerate` waits for a notification before returning.
    pub hold: Option<Arc<Notify>>,
}

impl Default for StubRecon {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            address: Some("93.184.216.34".parse().unwrap()),
            resolver_fault: false,
            open_ports: Vec::new(),
            calls: AtomicUsize::new(0),
            hold: None,
        }
    }
}

impl StubRecon {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, name: &str) -> Result<IpAddr, ResolveError> {
        if self.resolver_fault {
            let fault = hickory_resolver::error::ResolveError::from("upstream resolver unreachable");
            return Err(ResolveError::Resolver(fault));
        }
        self.address.ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl Recon for StubRecon {
    async fn enumerate(&self, domain: &str) -> SubdomainReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        SubdomainReport {
            domain: domain.to_string(),
            hosts: self.hosts.iter().cloned().collect::<BTreeSet<_>>(),
            sources: Vec::new(),
        }
    }

    async fn resolve(&self, name: &str) -> Result<IpAddr, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(name)
    }

    async fn describe(&self, target: &str) -> Result<HostInfo, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let address = self.lookup(target)?;
        let metadata = IpMetadata {
            ip: Some(address.to_string()),
            org: Some("AS15133 Edgecast".into()),
            country: Some("US".into()),
            city: None,
            hostname: None,
        };
        Ok(HostInfo::new(target, address, Ok(metadata), Err("connection refused".into())))
    }

    async fn probe(&self, address: IpAddr) -> PortScanReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PortScanReport { address, open_ports: self.open_ports.clone() }
    }
}

pub struct Harness {
    pub bot: Arc<Bot<Gated<Router>>>,
    pub transport: Arc<RecordingTransport>,
    pub directory: Arc<StubDirectory>,
    pub recon: Arc<StubRecon>,
}

impl Harness {
    pub fn new(recon: StubRecon) -> Self {
        Self::with(recon, RecordingTransport::default(), Ok(MemberStatus::Member))
    }

    pub fn with(recon: StubRecon, transport: RecordingTransport, membership: Result<MemberStatus, String>) -> Self {
        Self::with_engine(Arc::new(recon), transport, membership)
    }

    pub fn with_engine(
        recon: Arc<StubRecon>,
        transport: RecordingTransport,
        membership: Result<MemberStatus, String>,
    ) -> Self {
        let transport = Arc::new(transport);
        let directory = Arc::new(StubDirectory::new(membership));
        let gate = MembershipGate::new(directory.clone(), -100, JOIN_URL);
        let bot = Bot::gated(transport.clone(), SessionStore::new("en"), gate, recon.clone());
        Self { bot: Arc::new(bot), transport, directory, recon }
    }

    pub async fn text(&self, text: &str) {
        self.text_from(USER, text).await
    }

    pub async fn text_from(&self, principal: PrincipalId, text: &str) {
        self.bot.handle(Event::from_message(principal, CHAT, text)).await
    }

    pub async fn press(&self, data: &str) {
        self.bot
            .handle(Event {
                principal: USER,
                chat: CHAT,
                kind: EventKind::Button {
                    callback_id: format!("cb-{}", data),
                    data: data.to_string(),
                    message: Some(1),
                },
            })
            .await
    }
}
