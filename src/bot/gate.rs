// src/bot/gate.rs

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::bot::event::{Event, EventKind, PrincipalId};
use crate::bot::menu;
use crate::bot::{BotContext, Handler};
use crate::errors::MembershipError;

/// What the membership directory says about a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Member,
    NonMember,
}

/// Looks up group membership.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn status(&self, group: i64, principal: PrincipalId) -> Result<MemberStatus, MembershipError>;
}

/// The gate's verdict for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied { join_url: String },
}

/// Admits members of one group.
///
/// A lookup failure admits the principal: availability wins over strictness here,
/// and the failure is only logged.
pub struct MembershipGate {
    directory: Arc<dyn MembershipDirectory>,
    group: i64,
    join_url: String,
}

impl MembershipGate {
    pub fn new(directory: Arc<dyn MembershipDirectory>, group: i64, join_url: impl Into<String>) -> Self {
        Self {
            directory,
            group,
            join_url: join_url.into(),
        }
    }

    pub async fn admit(&self, principal: PrincipalId) -> Admission {
        match self.directory.status(self.group, principal).await {
            Ok(MemberStatus::Member) => {
                debug!(principal, "Membership confirmed.");
                Admission::Allowed
            }
            Ok(MemberStatus::NonMember) => {
                info!(principal, "Principal is not a member, denying.");
                Admission::Denied {
                    join_url: self.join_url.clone(),
                }
            }
            Err(e) => {
                error!(principal, group = self.group, error = %e, "Membership check failed, admitting.");
                Admission::Allowed
            }
        }
    }
}

/// Runs the gate in front of `inner` for every event, whatever its kind.
pub struct Gated<H> {
    gate: MembershipGate,
    inner: H,
}

impl<H> Gated<H> {
    pub fn new(gate: MembershipGate, inner: H) -> Self {
        Self { gate, inner }
    }
}

#[async_trait]
impl<H: Handler> Handler for Gated<H> {
    async fn handle(&self, ctx: &BotContext, event: Event) {
        match self.gate.admit(event.principal).await {
            Admission::Allowed => self.inner.handle(ctx, event).await,
            Admission::Denied { join_url } => {
                if let EventKind::Button { callback_id, .. } = &event.kind {
                    if let Err(e) = ctx.transport.answer_button(callback_id).await {
                        warn!(error = %e, "Could not acknowledge button.");
                    }
                }
                let lang = ctx.sessions.language(event.principal);
                let (text, keyboard) = menu::join_prompt(&lang, &join_url);
                if let Err(e) = ctx.transport.send_text(event.chat, &text, Some(&keyboard)).await {
                    warn!(chat = event.chat, error = %e, "Could not send join prompt.");
                }
            }
        }
    }
}
