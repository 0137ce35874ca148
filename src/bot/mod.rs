// src/bot/mod.rs

//! The chat-facing side: events in, transport calls out, with the membership
//! gate and the per-user conversation state in between.

pub mod delivery;
pub mod event;
pub mod gate;
pub mod menu;
pub mod router;
pub mod session;
pub mod telegram;
pub mod transport;

use async_trait::async_trait;
use std::sync::Arc;

use self::event::Event;
use self::gate::{Gated, MembershipGate};
use self::router::Router;
use self::session::SessionStore;
use self::transport::Transport;
use crate::core::scanner::Recon;

/// State shared by every handler invocation.
pub struct BotContext {
    pub transport: Arc<dyn Transport>,
    pub sessions: SessionStore,
}

/// Something that reacts to one inbound event. Middleware wraps another `Handler`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &BotContext, event: Event);
}

/// A handler stack bound to its context.
pub struct Bot<H> {
    ctx: BotContext,
    handler: H,
}

impl Bot<Gated<Router>> {
    /// The standard stack: every event passes the membership gate before routing.
    pub fn gated(
        transport: Arc<dyn Transport>,
        sessions: SessionStore,
        gate: MembershipGate,
        recon: Arc<dyn Recon>,
    ) -> Self {
        Bot::new(BotContext { transport, sessions }, Gated::new(gate, Router::new(recon)))
    }
}

impl<H: Handler> Bot<H> {
    pub fn new(ctx: BotContext, handler: H) -> Self {
        Self { ctx, handler }
    }

    pub async fn handle(&self, event: Event) {
        self.handler.handle(&self.ctx, event).await
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.ctx.sessions
    }
}
