// src/bot/router.rs

use async_trait::async_trait;
use rust_i18n::t;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::bot::delivery::deliver_subdomains;
use crate::bot::event::{ChatId, Event, EventKind, MessageId, PrincipalId};
use crate::bot::menu::{self, Callback};
use crate::bot::session::Tool;
use crate::bot::{BotContext, Handler};
use crate::core::models::{HostInfo, ScanResult};
use crate::core::scanner::Recon;
use crate::core::target::Target;
use crate::errors::{BotError, InputError, ResolveError};

/// The conversation state machine: turns events into prompts, menus and tool runs.
pub struct Router {
    recon: Arc<dyn Recon>,
}

/// Where a reply goes and in which language.
struct Reply<'a> {
    ctx: &'a BotContext,
    chat: ChatId,
    principal: PrincipalId,
    lang: String,
}

impl Reply<'_> {
    async fn send(&self, text: &str) -> Result<MessageId, BotError> {
        Ok(self.ctx.transport.send_text(self.chat, text, None).await?)
    }

    async fn edit(&self, message: MessageId, text: &str) -> Result<(), BotError> {
        Ok(self.ctx.transport.edit_text(self.chat, message, text, None).await?)
    }

    async fn main_menu(&self) -> Result<(), BotError> {
        let (text, keyboard) = menu::main_menu(&self.lang);
        self.ctx.transport.send_text(self.chat, &text, Some(&keyboard)).await?;
        Ok(())
    }
}

#[async_trait]
impl Handler for Router {
    async fn handle(&self, ctx: &BotContext, event: Event) {
        let reply = Reply {
            ctx,
            chat: event.chat,
            principal: event.principal,
            lang: ctx.sessions.language(event.principal),
        };

        let outcome = match event.kind {
            EventKind::Command { name, args } => self.on_command(&reply, &name, &args).await,
            EventKind::Button { callback_id, data, message } => {
                self.on_button(&reply, &callback_id, &data, message).await
            }
            EventKind::Text(text) => self.on_text(&reply, &text).await,
        };

        if let Err(e) = outcome {
            error!(chat = reply.chat, principal = reply.principal, error = %e, "Handler failed.");
            if let Err(e) = reply.send(&t!("generic_error", locale = reply.lang.as_str())).await {
                warn!(chat = reply.chat, error = %e, "Could not report failure to user.");
            }
        }
    }
}

impl Router {
    pub fn new(recon: Arc<dyn Recon>) -> Self {
        Self { recon }
    }

    async fn on_command(&self, reply: &Reply<'_>, name: &str, args: &[String]) -> Result<(), BotError> {
        debug!(principal = reply.principal, command = name, "Command received.");
        if name == "start" {
            reply.ctx.sessions.clear_pending(reply.principal);
            return reply.main_menu().await;
        }
        match Tool::from_str(name) {
            Ok(tool) => self.dispatch(reply, tool, args.first().map(String::as_str)).await,
            Err(_) => reply.main_menu().await,
        }
    }

    async fn on_button(
        &self,
        reply: &Reply<'_>,
        callback_id: &str,
        data: &str,
        message: Option<MessageId>,
    ) -> Result<(), BotError> {
        let transport = &reply.ctx.transport;
        if let Err(e) = transport.answer_button(callback_id).await {
            warn!(error = %e, "Could not acknowledge button.");
        }

        let Some(callback) = Callback::parse(data) else {
            debug!(data, "Ignoring unknown button.");
            return Ok(());
        };

        match callback {
            Callback::ChangeLanguage => {
                let (text, keyboard) = menu::language_picker(&reply.lang);
                show(reply, message, &text, Some(&keyboard)).await
            }
            Callback::SetLanguage(code) => {
                let lang = menu::resolve_language(&code);
                reply.ctx.sessions.set_language(reply.principal, lang);
                info!(principal = reply.principal, lang, "Language changed.");
                show(reply, message, &t!("language_changed", locale = lang), None).await?;
                let (text, keyboard) = menu::main_menu(lang);
                transport.send_text(reply.chat, &text, Some(&keyboard)).await?;
                Ok(())
            }
            Callback::Tool(tool) => {
                show(reply, message, &menu::prompt(tool, &reply.lang), None).await?;
                reply.ctx.sessions.set_pending(reply.principal, tool);
                debug!(principal = reply.principal, %tool, "Awaiting tool argument.");
                Ok(())
            }
        }
    }

    async fn on_text(&self, reply: &Reply<'_>, text: &str) -> Result<(), BotError> {
        // Cleared before dispatching so the text is consumed exactly once.
        match reply.ctx.sessions.take_pending(reply.principal) {
            Some(tool) => self.dispatch(reply, tool, text.split_whitespace().next()).await,
            None => reply.main_menu().await,
        }
    }

    async fn dispatch(&self, reply: &Reply<'_>, tool: Tool, arg: Option<&str>) -> Result<(), BotError> {
        let Some(arg) = arg else {
            reply.send(&menu::usage(tool, &reply.lang)).await?;
            return Ok(());
        };

        let target = match Target::parse(arg) {
            Ok(target) => target,
            Err(InputError::Missing) => {
                reply.send(&menu::usage(tool, &reply.lang)).await?;
                return Ok(());
            }
            Err(InputError::Invalid(input)) => {
                reply
                    .send(&t!("invalid_target", locale = reply.lang.as_str(), input = input))
                    .await?;
                return Ok(());
            }
        };

        // Subdomains only exist under names.
        if tool == Tool::Scan && target.as_ip().is_some() {
            reply
                .send(&t!("invalid_target", locale = reply.lang.as_str(), input = arg))
                .await?;
            return Ok(());
        }

        let Some(_guard) = reply.ctx.sessions.try_begin_dispatch(reply.principal) else {
            info!(principal = reply.principal, %tool, "Dispatch refused, session busy.");
            reply.send(&t!("busy", locale = reply.lang.as_str())).await?;
            return Ok(());
        };

        info!(principal = reply.principal, %tool, target = %target, "Dispatching tool.");
        match tool {
            Tool::Scan => self.run_scan(reply, &target).await,
            Tool::Ip => self.run_ip(reply, &target).await,
            Tool::Info => self.run_info(reply, &target).await,
            Tool::Ports => self.run_ports(reply, &target).await,
        }
    }

    async fn run_scan(&self, reply: &Reply<'_>, target: &Target) -> Result<(), BotError> {
        let domain = target.to_string();
        let progress = reply.send(&t!("scan_start", locale = reply.lang.as_str(), domain = &domain)).await?;
        let report = self.recon.enumerate(&domain).await;
        deliver_subdomains(reply.ctx.transport.as_ref(), reply.chat, progress, &report, &reply.lang).await
    }

    async fn run_ip(&self, reply: &Reply<'_>, target: &Target) -> Result<(), BotError> {
        let name = target.to_string();
        let text = match self.recon.resolve(&name).await {
            Ok(ip) => t!("ip_result", locale = reply.lang.as_str(), domain = &name, ip = ip),
            Err(ResolveError::NotFound(_)) => t!("ip_not_found", locale = reply.lang.as_str(), domain = &name),
            Err(e) => return Err(e.into()),
        };
        reply.send(&text).await?;
        Ok(())
    }

    async fn run_info(&self, reply: &Reply<'_>, target: &Target) -> Result<(), BotError> {
        let name = target.to_string();
        let progress = reply.send(&t!("info_start", locale = reply.lang.as_str(), target = &name)).await?;
        let text = match self.recon.describe(&name).await {
            Ok(info) => render_info(&info, &reply.lang),
            Err(ResolveError::NotFound(_)) => t!("ip_not_found", locale = reply.lang.as_str(), domain = &name).to_string(),
            Err(e) => return Err(e.into()),
        };
        reply.edit(progress, &text).await
    }

    async fn run_ports(&self, reply: &Reply<'_>, target: &Target) -> Result<(), BotError> {
        let name = target.to_string();
        let progress = reply.send(&t!("ports_start", locale = reply.lang.as_str(), target = &name)).await?;
        let address = match target.as_ip() {
            Some(ip) => ip,
            None => match self.recon.resolve(&name).await {
                Ok(ip) => ip,
                Err(ResolveError::NotFound(_)) => {
                    return reply
                        .edit(progress, &t!("ip_not_found", locale = reply.lang.as_str(), domain = &name))
                        .await;
                }
                Err(e) => return Err(e.into()),
            },
        };

        let report = self.recon.probe(address).await;
        let text = if report.has_open_ports() {
            let ports = report
                .open_ports
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            t!("ports_results", locale = reply.lang.as_str(), ip = address, ports = ports)
        } else {
            t!("ports_no_results", locale = reply.lang.as_str(), ip = address)
        };
        reply.edit(progress, &text).await
    }
}

/// Edits the button's message when there is one, otherwise sends a new message.
async fn show(
    reply: &Reply<'_>,
    message: Option<MessageId>,
    text: &str,
    keyboard: Option<&crate::bot::transport::Keyboard>,
) -> Result<(), BotError> {
    let transport = &reply.ctx.transport;
    match message {
        Some(id) => transport.edit_text(reply.chat, id, text, keyboard).await?,
        None => {
            transport.send_text(reply.chat, text, keyboard).await?;
        }
    }
    Ok(())
}

/// Formats the info record; failed sub-lookups show as "unavailable", absent fields as "N/A".
pub fn render_info(info: &HostInfo, lang: &str) -> String {
    let field = |value: &ScanResult<String>| match value {
        Ok(Some(v)) => v.clone(),
        Ok(None) => t!("not_available", locale = lang).to_string(),
        Err(_) => t!("unavailable", locale = lang).to_string(),
    };
    let mut text = t!("info_header", locale = lang, target = &info.target).to_string();
    text.push_str(&t!(
        "info_body",
        locale = lang,
        ip = info.address,
        server = field(&info.server),
        org = field(&info.org),
        country = field(&info.country),
        city = field(&info.city),
        hostname = field(&info.hostname)
    ));
    text
}
