// src/bot/delivery.rs

use rust_i18n::t;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::bot::event::{ChatId, MessageId};
use crate::bot::transport::Transport;
use crate::core::models::SubdomainReport;
use crate::errors::BotError;

/// Results longer than this many UTF-8 bytes are sent as a file.
pub const INLINE_LIMIT_BYTES: usize = 4000;

pub const ATTACHMENT_NAME: &str = "subdomains.txt";

/// How a subdomain report reaches the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    NoResults,
    Inline { count: usize, body: String },
    Attachment { count: usize, body: String },
}

impl Delivery {
    pub fn plan(report: &SubdomainReport) -> Self {
        if report.is_empty() {
            return Delivery::NoResults;
        }
        let body = report.to_text();
        let count = report.count();
        if body.len() > INLINE_LIMIT_BYTES {
            Delivery::Attachment { count, body }
        } else {
            Delivery::Inline { count, body }
        }
    }
}

/// Delivers `report`, replacing the progress message `progress`.
///
/// An attachment lives in a temporary file for the duration of the upload only;
/// the file is removed when it goes out of scope, whatever the upload returned.
pub async fn deliver_subdomains(
    transport: &dyn Transport,
    chat: ChatId,
    progress: MessageId,
    report: &SubdomainReport,
    lang: &str,
) -> Result<(), BotError> {
    match Delivery::plan(report) {
        Delivery::NoResults => {
            transport
                .edit_text(chat, progress, &t!("scan_no_results", locale = lang), None)
                .await?;
        }
        Delivery::Inline { count, body } => {
            let text = t!("scan_results_text", locale = lang, count = count, domains = body);
            transport.edit_text(chat, progress, &text, None).await?;
        }
        Delivery::Attachment { count, body } => {
            let artifact = stage_attachment(&body)?;
            debug!(path = %artifact.path().display(), bytes = body.len(), "Staged subdomain attachment.");

            let caption = t!("scan_results_file", locale = lang, count = count);
            let sent = transport
                .send_file(chat, artifact.path(), ATTACHMENT_NAME, &caption)
                .await;
            drop(artifact);
            sent?;

            info!(chat, count, "Delivered subdomains as attachment.");
            if let Err(e) = transport.delete_message(chat, progress).await {
                warn!(chat, error = %e, "Could not remove progress message.");
            }
        }
    }
    Ok(())
}

fn stage_attachment(body: &str) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("subdomains-")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(body.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn report_of(hosts: impl IntoIterator<Item = String>) -> SubdomainReport {
        SubdomainReport {
            domain: "example.com".into(),
            hosts: hosts.into_iter().collect::<BTreeSet<_>>(),
            sources: Vec::new(),
        }
    }

    #[test]
    fn small_results_stay_inline() {
        let report = report_of(["b.example.com".to_string(), "a.example.com".to_string()]);
        assert_eq!(
            Delivery::plan(&report),
            Delivery::Inline { count: 2, body: "a.example.com\nb.example.com".into() }
        );
    }

    #[test]
    fn empty_results_are_reported_as_such() {
        assert_eq!(Delivery::plan(&report_of([])), Delivery::NoResults);
    }

    #[test]
    fn limit_is_measured_in_bytes() {
        // 16 bytes per host plus a newline between them.
        let hosts: Vec<String> = (0..300).map(|i| format!("h{:03}.example.com", i)).collect();
        let report = report_of(hosts);
        assert!(report.to_text().len() > INLINE_LIMIT_BYTES);
        assert!(matches!(Delivery::plan(&report), Delivery::Attachment { count: 300, .. }));

        // Non-ASCII labels count by encoded size, not by characters.
        let wide: Vec<String> = (0..170).map(|i| format!("ü{:03}ääää.example.com", i)).collect();
        let report = report_of(wide);
        assert!(report.to_text().chars().count() < INLINE_LIMIT_BYTES);
        assert!(matches!(Delivery::plan(&report), Delivery::Attachment { .. }));
    }
}
