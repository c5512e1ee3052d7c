use chrono::Utc;

use crate::error::AppResult;
use crate::store::{Store, UpdateCandidate};
use crate::utils::email::{send_emails, MailTransport};

pub const UPDATE_SUBJECT: &str = "New updates in your courselet";

/// A learner chat gets one notice per content change of its unit, and none
/// once the conversation reached `DONE`.
pub fn needs_update_notice(candidate: &UpdateCandidate) -> bool {
    let chat = &candidate.chat;
    if chat.is_done() || !chat.is_learner_chat() {
        return false;
    }
    let Some(updated_at) = candidate.course_unit.content_updated_at else {
        return false;
    };
    if updated_at <= chat.last_modify_timestamp {
        return false;
    }
    chat.notified_at.map_or(true, |notified| notified < updated_at)
}

fn update_text(candidate: &UpdateCandidate) -> String {
    format!(
        "Your instructor has updated \"{}\" since your last visit.\n\n\
         Open the courselet to see what's new.",
        candidate.course_unit.title
    )
}

/// Emails the owner of every chat with unseen unit updates. Returns the
/// number of chats notified.
pub async fn notify_for_updates(
    store: &dyn Store,
    mailer: &dyn MailTransport,
    from: &str,
) -> AppResult<usize> {
    let candidates = store.list_update_candidates().await?;
    let mut notified = 0;

    for candidate in candidates.iter().filter(|c| needs_update_notice(c)) {
        let delivered = send_emails(
            mailer,
            UPDATE_SUBJECT,
            &update_text(candidate),
            from,
            std::slice::from_ref(&candidate.email),
            true,
        )
        .await?;
        if delivered == 0 {
            continue;
        }
        notified += 1;
        if let Err(e) = store.mark_chat_notified(candidate.chat.id, Utc::now()).await {
            tracing::error!(chat_id = %candidate.chat.id, error = %e, "failed to mark chat notified");
        }
    }

    tracing::info!(
        candidates = candidates.len(),
        notified,
        "update notification sweep finished"
    );
    Ok(notified)
}
