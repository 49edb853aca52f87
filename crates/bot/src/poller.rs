//! Long-polling update loop.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::commands::Command;
use crate::handlers::{Handler, Sender, proof_filename};
use crate::telegram::{Message, TelegramClient, TelegramError};

/// Pause after a failed `getUpdates` before polling again.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Poll Telegram and answer messages until `shutdown` resolves.
///
/// Updates are handled one at a time in arrival order.
pub async fn run(
    telegram: &TelegramClient,
    handler: &Handler,
    poll_timeout: Duration,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    let mut offset = 0;

    info!(bot = handler.bot_username(), "Polling for updates");

    loop {
        let updates = tokio::select! {
            () = &mut shutdown => break,
            result = telegram.get_updates(offset, poll_timeout) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                error!(error = %e, "Failed to fetch updates");
                tokio::select! {
                    () = &mut shutdown => break,
                    () = tokio::time::sleep(ERROR_BACKOFF) => continue,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            if let Some(message) = update.message {
                dispatch(telegram, handler, &message).await;
            }
        }
    }

    info!("Polling stopped");
}

/// Answer a single message, if it is something the bot handles.
async fn dispatch(telegram: &TelegramClient, handler: &Handler, message: &Message) {
    let Some(from) = message.from.as_ref().filter(|u| !u.is_bot) else {
        return;
    };
    let sender = Sender::from(from);

    let reply = if let Some(photo) = message.largest_photo() {
        match download(telegram, &photo.file_id).await {
            Ok((bytes, filename)) => handler.on_photo(&sender, bytes, &filename).await,
            Err(e) => {
                error!(error = %e, "Failed to download photo");
                handler.on_photo_unavailable()
            }
        }
    } else if let Some(command) = message
        .text
        .as_deref()
        .and_then(|text| Command::parse(text, Some(handler.bot_username())))
    {
        debug!(?command, "Handling command");
        handler.on_command(&sender, command).await
    } else {
        return;
    };

    if let Err(e) = telegram
        .send_message(message.chat.id, &reply, Some(message.message_id))
        .await
    {
        warn!(error = %e, chat_id = message.chat.id, "Failed to send reply");
    }
}

async fn download(
    telegram: &TelegramClient,
    file_id: &str,
) -> Result<(Vec<u8>, String), TelegramError> {
    let file = telegram.get_file(file_id).await?;
    let bytes = telegram.download_file(&file).await?;
    Ok((bytes, proof_filename(file.file_path.as_deref())))
}
