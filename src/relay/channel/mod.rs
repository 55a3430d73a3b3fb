//! Messaging-channel boundary.
//!
//! The relay consumes a long-lived pull subscription of message events and
//! replies with each command's captured output. Only textual messages
//! beginning with the command prefix are forwarded to the executor; other
//! events are ignored. Commands run strictly one at a time: a slow remote
//! command blocks all subsequent message processing.
//!
//! Execution failures are logged and produce no reply; nothing that looks
//! like an error ever reaches the remote conversation.

mod telegram;

pub use telegram::TelegramChannel;

use async_trait::async_trait;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::error::ChannelError;
use super::executor::{CommandExecutor, Connector};

/// Leading character marking a message as an executable command.
pub const COMMAND_PREFIX: char = '/';

/// Delay before re-polling after a channel error.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// One inbound message event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Conversation the reply must go back to.
    pub conversation_id: i64,
    /// Message text; `None` for non-text events.
    pub text: Option<String>,
}

/// A bidirectional messaging channel: poll inbound events, send replies.
#[async_trait]
pub trait MessageChannel: Send {
    /// Wait for the next batch of inbound messages.
    async fn poll(&mut self) -> Result<Vec<IncomingMessage>, ChannelError>;

    /// Send `text` as a single reply to the conversation that produced
    /// `message`. No chunking is applied to oversized output.
    async fn reply(&self, message: &IncomingMessage, text: &str) -> Result<(), ChannelError>;
}

/// Extract the command line from a message text.
///
/// A message is a command iff it begins with [`COMMAND_PREFIX`]. The prefix
/// is stripped exactly once; the remainder, embedded spaces included, is the
/// command line. A bare prefix is not a command.
pub fn parse_command(text: &str) -> Option<&str> {
    let command = text.strip_prefix(COMMAND_PREFIX)?;
    if command.is_empty() { None } else { Some(command) }
}

/// Dispatch loop: poll the channel and execute commands one at a time until
/// `shutdown` fires.
pub async fn serve<C, M>(executor: &CommandExecutor<C>, channel: &mut M, shutdown: CancellationToken)
where
    C: Connector,
    M: MessageChannel,
{
    loop {
        let batch = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("relay shutting down");
                return;
            }
            batch = channel.poll() => batch,
        };

        match batch {
            Ok(messages) => {
                for message in &messages {
                    handle_message(executor, channel, message).await;
                }
            }
            Err(err) => {
                error!("update poll failed: {}", err);
                sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}

/// Process one inbound message: ignore non-commands, run the command, reply
/// with its combined output.
pub(crate) async fn handle_message<C, M>(
    executor: &CommandExecutor<C>,
    channel: &M,
    message: &IncomingMessage,
) where
    C: Connector,
    M: MessageChannel,
{
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let Some(command) = parse_command(text) else {
        return;
    };

    match executor.run(command).await {
        Ok(output) => {
            if let Err(err) = channel.reply(message, &output).await {
                error!("failed to send reply: {}", err);
            }
        }
        // The conversation sees nothing on failure.
        Err(err) => error!("command failed: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::relay::config::AuthMode;
    use crate::relay::executor::testing::{Behavior, MockConnector};
    use crate::relay::types::Target;

    struct RecordingChannel {
        replies: StdMutex<Vec<(i64, String)>>,
    }

    impl RecordingChannel {
        fn new() -> Self {
            Self {
                replies: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MessageChannel for RecordingChannel {
        async fn poll(&mut self) -> Result<Vec<IncomingMessage>, ChannelError> {
            Ok(Vec::new())
        }

        async fn reply(&self, message: &IncomingMessage, text: &str) -> Result<(), ChannelError> {
            self.replies
                .lock()
                .unwrap()
                .push((message.conversation_id, text.to_string()));
            Ok(())
        }
    }

    fn executor(
        behavior: Behavior,
    ) -> (
        CommandExecutor<MockConnector>,
        Arc<AtomicUsize>,
        Arc<StdMutex<Vec<String>>>,
    ) {
        let connector = MockConnector::new(behavior);
        let attempts = connector.connect_attempts.clone();
        let commands = connector.commands.clone();
        let exec = CommandExecutor::new(
            Target {
                host: "203.0.113.7".to_string(),
                port: 22,
                user: "ops".to_string(),
            },
            AuthMode::Password,
            "secret".to_string(),
            Duration::from_secs(3),
            None,
            connector,
        );
        (exec, attempts, commands)
    }

    fn message(text: Option<&str>) -> IncomingMessage {
        IncomingMessage {
            conversation_id: 42,
            text: text.map(String::from),
        }
    }

    mod command_parsing {
        use super::*;

        #[test]
        fn test_prefix_is_stripped_exactly_once() {
            assert_eq!(parse_command("/ls -la /"), Some("ls -la /"));
        }

        #[test]
        fn test_double_prefix_keeps_the_second() {
            assert_eq!(parse_command("//etc/init.d/nginx restart"), Some("/etc/init.d/nginx restart"));
        }

        #[test]
        fn test_plain_text_is_not_a_command() {
            assert_eq!(parse_command("hello there"), None);
        }

        #[test]
        fn test_bare_prefix_is_not_a_command() {
            assert_eq!(parse_command("/"), None);
        }

        #[test]
        fn test_empty_text_is_not_a_command() {
            assert_eq!(parse_command(""), None);
        }

        #[test]
        fn test_interior_prefix_does_not_count() {
            assert_eq!(parse_command("cat /etc/hosts"), None);
        }
    }

    mod dispatch {
        use super::*;

        #[tokio::test]
        async fn test_command_output_is_replied_to_origin() {
            let (exec, _, _) = executor(Behavior::Output("hello\n".to_string()));
            let channel = RecordingChannel::new();

            handle_message(&exec, &channel, &message(Some("/echo hello"))).await;

            assert_eq!(
                *channel.replies.lock().unwrap(),
                vec![(42, "hello\n".to_string())]
            );
        }

        #[tokio::test]
        async fn test_forwarded_command_has_prefix_stripped() {
            let (exec, _, commands) = executor(Behavior::Output(String::new()));
            let channel = RecordingChannel::new();

            handle_message(&exec, &channel, &message(Some("/ls -la /"))).await;

            assert_eq!(*commands.lock().unwrap(), vec!["ls -la /".to_string()]);
        }

        #[tokio::test]
        async fn test_non_command_message_is_ignored() {
            let (exec, attempts, _) = executor(Behavior::Output("never\n".to_string()));
            let channel = RecordingChannel::new();

            handle_message(&exec, &channel, &message(Some("just chatting"))).await;

            assert_eq!(attempts.load(Ordering::SeqCst), 0);
            assert!(channel.replies.lock().unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_non_text_event_is_ignored() {
            let (exec, attempts, _) = executor(Behavior::Output("never\n".to_string()));
            let channel = RecordingChannel::new();

            handle_message(&exec, &channel, &message(None)).await;

            assert_eq!(attempts.load(Ordering::SeqCst), 0);
            assert!(channel.replies.lock().unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_execution_failure_sends_no_reply() {
            let (exec, attempts, _) = executor(Behavior::RefuseConnect);
            let channel = RecordingChannel::new();

            handle_message(&exec, &channel, &message(Some("/uptime"))).await;

            assert_eq!(attempts.load(Ordering::SeqCst), 1);
            assert!(channel.replies.lock().unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_empty_output_is_still_replied() {
            let (exec, _, _) = executor(Behavior::Output(String::new()));
            let channel = RecordingChannel::new();

            handle_message(&exec, &channel, &message(Some("/true"))).await;

            assert_eq!(
                *channel.replies.lock().unwrap(),
                vec![(42, String::new())]
            );
        }
    }

    mod shutdown {
        use super::*;
        use tokio_util::sync::CancellationToken;

        #[tokio::test]
        async fn test_serve_returns_when_cancelled() {
            let (exec, _, _) = executor(Behavior::Output("ok\n".to_string()));
            let mut channel = RecordingChannel::new();
            let token = CancellationToken::new();
            token.cancel();

            // Already-cancelled token: the loop exits on its first pass.
            serve(&exec, &mut channel, token).await;
        }
    }
}
