mod email;
mod telegram;

pub use email::{HttpEmailSender, IEmailSender, InMemoryEmailSender, OutboundEmail};
pub use telegram::{BroadcastMessage, IBroadcastChannel, InMemoryBroadcastChannel, TelegramBotApi};
use thiserror::Error;

/// Failure to hand a message over to an outbound provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    #[error("Unable to reach provider: {0}")]
    Network(String),
    #[error("Provider rejected the message with status {status}: {message}")]
    Rejected { status: u16, message: String },
}
