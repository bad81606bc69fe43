pub mod backend;
pub mod message;
pub mod noop;
pub mod telegram;

pub use backend::NotifyBackend;
pub use message::render;
pub use noop::NoopNotifier;
pub use telegram::TelegramNotifier;
