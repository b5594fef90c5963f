// Messaging - event bus, notification catalog and control commands

pub mod bus;
pub mod command;
pub mod notification;
pub mod status;

pub use bus::{EventBus, Subscription};
pub use command::{CommandReceiver, CommandSender, ControlCommand, create_command_channel};
pub use notification::{Notification, NotificationKind};
pub use status::{StatusCategory, StatusLevel, StatusMessage};
