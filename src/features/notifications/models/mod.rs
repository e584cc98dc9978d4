mod notification;

pub use notification::{Notification, NotificationMessage, NotificationType};
