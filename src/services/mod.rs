pub mod mailer;
pub mod notifications;
