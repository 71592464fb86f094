// Report rendering and delivery
pub mod email;
pub mod report;

pub use email::{
    deliver, notifier_from_env, ConsoleNotifier, EmailSettings, Notifier, SmtpNotifier,
};
pub use report::{build_email, build_html, fmt_contract, REPORT_TITLE};
