//! Console notifications.

use chrono::Local;
use dailyfacts_core::collab::Notifier;

/// Prints notifications to stdout. In daemon mode each one is stamped with
/// the local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
  pub timestamps: bool,
}

impl Notifier for ConsoleNotifier {
  fn show(&self, title: &str, body: &str) {
    if self.timestamps {
      println!("[{}] {title}", Local::now().format("%Y-%m-%d %H:%M"));
    } else {
      println!("{title}");
    }
    println!("  {body}");
  }
}
