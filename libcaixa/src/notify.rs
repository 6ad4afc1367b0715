use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

/// Transient, fire-and-forget user notifications.
pub trait Notifier {
    fn toast(&self, title: &str, message: &str, seconds: u32);
}

/// Sends toasts to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn toast(&self, title: &str, message: &str, seconds: u32) {
        info!(title, seconds, "{}", message);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub seconds: u32,
}

/// Keeps every toast; clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct ToastLog(Rc<RefCell<Vec<Toast>>>);

impl ToastLog {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.0.borrow().clone()
    }

    pub fn last(&self) -> Option<Toast> {
        self.0.borrow().last().cloned()
    }
}

impl Notifier for ToastLog {
    fn toast(&self, title: &str, message: &str, seconds: u32) {
        self.0.borrow_mut().push(Toast {
            title: title.to_string(),
            message: message.to_string(),
            seconds,
        });
    }
}
