//! The copy button: presentation state, revert tickets and the clipboard seam.
//!
//! A button cycles `Idle -> Copied -> Idle` or `Idle -> Error -> Idle`. Every
//! transition into `Copied` or `Error` issues a [`RevertTicket`]; the host
//! schedules a revert for that ticket after the configured delay. Only the
//! newest ticket can revert the button, so a revert scheduled by an earlier
//! click cannot cut a later state short, and the button always returns to
//! `Idle` one delay after the last completion.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{Captions, DecorateConfig};

/// Visual state of a copy button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Idle,
    Copied,
    Error,
}

/// Identifies one scheduled revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevertTicket(u64);

/// Everything a host needs to render a button in its current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub title: String,
    /// Full class attribute, e.g. `copy-btn copied`.
    pub class_name: String,
    /// Background override, `None` to clear it.
    pub background: Option<String>,
}

/// State machine behind one copy button.
#[derive(Debug, Clone)]
pub struct CopyButton {
    state: ButtonState,
    generation: u64,
    captions: Captions,
    button_class: String,
    copied_class: String,
    error_background: String,
    revert_delay: Duration,
}

impl CopyButton {
    pub fn new(config: &DecorateConfig) -> Self {
        Self {
            state: ButtonState::Idle,
            generation: 0,
            captions: config.captions.clone(),
            button_class: config.button_class.clone(),
            copied_class: config.copied_class.clone(),
            error_background: config.error_background.clone(),
            revert_delay: config.revert_delay,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Delay after which a ticket should be passed to [`revert`](Self::revert).
    pub fn revert_delay(&self) -> Duration {
        self.revert_delay
    }

    pub fn view(&self) -> ButtonView {
        let (label, class_name, background) = match self.state {
            ButtonState::Idle => (&self.captions.copy, self.button_class.clone(), None),
            ButtonState::Copied => (
                &self.captions.copied,
                format!("{} {}", self.button_class, self.copied_class),
                None,
            ),
            ButtonState::Error => (
                &self.captions.error,
                self.button_class.clone(),
                Some(self.error_background.clone()),
            ),
        };
        ButtonView {
            label: label.clone(),
            title: self.captions.title.clone(),
            class_name,
            background,
        }
    }

    fn enter(&mut self, state: ButtonState) -> RevertTicket {
        self.state = state;
        self.generation += 1;
        RevertTicket(self.generation)
    }

    /// The clipboard write succeeded.
    pub fn succeed(&mut self) -> RevertTicket {
        self.enter(ButtonState::Copied)
    }

    /// The clipboard write failed.
    pub fn fail(&mut self) -> RevertTicket {
        self.enter(ButtonState::Error)
    }

    /// Return to `Idle` if `ticket` is the most recent one.
    ///
    /// Returns whether the revert was applied.
    pub fn revert(&mut self, ticket: RevertTicket) -> bool {
        if ticket.0 != self.generation {
            debug!(
                ticket = ticket.0,
                current = self.generation,
                "ignoring stale revert"
            );
            return false;
        }
        self.state = ButtonState::Idle;
        true
    }
}

/// A clipboard write rejected by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardError {
    pub message: String,
}

impl ClipboardError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clipboard write failed: {}", self.message)
    }
}

impl std::error::Error for ClipboardError {}

/// Asynchronous access to the system clipboard.
pub trait Clipboard {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>>;
}

/// Result of one copy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied { ticket: RevertTicket, chars: usize },
    Failed { ticket: RevertTicket, error: ClipboardError },
}

impl CopyOutcome {
    /// Ticket to revert the button with once the delay has passed.
    pub fn ticket(&self) -> RevertTicket {
        match self {
            CopyOutcome::Copied { ticket, .. } | CopyOutcome::Failed { ticket, .. } => *ticket,
        }
    }
}

/// Write `text` to the clipboard and move the button into the matching state.
///
/// The failure is logged and reflected on the button; it is never returned as
/// an error.
pub async fn run_copy<C: Clipboard>(
    button: &RefCell<CopyButton>,
    clipboard: &C,
    text: &str,
) -> CopyOutcome {
    let write = clipboard.write_text(text);
    settle_copy(button, write, text.chars().count()).await
}

/// Wait for a clipboard write that has already been started and move the
/// button into the matching state.
///
/// Browsers only accept clipboard writes started inside the click handler, so
/// hosts start the write synchronously and hand the pending future here.
pub async fn settle_copy<F>(button: &RefCell<CopyButton>, write: F, chars: usize) -> CopyOutcome
where
    F: Future<Output = Result<(), ClipboardError>>,
{
    match write.await {
        Ok(()) => {
            let ticket = button.borrow_mut().succeed();
            debug!(chars, "copied to clipboard");
            CopyOutcome::Copied { ticket, chars }
        }
        Err(error) => {
            warn!(%error, "copy failed");
            let ticket = button.borrow_mut().fail();
            CopyOutcome::Failed { ticket, error }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    struct FakeClipboard {
        fail: bool,
        written: RefCell<Vec<String>>,
    }

    impl FakeClipboard {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                written: RefCell::new(Vec::new()),
            }
        }
    }

    impl Clipboard for FakeClipboard {
        fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> {
            if self.fail {
                return std::future::ready(Err(ClipboardError::new("denied")));
            }
            self.written.borrow_mut().push(text.to_string());
            std::future::ready(Ok(()))
        }
    }

    /// Poll a future that must complete without yielding.
    fn poll_once<F: Future>(future: F) -> F::Output {
        let mut future = pin!(future);
        let mut cx = Context::from_waker(Waker::noop());
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => output,
            Poll::Pending => panic!("future yielded"),
        }
    }

    fn button() -> RefCell<CopyButton> {
        RefCell::new(CopyButton::new(&DecorateConfig::default()))
    }

    #[test]
    fn test_initial_view() {
        let button = CopyButton::new(&DecorateConfig::default());
        assert_eq!(
            button.view(),
            ButtonView {
                label: "Копировать".into(),
                title: "Копировать код".into(),
                class_name: "copy-btn".into(),
                background: None,
            }
        );
    }

    #[test]
    fn test_success_cycle() {
        let button = button();
        let clipboard = FakeClipboard::new(false);
        let outcome = poll_once(run_copy(&button, &clipboard, "abc"));

        assert!(matches!(outcome, CopyOutcome::Copied { chars: 3, .. }));
        assert_eq!(clipboard.written.borrow().as_slice(), ["abc"]);
        let view = button.borrow().view();
        assert_eq!(view.label, "Скопировано!");
        assert_eq!(view.class_name, "copy-btn copied");

        assert!(button.borrow_mut().revert(outcome.ticket()));
        assert_eq!(button.borrow().state(), ButtonState::Idle);
        assert_eq!(button.borrow().view().class_name, "copy-btn");
    }

    #[test]
    fn test_empty_text_still_succeeds() {
        let button = button();
        let clipboard = FakeClipboard::new(false);
        let outcome = poll_once(run_copy(&button, &clipboard, ""));
        assert!(matches!(outcome, CopyOutcome::Copied { chars: 0, .. }));
        assert_eq!(button.borrow().state(), ButtonState::Copied);
        assert_eq!(clipboard.written.borrow().as_slice(), [""]);
    }

    #[test]
    fn test_failure_shows_error_then_reverts() {
        let button = button();
        let clipboard = FakeClipboard::new(true);
        let outcome = poll_once(run_copy(&button, &clipboard, &"x".repeat(10_000)));

        let CopyOutcome::Failed { ticket, error } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.message, "denied");
        let view = button.borrow().view();
        assert_eq!(view.label, "Ошибка");
        assert_eq!(view.background.as_deref(), Some("#dc3545"));

        assert!(button.borrow_mut().revert(ticket));
        let view = button.borrow().view();
        assert_eq!(view.label, "Копировать");
        assert_eq!(view.background, None);
    }

    #[test]
    fn test_double_click_never_sticks() {
        let button = button();
        let clipboard = FakeClipboard::new(false);
        let first = poll_once(run_copy(&button, &clipboard, "a")).ticket();
        let second = poll_once(run_copy(&button, &clipboard, "a")).ticket();

        // The first timer fires while the second state is showing.
        assert!(!button.borrow_mut().revert(first));
        assert_eq!(button.borrow().state(), ButtonState::Copied);

        assert!(button.borrow_mut().revert(second));
        assert_eq!(button.borrow().state(), ButtonState::Idle);
    }

    #[test]
    fn test_error_after_success_keeps_latest_state() {
        let button = button();
        let ok = poll_once(run_copy(&button, &FakeClipboard::new(false), "a")).ticket();
        let err = poll_once(run_copy(&button, &FakeClipboard::new(true), "a")).ticket();

        assert!(!button.borrow_mut().revert(ok));
        assert_eq!(button.borrow().state(), ButtonState::Error);
        assert!(button.borrow_mut().revert(err));
        assert_eq!(button.borrow().state(), ButtonState::Idle);
    }

    #[test]
    fn test_settle_started_write() {
        let button = button();
        let clipboard = FakeClipboard::new(false);

        // The write is issued before anything awaits it.
        let write = clipboard.write_text("let x = 1;");
        assert_eq!(clipboard.written.borrow().as_slice(), ["let x = 1;"]);
        assert_eq!(button.borrow().state(), ButtonState::Idle);

        let outcome = poll_once(settle_copy(&button, write, 10));
        assert!(matches!(outcome, CopyOutcome::Copied { chars: 10, .. }));
        assert_eq!(button.borrow().state(), ButtonState::Copied);
    }

    #[test]
    fn test_settle_rejected_write() {
        let button = button();
        let write = std::future::ready(Err(ClipboardError::new("not allowed")));
        let outcome = poll_once(settle_copy(&button, write, 3));
        assert!(matches!(outcome, CopyOutcome::Failed { .. }));
        assert_eq!(button.borrow().state(), ButtonState::Error);
    }

    #[test]
    fn test_revert_delay_from_config() {
        let config = DecorateConfig {
            revert_delay: Duration::from_millis(250),
            ..Default::default()
        };
        assert_eq!(
            CopyButton::new(&config).revert_delay(),
            Duration::from_millis(250)
        );
    }
}
