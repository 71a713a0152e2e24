//! Paginated Cursor Abstraction
//!
//! The messaging platform enumerates threads and messages through cursors:
//! each advance resolves with the next result, an end marker, or an error.
//! Two native cursor shapes exist and are represented as explicit variants
//! of [`CursorStep`] rather than probed by field presence:
//!
//! - **Result-or-null** ([`CursorStep::Next`]): `None` is the end marker.
//!   Used for full enumerations such as threads.
//! - **Done-flagged** ([`CursorStep::Flagged`]): an explicit `done` flag
//!   accompanies each result and is authoritative. Used for filtered
//!   message enumerations.
//!
//! # Example
//!
//! ```ignore
//! use bridge_traits::cursor::{Cursor, CursorStep};
//!
//! async fn count<C: Cursor + ?Sized>(cursor: &mut C) -> usize {
//!     let mut n = 0;
//!     while let Ok(step) = cursor.advance().await {
//!         match step {
//!             CursorStep::Next(Some(_)) => n += 1,
//!             _ => break,
//!         }
//!     }
//!     n
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;

/// Outcome of a single successful cursor advance.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorStep<T> {
    /// Result-or-null cursor: `Some` carries the next item, `None` ends the
    /// enumeration.
    Next(Option<T>),
    /// Done-flagged cursor: when `done` is true the enumeration has ended
    /// and `result` must be ignored.
    Flagged { result: Option<T>, done: bool },
}

impl<T> CursorStep<T> {
    /// Returns `true` if this step ends the enumeration.
    pub fn is_terminal(&self) -> bool {
        match self {
            CursorStep::Next(result) => result.is_none(),
            CursorStep::Flagged { done, .. } => *done,
        }
    }

    /// Returns the item to deliver, if any. Terminal steps never yield one.
    pub fn into_item(self) -> Option<T> {
        match self {
            CursorStep::Next(result) => result,
            CursorStep::Flagged { done: true, .. } => None,
            CursorStep::Flagged { result, done: false } => result,
        }
    }
}

/// Error reported by a cursor after it was successfully opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorError {
    /// Platform error name (e.g. `UnknownError`).
    pub name: String,
    pub message: Option<String>,
}

impl CursorError {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl std::error::Error for CursorError {}

/// Pull-based, paginated data source.
///
/// The future returned by [`advance`](Cursor::advance) resolving plays the
/// role of the platform's success/error callback. Callers never issue a new
/// advance before the previous one resolved. Dropping an unresolved advance
/// abandons it; implementations must tolerate that.
#[async_trait::async_trait]
pub trait Cursor: Send {
    type Item: Send;

    /// Request the next step of the enumeration.
    async fn advance(&mut self) -> std::result::Result<CursorStep<Self::Item>, CursorError>;
}

#[async_trait::async_trait]
impl<C> Cursor for Box<C>
where
    C: Cursor + ?Sized,
{
    type Item = C::Item;

    async fn advance(&mut self) -> std::result::Result<CursorStep<Self::Item>, CursorError> {
        (**self).advance().await
    }
}

/// Boxed thread cursor as handed out by the platform.
pub type ThreadCursor = Box<dyn Cursor<Item = crate::models::Thread>>;

/// Boxed message cursor as handed out by the platform.
pub type MessageCursor = Box<dyn Cursor<Item = crate::models::Message>>;

/// Cursor replaying a fixed script of steps.
///
/// Useful for hosts that already hold results in memory and for tests.
/// Once the script is exhausted every further advance reports the end of
/// the enumeration in the shape of the last step.
#[derive(Debug)]
pub struct ScriptedCursor<T> {
    steps: VecDeque<std::result::Result<CursorStep<T>, CursorError>>,
    flagged: bool,
    advances: usize,
}

impl<T> ScriptedCursor<T> {
    pub fn new(steps: impl IntoIterator<Item = std::result::Result<CursorStep<T>, CursorError>>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            flagged: false,
            advances: 0,
        }
    }

    /// Result-or-null cursor yielding `items` and then `None`.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut steps: VecDeque<_> = items
            .into_iter()
            .map(|item| Ok(CursorStep::Next(Some(item))))
            .collect();
        steps.push_back(Ok(CursorStep::Next(None)));
        Self {
            steps,
            flagged: false,
            advances: 0,
        }
    }

    /// Done-flagged cursor yielding `items` and then `done = true`.
    pub fn flagged_from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut steps: VecDeque<_> = items
            .into_iter()
            .map(|item| {
                Ok(CursorStep::Flagged {
                    result: Some(item),
                    done: false,
                })
            })
            .collect();
        steps.push_back(Ok(CursorStep::Flagged {
            result: None,
            done: true,
        }));
        Self {
            steps,
            flagged: true,
            advances: 0,
        }
    }

    /// Number of advances requested so far.
    pub fn advances(&self) -> usize {
        self.advances
    }
}

#[async_trait::async_trait]
impl<T: Send> Cursor for ScriptedCursor<T> {
    type Item = T;

    async fn advance(&mut self) -> std::result::Result<CursorStep<T>, CursorError> {
        self.advances += 1;
        match self.steps.pop_front() {
            Some(step) => step,
            None if self.flagged => Ok(CursorStep::Flagged {
                result: None,
                done: true,
            }),
            None => Ok(CursorStep::Next(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_detection() {
        assert!(CursorStep::<u8>::Next(None).is_terminal());
        assert!(!CursorStep::Next(Some(1)).is_terminal());
        assert!(CursorStep::Flagged {
            result: Some(1),
            done: true
        }
        .is_terminal());
        assert!(!CursorStep::<u8>::Flagged {
            result: None,
            done: false
        }
        .is_terminal());
    }

    #[test]
    fn test_done_flag_discards_result() {
        let step = CursorStep::Flagged {
            result: Some("ignored"),
            done: true,
        };
        assert_eq!(step.into_item(), None);
    }

    #[test]
    fn test_cursor_error_displays_name() {
        let err = CursorError::new("fake error").with_message("disk on fire");
        assert_eq!(err.to_string(), "fake error");
        assert_eq!(err.message.as_deref(), Some("disk on fire"));
    }

    #[tokio::test]
    async fn test_scripted_cursor_from_items() {
        let mut cursor = ScriptedCursor::from_items(vec![1, 2]);
        assert_eq!(cursor.advance().await, Ok(CursorStep::Next(Some(1))));
        assert_eq!(cursor.advance().await, Ok(CursorStep::Next(Some(2))));
        assert_eq!(cursor.advance().await, Ok(CursorStep::Next(None)));
        assert_eq!(cursor.advance().await, Ok(CursorStep::Next(None)));
        assert_eq!(cursor.advances(), 4);
    }

    #[tokio::test]
    async fn test_scripted_flagged_cursor_stays_done() {
        let mut cursor = ScriptedCursor::flagged_from_items(vec!["a"]);
        assert_eq!(
            cursor.advance().await,
            Ok(CursorStep::Flagged {
                result: Some("a"),
                done: false
            })
        );
        for _ in 0..2 {
            assert!(cursor.advance().await.unwrap().is_terminal());
        }
    }

    #[tokio::test]
    async fn test_boxed_cursor_delegates() {
        let mut cursor: Box<dyn Cursor<Item = u8>> = Box::new(ScriptedCursor::<u8>::new(vec![Err(
            CursorError::new("boom"),
        )]));
        assert_eq!(cursor.advance().await, Err(CursorError::new("boom")));
    }
}
