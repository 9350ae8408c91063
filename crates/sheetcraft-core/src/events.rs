#![forbid(unsafe_code)]

//! Typed publish/subscribe channel for board events.
//!
//! # Design
//!
//! [`EventChannel<E>`] is a single-threaded fan-out: a shared
//! (`Rc<RefCell<..>>`) list of weak subscriber callbacks. Publishing calls every
//! live subscriber in registration order. Subscribers are handed out as
//! [`Subscription`] guards; dropping the guard unsubscribes.
//!
//! Components that used to signal each other through page-global events
//! (section resized, character deleted, toast notifications) receive a clone of
//! the channel instead.
//!
//! # Failure Modes
//!
//! - **Publishing from a subscriber**: allowed. The callback list is
//!   snapshotted before dispatch, so nested publishes run to completion
//!   before the outer dispatch continues.
//! - **Subscriber leak**: guards stored forever keep their callbacks alive.
//!   Dead weak references are pruned lazily during `publish()`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;
use web_time::Instant;

use crate::ids::{SectionId, SectionType};
use crate::slot::Section;

type CallbackRc<E> = Rc<dyn Fn(&E)>;
type CallbackWeak<E> = Weak<dyn Fn(&E)>;

struct ChannelInner<E> {
    subscribers: Vec<CallbackWeak<E>>,
    published: u64,
}

/// Shared, typed event channel.
///
/// Cloning creates a new handle to the **same** subscriber list.
pub struct EventChannel<E> {
    inner: Rc<RefCell<ChannelInner<E>>>,
}

impl<E> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventChannel")
            .field("subscriber_count", &inner.subscribers.len())
            .field("published", &inner.published)
            .finish()
    }
}

impl<E: 'static> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventChannel<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ChannelInner {
                subscribers: Vec::new(),
                published: 0,
            })),
        }
    }

    /// Register `callback`. It stays registered while the returned guard lives.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong: CallbackRc<E> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Deliver `event` to every live subscriber.
    pub fn publish(&self, event: &E) {
        let callbacks: Vec<CallbackRc<E>> = {
            let mut inner = self.inner.borrow_mut();
            inner.published += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect()
        };
        if callbacks.is_empty() {
            return;
        }

        let start = Instant::now();
        for cb in &callbacks {
            cb(event);
        }
        trace!(
            subscribers = callbacks.len() as u64,
            duration_us = start.elapsed().as_micros() as u64,
            "event channel publish"
        );
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Events published since creation.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.inner.borrow().published
    }
}

/// RAII guard for a subscriber callback.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum NoticeLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Transient message for the user (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Everything a [`crate::board::SlotBoard`] announces.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// Palette drop created a section; open its editor.
    SectionCreated { section: Section, index: usize },
    SectionMoved { id: SectionId, from: usize, to: usize },
    SectionsReordered { id: SectionId, from: usize, to: usize },
    SectionDeleted {
        id: SectionId,
        section_type: SectionType,
        index: usize,
    },
    /// Collapse state changed, so the rendered height did.
    SectionResized { id: SectionId, collapsed: bool },
    ContentChanged { id: SectionId },
    CharacterDeleted { character_id: String },
    Notify(Notice),
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn subscribers_receive_in_registration_order() {
        let channel: EventChannel<u32> = EventChannel::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _a = channel.subscribe(move |v| l1.borrow_mut().push(("a", *v)));
        let l2 = Rc::clone(&log);
        let _b = channel.subscribe(move |v| l2.borrow_mut().push(("b", *v)));

        channel.publish(&7);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
        assert_eq!(channel.published(), 1);
    }

    #[test]
    fn dropping_guard_unsubscribes() {
        let channel: EventChannel<u32> = EventChannel::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = channel.subscribe(move |_| h.set(h.get() + 1));

        channel.publish(&1);
        drop(sub);
        channel.publish(&2);

        assert_eq!(hits.get(), 1);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn clones_share_subscribers() {
        let channel: EventChannel<&'static str> = EventChannel::new();
        let other = channel.clone();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        let _sub = channel.subscribe(move |v| *s.borrow_mut() = Some(*v));

        other.publish(&"hello");
        assert_eq!(*seen.borrow(), Some("hello"));
    }

    #[test]
    fn publish_from_subscriber_does_not_panic() {
        let channel: EventChannel<u32> = EventChannel::new();
        let inner = channel.clone();
        let total = Rc::new(Cell::new(0));
        let t = Rc::clone(&total);
        let _sub = channel.subscribe(move |v| {
            t.set(t.get() + v);
            if *v > 1 {
                inner.publish(&(v - 1));
            }
        });

        channel.publish(&3);
        assert_eq!(total.get(), 6);
    }

    #[test]
    fn notice_helpers_set_level() {
        assert_eq!(Notice::error("x").level, NoticeLevel::Error);
        assert_eq!(Notice::info("x").level, NoticeLevel::Info);
    }
}
