//! Reactor: the single blocking point of the core.
//!
//! Readiness notification wraps the `polling` crate (epoll/kqueue/IOCP
//! behind one portable API). File-watch wraps `notify`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::Result;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use polling::{Event, Events, PollMode, Poller};
use tracing::{trace, warn};

use core_events::{FileEvent, FileEventKind, FileWatchMask};

pub type InterestId = usize;
pub type WatchId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Read,
    Write,
}

struct Registration {
    fd: RawFd,
    interest: Interest,
}

/// Wraps a `polling::Poller` plus a `notify` watcher behind one
/// register/poll/watch/update API.
pub struct Reactor {
    poller: Poller,
    registrations: HashMap<InterestId, Registration>,
    next_interest: InterestId,
    ready: HashSet<InterestId>,

    watcher: RecommendedWatcher,
    watch_rx: Receiver<notify::Result<notify::Event>>,
    watches: HashMap<WatchId, (PathBuf, FileWatchMask)>,
    path_to_watch: HashMap<PathBuf, WatchId>,
    next_watch: WatchId,
    pending_file_events: VecDeque<FileEvent>,

    /// Set to false from a signal handler to unblock the next `update`.
    pub running: Arc<AtomicBool>,
}

impl Reactor {
    pub fn new() -> Result<Self> {
        let poller = Poller::new()?;
        let (tx, watch_rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |event| {
            let _ = tx.send(event);
        })?;
        Ok(Self {
            poller,
            registrations: HashMap::new(),
            next_interest: 0,
            ready: HashSet::new(),
            watcher,
            watch_rx,
            watches: HashMap::new(),
            path_to_watch: HashMap::new(),
            next_watch: 0,
            pending_file_events: VecDeque::new(),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Register readiness interest in `fd`, returning an opaque id to
    /// query via [`Reactor::poll_event`] after the next [`Reactor::update`].
    pub fn register_interest(&mut self, fd: RawFd, interest: Interest) -> Result<InterestId> {
        let id = self.next_interest;
        self.next_interest += 1;
        let event = match interest {
            Interest::Read => Event::readable(id),
            Interest::Write => Event::writable(id),
        };
        // Safety: `fd` must stay open and registered for as long as it is
        // held by the poller; the caller owns `fd`'s lifetime and is
        // expected to `unregister_interest` before closing it.
        unsafe {
            let borrowed = BorrowedFd::borrow_raw(fd);
            self.poller.add_with_mode(borrowed.as_raw_fd(), event, PollMode::Oneshot)?;
        }
        self.registrations.insert(id, Registration { fd, interest });
        Ok(id)
    }

    pub fn unregister_interest(&mut self, id: InterestId) -> Result<()> {
        if let Some(registration) = self.registrations.remove(&id) {
            unsafe {
                let borrowed = BorrowedFd::borrow_raw(registration.fd);
                self.poller.delete(borrowed.as_raw_fd())?;
            }
        }
        self.ready.remove(&id);
        Ok(())
    }

    /// True iff the last `update` reported readiness for `id`.
    pub fn poll_event(&self, id: InterestId) -> bool {
        self.ready.contains(&id)
    }

    pub fn watch_file(&mut self, path: impl Into<PathBuf>, mask: FileWatchMask) -> Result<WatchId> {
        let path = path.into();
        self.watcher.watch(&path, RecursiveMode::NonRecursive)?;
        let id = self.next_watch;
        self.next_watch += 1;
        self.path_to_watch.insert(path.clone(), id);
        self.watches.insert(id, (path, mask));
        Ok(id)
    }

    pub fn unwatch_file(&mut self, id: WatchId) -> Result<()> {
        if let Some((path, _)) = self.watches.remove(&id) {
            self.path_to_watch.remove(&path);
            let _ = self.watcher.unwatch(&path);
        }
        Ok(())
    }

    /// Drain one pending file event into `out`, returning whether one was
    /// available.
    pub fn next_file_event(&mut self, out: &mut Option<FileEvent>) -> bool {
        if let Some(event) = self.pending_file_events.pop_front() {
            *out = Some(event);
            true
        } else {
            *out = None;
            false
        }
    }

    /// Block until at least one readiness or file-watch event, then record
    /// the batch. This is the sole blocking point in the core.
    pub fn update(&mut self) -> Result<()> {
        self.ready.clear();
        let mut events = Events::new();
        // A short timeout keeps the loop responsive to file-watch events
        // that arrive on notify's own background thread, and to the
        // `running` flag being cleared by a signal handler.
        let timed_out = self.poller.wait(&mut events, Some(Duration::from_millis(200)))? == 0;

        for event in events.iter() {
            self.ready.insert(event.key);
            // Oneshot mode requires re-arming for the next tick.
            if let Some(registration) = self.registrations.get(&event.key) {
                let ev = match registration.interest {
                    Interest::Read => Event::readable(event.key),
                    Interest::Write => Event::writable(event.key),
                };
                unsafe {
                    let borrowed = BorrowedFd::borrow_raw(registration.fd);
                    let _ = self.poller.modify_with_mode(borrowed.as_raw_fd(), ev, PollMode::Oneshot);
                }
            }
        }

        if timed_out {
            trace!("reactor update timed out with no readiness events");
        }

        self.drain_watch_events();
        Ok(())
    }

    fn drain_watch_events(&mut self) {
        while let Ok(result) = self.watch_rx.try_recv() {
            match result {
                Ok(event) => self.translate_watch_event(event),
                Err(err) => warn!(%err, "file watcher error"),
            }
        }
    }

    fn translate_watch_event(&mut self, event: notify::Event) {
        for path in &event.paths {
            let Some(&watch_id) = self.path_to_watch.get(path) else {
                continue;
            };
            let Some((_, mask)) = self.watches.get(&watch_id) else {
                continue;
            };
            match event.kind {
                EventKind::Modify(_) if mask.contains(FileWatchMask::WRITTEN) => {
                    self.pending_file_events.push_back(FileEvent {
                        watch_id,
                        kind: FileEventKind::Written,
                    });
                }
                EventKind::Remove(_) if mask.contains(FileWatchMask::REMOVED) => {
                    self.pending_file_events.push_back(FileEvent {
                        watch_id,
                        kind: FileEventKind::Removed,
                    });
                    self.pending_file_events.push_back(FileEvent {
                        watch_id,
                        kind: FileEventKind::LastEvent,
                    });
                }
                _ => {}
            }
        }
    }

    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn watch_file_and_detect_write() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        let mut reactor = Reactor::new().unwrap();
        let watch_id = reactor.watch_file(&path, FileWatchMask::WRITTEN).unwrap();

        std::fs::OpenOptions::new().append(true).open(&path).unwrap().write_all(b"more").unwrap();

        // notify delivers asynchronously; poll briefly for the event.
        let mut found = false;
        for _ in 0..50 {
            reactor.drain_watch_events();
            let mut out = None;
            if reactor.next_file_event(&mut out) {
                if let Some(event) = out {
                    if event.watch_id == watch_id && event.kind == FileEventKind::Written {
                        found = true;
                        break;
                    }
                }
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(found);
    }

    #[test]
    fn running_flag_starts_true_and_request_stop_clears_it() {
        let reactor = Reactor::new().unwrap();
        assert!(reactor.is_running());
        reactor.request_stop();
        assert!(!reactor.is_running());
    }
}
