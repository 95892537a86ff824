//! Navigation and position sync.
//!
//! After every page change the controller reads the live instance's position
//! and pushes it to the session, the mode's page widgets, and the background.
//! The background is never swapped straight away: its asset is preloaded
//! first and swapped in only when that load succeeds, so the shell never shows
//! a half-decoded image.

use crate::assets::{AssetLoader, ImageSize, LoadPurpose};
use crate::display::{PageInput, ViewerDisplay};
use crate::engine::PageFlipEngine;
use crate::error::AssetError;
use crate::events::EventQueue;
use crate::mode::ViewerMode;
use crate::page::ContentRef;
use crate::session::ViewerSession;
use flipbook_scheduler::{TaskId, TaskRegistry};
use log::debug;

/// Position reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 0-based index from the engine
    pub page_index: u32,
    pub page_count: u32,
}

impl Position {
    pub fn read<E: PageFlipEngine>(engine: &E) -> Self {
        Self { page_index: engine.current_page_index(), page_count: engine.page_count() }
    }

    /// 1-based number shown to the reader.
    pub fn page_number(&self) -> u32 {
        self.page_index + 1
    }
}

/// Record `position` in the session and the widgets of `mode`.
pub fn apply_position(
    mode: ViewerMode,
    position: Position,
    session: &mut ViewerSession,
    display: &mut ViewerDisplay,
) {
    session.set_current_page_index(position.page_index);

    let current = position.page_number();
    let total = position.page_count;

    match mode {
        ViewerMode::Desktop => {
            display.page_input = Some(PageInput { value: current, max: total });
            display.page_label = Some(format!(" / {total}"));
            display.book_open = position.page_index != 0;
        }
        ViewerMode::Mobile => {
            display.compact_indicator = Some(format!("{current} / {total}"));
        }
    }
}

/// Preload-then-swap for the background image.
///
/// At most one preload is outstanding. Requesting a different asset cancels
/// the previous preload, so a slow load for a page the reader already left
/// can never overwrite the current background.
#[derive(Debug, Default)]
pub struct BackgroundSync {
    pending: Option<(TaskId, ContentRef)>,
}

impl BackgroundSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start preloading `asset` unless it is already shown or in flight.
    pub fn request<L: AssetLoader>(
        &mut self,
        asset: ContentRef,
        display: &ViewerDisplay,
        loads: &mut TaskRegistry<LoadPurpose>,
        loader: &mut L,
        events: &EventQueue,
    ) -> Option<TaskId> {
        match &self.pending {
            Some((_, pending)) if *pending == asset => return None,
            None if display.background.as_ref() == Some(&asset) => return None,
            _ => {}
        }

        if let Some((stale, _)) = self.pending.take() {
            loads.cancel(stale);
        }

        let task = loads.register(LoadPurpose::Background(asset.clone()));
        self.pending = Some((task, asset.clone()));
        loader.load(&asset, events.completer(task));
        Some(task)
    }

    /// Finish the preload `task` for `asset`. Returns `true` if the background changed.
    pub fn complete(
        &mut self,
        task: TaskId,
        asset: ContentRef,
        outcome: Result<ImageSize, AssetError>,
        display: &mut ViewerDisplay,
    ) -> bool {
        if matches!(&self.pending, Some((pending, _)) if *pending == task) {
            self.pending = None;
        }

        match outcome {
            Ok(_) => {
                display.background = Some(asset);
                true
            }
            Err(error) => {
                debug!("background preload of {asset} failed: {error}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LoadCompleter, ViewerEvent};

    #[derive(Default)]
    struct HeldLoader {
        requests: Vec<(ContentRef, LoadCompleter)>,
    }

    impl AssetLoader for HeldLoader {
        fn load(&mut self, asset: &ContentRef, done: LoadCompleter) {
            self.requests.push((asset.clone(), done));
        }
    }

    fn position(page_index: u32) -> Position {
        Position { page_index, page_count: 44 }
    }

    #[test]
    fn test_desktop_position_updates_input_and_open_flag() {
        let mut session = ViewerSession::new(44, 0.707);
        let mut display = ViewerDisplay::default();

        apply_position(ViewerMode::Desktop, position(0), &mut session, &mut display);
        assert_eq!(display.page_input, Some(PageInput { value: 1, max: 44 }));
        assert_eq!(display.page_label.as_deref(), Some(" / 44"));
        assert!(!display.book_open);

        apply_position(ViewerMode::Desktop, position(43), &mut session, &mut display);
        assert_eq!(session.current_page_index(), 43);
        assert_eq!(display.page_input, Some(PageInput { value: 44, max: 44 }));
        assert!(display.book_open);
        assert_eq!(display.compact_indicator, None);
    }

    #[test]
    fn test_mobile_position_updates_compact_indicator_only() {
        let mut session = ViewerSession::new(44, 0.707);
        let mut display = ViewerDisplay::default();

        apply_position(ViewerMode::Mobile, position(2), &mut session, &mut display);

        assert_eq!(display.compact_indicator.as_deref(), Some("3 / 44"));
        assert_eq!(display.page_input, None);
        assert!(!display.book_open);
    }

    #[test]
    fn test_background_swaps_only_after_preload() {
        let mut sync = BackgroundSync::new();
        let mut display = ViewerDisplay::default();
        let mut loads = TaskRegistry::new();
        let mut loader = HeldLoader::default();
        let events = EventQueue::new();
        let asset = ContentRef::new("ebook/page_2.webp");

        let task = sync
            .request(asset.clone(), &display, &mut loads, &mut loader, &events)
            .expect("preload should start");
        assert_eq!(display.background, None);
        assert_eq!(sync.pending, Some((task, asset.clone())));

        let (_, done) = loader.requests.pop().expect("loader should receive request");
        done.succeed(ImageSize::new(707, 1000));
        let Some(ViewerEvent::AssetLoaded { task: finished, outcome }) = events.pop() else {
            panic!("expected asset event");
        };
        assert_eq!(finished, task);

        let Some(LoadPurpose::Background(loaded)) = loads.complete(finished) else {
            panic!("expected background purpose");
        };
        assert!(sync.complete(finished, loaded, outcome, &mut display));
        assert_eq!(display.background, Some(asset));
        assert_eq!(sync.pending, None);
    }

    #[test]
    fn test_failed_preload_keeps_background() {
        let mut sync = BackgroundSync::new();
        let mut display = ViewerDisplay { background: Some(ContentRef::new("a")), ..ViewerDisplay::default() };

        let changed = sync.complete(
            TaskId(1),
            ContentRef::new("b"),
            Err(AssetError::NotFound("b".to_owned())),
            &mut display,
        );

        assert!(!changed);
        assert_eq!(display.background, Some(ContentRef::new("a")));
    }

    #[test]
    fn test_newer_request_cancels_stale_preload() {
        let mut sync = BackgroundSync::new();
        let display = ViewerDisplay::default();
        let mut loads = TaskRegistry::new();
        let mut loader = HeldLoader::default();
        let events = EventQueue::new();

        let first = sync
            .request(ContentRef::new("p1"), &display, &mut loads, &mut loader, &events)
            .expect("first preload");
        let second = sync
            .request(ContentRef::new("p2"), &display, &mut loads, &mut loader, &events)
            .expect("second preload");

        assert!(!loads.contains(first));
        assert!(loads.contains(second));
        assert_eq!(loader.requests.len(), 2);
    }

    #[test]
    fn test_duplicate_requests_are_skipped() {
        let mut sync = BackgroundSync::new();
        let mut loads = TaskRegistry::new();
        let mut loader = HeldLoader::default();
        let events = EventQueue::new();
        let shown = ViewerDisplay { background: Some(ContentRef::new("p1")), ..ViewerDisplay::default() };

        assert!(sync.request(ContentRef::new("p1"), &shown, &mut loads, &mut loader, &events).is_none());

        sync.request(ContentRef::new("p2"), &shown, &mut loads, &mut loader, &events);
        assert!(sync.request(ContentRef::new("p2"), &shown, &mut loads, &mut loader, &events).is_none());
        assert_eq!(loader.requests.len(), 1);
    }
}
