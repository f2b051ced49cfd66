//! Link Preview Controller: the hover-to-preview state machine.
//!
//! Host-agnostic: callers feed pointer, key and embed events in and render
//! `modals()` out. Time is passed in explicitly (`now`) so the hover delay and
//! the copied-indicator reset are deadlines checked by `tick`, not timers.
//!
//! States: idle (nothing pending, no modals), hovering (a link is waiting
//! out the hover delay), previewing (modals open, none focused) and focused
//! (one modal is rendered full-viewport and receives keyboard navigation).
//!
//! Window management on top of that: snapping to nine viewport regions,
//! minimizing to a taskbar, pinning, and resetting to the default frame.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::preview::domains::{domain_of, is_non_link, LinkClassifier};
use crate::preview::preferences::PreviewPreferences;

pub const HOVER_DELAY: Duration = Duration::from_millis(500);
pub const COPIED_RESET: Duration = Duration::from_millis(2000);
pub const DEFAULT_MODAL_SIZE: Size = Size {
    width: 600.0,
    height: 500.0,
};

/// Stable identity of a rendered link element.
pub type LinkId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Gap kept between a snapped modal and the viewport edges.
const ZOOM_PADDING: f64 = 10.0;

/// Viewport regions a modal can snap to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoomPosition {
    TopLeft,
    Top,
    TopRight,
    Left,
    Full,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl ZoomPosition {
    /// Keyboard layout: the `qwe`/`afd`/`zsx` block maps onto the 3x3 grid.
    pub fn from_shortcut(key: char) -> Option<Self> {
        match key {
            'q' => Some(ZoomPosition::TopLeft),
            'w' => Some(ZoomPosition::Top),
            'e' => Some(ZoomPosition::TopRight),
            'a' => Some(ZoomPosition::Left),
            'f' => Some(ZoomPosition::Full),
            'd' => Some(ZoomPosition::Right),
            'z' => Some(ZoomPosition::BottomLeft),
            's' => Some(ZoomPosition::Bottom),
            'x' => Some(ZoomPosition::BottomRight),
            _ => None,
        }
    }

    /// Top-left corner and size of this region within `viewport`.
    pub fn frame(self, viewport: Size) -> (Point, Size) {
        let p = ZOOM_PADDING;
        let half_w = viewport.width / 2.0 - p * 1.5;
        let half_h = viewport.height / 2.0 - p * 1.5;
        let full_w = viewport.width - p * 2.0;
        let full_h = viewport.height - p * 2.0;
        let right_x = viewport.width / 2.0 + p / 2.0;
        let bottom_y = viewport.height / 2.0 + p / 2.0;

        let (x, y, width, height) = match self {
            ZoomPosition::TopLeft => (p, p, half_w, half_h),
            ZoomPosition::Top => (p, p, full_w, half_h),
            ZoomPosition::TopRight => (right_x, p, half_w, half_h),
            ZoomPosition::Left => (p, p, half_w, full_h),
            ZoomPosition::Full => (p, p, full_w, full_h),
            ZoomPosition::Right => (right_x, p, half_w, full_h),
            ZoomPosition::BottomLeft => (p, bottom_y, half_w, half_h),
            ZoomPosition::Bottom => (p, bottom_y, full_w, half_h),
            ZoomPosition::BottomRight => (right_x, bottom_y, half_w, half_h),
        };
        (Point { x, y }, Size { width, height })
    }
}

/// A link the pointer can hover.
#[derive(Debug, Clone)]
pub struct LinkTarget {
    pub id: LinkId,
    pub href: String,
    pub text: String,
    /// The link carries an explicit no-preview marker.
    pub opted_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedState {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewModal {
    pub id: String,
    pub url: String,
    pub title: String,
    pub position: Point,
    pub size: Size,
    pub is_full_screen: bool,
    pub embed: EmbedState,
    pub is_pinned: bool,
    /// Hidden from the viewport and listed in the taskbar instead.
    pub is_minimized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomPosition>,
    /// Frame to return to when a snap or minimize is undone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_size: Option<Size>,
}

impl PreviewModal {
    /// Set once the embed failed: render an "open in new tab" link instead.
    pub fn fallback_url(&self) -> Option<&str> {
        (self.embed == EmbedState::Failed).then_some(self.url.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub alt: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self { key, alt: false }
    }

    pub fn alt(key: Key) -> Self {
        Self { key, alt: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverOutcome {
    /// The link opted out or was already known to be non-previewable.
    Ignored,
    /// The link is not previewable; it is remembered and never re-evaluated.
    Skipped,
    /// A hover timer started for this link.
    Pending,
    /// The hover timer for this link is already running.
    AlreadyPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Idle,
    Hovering,
    Previewing,
    Focused,
}

#[derive(Debug)]
struct PendingHover {
    link: LinkTarget,
    deadline: Instant,
}

#[derive(Debug)]
struct Drag {
    id: String,
    offset: Point,
}

pub struct LinkPreviewController {
    prefs: PreviewPreferences,
    classifier: LinkClassifier,
    viewport: Size,
    /// Render order: later modals are drawn on top.
    modals: Vec<PreviewModal>,
    open_urls: HashSet<String>,
    skipped_links: HashSet<LinkId>,
    pending: Option<PendingHover>,
    focused: Option<usize>,
    drag: Option<Drag>,
    copied_until: Option<Instant>,
    last_id_millis: i64,
}

impl LinkPreviewController {
    pub fn new(prefs: PreviewPreferences, classifier: LinkClassifier, viewport: Size) -> Self {
        Self {
            prefs,
            classifier,
            viewport,
            modals: Vec::new(),
            open_urls: HashSet::new(),
            skipped_links: HashSet::new(),
            pending: None,
            focused: None,
            drag: None,
            copied_until: None,
            last_id_millis: 0,
        }
    }

    /// Builds a controller from the preferences persisted at `path`.
    pub async fn load(path: &Path, classifier: LinkClassifier, viewport: Size) -> Self {
        Self::new(PreviewPreferences::load(path).await, classifier, viewport)
    }

    pub fn preferences(&self) -> PreviewPreferences {
        self.prefs
    }

    pub fn state(&self) -> PreviewState {
        if self.focused.is_some() {
            PreviewState::Focused
        } else if !self.modals.is_empty() {
            PreviewState::Previewing
        } else if self.pending.is_some() {
            PreviewState::Hovering
        } else {
            PreviewState::Idle
        }
    }

    pub fn modals(&self) -> &[PreviewModal] {
        &self.modals
    }

    pub fn modal(&self, id: &str) -> Option<&PreviewModal> {
        self.modals.iter().find(|m| m.id == id)
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    pub fn focused_modal(&self) -> Option<&PreviewModal> {
        self.focused.and_then(|i| self.modals.get(i))
    }

    /// Modals drawn in the viewport, in render order.
    pub fn visible_modals(&self) -> impl Iterator<Item = &PreviewModal> {
        self.modals.iter().filter(|m| !m.is_minimized)
    }

    /// Modals parked in the taskbar.
    pub fn minimized_modals(&self) -> impl Iterator<Item = &PreviewModal> {
        self.modals.iter().filter(|m| m.is_minimized)
    }

    pub fn is_open(&self, url: &str) -> bool {
        self.open_urls.contains(url)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_skipped(&self, link: LinkId) -> bool {
        self.skipped_links.contains(&link)
    }

    pub fn should_preview(&self, url: &str) -> bool {
        self.classifier.previewable(url, self.prefs.effective_mode())
    }

    // ── Hover ───────────────────────────────────────────────────────────────

    pub fn pointer_over(&mut self, link: &LinkTarget, now: Instant) -> HoverOutcome {
        if link.opted_out || self.skipped_links.contains(&link.id) {
            return HoverOutcome::Ignored;
        }
        if !self.should_preview(&link.href) {
            self.skipped_links.insert(link.id);
            return HoverOutcome::Skipped;
        }
        if self.pending.as_ref().is_some_and(|p| p.link.id == link.id) {
            return HoverOutcome::AlreadyPending;
        }
        // Hovering a different link supersedes whatever was pending.
        self.pending = Some(PendingHover {
            link: link.clone(),
            deadline: now + HOVER_DELAY,
        });
        HoverOutcome::Pending
    }

    pub fn pointer_out(&mut self, link: LinkId) {
        if self.pending.as_ref().is_some_and(|p| p.link.id == link) {
            self.pending = None;
        }
    }

    /// Advances timers. Returns the id of a modal opened by an expired hover.
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        if self.copied_until.is_some_and(|until| now >= until) {
            self.copied_until = None;
        }
        if !self.pending.as_ref().is_some_and(|p| now >= p.deadline) {
            return None;
        }
        let link = self.pending.take()?.link;
        self.open(&link.href, &link.text)
    }

    // ── Modal lifecycle ─────────────────────────────────────────────────────

    /// Opens a modal for `url`, unless it is not previewable or already open.
    /// `title` falls back to the link's domain.
    pub fn open(&mut self, url: &str, title: &str) -> Option<String> {
        if is_non_link(url) || !self.should_preview(url) {
            return None;
        }
        if self.open_urls.contains(url) {
            debug!("Modal for {url} already open");
            return None;
        }

        let title = match title.trim() {
            "" => domain_of(url),
            t => t.to_string(),
        };
        let size = DEFAULT_MODAL_SIZE;
        let position = self.clamp(
            Point {
                x: (self.viewport.width - size.width) / 2.0,
                y: (self.viewport.height - size.height) / 2.0,
            },
            size,
        );
        let id = self.next_id();

        debug!("Opening preview {id} for {url}");
        self.modals.push(PreviewModal {
            id: id.clone(),
            url: url.to_string(),
            title,
            position,
            size,
            is_full_screen: false,
            embed: EmbedState::Loading,
            is_pinned: false,
            is_minimized: false,
            zoom: None,
            saved_position: None,
            saved_size: None,
        });
        self.open_urls.insert(url.to_string());
        Some(id)
    }

    pub fn close(&mut self, id: &str) -> bool {
        let Some(index) = self.modals.iter().position(|m| m.id == id) else {
            return false;
        };
        let modal = self.modals.remove(index);
        self.open_urls.remove(&modal.url);
        if self.drag.as_ref().is_some_and(|d| d.id == id) {
            self.drag = None;
        }

        if let Some(focused) = self.focused {
            self.focused = if self.modals.is_empty() {
                None
            } else if index == focused {
                Some(focused.saturating_sub(1))
            } else if index < focused {
                Some(focused - 1)
            } else {
                Some(focused)
            };
        }
        debug!("Closed preview {id}");
        true
    }

    pub fn close_all(&mut self) {
        self.modals.clear();
        self.open_urls.clear();
        self.focused = None;
        self.drag = None;
    }

    pub fn toggle_full_screen(&mut self, index: usize) -> bool {
        match self.modals.get_mut(index) {
            Some(modal) => {
                modal.is_full_screen = !modal.is_full_screen;
                true
            }
            None => false,
        }
    }

    // ── Window management ───────────────────────────────────────────────────

    /// Snaps modal `index` to `zoom`, or with `None` puts it back where it
    /// was before snapping. The pre-snap frame is saved only when leaving the
    /// unsnapped state, so hopping between regions still returns home.
    pub fn zoom_to(&mut self, index: usize, zoom: Option<ZoomPosition>) -> bool {
        let viewport = self.viewport;
        let Some(modal) = self.modals.get_mut(index) else {
            return false;
        };
        match zoom {
            None => {
                modal.position = modal.saved_position.unwrap_or(modal.position);
                modal.size = modal.saved_size.unwrap_or(modal.size);
            }
            Some(region) => {
                if modal.zoom.is_none() {
                    modal.saved_position = Some(modal.position);
                    modal.saved_size = Some(modal.size);
                }
                (modal.position, modal.size) = region.frame(viewport);
            }
        }
        modal.zoom = zoom;
        true
    }

    /// Resets modal `index` to the default size, centred and unsnapped.
    pub fn restore_size(&mut self, index: usize) -> bool {
        let size = DEFAULT_MODAL_SIZE;
        let position = self.clamp(
            Point {
                x: (self.viewport.width - size.width) / 2.0,
                y: (self.viewport.height - size.height) / 2.0,
            },
            size,
        );
        let Some(modal) = self.modals.get_mut(index) else {
            return false;
        };
        modal.zoom = None;
        modal.size = size;
        modal.position = position;
        true
    }

    /// Parks modal `index` in the taskbar. A minimized modal cannot keep focus
    /// or stay in a drag.
    pub fn minimize(&mut self, index: usize) -> bool {
        let Some(modal) = self.modals.get_mut(index) else {
            return false;
        };
        modal.is_minimized = true;
        modal.saved_position.get_or_insert(modal.position);
        modal.saved_size.get_or_insert(modal.size);
        let id = modal.id.clone();

        if self.focused == Some(index) {
            self.focused = None;
        }
        if self.drag.as_ref().is_some_and(|d| d.id == id) {
            self.drag = None;
        }
        true
    }

    /// Brings modal `index` back from the taskbar with its frame unchanged.
    pub fn restore(&mut self, index: usize) -> bool {
        match self.modals.get_mut(index) {
            Some(modal) if modal.is_minimized => {
                modal.is_minimized = false;
                true
            }
            _ => false,
        }
    }

    pub fn toggle_pin(&mut self, index: usize) -> bool {
        match self.modals.get_mut(index) {
            Some(modal) => {
                modal.is_pinned = !modal.is_pinned;
                true
            }
            None => false,
        }
    }

    pub fn set_pinned_all(&mut self, pinned: bool) {
        for modal in &mut self.modals {
            modal.is_pinned = pinned;
        }
    }

    pub fn embed_loaded(&mut self, id: &str) {
        if let Some(modal) = self.modals.iter_mut().find(|m| m.id == id) {
            modal.embed = EmbedState::Loaded;
        }
    }

    pub fn embed_failed(&mut self, id: &str) {
        if let Some(modal) = self.modals.iter_mut().find(|m| m.id == id) {
            warn!("Preview embed failed for {}", modal.url);
            modal.embed = EmbedState::Failed;
        }
    }

    // ── Focus & keyboard ────────────────────────────────────────────────────

    pub fn focus(&mut self, index: usize) -> bool {
        if !self.modals.get(index).is_some_and(|m| !m.is_minimized) {
            return false;
        }
        self.focused = Some(index);
        true
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    /// Keys only act while a modal is focused. Returns whether the key was
    /// consumed.
    ///
    /// `c` toggles the pin (Alt+`c` applies the focused modal's flipped pin to
    /// every modal), `t` minimizes, `r` undoes a snap, and the `qwe`/`afd`/`zsx`
    /// block snaps to a region.
    pub fn handle_key(&mut self, press: KeyPress) -> bool {
        let Some(focused) = self.focused else {
            return false;
        };
        let Some(pinned) = self.modals.get(focused).map(|m| m.is_pinned) else {
            return false;
        };
        match press.key {
            Key::Escape if press.alt => self.close_all(),
            Key::Escape => self.clear_focus(),
            Key::ArrowLeft => return self.navigate(focused, false),
            Key::ArrowRight => return self.navigate(focused, true),
            Key::Char('c') if press.alt => self.set_pinned_all(!pinned),
            Key::Char('c') => return self.toggle_pin(focused),
            Key::Char('t') => return self.minimize(focused),
            Key::Char('r') => return self.zoom_to(focused, None),
            Key::Char(other) => match ZoomPosition::from_shortcut(other) {
                Some(region) => return self.zoom_to(focused, Some(region)),
                None => return false,
            },
        }
        true
    }

    /// Moves focus to the next or previous visible modal, wrapping around.
    /// Minimized modals are skipped; fewer than two visible is a no-op.
    fn navigate(&mut self, focused: usize, forward: bool) -> bool {
        let visible: Vec<usize> = (0..self.modals.len())
            .filter(|&i| !self.modals[i].is_minimized)
            .collect();
        let n = visible.len();
        if n <= 1 {
            return false;
        }
        let Some(at) = visible.iter().position(|&i| i == focused) else {
            return false;
        };
        let next = if forward { (at + 1) % n } else { (at + n - 1) % n };
        self.focused = Some(visible[next]);
        true
    }

    // ── Drag ────────────────────────────────────────────────────────────────

    /// Starts dragging modal `id` from `pointer`. Only the drag handle starts
    /// a drag, full-screen, snapped and minimized modals never move, and one
    /// drag runs at a time. The dragged modal is raised to the top.
    pub fn begin_drag(&mut self, id: &str, pointer: Point, on_handle: bool) -> bool {
        if !on_handle || self.drag.is_some() {
            return false;
        }
        let Some(index) = self.modals.iter().position(|m| m.id == id) else {
            return false;
        };
        let modal = &self.modals[index];
        if modal.is_full_screen || modal.is_minimized || modal.zoom.is_some() {
            return false;
        }

        let modal = self.modals.remove(index);
        let offset = Point {
            x: pointer.x - modal.position.x,
            y: pointer.y - modal.position.y,
        };
        self.modals.push(modal);

        let last = self.modals.len() - 1;
        self.focused = self.focused.map(|f| match f {
            f if f == index => last,
            f if f > index => f - 1,
            f => f,
        });
        self.drag = Some(Drag {
            id: id.to_string(),
            offset,
        });
        true
    }

    pub fn drag_to(&mut self, pointer: Point) {
        let Some(drag) = &self.drag else {
            return;
        };
        let Some(index) = self.modals.iter().position(|m| m.id == drag.id) else {
            return;
        };
        let target = Point {
            x: pointer.x - drag.offset.x,
            y: pointer.y - drag.offset.y,
        };
        let size = self.modals[index].size;
        self.modals[index].position = self.clamp(target, size);
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    // ── Copy indicator ──────────────────────────────────────────────────────

    pub fn mark_copied(&mut self, now: Instant) {
        self.copied_until = Some(now + COPIED_RESET);
    }

    pub fn is_copied(&self) -> bool {
        self.copied_until.is_some()
    }

    fn clamp(&self, p: Point, size: Size) -> Point {
        let max_x = (self.viewport.width - size.width).max(0.0);
        let max_y = (self.viewport.height - size.height).max(0.0);
        Point {
            x: p.x.clamp(0.0, max_x),
            y: p.y.clamp(0.0, max_y),
        }
    }

    /// `popup-<millis>`, bumped when two modals open within the same millisecond.
    fn next_id(&mut self) -> String {
        let millis = chrono::Utc::now()
            .timestamp_millis()
            .max(self.last_id_millis + 1);
        self.last_id_millis = millis;
        format!("popup-{millis}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::preferences::PreviewMode;

    const VIEWPORT: Size = Size {
        width: 1200.0,
        height: 800.0,
    };

    fn controller(mode: PreviewMode) -> LinkPreviewController {
        LinkPreviewController::new(
            PreviewPreferences {
                enabled: true,
                mode,
            },
            LinkClassifier::new("example.org"),
            VIEWPORT,
        )
    }

    fn link(id: LinkId, href: &str) -> LinkTarget {
        LinkTarget {
            id,
            href: href.to_string(),
            text: format!("link {id}"),
            opted_out: false,
        }
    }

    fn open_n(c: &mut LinkPreviewController, n: usize) -> Vec<String> {
        (0..n)
            .map(|i| {
                c.open(&format!("https://site{i}.net/"), "")
                    .expect("previewable")
            })
            .collect()
    }

    #[test]
    fn test_hover_opens_after_delay() {
        let mut c = controller(PreviewMode::External);
        let t0 = Instant::now();
        let l = link(1, "https://en.wikipedia.org/wiki/Rust");

        assert_eq!(c.pointer_over(&l, t0), HoverOutcome::Pending);
        assert_eq!(c.state(), PreviewState::Hovering);
        assert_eq!(c.tick(t0 + Duration::from_millis(499)), None);

        let id = c.tick(t0 + HOVER_DELAY).expect("modal opened");
        assert_eq!(c.state(), PreviewState::Previewing);
        let modal = c.modal(&id).unwrap();
        assert_eq!(modal.title, "link 1");
        assert_eq!(modal.size, DEFAULT_MODAL_SIZE);
        assert_eq!(modal.embed, EmbedState::Loading);
    }

    #[test]
    fn test_pointer_out_cancels_pending() {
        let mut c = controller(PreviewMode::External);
        let t0 = Instant::now();
        c.pointer_over(&link(1, "https://a.net/"), t0);
        c.pointer_out(1);
        assert_eq!(c.state(), PreviewState::Idle);
        assert_eq!(c.tick(t0 + HOVER_DELAY * 2), None);
    }

    #[test]
    fn test_rehover_does_not_restart_timer() {
        let mut c = controller(PreviewMode::External);
        let t0 = Instant::now();
        let l = link(1, "https://a.net/");
        c.pointer_over(&l, t0);
        assert_eq!(
            c.pointer_over(&l, t0 + Duration::from_millis(300)),
            HoverOutcome::AlreadyPending
        );
        assert!(c.tick(t0 + HOVER_DELAY).is_some());
    }

    #[test]
    fn test_unpreviewable_links_memoized() {
        let mut c = controller(PreviewMode::External);
        let now = Instant::now();
        let banned = link(1, "https://github.com/x");
        let internal = link(2, "/essays/foo");
        let mut opted = link(3, "https://a.net/");
        opted.opted_out = true;

        assert_eq!(c.pointer_over(&banned, now), HoverOutcome::Skipped);
        assert_eq!(c.pointer_over(&banned, now), HoverOutcome::Ignored);
        assert_eq!(c.pointer_over(&internal, now), HoverOutcome::Skipped);
        assert_eq!(c.pointer_over(&opted, now), HoverOutcome::Ignored);
        assert!(c.is_skipped(1) && c.is_skipped(2));
        assert!(!c.is_skipped(3));
        assert_eq!(c.state(), PreviewState::Idle);
    }

    #[test]
    fn test_mode_all_previews_internal_links() {
        let mut c = controller(PreviewMode::All);
        assert!(c.open("/essays/foo", "Foo").is_some());
        assert!(c.open("https://youtube.com/watch", "").is_none());
    }

    #[test]
    fn test_disabled_previews_nothing() {
        let mut c = LinkPreviewController::new(
            PreviewPreferences {
                enabled: false,
                mode: PreviewMode::All,
            },
            LinkClassifier::new("example.org"),
            VIEWPORT,
        );
        assert_eq!(
            c.pointer_over(&link(1, "https://a.net/"), Instant::now()),
            HoverOutcome::Skipped
        );
    }

    #[test]
    fn test_same_url_opens_once() {
        let mut c = controller(PreviewMode::External);
        let first = c.open("https://a.net/", "A");
        assert!(first.is_some());
        assert!(c.open("https://a.net/", "A again").is_none());
        assert_eq!(c.modals().len(), 1);

        assert!(c.close(&first.unwrap()));
        assert!(!c.is_open("https://a.net/"));
        assert!(c.open("https://a.net/", "A").is_some());
    }

    #[test]
    fn test_hovering_second_link_to_open_url_adds_nothing() {
        let mut c = controller(PreviewMode::External);
        let t0 = Instant::now();
        let first = link(1, "https://a.net/page");
        let second = link(2, "https://a.net/page");

        c.pointer_over(&first, t0);
        assert!(c.tick(t0 + HOVER_DELAY).is_some());

        assert_eq!(
            c.pointer_over(&second, t0 + Duration::from_millis(900)),
            HoverOutcome::Pending
        );
        assert_eq!(c.tick(t0 + Duration::from_millis(1500)), None);
        assert_eq!(c.modals().len(), 1);
        assert_eq!(c.state(), PreviewState::Previewing);
    }

    #[test]
    fn test_rejects_non_links_and_titles_from_domain() {
        let mut c = controller(PreviewMode::All);
        assert!(c.open("", "x").is_none());
        assert!(c.open("#", "x").is_none());
        assert!(c.open("javascript:alert(1)", "x").is_none());

        let id = c.open("https://www.rust-lang.org/learn", "  ").unwrap();
        assert_eq!(c.modal(&id).unwrap().title, "rust-lang.org");
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let mut c = controller(PreviewMode::External);
        let ids = open_n(&mut c, 5);
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 5);
        assert!(ids.iter().all(|id| id.starts_with("popup-")));
    }

    #[test]
    fn test_navigation_wraps() {
        let mut c = controller(PreviewMode::External);
        open_n(&mut c, 3);
        assert!(c.focus(0));
        assert_eq!(c.state(), PreviewState::Focused);

        assert!(c.handle_key(KeyPress::plain(Key::ArrowLeft)));
        assert_eq!(c.focused_index(), Some(2));
        assert!(c.handle_key(KeyPress::plain(Key::ArrowRight)));
        assert_eq!(c.focused_index(), Some(0));
        assert!(c.handle_key(KeyPress::plain(Key::ArrowRight)));
        assert_eq!(c.focused_index(), Some(1));
    }

    #[test]
    fn test_navigation_needs_two_modals() {
        let mut c = controller(PreviewMode::External);
        open_n(&mut c, 1);
        c.focus(0);
        assert!(!c.handle_key(KeyPress::plain(Key::ArrowRight)));
        assert_eq!(c.focused_index(), Some(0));
    }

    #[test]
    fn test_keys_ignored_without_focus() {
        let mut c = controller(PreviewMode::External);
        open_n(&mut c, 2);
        assert!(!c.handle_key(KeyPress::alt(Key::Escape)));
        assert_eq!(c.modals().len(), 2);
        assert!(!c.focus(5));
    }

    #[test]
    fn test_escape_and_alt_escape() {
        let mut c = controller(PreviewMode::External);
        open_n(&mut c, 2);
        c.focus(1);
        assert!(c.handle_key(KeyPress::plain(Key::Escape)));
        assert_eq!(c.focused_index(), None);
        assert_eq!(c.modals().len(), 2);

        c.focus(1);
        assert!(c.handle_key(KeyPress::alt(Key::Escape)));
        assert!(c.modals().is_empty());
        assert_eq!(c.state(), PreviewState::Idle);
    }

    #[test]
    fn test_close_adjusts_focus() {
        let mut c = controller(PreviewMode::External);
        let ids = open_n(&mut c, 4);

        // Closing before the focused modal shifts focus down with it.
        c.focus(2);
        c.close(&ids[0]);
        assert_eq!(c.focused_modal().unwrap().id, ids[2]);

        // Closing the focused modal moves focus to the previous one.
        c.close(&ids[2]);
        assert_eq!(c.focused_modal().unwrap().id, ids[1]);

        // Closing after it leaves focus alone.
        c.close(&ids[3]);
        assert_eq!(c.focused_modal().unwrap().id, ids[1]);

        c.close(&ids[1]);
        assert_eq!(c.focused_index(), None);
        assert!(!c.close("popup-missing"));
    }

    #[test]
    fn test_drag_requires_handle_and_clamps() {
        let mut c = controller(PreviewMode::External);
        let id = open_n(&mut c, 1).remove(0);
        let start = c.modal(&id).unwrap().position;

        assert!(!c.begin_drag(&id, start, false));
        assert!(c.begin_drag(&id, Point { x: start.x + 10.0, y: start.y + 10.0 }, true));

        c.drag_to(Point { x: 110.0, y: 60.0 });
        assert_eq!(c.modal(&id).unwrap().position, Point { x: 100.0, y: 50.0 });

        c.drag_to(Point { x: -500.0, y: 5000.0 });
        assert_eq!(
            c.modal(&id).unwrap().position,
            Point {
                x: 0.0,
                y: VIEWPORT.height - DEFAULT_MODAL_SIZE.height
            }
        );

        c.end_drag();
        c.drag_to(Point { x: 300.0, y: 300.0 });
        assert_eq!(c.modal(&id).unwrap().position.x, 0.0);
    }

    #[test]
    fn test_one_drag_at_a_time_and_not_full_screen() {
        let mut c = controller(PreviewMode::External);
        let ids = open_n(&mut c, 2);
        let p = Point { x: 0.0, y: 0.0 };

        assert!(c.toggle_full_screen(0));
        assert!(!c.begin_drag(&ids[0], p, true));
        assert!(c.begin_drag(&ids[1], p, true));
        assert!(!c.begin_drag(&ids[0], p, true));
        assert!(c.is_dragging());

        c.close(&ids[1]);
        assert!(!c.is_dragging());
    }

    #[test]
    fn test_drag_raises_modal_and_keeps_focus() {
        let mut c = controller(PreviewMode::External);
        let ids = open_n(&mut c, 3);
        c.focus(2);

        assert!(c.begin_drag(&ids[0], Point { x: 0.0, y: 0.0 }, true));
        let order: Vec<&str> = c.modals().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(order, vec![ids[1].as_str(), ids[2].as_str(), ids[0].as_str()]);
        assert_eq!(c.focused_modal().unwrap().id, ids[2]);
    }

    #[test]
    fn test_modal_fits_small_viewport() {
        let mut c = LinkPreviewController::new(
            PreviewPreferences::default(),
            LinkClassifier::new("example.org"),
            Size {
                width: 400.0,
                height: 300.0,
            },
        );
        let id = c.open("https://a.net/", "A").unwrap();
        assert_eq!(c.modal(&id).unwrap().position, Point { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_zoom_saves_and_restores_frame() {
        let mut c = controller(PreviewMode::External);
        open_n(&mut c, 1);
        let home = (Point { x: 300.0, y: 150.0 }, DEFAULT_MODAL_SIZE);
        let m = |c: &LinkPreviewController| (c.modals()[0].position, c.modals()[0].size);
        assert_eq!(m(&c), home);

        assert!(c.zoom_to(0, Some(ZoomPosition::TopLeft)));
        assert_eq!(
            m(&c),
            (
                Point { x: 10.0, y: 10.0 },
                Size {
                    width: 585.0,
                    height: 385.0
                }
            )
        );

        // Hopping to another region keeps the first saved frame.
        c.zoom_to(0, Some(ZoomPosition::Right));
        assert_eq!(c.modals()[0].position, Point { x: 605.0, y: 10.0 });
        assert_eq!(c.modals()[0].size.height, 780.0);
        assert_eq!(c.modals()[0].zoom, Some(ZoomPosition::Right));

        c.zoom_to(0, None);
        assert_eq!(m(&c), home);
        assert_eq!(c.modals()[0].zoom, None);
        assert!(!c.zoom_to(3, Some(ZoomPosition::Full)));
    }

    #[test]
    fn test_snapped_modal_cannot_be_dragged() {
        let mut c = controller(PreviewMode::External);
        let id = open_n(&mut c, 1).remove(0);
        c.zoom_to(0, Some(ZoomPosition::Left));
        assert!(!c.begin_drag(&id, Point { x: 20.0, y: 20.0 }, true));
    }

    #[test]
    fn test_restore_size_recentres() {
        let mut c = controller(PreviewMode::External);
        open_n(&mut c, 1);
        c.zoom_to(0, Some(ZoomPosition::Full));
        assert!(c.restore_size(0));
        let modal = &c.modals()[0];
        assert_eq!(modal.size, DEFAULT_MODAL_SIZE);
        assert_eq!(modal.position, Point { x: 300.0, y: 150.0 });
        assert_eq!(modal.zoom, None);
    }

    #[test]
    fn test_minimize_and_restore() {
        let mut c = controller(PreviewMode::External);
        open_n(&mut c, 3);
        c.focus(1);

        assert!(c.handle_key(KeyPress::plain(Key::Char('t'))));
        assert!(c.modals()[1].is_minimized);
        assert_eq!(c.focused_index(), None);
        assert_eq!(c.visible_modals().count(), 2);
        assert_eq!(c.minimized_modals().count(), 1);
        assert!(!c.focus(1));

        assert!(c.restore(1));
        assert!(!c.restore(1));
        assert!(c.focus(1));
        assert_eq!(c.modals()[1].position, Point { x: 300.0, y: 150.0 });
    }

    #[test]
    fn test_navigation_skips_minimized() {
        let mut c = controller(PreviewMode::External);
        open_n(&mut c, 3);
        c.minimize(1);
        c.focus(0);

        assert!(c.handle_key(KeyPress::plain(Key::ArrowRight)));
        assert_eq!(c.focused_index(), Some(2));
        assert!(c.handle_key(KeyPress::plain(Key::ArrowRight)));
        assert_eq!(c.focused_index(), Some(0));

        c.minimize(2);
        assert!(!c.handle_key(KeyPress::plain(Key::ArrowLeft)));
        assert_eq!(c.focused_index(), Some(0));
    }

    #[test]
    fn test_shortcut_keys() {
        let mut c = controller(PreviewMode::External);
        open_n(&mut c, 2);
        c.focus(0);

        assert!(c.handle_key(KeyPress::plain(Key::Char('f'))));
        assert_eq!(c.modals()[0].zoom, Some(ZoomPosition::Full));
        assert_eq!(
            c.modals()[0].size,
            Size {
                width: 1180.0,
                height: 780.0
            }
        );
        assert!(c.handle_key(KeyPress::plain(Key::Char('r'))));
        assert_eq!(c.modals()[0].size, DEFAULT_MODAL_SIZE);

        assert!(c.handle_key(KeyPress::plain(Key::Char('c'))));
        assert!(c.modals()[0].is_pinned && !c.modals()[1].is_pinned);

        // Alt+c spreads the focused modal's flipped pin to everyone.
        assert!(c.handle_key(KeyPress::alt(Key::Char('c'))));
        assert!(c.modals().iter().all(|m| !m.is_pinned));
        assert!(c.handle_key(KeyPress::alt(Key::Char('c'))));
        assert!(c.modals().iter().all(|m| m.is_pinned));

        assert!(!c.handle_key(KeyPress::plain(Key::Char('y'))));
    }

    #[test]
    fn test_embed_failure_offers_fallback() {
        let mut c = controller(PreviewMode::External);
        let ids = open_n(&mut c, 2);
        c.embed_failed(&ids[0]);
        c.embed_loaded(&ids[1]);
        assert_eq!(c.modal(&ids[0]).unwrap().fallback_url(), Some("https://site0.net/"));
        assert_eq!(c.modal(&ids[1]).unwrap().fallback_url(), None);
    }

    #[test]
    fn test_copied_indicator_resets() {
        let mut c = controller(PreviewMode::External);
        let t0 = Instant::now();
        c.mark_copied(t0);
        c.tick(t0 + Duration::from_millis(1999));
        assert!(c.is_copied());
        c.tick(t0 + COPIED_RESET);
        assert!(!c.is_copied());
    }

    #[tokio::test]
    async fn test_load_reads_persisted_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        PreviewPreferences {
            enabled: true,
            mode: PreviewMode::Off,
        }
        .save(&path)
        .await
        .unwrap();

        let mut c =
            LinkPreviewController::load(&path, LinkClassifier::new("example.org"), VIEWPORT).await;
        assert_eq!(c.preferences().mode, PreviewMode::Off);
        assert!(c.open("https://a.net/", "A").is_none());
    }
}
