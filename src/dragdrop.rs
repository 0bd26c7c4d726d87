use crate::selection::SelectionState;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Screen-space coordinates of a pointer or touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// What the host surface can tell the drag coordinator about the screen.
///
/// The coordinator never hit-tests geometry itself; the host resolves a
/// point to the id of a drop-accepting element (a folder tile, an Up tile,
/// or a breadcrumb segment mapped to its folder).
pub trait DropSurface {
    /// The drop target under `point`, if any.
    fn drop_target_at(&self, point: Point) -> Option<String>;

    /// One haptic pulse when a long-press arms a drag session.
    fn haptic_feedback(&mut self) {}
}

/// A finished drag the session should turn into a move batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIntent {
    pub source: String,
    /// Folder to move into; `None` means the root level.
    pub target: Option<String>,
}

/// Touch contact lifecycle. Pointer drags skip straight to `Dragging`
/// because the platform gesture already decided this is a drag.
#[derive(Debug, Clone, PartialEq)]
pub enum TouchPhase {
    Idle,
    /// Finger down, long-press timer running.
    Pressed {
        source: String,
        origin: Point,
        pressed_at: Instant,
    },
    /// Drag session armed; a ghost follows the contact point.
    Dragging {
        source: String,
        ghost: Point,
        target: Option<String>,
    },
}

/// Unified drag-and-drop coordinator for pointer and touch input.
///
/// Time is passed in by the caller so the long-press arm and the scroll
/// threshold are deterministic under test.
#[derive(Debug)]
pub struct DragController {
    phase: TouchPhase,
    long_press: Duration,
    move_threshold: f32,
}

impl DragController {
    pub fn new(long_press: Duration, move_threshold: f32) -> Self {
        Self {
            phase: TouchPhase::Idle,
            long_press,
            move_threshold,
        }
    }

    pub fn phase(&self) -> &TouchPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, TouchPhase::Dragging { .. })
    }

    /// Id of the node being dragged, if a session is active.
    pub fn drag_source(&self) -> Option<&str> {
        match &self.phase {
            TouchPhase::Dragging { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Current highlighted drop target, if the contact is over one.
    pub fn hover_target(&self) -> Option<&str> {
        match &self.phase {
            TouchPhase::Dragging { target, .. } => target.as_deref(),
            _ => None,
        }
    }

    // --- Pointer path -----------------------------------------------------

    /// Platform drag started on `source`.
    pub fn pointer_drag_start(&mut self, source: &str) {
        self.phase = TouchPhase::Dragging {
            source: source.to_string(),
            ghost: Point::new(0.0, 0.0),
            target: None,
        };
    }

    /// Pointer moved over a potential drop zone (`None` when leaving one).
    /// The drag source itself is never a valid target.
    pub fn pointer_drag_over(&mut self, zone: Option<&str>) {
        if let TouchPhase::Dragging { source, target, .. } = &mut self.phase {
            *target = zone
                .filter(|z| *z != source.as_str())
                .map(|z| z.to_string());
        }
    }

    /// Pointer released. Returns the drop intent when released over a zone.
    pub fn pointer_drop(&mut self, zone_target: Option<String>) -> Option<DropIntent> {
        let phase = std::mem::replace(&mut self.phase, TouchPhase::Idle);
        match phase {
            TouchPhase::Dragging { source, .. } => zone_target.map(|t| DropIntent {
                source,
                target: if t == "root" { None } else { Some(t) },
            }),
            _ => None,
        }
    }

    // --- Touch path -------------------------------------------------------

    /// Finger down on `source`. Ignored unless the controller is idle, so a
    /// second finger cannot hijack an active session.
    pub fn touch_down(&mut self, source: &str, point: Point, now: Instant) {
        if matches!(self.phase, TouchPhase::Idle) {
            self.phase = TouchPhase::Pressed {
                source: source.to_string(),
                origin: point,
                pressed_at: now,
            };
        }
    }

    /// Timer poll. Arms the drag session once the press has been held still
    /// long enough, with one haptic pulse on arming.
    pub fn poll_long_press<S: DropSurface>(&mut self, now: Instant, surface: &mut S) {
        let armed = match &self.phase {
            TouchPhase::Pressed {
                source,
                origin,
                pressed_at,
            } if now.duration_since(*pressed_at) >= self.long_press => {
                Some((source.clone(), *origin))
            }
            _ => None,
        };
        if let Some((source, origin)) = armed {
            log::debug!("long press armed drag on {}", source);
            surface.haptic_feedback();
            let target = surface
                .drop_target_at(origin)
                .filter(|t| t.as_str() != source.as_str());
            self.phase = TouchPhase::Dragging {
                source,
                ghost: origin,
                target,
            };
        }
    }

    /// Finger moved. While pressed, movement past the threshold is a scroll
    /// and cancels the pending drag; while dragging, the ghost and the
    /// highlighted target follow the contact point.
    pub fn touch_move<S: DropSurface>(&mut self, point: Point, surface: &S) {
        match &mut self.phase {
            TouchPhase::Pressed { origin, .. } => {
                if origin.distance_to(point) > self.move_threshold {
                    self.phase = TouchPhase::Idle;
                }
            }
            TouchPhase::Dragging { source, ghost, target } => {
                *ghost = point;
                *target = surface
                    .drop_target_at(point)
                    .filter(|t| t.as_str() != source.as_str());
            }
            TouchPhase::Idle => {}
        }
    }

    /// Finger lifted. A press that never armed is a tap (no intent); an
    /// armed drag yields an intent when it ends over a target.
    pub fn touch_up(&mut self) -> Option<DropIntent> {
        let phase = std::mem::replace(&mut self.phase, TouchPhase::Idle);
        match phase {
            TouchPhase::Dragging {
                source,
                target: Some(target),
                ..
            } => Some(DropIntent {
                source,
                target: if target == "root" { None } else { Some(target) },
            }),
            _ => None,
        }
    }

    /// Abort whatever is in flight (e.g. the host cancelled the gesture).
    pub fn cancel(&mut self) {
        self.phase = TouchPhase::Idle;
    }
}

/// Which nodes a drop moves: the whole selection when the dragged node is
/// part of it, otherwise just the dragged node. Returns `None` when the
/// drop target itself is in the move set, which makes the drop a no-op.
pub fn resolve_move_set(
    selection: &SelectionState,
    source: &str,
    target: Option<&str>,
) -> Option<Vec<String>> {
    let mut set: Vec<String> = if selection.is_selected(source) {
        selection.ids().iter().cloned().collect()
    } else {
        vec![source.to_string()]
    };
    set.sort();
    if let Some(target) = target {
        if set.iter().any(|id| id == target) {
            return None;
        }
    }
    Some(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::time::Duration;

    struct FakeSurface {
        target: Option<String>,
        haptics: u32,
    }

    impl FakeSurface {
        fn new(target: Option<&str>) -> Self {
            Self {
                target: target.map(|t| t.to_string()),
                haptics: 0,
            }
        }
    }

    impl DropSurface for FakeSurface {
        fn drop_target_at(&self, _point: Point) -> Option<String> {
            self.target.clone()
        }

        fn haptic_feedback(&mut self) {
            self.haptics += 1;
        }
    }

    fn controller() -> DragController {
        DragController::new(Duration::from_millis(500), 8.0)
    }

    #[test]
    fn test_pointer_drag_lifecycle() {
        let mut drag = controller();
        drag.pointer_drag_start("kick.wav");
        drag.pointer_drag_over(Some("drums"));
        assert_eq!(drag.hover_target(), Some("drums"));
        let intent = drag.pointer_drop(Some("drums".to_string())).unwrap();
        assert_eq!(intent.source, "kick.wav");
        assert_eq!(intent.target.as_deref(), Some("drums"));
        assert_eq!(*drag.phase(), TouchPhase::Idle);
    }

    #[test]
    fn test_drag_source_is_never_a_target() {
        let mut drag = controller();
        drag.pointer_drag_start("drums");
        drag.pointer_drag_over(Some("drums"));
        assert_eq!(drag.hover_target(), None);
        drag.pointer_drag_over(Some("loops"));
        assert_eq!(drag.hover_target(), Some("loops"));
    }

    #[test]
    fn test_pointer_drop_outside_zone_is_noop() {
        let mut drag = controller();
        drag.pointer_drag_start("kick.wav");
        assert!(drag.pointer_drop(None).is_none());
        assert_eq!(*drag.phase(), TouchPhase::Idle);
    }

    #[test]
    fn test_root_zone_maps_to_root_level() {
        let mut drag = controller();
        drag.pointer_drag_start("kick.wav");
        let intent = drag.pointer_drop(Some("root".to_string())).unwrap();
        assert_eq!(intent.target, None);
    }

    #[test]
    fn test_long_press_arms_with_haptic() {
        let mut drag = controller();
        let mut surface = FakeSurface::new(None);
        let t0 = Instant::now();
        drag.touch_down("kick.wav", Point::new(10.0, 10.0), t0);
        drag.poll_long_press(t0 + Duration::from_millis(100), &mut surface);
        assert!(!drag.is_dragging());
        drag.poll_long_press(t0 + Duration::from_millis(500), &mut surface);
        assert!(drag.is_dragging());
        assert_eq!(surface.haptics, 1);
    }

    #[test]
    fn test_scroll_movement_cancels_pending_press() {
        let mut drag = controller();
        let mut surface = FakeSurface::new(None);
        let t0 = Instant::now();
        drag.touch_down("kick.wav", Point::new(10.0, 10.0), t0);
        drag.touch_move(Point::new(10.0, 30.0), &surface);
        assert_eq!(*drag.phase(), TouchPhase::Idle);
        // A late timer poll must not arm the cancelled press.
        drag.poll_long_press(t0 + Duration::from_secs(1), &mut surface);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_small_movement_keeps_press_alive() {
        let mut drag = controller();
        let mut surface = FakeSurface::new(None);
        let t0 = Instant::now();
        drag.touch_down("kick.wav", Point::new(10.0, 10.0), t0);
        drag.touch_move(Point::new(13.0, 11.0), &surface);
        drag.poll_long_press(t0 + Duration::from_millis(600), &mut surface);
        assert!(drag.is_dragging());
    }

    #[test]
    fn test_quick_tap_yields_no_intent() {
        let mut drag = controller();
        let t0 = Instant::now();
        drag.touch_down("kick.wav", Point::new(10.0, 10.0), t0);
        assert!(drag.touch_up().is_none());
        assert_eq!(*drag.phase(), TouchPhase::Idle);
    }

    #[test]
    fn test_touch_drag_tracks_target_and_drops() {
        let mut drag = controller();
        let mut surface = FakeSurface::new(None);
        let t0 = Instant::now();
        drag.touch_down("kick.wav", Point::new(10.0, 10.0), t0);
        drag.poll_long_press(t0 + Duration::from_millis(500), &mut surface);
        let over_folder = FakeSurface::new(Some("drums"));
        drag.touch_move(Point::new(50.0, 50.0), &over_folder);
        assert_eq!(drag.hover_target(), Some("drums"));
        let intent = drag.touch_up().unwrap();
        assert_eq!(intent.target.as_deref(), Some("drums"));
    }

    #[test]
    fn test_second_finger_ignored_while_active() {
        let mut drag = controller();
        let t0 = Instant::now();
        drag.touch_down("kick.wav", Point::new(10.0, 10.0), t0);
        drag.touch_down("snare.wav", Point::new(90.0, 90.0), t0);
        assert_matches!(
            drag.phase(),
            TouchPhase::Pressed { source, .. } if source == "kick.wav"
        );
    }

    #[test]
    fn test_resolve_move_set_selection_rides_along() {
        let mut sel = SelectionState::new();
        sel.click("a");
        sel.click("b");
        let set = resolve_move_set(&sel, "a", Some("drums")).unwrap();
        assert_eq!(set, vec!["a", "b"]);
        // Dragging an unselected node moves only that node.
        let set = resolve_move_set(&sel, "c", Some("drums")).unwrap();
        assert_eq!(set, vec!["c"]);
    }

    #[test]
    fn test_resolve_move_set_target_in_set_is_noop() {
        let mut sel = SelectionState::new();
        sel.click("drums");
        sel.click("a");
        assert!(resolve_move_set(&sel, "a", Some("drums")).is_none());
        assert!(resolve_move_set(&sel, "drums", Some("drums")).is_none());
        // Root target cannot collide with the set.
        assert!(resolve_move_set(&sel, "a", None).is_some());
    }
}
