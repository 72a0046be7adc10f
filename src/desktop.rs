use crate::dispatch::{CursorPos, InputInjector, MouseEventKind, Surface, SyntheticMouseEvent};
use crate::settings::MouseButton;
use display_info::DisplayInfo;
use enigo::MouseControllable;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

static ENIGO: Lazy<Mutex<enigo::Enigo>> = Lazy::new(|| Mutex::new(enigo::Enigo::new()));

// -------------- Displays --------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds { pub min_x: i32, pub max_x: i32, pub min_y: i32, pub max_y: i32 }

impl Bounds {
    pub fn width(&self) -> i32 { self.max_x - self.min_x }
    pub fn height(&self) -> i32 { self.max_y - self.min_y }
    pub fn is_valid(&self) -> bool { self.width() > 0 && self.height() > 0 }

    pub fn center(&self) -> CursorPos {
        CursorPos::new(self.min_x as f64 + self.width() as f64 / 2.0, self.min_y as f64 + self.height() as f64 / 2.0)
    }

    pub fn surface(&self) -> Surface {
        Surface { min_x: self.min_x as f64, min_y: self.min_y as f64, max_x: self.max_x as f64, max_y: self.max_y as f64 }
    }
}

/// Connected displays, primary first. Falls back to the main display size
/// reported by enigo when enumeration fails.
pub fn displays() -> Vec<Bounds> {
    let mut found: Vec<(bool, Bounds)> = match DisplayInfo::all() {
        Ok(all) => all
            .into_iter()
            .map(|d| (d.is_primary, Bounds {
                min_x: d.x,
                max_x: d.x + d.width as i32,
                min_y: d.y,
                max_y: d.y + d.height as i32,
            }))
            .filter(|(_, b)| b.is_valid())
            .collect(),
        Err(e) => {
            tracing::warn!("display enumeration failed: {e}");
            Vec::new()
        }
    };

    if found.is_empty() {
        let (w, h) = ENIGO.lock().main_display_size();
        return vec![Bounds { min_x: 0, max_x: w, min_y: 0, max_y: h }];
    }
    found.sort_by_key(|(primary, _)| !*primary);
    found.into_iter().map(|(_, b)| b).collect()
}

/// Where clicks land before the pointer has moved: the middle of the primary
/// display.
pub fn primary_center(displays: &[Bounds]) -> CursorPos {
    displays.first().map(Bounds::center).unwrap_or(CursorPos::new(0.0, 0.0))
}

fn to_enigo(button: MouseButton) -> enigo::MouseButton {
    match button {
        MouseButton::Left => enigo::MouseButton::Left,
        MouseButton::Middle => enigo::MouseButton::Middle,
        MouseButton::Right => enigo::MouseButton::Right,
    }
}

// -------------- Injector --------------

/// Injects OS-level input. A point resolves to a target when it lies on a
/// connected display.
pub struct EnigoInjector {
    displays: Vec<Bounds>,
}

impl EnigoInjector {
    pub fn new(displays: Vec<Bounds>) -> Self { Self { displays } }
}

impl InputInjector for EnigoInjector {
    type Target = (i32, i32);

    fn target_at(&mut self, pos: CursorPos) -> Option<(i32, i32)> {
        self.displays
            .iter()
            .any(|d| d.surface().contains(pos))
            .then(|| (pos.x.round() as i32, pos.y.round() as i32))
    }

    fn dispatch(&mut self, target: &(i32, i32), event: &SyntheticMouseEvent) {
        let button = to_enigo(event.mouse_button());
        let mut en = ENIGO.lock();
        match event.kind {
            MouseEventKind::MouseDown => {
                en.mouse_move_to(target.0, target.1);
                en.mouse_down(button);
            }
            MouseEventKind::MouseUp => en.mouse_up(button),
            // The OS derives these from the press/release pair.
            MouseEventKind::Click | MouseEventKind::ContextMenu | MouseEventKind::DblClick => {}
        }
    }

    fn pointer_position(&mut self) -> Option<CursorPos> {
        let (x, y) = ENIGO.lock().mouse_location();
        Some(CursorPos::new(x as f64, y as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_validation() {
        let valid = Bounds { min_x: 100, max_x: 200, min_y: 100, max_y: 200 };
        assert!(valid.is_valid());
        assert_eq!(valid.width(), 100);
        assert_eq!(valid.center(), CursorPos::new(150.0, 150.0));

        let invalid = Bounds { min_x: 200, max_x: 100, min_y: 200, max_y: 100 };
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_target_requires_a_display() {
        let mut inj = EnigoInjector::new(vec![
            Bounds { min_x: 0, max_x: 1920, min_y: 0, max_y: 1080 },
            Bounds { min_x: 1920, max_x: 3200, min_y: 0, max_y: 1024 },
        ]);
        assert_eq!(inj.target_at(CursorPos::new(2000.4, 10.6)), Some((2000, 11)));
        assert_eq!(inj.target_at(CursorPos::new(2000.0, 1050.0)), None);
        assert_eq!(inj.target_at(CursorPos::new(-1.0, 5.0)), None);
    }

    #[test]
    fn test_primary_center_fallback() {
        assert_eq!(primary_center(&[]), CursorPos::new(0.0, 0.0));
        let d = [Bounds { min_x: 0, max_x: 1280, min_y: 0, max_y: 720 }];
        assert_eq!(primary_center(&d), CursorPos::new(640.0, 360.0));
    }
}
