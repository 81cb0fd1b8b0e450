/// Per-frame callbacks a simulation host delivers to every attached plugin.
///
/// All methods default to doing nothing, so a plugin overrides only the
/// events it reacts to.
pub trait HostHooks {
    fn keyboard_update(&mut self, _key: i32, _scancode: i32, _action: i32, _mods: i32) {}

    fn mouse_buttons_update(&mut self, _button: i32, _action: i32, _mods: i32) {}

    fn mouse_position_update(&mut self, _x: f64, _y: f64) {}

    fn mouse_scroll_update(&mut self, _x_offset: f64, _y_offset: f64) {}

    fn physics_update(&mut self, _dt: f64) {}

    fn reset(&mut self) {}
}
