use super::config::MapConfig;

/// Screen or world coordinates in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragMode {
	#[default]
	Idle,
	/// `origin` is the pointer position minus the pan at drag start, so the
	/// pan while dragging is simply `pointer - origin`.
	Dragging { origin: Point },
}

/// Pan/zoom transform of the canvas: `screen = world * zoom + pan`.
#[derive(Clone, Debug)]
pub struct Viewport {
	zoom: f64,
	pan: Point,
	mode: DragMode,
	zoom_min: f64,
	zoom_max: f64,
	zoom_step: f64,
}

impl Viewport {
	pub fn new(config: &MapConfig) -> Self {
		Self {
			zoom: 1.0,
			pan: Point::default(),
			mode: DragMode::Idle,
			zoom_min: config.zoom_min,
			zoom_max: config.zoom_max,
			zoom_step: config.zoom_step,
		}
	}

	pub fn zoom(&self) -> f64 {
		self.zoom
	}

	pub fn pan(&self) -> Point {
		self.pan
	}

	pub fn is_dragging(&self) -> bool {
		matches!(self.mode, DragMode::Dragging { .. })
	}

	pub fn begin_drag(&mut self, pointer: Point) {
		self.mode = DragMode::Dragging {
			origin: Point::new(pointer.x - self.pan.x, pointer.y - self.pan.y),
		};
	}

	/// Pans along with the pointer. Returns false when no drag is active.
	pub fn drag_to(&mut self, pointer: Point) -> bool {
		let DragMode::Dragging { origin } = self.mode else {
			return false;
		};
		self.pan = Point::new(pointer.x - origin.x, pointer.y - origin.y);
		true
	}

	pub fn end_drag(&mut self) {
		self.mode = DragMode::Idle;
	}

	fn set_zoom(&mut self, zoom: f64) {
		self.zoom = zoom.clamp(self.zoom_min, self.zoom_max);
	}

	pub fn zoom_in(&mut self) {
		self.set_zoom(self.zoom * self.zoom_step);
	}

	pub fn zoom_out(&mut self) {
		self.set_zoom(self.zoom / self.zoom_step);
	}

	/// Scales by `factor` while keeping the world point under `pointer` fixed.
	pub fn zoom_at(&mut self, pointer: Point, factor: f64) {
		let before = self.zoom;
		self.set_zoom(before * factor);
		let ratio = self.zoom / before;
		self.pan = Point::new(
			pointer.x - (pointer.x - self.pan.x) * ratio,
			pointer.y - (pointer.y - self.pan.y) * ratio,
		);
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.pan = Point::new(self.pan.x + dx, self.pan.y + dy);
	}

	pub fn reset(&mut self) {
		self.zoom = 1.0;
		self.pan = Point::default();
		self.mode = DragMode::Idle;
	}

	pub fn screen_to_world(&self, p: Point) -> Point {
		Point::new((p.x - self.pan.x) / self.zoom, (p.y - self.pan.y) / self.zoom)
	}

	pub fn world_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
	}

	/// Zoom as a whole percentage, for display.
	pub fn zoom_percent(&self) -> u32 {
		(self.zoom * 100.0).round() as u32
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(&MapConfig::default())
	}

	#[test]
	fn drag_moves_pan_by_pointer_delta() {
		let mut v = viewport();
		v.pan_by(10.0, 20.0);
		v.begin_drag(Point::new(100.0, 100.0));
		assert!(v.is_dragging());
		assert!(v.drag_to(Point::new(130.0, 90.0)));
		assert_eq!(v.pan(), Point::new(40.0, 10.0));
		v.end_drag();
		assert!(!v.is_dragging());
		assert!(!v.drag_to(Point::new(0.0, 0.0)));
		assert_eq!(v.pan(), Point::new(40.0, 10.0));
	}

	#[test]
	fn zoom_is_clamped_both_ways() {
		let mut v = viewport();
		for _ in 0..50 {
			v.zoom_in();
		}
		assert_eq!(v.zoom(), 3.0);
		for _ in 0..50 {
			v.zoom_out();
		}
		assert_eq!(v.zoom(), 0.3);
	}

	#[test]
	fn zoom_at_keeps_pointer_fixed() {
		let mut v = viewport();
		v.pan_by(15.0, -5.0);
		let pointer = Point::new(200.0, 120.0);
		let world = v.screen_to_world(pointer);
		v.zoom_at(pointer, 1.1);
		let back = v.world_to_screen(world);
		assert!((back.x - pointer.x).abs() < 1e-9);
		assert!((back.y - pointer.y).abs() < 1e-9);
	}

	#[test]
	fn reset_restores_identity() {
		let mut v = viewport();
		v.zoom_in();
		v.begin_drag(Point::new(1.0, 1.0));
		v.drag_to(Point::new(50.0, 50.0));
		v.reset();
		assert_eq!((v.zoom(), v.pan()), (1.0, Point::default()));
		assert!(!v.is_dragging());
		assert_eq!(v.zoom_percent(), 100);
	}
}
