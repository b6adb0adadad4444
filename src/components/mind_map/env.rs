//! Environment the editor reads instead of browser globals.

use std::cell::Cell;
use std::rc::Rc;

/// Wall clock in milliseconds since the Unix epoch.
pub trait Clock {
	fn now_ms(&self) -> u64;
}

/// Whether the host currently has network connectivity.
pub trait Connectivity {
	fn is_online(&self) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	#[cfg(target_arch = "wasm32")]
	fn now_ms(&self) -> u64 {
		js_sys::Date::now() as u64
	}

	#[cfg(not(target_arch = "wasm32"))]
	fn now_ms(&self) -> u64 {
		std::time::SystemTime::now()
			.duration_since(std::time::UNIX_EPOCH)
			.map(|d| d.as_millis() as u64)
			.unwrap_or(0)
	}
}

/// Clock that only moves when told to.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
	pub fn new(start: u64) -> Self {
		Self(Rc::new(Cell::new(start)))
	}

	pub fn advance(&self, ms: u64) {
		self.0.set(self.0.get() + ms);
	}
}

impl Clock for ManualClock {
	fn now_ms(&self) -> u64 {
		self.0.get()
	}
}

/// Connectivity flag shared between the store and whoever observes the
/// network (the component pushes browser `online`/`offline` events here).
#[derive(Clone, Debug)]
pub struct SharedConnectivity(Rc<Cell<bool>>);

impl SharedConnectivity {
	pub fn new(online: bool) -> Self {
		Self(Rc::new(Cell::new(online)))
	}

	pub fn set_online(&self, online: bool) {
		if self.0.replace(online) != online {
			log::info!("connectivity changed: online={online}");
		}
	}
}

impl Default for SharedConnectivity {
	fn default() -> Self {
		Self::new(true)
	}
}

impl Connectivity for SharedConnectivity {
	fn is_online(&self) -> bool {
		self.0.get()
	}
}

/// Providers handed to the store at construction.
#[derive(Clone)]
pub struct Environment {
	pub clock: Rc<dyn Clock>,
	pub connectivity: Rc<dyn Connectivity>,
}

impl Environment {
	pub fn new(clock: impl Clock + 'static, connectivity: impl Connectivity + 'static) -> Self {
		Self {
			clock: Rc::new(clock),
			connectivity: Rc::new(connectivity),
		}
	}

	pub fn now_ms(&self) -> u64 {
		self.clock.now_ms()
	}

	pub fn is_online(&self) -> bool {
		self.connectivity.is_online()
	}
}

impl Default for Environment {
	fn default() -> Self {
		Self::new(SystemClock, SharedConnectivity::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn manual_clock_is_shared_between_clones() {
		let clock = ManualClock::new(10);
		let env = Environment::new(clock.clone(), SharedConnectivity::default());
		clock.advance(5);
		assert_eq!(env.now_ms(), 15);
	}

	#[test]
	fn connectivity_changes_are_visible_to_the_environment() {
		let net = SharedConnectivity::new(true);
		let env = Environment::new(ManualClock::new(0), net.clone());
		net.set_online(false);
		assert!(!env.is_online());
	}
}
