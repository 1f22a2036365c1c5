use std::{cell::{Ref, RefCell, RefMut}, rc::Rc};

/// Shared mutable cell used for environments and the diagnostic sink.
///
/// Environments are shared between the scope that created them and every
/// closure that captured them; the sink is shared by all pipeline stages.
#[derive(Debug, Default)]
pub struct RcCell<T> {
	inner: Rc<RefCell<T>>,
}

impl<T> Clone for RcCell<T> {
	fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<T> RcCell<T> {
	pub fn new(value: T) -> Self { Self { inner: Rc::new(RefCell::new(value)) } }

	pub fn borrow(&self) -> Ref<'_, T> { self.inner.borrow() }

	pub fn borrow_mut(&self) -> RefMut<'_, T> { self.inner.borrow_mut() }
}
