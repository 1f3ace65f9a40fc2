//! Shared, fixed-size byte storage backing typed array views

use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use crate::error::{ArrayError, ArrayResult};

/// A fixed-size block of raw memory.
///
/// Cloning an `ArrayBuffer` clones the reference, not the bytes: every clone
/// and every view created over it sees the same storage.
#[derive(Clone)]
pub struct ArrayBuffer(Rc<RefCell<Box<[u8]>>>);

impl ArrayBuffer {
    /// Allocate a zero-initialised buffer of `byte_length` bytes.
    ///
    /// # Errors
    ///
    /// [`ArrayError::AllocationFailed`] if the memory could not be reserved.
    pub fn new(byte_length: usize) -> ArrayResult<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(byte_length)
            .map_err(|_| ArrayError::AllocationFailed(byte_length))?;
        bytes.resize(byte_length, 0);

        Ok(Self::from(bytes))
    }

    /// Size of the buffer in bytes. Never changes.
    pub fn byte_length(&self) -> usize {
        self.0.borrow().len()
    }

    /// Copy the bytes in `[begin, end)` into a new buffer.
    ///
    /// Negative indices count from the end. Both indices are clamped to the
    /// buffer, and `end <= begin` produces an empty buffer.
    pub fn slice(&self, begin: isize, end: Option<isize>) -> Self {
        let length = self.byte_length();
        let (start, end) = resolve_range(length, begin, end);

        Self::from(self.bytes()[start..end].to_vec())
    }

    /// Copy the whole buffer into a `Vec`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }

    /// Whether both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn bytes(&self) -> Ref<'_, [u8]> {
        Ref::map(self.0.borrow(), |bytes| &**bytes)
    }

    pub(crate) fn bytes_mut(&self) -> RefMut<'_, [u8]> {
        RefMut::map(self.0.borrow_mut(), |bytes| &mut **bytes)
    }
}

#[cfg(target_arch = "wasm32")]
impl ArrayBuffer {
    /// Copy the contents into a new JS `ArrayBuffer`.
    pub fn to_js(&self) -> js_sys::ArrayBuffer {
        let array = js_sys::Uint8Array::from(&*self.bytes());
        array.buffer()
    }

    /// Copy the contents of a JS `ArrayBuffer` into a new buffer.
    pub fn from_js(buffer: &js_sys::ArrayBuffer) -> Self {
        Self::from(js_sys::Uint8Array::new(buffer).to_vec())
    }
}

impl From<Vec<u8>> for ArrayBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Rc::new(RefCell::new(bytes.into_boxed_slice())))
    }
}

impl Debug for ArrayBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayBuffer")
            .field("byte_length", &self.byte_length())
            .finish_non_exhaustive()
    }
}

/// Resolve a relative `[begin, end)` pair against `length`.
///
/// Negative values count back from `length`, everything is clamped to
/// `0..=length` and the result never has `end < start`.
pub(crate) fn resolve_range(length: usize, begin: isize, end: Option<isize>) -> (usize, usize) {
    let start = resolve_index(length, begin);
    let end = end.map_or(length, |end| resolve_index(length, end));

    (start, end.max(start))
}

fn resolve_index(length: usize, index: isize) -> usize {
    if index < 0 {
        length.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(length)
    }
}
