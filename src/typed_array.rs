//! Typed views over an [`ArrayBuffer`]
//!
//! A [`TypedArray`] is a window of `length` elements starting `byte_offset`
//! bytes into a shared buffer. Creating a view never copies: writes through
//! one view are visible through every other view over the same bytes.
//!
//! ```rust
//! use wasm_socket_bindings::{ArrayBuffer, Int8Array};
//!
//! let buffer = ArrayBuffer::new(4).unwrap();
//! let whole = Int8Array::with_buffer(buffer.clone()).unwrap();
//! let tail = Int8Array::with_buffer_offset(buffer, 2).unwrap();
//!
//! whole.set(3, -5).unwrap();
//! assert_eq!(tail.get(1), Some(-5));
//! ```

use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

use crate::buffer::{resolve_range, ArrayBuffer};
use crate::error::{ArrayError, ArrayResult};

mod sealed {
    pub trait Sealed {}
}

/// A numeric type that can be stored in a [`TypedArray`].
///
/// Elements are stored little-endian.
pub trait Element: sealed::Sealed + Copy + Debug + PartialEq + 'static {
    /// Width of one element in bytes.
    const BYTES: usize;

    /// Decode an element from exactly [`Self::BYTES`] bytes.
    fn read(bytes: &[u8]) -> Self;

    /// Encode the element into exactly [`Self::BYTES`] bytes.
    fn write(self, bytes: &mut [u8]);

    /// Convert an arbitrary number the way the host does on store.
    fn from_number(value: f64) -> Self;

    /// Widen the element to a number.
    fn to_number(self) -> f64;
}

/// Truncate toward zero and wrap modulo `2^bits`; NaN and infinities map to 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn wrap_number(value: f64, bits: u32) -> u64 {
    if !value.is_finite() {
        return 0;
    }

    value.trunc().rem_euclid(f64::from(bits).exp2()) as u64
}

macro_rules! integer_element {
    ($($ty:ty => $bits:literal),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const BYTES: usize = std::mem::size_of::<$ty>();

            fn read(bytes: &[u8]) -> Self {
                let mut raw = [0; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_le_bytes(raw)
            }

            fn write(self, bytes: &mut [u8]) {
                bytes.copy_from_slice(&self.to_le_bytes());
            }

            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            fn from_number(value: f64) -> Self {
                wrap_number(value, $bits) as $ty
            }

            fn to_number(self) -> f64 {
                f64::from(self)
            }
        }
    )*};
}

integer_element!(i8 => 8, u8 => 8, i16 => 16, u16 => 16, i32 => 32, u32 => 32);

impl sealed::Sealed for f32 {}

impl Element for f32 {
    const BYTES: usize = 4;

    fn read(bytes: &[u8]) -> Self {
        let mut raw = [0; 4];
        raw.copy_from_slice(bytes);
        f32::from_le_bytes(raw)
    }

    fn write(self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.to_le_bytes());
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_number(value: f64) -> Self {
        value as f32
    }

    fn to_number(self) -> f64 {
        f64::from(self)
    }
}

impl sealed::Sealed for f64 {}

impl Element for f64 {
    const BYTES: usize = 8;

    fn read(bytes: &[u8]) -> Self {
        let mut raw = [0; 8];
        raw.copy_from_slice(bytes);
        f64::from_le_bytes(raw)
    }

    fn write(self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.to_le_bytes());
    }

    fn from_number(value: f64) -> Self {
        value
    }

    fn to_number(self) -> f64 {
        self
    }
}

/// A fixed-length view of `E` elements over a shared [`ArrayBuffer`].
///
/// Cloning a view produces another view over the same bytes.
pub struct TypedArray<E: Element> {
    buffer: ArrayBuffer,
    byte_offset: usize,
    length: usize,
    _element: PhantomData<E>,
}

/// View of signed bytes, each in `[-128, 127]`.
pub type Int8Array = TypedArray<i8>;
/// View of unsigned bytes.
pub type Uint8Array = TypedArray<u8>;
/// View of signed 16-bit integers.
pub type Int16Array = TypedArray<i16>;
/// View of unsigned 16-bit integers.
pub type Uint16Array = TypedArray<u16>;
/// View of signed 32-bit integers.
pub type Int32Array = TypedArray<i32>;
/// View of unsigned 32-bit integers.
pub type Uint32Array = TypedArray<u32>;
/// View of 32-bit floats.
pub type Float32Array = TypedArray<f32>;
/// View of 64-bit floats.
pub type Float64Array = TypedArray<f64>;

impl<E: Element> TypedArray<E> {
    /// Size in bytes of one element of this view.
    pub const BYTES_PER_ELEMENT: usize = E::BYTES;

    /// Allocate a new zero-filled buffer holding `length` elements and view
    /// all of it.
    ///
    /// # Errors
    ///
    /// - [`ArrayError::TooLong`] if `length` elements cannot be addressed.
    /// - [`ArrayError::AllocationFailed`] if the buffer could not be allocated.
    pub fn new(length: usize) -> ArrayResult<Self> {
        let byte_length = length.checked_mul(E::BYTES).ok_or(ArrayError::TooLong {
            length,
            element_size: E::BYTES,
        })?;
        let buffer = ArrayBuffer::new(byte_length)?;

        Ok(Self::from_parts(buffer, 0, length))
    }

    /// Copy the elements of another view, of any element type, into a new
    /// buffer, converting each one with [`Element::from_number`].
    ///
    /// # Errors
    ///
    /// [`ArrayError::AllocationFailed`] if the buffer could not be allocated.
    pub fn from_array<F: Element>(array: &TypedArray<F>) -> ArrayResult<Self> {
        let values: Vec<f64> = array.to_vec().into_iter().map(F::to_number).collect();
        Self::from_numbers(&values)
    }

    /// Copy a sequence of numbers into a new buffer, converting each one with
    /// [`Element::from_number`].
    ///
    /// # Errors
    ///
    /// [`ArrayError::AllocationFailed`] if the buffer could not be allocated.
    pub fn from_numbers(values: &[f64]) -> ArrayResult<Self> {
        let array = Self::new(values.len())?;
        {
            let mut bytes = array.buffer.bytes_mut();
            for (chunk, value) in bytes.chunks_exact_mut(E::BYTES).zip(values) {
                E::from_number(*value).write(chunk);
            }
        }

        Ok(array)
    }

    /// Copy native elements into a new buffer.
    ///
    /// # Errors
    ///
    /// [`ArrayError::AllocationFailed`] if the buffer could not be allocated.
    pub fn from_slice(values: &[E]) -> ArrayResult<Self> {
        let array = Self::new(values.len())?;
        {
            let mut bytes = array.buffer.bytes_mut();
            for (chunk, value) in bytes.chunks_exact_mut(E::BYTES).zip(values) {
                value.write(chunk);
            }
        }

        Ok(array)
    }

    /// View the whole of `buffer`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::LengthNotMultiple`] if the buffer length is not a
    /// multiple of the element size.
    pub fn with_buffer(buffer: ArrayBuffer) -> ArrayResult<Self> {
        Self::with_buffer_offset(buffer, 0)
    }

    /// View `buffer` from `byte_offset` to its end.
    ///
    /// # Errors
    ///
    /// - [`ArrayError::Misaligned`] if `byte_offset` is not a multiple of the
    ///   element size.
    /// - [`ArrayError::OutOfRange`] if `byte_offset` is past the end.
    /// - [`ArrayError::LengthNotMultiple`] if the remaining bytes are not a
    ///   multiple of the element size.
    pub fn with_buffer_offset(buffer: ArrayBuffer, byte_offset: usize) -> ArrayResult<Self> {
        check_alignment::<E>(byte_offset)?;

        let buffer_length = buffer.byte_length();
        let byte_length =
            buffer_length
                .checked_sub(byte_offset)
                .ok_or(ArrayError::OutOfRange {
                    byte_offset,
                    byte_length: 0,
                    buffer_length,
                })?;

        if byte_length % E::BYTES != 0 {
            return Err(ArrayError::LengthNotMultiple {
                byte_length,
                element_size: E::BYTES,
            });
        }

        Ok(Self::from_parts(buffer, byte_offset, byte_length / E::BYTES))
    }

    /// View exactly `length` elements of `buffer` starting at `byte_offset`.
    ///
    /// # Errors
    ///
    /// - [`ArrayError::Misaligned`] if `byte_offset` is not a multiple of the
    ///   element size.
    /// - [`ArrayError::OutOfRange`] if the range reaches past the end.
    pub fn with_buffer_range(
        buffer: ArrayBuffer,
        byte_offset: usize,
        length: usize,
    ) -> ArrayResult<Self> {
        check_alignment::<E>(byte_offset)?;

        let buffer_length = buffer.byte_length();
        let byte_length = length.saturating_mul(E::BYTES);

        match byte_offset.checked_add(byte_length) {
            Some(end) if end <= buffer_length => {
                Ok(Self::from_parts(buffer, byte_offset, length))
            }
            _ => Err(ArrayError::OutOfRange {
                byte_offset,
                byte_length,
                buffer_length,
            }),
        }
    }

    fn from_parts(buffer: ArrayBuffer, byte_offset: usize, length: usize) -> Self {
        Self {
            buffer,
            byte_offset,
            length,
            _element: PhantomData,
        }
    }

    /// The buffer this view refers to.
    pub fn buffer(&self) -> &ArrayBuffer {
        &self.buffer
    }

    /// Offset of the first element, in bytes from the start of the buffer.
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Size of the view in bytes.
    pub fn byte_length(&self) -> usize {
        self.length * E::BYTES
    }

    /// Number of elements in the view.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Element at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<E> {
        if index >= self.length {
            return None;
        }

        let start = self.byte_offset + index * E::BYTES;
        Some(E::read(&self.buffer.bytes()[start..start + E::BYTES]))
    }

    /// Store `value` at `index`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::IndexOutOfBounds`] if `index` is past the end.
    pub fn set(&self, index: usize, value: E) -> ArrayResult<()> {
        if index >= self.length {
            return Err(ArrayError::IndexOutOfBounds {
                index,
                length: self.length,
            });
        }

        let start = self.byte_offset + index * E::BYTES;
        value.write(&mut self.buffer.bytes_mut()[start..start + E::BYTES]);
        Ok(())
    }

    /// Store an arbitrary number at `index`, wrapping it into the element
    /// range. For [`Int8Array`] `200.0` is stored as `-56`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::IndexOutOfBounds`] if `index` is past the end.
    pub fn set_number(&self, index: usize, value: f64) -> ArrayResult<()> {
        self.set(index, E::from_number(value))
    }

    /// View of the elements from `begin` to the end of this view.
    ///
    /// A negative `begin` counts from the end, so `subarray(-2)` is the last
    /// two elements.
    pub fn subarray(&self, begin: isize) -> Self {
        self.slice_view(begin, None)
    }

    /// View of the elements in `[begin, end)`, sharing this view's buffer.
    ///
    /// Negative indices count from the end, both are clamped to the view,
    /// and `end <= begin` produces an empty view.
    pub fn subarray_range(&self, begin: isize, end: isize) -> Self {
        self.slice_view(begin, Some(end))
    }

    fn slice_view(&self, begin: isize, end: Option<isize>) -> Self {
        let (start, end) = resolve_range(self.length, begin, end);

        Self::from_parts(
            self.buffer.clone(),
            self.byte_offset + start * E::BYTES,
            end - start,
        )
    }

    /// Copy the elements out.
    pub fn to_vec(&self) -> Vec<E> {
        let bytes = self.buffer.bytes();
        bytes[self.byte_offset..self.byte_offset + self.byte_length()]
            .chunks_exact(E::BYTES)
            .map(E::read)
            .collect()
    }
}

#[cfg(target_arch = "wasm32")]
impl TypedArray<i8> {
    /// Copy the elements into a new JS `Int8Array`.
    pub fn to_js(&self) -> js_sys::Int8Array {
        js_sys::Int8Array::from(self.to_vec().as_slice())
    }

    /// Copy the elements of a JS `Int8Array` into a new buffer.
    ///
    /// # Errors
    ///
    /// [`ArrayError::AllocationFailed`] if the buffer could not be allocated.
    pub fn from_js(array: &js_sys::Int8Array) -> ArrayResult<Self> {
        Self::from_slice(&array.to_vec())
    }
}

fn check_alignment<E: Element>(byte_offset: usize) -> ArrayResult<()> {
    if byte_offset % E::BYTES == 0 {
        Ok(())
    } else {
        Err(ArrayError::Misaligned {
            byte_offset,
            element_size: E::BYTES,
        })
    }
}

impl<E: Element> Clone for TypedArray<E> {
    fn clone(&self) -> Self {
        Self::from_parts(self.buffer.clone(), self.byte_offset, self.length)
    }
}

impl<E: Element> Debug for TypedArray<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedArray")
            .field("byte_offset", &self.byte_offset)
            .field("length", &self.length)
            .field("elements", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let array = Int8Array::new(5).unwrap();
        assert_eq!(array.length(), 5);
        assert_eq!(array.byte_length(), 5);
        assert_eq!(array.to_vec(), vec![0; 5]);
        assert_eq!(Int8Array::BYTES_PER_ELEMENT, 1);
    }

    #[test]
    fn test_new_reports_unaddressable_length() {
        let length = usize::MAX / 2;
        assert_eq!(
            Int32Array::new(length).unwrap_err(),
            ArrayError::TooLong {
                length,
                element_size: 4
            }
        );
    }

    #[test]
    fn test_set_number_wraps() {
        let array = Int8Array::new(6).unwrap();
        array.set_number(0, 127.0).unwrap();
        array.set_number(1, 128.0).unwrap();
        array.set_number(2, 200.0).unwrap();
        array.set_number(3, -129.0).unwrap();
        array.set_number(4, 3.9).unwrap();
        array.set_number(5, f64::NAN).unwrap();

        assert_eq!(array.to_vec(), vec![127, -128, -56, 127, 3, 0]);
    }

    #[test]
    fn test_unsigned_conversion() {
        assert_eq!(u8::from_number(-1.0), 255);
        assert_eq!(u16::from_number(65_537.0), 1);
        assert_eq!(i32::from_number(2_147_483_648.0), i32::MIN);
        assert_eq!(u32::from_number(f64::INFINITY), 0);
        assert_eq!(i8::from_number(-3.7), -3);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let array = Int8Array::new(2).unwrap();
        assert_eq!(array.get(2), None);
        assert_eq!(
            array.set(2, 1),
            Err(ArrayError::IndexOutOfBounds {
                index: 2,
                length: 2
            })
        );
    }

    #[test]
    fn test_subarray_negative() {
        let array = Int8Array::from_slice(&[1, 2, 3, 4, 5]).unwrap();

        let tail = array.subarray(-2);
        assert_eq!(tail.length(), 2);
        assert_eq!(tail.byte_offset(), 3);
        assert_eq!(tail.to_vec(), vec![4, 5]);

        assert_eq!(array.subarray_range(1, -1).to_vec(), vec![2, 3, 4]);
        assert!(array.subarray_range(3, 1).is_empty());
        assert_eq!(array.subarray_range(-100, 100).to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_nested_subarray_offsets() {
        let array = Int16Array::from_slice(&[10, 20, 30, 40]).unwrap();
        let middle = array.subarray_range(1, 3);
        let last = middle.subarray(1);

        assert_eq!(middle.byte_offset(), 2);
        assert_eq!(last.byte_offset(), 4);
        assert_eq!(last.to_vec(), vec![30]);
    }

    #[test]
    fn test_wide_element_alignment() {
        let buffer = ArrayBuffer::new(6).unwrap();

        assert_eq!(
            Int32Array::with_buffer(buffer.clone()).unwrap_err(),
            ArrayError::LengthNotMultiple {
                byte_length: 6,
                element_size: 4
            }
        );
        assert_eq!(
            Int16Array::with_buffer_offset(buffer.clone(), 1).unwrap_err(),
            ArrayError::Misaligned {
                byte_offset: 1,
                element_size: 2
            }
        );
        assert_eq!(Int16Array::with_buffer(buffer).unwrap().length(), 3);
    }

    #[test]
    fn test_range_checks() {
        let buffer = ArrayBuffer::new(4).unwrap();

        assert!(matches!(
            Int8Array::with_buffer_offset(buffer.clone(), 5),
            Err(ArrayError::OutOfRange { .. })
        ));
        assert!(Int8Array::with_buffer_offset(buffer.clone(), 4)
            .unwrap()
            .is_empty());
        assert!(matches!(
            Int8Array::with_buffer_range(buffer.clone(), 2, 3),
            Err(ArrayError::OutOfRange { .. })
        ));
        assert!(matches!(
            Int8Array::with_buffer_range(buffer, 1, usize::MAX),
            Err(ArrayError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_copy_constructors_do_not_alias() {
        let source = Int16Array::from_slice(&[300, -1]).unwrap();
        let copy = Int8Array::from_array(&source).unwrap();

        assert_eq!(copy.to_vec(), vec![44, -1]);
        assert!(!copy.buffer().ptr_eq(source.buffer()));

        let numbers = Int8Array::from_numbers(&[1.5, -2.5, 256.0]).unwrap();
        assert_eq!(numbers.to_vec(), vec![1, -2, 0]);
    }

    #[test]
    fn test_little_endian_layout() {
        let array = Uint16Array::from_slice(&[0x0102]).unwrap();
        assert_eq!(array.buffer().to_vec(), vec![0x02, 0x01]);

        let floats = Float32Array::from_numbers(&[1.5]).unwrap();
        assert_eq!(floats.get(0), Some(1.5));
    }
}
