//! Views over shared buffers.

use wasm_socket_bindings::{ArrayBuffer, ArrayError, Int16Array, Int8Array, Uint8Array};

/// Every aligned `(offset, length)` that fits exposes exactly that window.
#[test]
fn view_exposes_requested_window() {
    let bytes: Vec<u8> = (0..16).collect();
    let buffer = ArrayBuffer::from(bytes);

    for offset in 0..=16 {
        for length in 0..=(16 - offset) {
            let view = Uint8Array::with_buffer_range(buffer.clone(), offset, length).unwrap();
            assert_eq!(view.length(), length);
            assert_eq!(view.byte_offset(), offset);

            let expected: Vec<u8> = (offset..offset + length)
                .map(|byte| u8::try_from(byte).unwrap())
                .collect();
            assert_eq!(view.to_vec(), expected, "offset {offset}, length {length}");
        }
    }
}

#[test]
fn writes_are_visible_through_aliasing_views() {
    let buffer = ArrayBuffer::new(8).unwrap();
    let a = Int8Array::with_buffer(buffer.clone()).unwrap();
    let b = Int8Array::with_buffer_offset(buffer.clone(), 4).unwrap();
    let c = Int8Array::with_buffer_range(buffer, 2, 4).unwrap();

    a.set(5, -42).unwrap();
    assert_eq!(b.get(1), Some(-42));
    assert_eq!(c.get(3), Some(-42));

    b.set(0, 17).unwrap();
    assert_eq!(a.get(4), Some(17));
    assert_eq!(c.get(2), Some(17));
}

#[test]
fn subarray_aliases_parent() {
    let array = Int8Array::from_slice(&[10, 20, 30, 40, 50]).unwrap();
    let tail = array.subarray(-2);

    assert_eq!(tail.to_vec(), vec![40, 50]);
    assert!(tail.buffer().ptr_eq(array.buffer()));

    tail.set(1, -1).unwrap();
    assert_eq!(array.get(4), Some(-1));
}

#[test]
fn differently_typed_views_share_bytes() {
    let buffer = ArrayBuffer::new(4).unwrap();
    let bytes = Int8Array::with_buffer(buffer.clone()).unwrap();
    let words = Int16Array::with_buffer(buffer).unwrap();

    words.set(1, -2).unwrap();
    assert_eq!(bytes.to_vec(), vec![0, 0, -2, -1]);
}

#[test]
fn whole_buffer_view_defaults_to_offset_zero() {
    let buffer = ArrayBuffer::new(3).unwrap();
    let view = Int8Array::with_buffer(buffer).unwrap();

    assert_eq!(view.byte_offset(), 0);
    assert_eq!(view.length(), 3);
}

#[test]
fn copies_do_not_alias() {
    let original = Int8Array::from_slice(&[1, 2, 3]).unwrap();
    let copy = Int8Array::from_array(&original).unwrap();

    copy.set(0, 9).unwrap();
    assert_eq!(original.get(0), Some(1));
}

#[test]
fn range_violations_are_errors() {
    let buffer = ArrayBuffer::new(4).unwrap();

    assert_eq!(
        Int8Array::with_buffer_range(buffer.clone(), 3, 2).unwrap_err(),
        ArrayError::OutOfRange {
            byte_offset: 3,
            byte_length: 2,
            buffer_length: 4
        }
    );
    assert_eq!(
        Int16Array::with_buffer_range(buffer, 1, 1).unwrap_err(),
        ArrayError::Misaligned {
            byte_offset: 1,
            element_size: 2
        }
    );
}
