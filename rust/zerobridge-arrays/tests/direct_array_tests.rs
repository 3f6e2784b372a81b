use zerobridge_arrays::{ByteBuffer, DirectArray};
use zerobridge_testkit::{
    fixtures::{K_FIXTURE, bumped, direct_fixture, heap_fixture},
    holder::{NativeArrayHolder, check_arrays},
};

#[test]
fn test_null() {
    assert!(NativeArrayHolder::check_null_direct_array(
        &DirectArray::wrap_managed_direct(None)
    ));
}

#[test]
fn test_heap_buffer_is_null() {
    let heap = ByteBuffer::wrap(heap_fixture());
    assert!(NativeArrayHolder::check_null_direct_array(
        &DirectArray::wrap_managed_direct(&heap)
    ));
}

#[test]
fn test_empty_managed() {
    let empty = ByteBuffer::allocate_direct(0).unwrap();
    let da = DirectArray::wrap_managed_direct(&empty);
    let mut holder = NativeArrayHolder::create();
    assert!(holder.wrap(da));

    check_arrays(&mut holder, &[]).unwrap();
}

#[test]
fn test_empty_native_direct() {
    let mut holder = NativeArrayHolder::allocate_direct(0).unwrap();
    check_arrays(&mut holder, &[]).unwrap();
}

#[test]
fn test_empty_native_facade() {
    let mut holder = NativeArrayHolder::allocate_facade(0).unwrap();
    check_arrays(&mut holder, &[]).unwrap();
}

#[test]
fn test_non_empty_managed() {
    let actual = direct_fixture().unwrap();
    let da = DirectArray::wrap_managed_direct(&actual);
    let mut holder = NativeArrayHolder::create();
    assert!(holder.wrap(da));

    check_arrays(&mut holder, &K_FIXTURE).unwrap();
}

#[test]
fn test_non_empty_native_direct() {
    let mut holder = NativeArrayHolder::allocate_direct(K_FIXTURE.len() as u64).unwrap();
    assert!(holder.write(&K_FIXTURE));

    check_arrays(&mut holder, &K_FIXTURE).unwrap();
}

#[test]
fn test_non_empty_native_facade() {
    let mut holder = NativeArrayHolder::allocate_facade(K_FIXTURE.len()).unwrap();
    assert!(holder.write(&K_FIXTURE));

    check_arrays(&mut holder, &K_FIXTURE).unwrap();
    assert_eq!(holder.native_buf(), &K_FIXTURE);
}

// Writes to a managed direct buffer stay visible to the native holder without
// re-wrapping.
#[test]
fn test_write_managed() {
    let actual = ByteBuffer::allocate_direct(K_FIXTURE.len() as u64).unwrap();
    let mut holder = NativeArrayHolder::create();
    assert!(holder.wrap(DirectArray::wrap_managed_direct(&actual)));

    for i in 0..K_FIXTURE.len() {
        let expected = bumped(&K_FIXTURE, i);
        actual.write_at(0, &expected);

        check_arrays(&mut holder, &expected).unwrap();
    }
}

// Writes by the native holder stay visible to the managed side, which sees the same
// buffer object every time.
#[test]
fn test_write_native_direct() {
    let mut holder = NativeArrayHolder::allocate_direct(K_FIXTURE.len() as u64).unwrap();
    let first = holder.take_array();
    let buffer = first.as_direct_buffer().cloned().unwrap();
    assert!(holder.wrap(first));

    for i in 0..K_FIXTURE.len() {
        let expected = bumped(&K_FIXTURE, i);
        assert!(holder.write(&expected));

        check_arrays(&mut holder, &expected).unwrap();
        assert_eq!(buffer.to_vec(), expected);
    }
}

#[test]
fn test_write_native_facade() {
    let mut holder = NativeArrayHolder::allocate_facade(K_FIXTURE.len()).unwrap();

    for i in 0..K_FIXTURE.len() {
        let expected = bumped(&K_FIXTURE, i);
        assert!(holder.write(&expected));

        check_arrays(&mut holder, &expected).unwrap();
        assert_eq!(holder.native_buf(), expected.as_slice());
    }
}

#[test]
fn test_write_size_mismatch_is_rejected() {
    let mut holder = NativeArrayHolder::allocate_direct(4).unwrap();
    assert!(!holder.write(&K_FIXTURE));
    assert!(!holder.write(&[]));
    check_arrays(&mut holder, &[0; 4]).unwrap();
}

#[test]
fn test_native_unsafe_array_through_holder() {
    let mut da = DirectArray::allocate_unsafe(K_FIXTURE.len() as u64);
    da.write_all(&K_FIXTURE).unwrap();
    let mut holder = NativeArrayHolder::create();
    assert!(holder.wrap(da));
    check_arrays(&mut holder, &K_FIXTURE).unwrap();
}

#[test]
fn test_foreign_round_trip() {
    let mut native = K_FIXTURE.to_vec();
    let mut da =
        unsafe { DirectArray::wrap_foreign(native.as_mut_ptr() as u64, native.len() as u64) };
    assert!(da.has_array());
    assert_eq!(da.len(), K_FIXTURE.len() as u64);
    assert!(da.contents_eq(&K_FIXTURE));
    assert_eq!(da.to_vec(), K_FIXTURE);

    let expected = bumped(&K_FIXTURE, 1);
    da.write_all(&expected).unwrap();
    da.release();
    assert_eq!(native, expected);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "out of bounds")]
fn test_foreign_put_at_length_panics_in_debug() {
    let mut native = K_FIXTURE.to_vec();
    let mut da =
        unsafe { DirectArray::wrap_foreign(native.as_mut_ptr() as u64, native.len() as u64) };
    da.put(K_FIXTURE.len() as u64, 0);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "out of bounds")]
fn test_managed_direct_put_at_length_panics_in_debug() {
    let buffer = direct_fixture().unwrap();
    let mut da = DirectArray::wrap_managed_direct(&buffer);
    da.put(K_FIXTURE.len() as u64, 0);
}
