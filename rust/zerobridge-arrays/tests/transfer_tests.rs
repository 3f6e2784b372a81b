use zerobridge_arrays::{
    BackingKind, DirectArray, Endpoint, HeapArray, OwnershipState, Side, ffi,
};
use zerobridge_native_alloc::AllocatorStats;
use zerobridge_testkit::fixtures::{K_FIXTURE, bumped};

#[test]
fn test_round_trip_preserves_contents_and_frees_once() {
    let before = AllocatorStats::current_thread();

    let mut native = Endpoint::with_array(
        Side::Native,
        DirectArray::allocate_unsafe(K_FIXTURE.len() as u64),
    );
    native.write(&K_FIXTURE).unwrap();
    let address = native.array().raw_handle().unwrap().address;

    let mut managed = Endpoint::new(Side::Managed);
    assert!(native.transfer_to(&mut managed));

    assert_eq!(native.state(), OwnershipState::Unbound);
    assert_eq!(managed.state(), OwnershipState::Owned(Side::Managed));
    // The previous owner no longer holds anything it could release.
    native.release();
    assert_eq!(AllocatorStats::current_thread().since(&before).frees, 0);

    assert!(managed.transfer_to(&mut native));
    assert!(native.check(&K_FIXTURE));
    assert_eq!(native.array().raw_handle().unwrap().address, address);

    native.release();
    native.release();
    drop(native);
    drop(managed);

    let delta = AllocatorStats::current_thread().since(&before);
    assert_eq!(delta.allocations, 1);
    assert_eq!(delta.frees, 1);
}

#[test]
fn test_lent_view_sees_every_write() {
    let mut owner = Endpoint::with_array(
        Side::Native,
        DirectArray::allocate_unsafe(K_FIXTURE.len() as u64),
    );
    for i in 0..K_FIXTURE.len() {
        let expected = bumped(&K_FIXTURE, i);
        owner.lend_mut().write_all(&expected).unwrap();

        let view = owner.lend();
        assert!(view.contents_eq(&expected));
        assert_eq!(view.get(i as u64), expected[i]);
    }
    assert_eq!(owner.state(), OwnershipState::Owned(Side::Native));
}

#[test]
fn test_raw_handle_round_trip_across_c_abi() {
    let before = AllocatorStats::current_thread();

    let handle = ffi::zb_allocate_unsafe(K_FIXTURE.len() as u64);
    assert_eq!(handle.backing_kind(), Some(BackingKind::NativeUnsafe));
    let written = unsafe { ffi::zb_write(handle, 0, K_FIXTURE.as_ptr(), K_FIXTURE.len() as u64) };
    assert_eq!(written, K_FIXTURE.len() as u64);

    let mut managed = Endpoint::new(Side::Managed);
    assert!(unsafe { managed.import(handle) });
    assert!(managed.check(&K_FIXTURE));

    let handle = managed.export().unwrap();
    unsafe { ffi::zb_release(handle) };

    let delta = AllocatorStats::current_thread().since(&before);
    assert_eq!(delta.allocations, 1);
    assert_eq!(delta.frees, 1);
}

#[test]
fn test_heap_backed_array_survives_relocation() {
    let heap = HeapArray::copy_from(&K_FIXTURE);
    let mut managed = Endpoint::with_array(Side::Managed, DirectArray::wrap_managed_heap(&heap));
    assert!(heap.relocate());
    assert!(managed.check(&K_FIXTURE));

    managed.lend_mut().put(0, 0xff);
    assert!(heap.relocate());
    assert_eq!(heap.to_vec()[0], 0xff);
    assert_eq!(heap.relocation_count(), 2);

    // Heap arrays have no stable address to hand across as a raw handle.
    assert!(managed.export().is_none());
    assert!(managed.has_array());
}

#[test]
fn test_zero_length_array_is_present() {
    let mut native = Endpoint::new(Side::Native);
    assert!(native.adopt(DirectArray::allocate_unsafe(0)));
    assert!(native.array().is_empty());
    assert!(native.check(&[]));
    assert!(native.write(&[]).is_ok());

    let mut absent = Endpoint::new(Side::Native);
    assert!(!absent.adopt(DirectArray::wrap_unsafe(None)));
    assert!(absent.array().is_empty());
    assert!(!absent.check(&[]));
    assert!(absent.write(&[]).is_err());
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "out of bounds")]
fn test_read_at_length_panics_in_debug() {
    let da = DirectArray::allocate_unsafe(4);
    let _ = da.get(4);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "not in flight")]
fn test_double_release_across_c_abi_panics_in_debug() {
    let handle = ffi::zb_allocate_unsafe(4);
    unsafe {
        ffi::zb_release(handle);
        ffi::zb_release(handle);
    }
}
