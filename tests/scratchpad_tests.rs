//! Integration tests for the typed allocation layer

mod common;

use common::{default_sizes, CountingScratchpad};
use scratchforge::{
    MemoryClass, PreallocScratchpad, ScratchError, ScratchSizes, Scratchpad, ScratchpadExt,
    TensorShape,
};

fn pad() -> PreallocScratchpad {
    PreallocScratchpad::new(default_sizes())
}

#[test]
fn typed_allocation_is_naturally_aligned() {
    let mut pad = pad();
    // Force an odd cursor position first so alignment actually has to work.
    pad.alloc(MemoryClass::Host, 3, 1).unwrap();

    let p64 = pad.allocate::<u64>(MemoryClass::Host, 4).unwrap();
    assert_eq!(p64.as_ptr() as usize % std::mem::align_of::<u64>(), 0);

    let p16 = pad.allocate::<u16>(MemoryClass::Host, 9).unwrap();
    assert_eq!(p16.as_ptr() as usize % std::mem::align_of::<u16>(), 0);
}

#[test]
fn explicit_alignment_is_honored_exactly() {
    let mut pad = pad();
    pad.alloc(MemoryClass::Host, 1, 1).unwrap();
    let ptr = pad
        .allocate_aligned::<u8>(MemoryClass::Host, 10, 256)
        .unwrap();
    assert_eq!(ptr.as_ptr() as usize % 256, 0);
}

#[test]
fn distinct_allocations_do_not_overlap() -> anyhow::Result<()> {
    let mut pad = pad();
    let a = pad.allocate::<u32>(MemoryClass::Host, 16)?;
    let b = pad.allocate::<u32>(MemoryClass::Host, 16)?;
    let a_range = a.as_ptr() as usize..a.as_ptr() as usize + 64;
    let b_start = b.as_ptr() as usize;
    assert!(!a_range.contains(&b_start));
    Ok(())
}

#[test]
fn tensor_view_matches_shape_volume() {
    let mut pad = pad();
    let shape = TensorShape::from_dims(&[2, 3, 4]);
    let mut view = pad
        .alloc_tensor::<f32>(MemoryClass::Host, shape)
        .unwrap();
    assert_eq!(view.len(), 24);
    assert_eq!(view.shape().dims(), &[2, 3, 4]);

    let slice = unsafe { view.as_mut_slice() };
    for (i, v) in slice.iter_mut().enumerate() {
        *v = i as f32;
    }
    let readback = unsafe { view.as_slice() };
    assert_eq!(readback[23], 23.0);
}

#[test]
fn tensor_list_offsets_are_exclusive_prefix_sums() {
    let mut pad = pad();
    let shapes = vec![
        TensorShape::from_dims(&[2, 2]),
        TensorShape::from_dims(&[3]),
        TensorShape::from_dims(&[4, 1]),
    ];
    let list = pad
        .alloc_tensor_list::<i64>(MemoryClass::Host, &shapes)
        .unwrap();

    assert_eq!(list.num_items(), 3);
    assert_eq!(list.total_elements(), 11);
    assert_eq!(list.offsets(), &[0, 4, 7]);

    // Item pointers derive from the shared base via the offsets.
    let base = list.base_ptr() as usize;
    let item1 = list.get(1).unwrap();
    assert_eq!(
        item1.as_ptr() as usize,
        base + 4 * std::mem::size_of::<i64>()
    );
    assert_eq!(item1.len(), 3);
    assert!(list.get(3).is_none());
}

#[test]
fn tensor_list_items_share_one_allocation() {
    let mut counting = CountingScratchpad::new(default_sizes());
    let shapes = vec![
        TensorShape::from_dims(&[8]),
        TensorShape::from_dims(&[16]),
        TensorShape::from_dims(&[32]),
    ];
    counting
        .alloc_tensor_list::<f32>(MemoryClass::Host, &shapes)
        .unwrap();
    assert_eq!(counting.allocs_in(MemoryClass::Host), 1);
}

#[test]
fn tensor_list_volume_sum_overflow_is_invalid_argument() {
    let mut counting = CountingScratchpad::new(default_sizes());
    let shapes = vec![
        TensorShape::from_dims(&[usize::MAX]),
        TensorShape::from_dims(&[2]),
    ];
    let err = counting
        .alloc_tensor_list::<u8>(MemoryClass::Host, &shapes)
        .unwrap_err();
    assert!(matches!(err, ScratchError::InvalidArgument(_)));
    assert_eq!(counting.total_allocs(), 0);
}

#[test]
fn empty_tensor_list() {
    let mut pad = pad();
    let list = pad
        .alloc_tensor_list::<f32>(MemoryClass::Host, &[])
        .unwrap();
    assert_eq!(list.num_items(), 0);
    assert_eq!(list.total_elements(), 0);
}

#[test]
fn host_staging_copies_synchronously() {
    let mut pad = pad();
    for class_copy in [MemoryClass::Host, MemoryClass::Pinned, MemoryClass::Unified] {
        let src = vec![3u32, 1, 4, 1, 5];
        let ptr = match class_copy {
            MemoryClass::Host => pad.to_host(&src).unwrap(),
            MemoryClass::Pinned => pad.to_pinned(&src).unwrap(),
            _ => pad.to_unified(&src).unwrap(),
        };
        let copied = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), src.len()) };
        assert_eq!(copied, src.as_slice());
    }
}

#[test]
fn invalid_alignment_performs_no_allocation() {
    let mut counting = CountingScratchpad::new(default_sizes());
    for align in [0usize, 3, 24] {
        let err = counting.alloc(MemoryClass::Host, 64, align).unwrap_err();
        assert!(matches!(err, ScratchError::InvalidArgument(_)));
    }
    assert_eq!(counting.total_allocs(), 0);
}

#[test]
fn out_of_memory_is_terminal_and_reported() {
    let sizes = ScratchSizes::new().with_capacity(MemoryClass::Host, 256);
    let mut pad = PreallocScratchpad::new(sizes);
    pad.alloc(MemoryClass::Host, 200, 1).unwrap();
    let err = pad.alloc(MemoryClass::Host, 100, 1).unwrap_err();
    assert_eq!(
        err,
        ScratchError::OutOfMemory {
            class: MemoryClass::Host,
            requested: 100,
            available: 56,
        }
    );
    assert!(err.is_recoverable());
}

#[test]
fn zero_byte_allocation_is_distinguishable_from_failure() {
    let mut pad = pad();
    let ptr = pad.alloc(MemoryClass::Device, 0, 128).unwrap();
    assert_eq!(ptr.as_ptr() as usize % 128, 0);
    // Nothing was consumed from the device arena.
    assert_eq!(pad.allocated_bytes(MemoryClass::Device), 0);
}

#[cfg(not(feature = "rocm"))]
mod emulated_device {
    use super::*;
    use rand::{thread_rng, Rng};
    use scratchforge::Stream;

    #[test]
    fn to_gpu_queues_exactly_one_async_copy() {
        let mut pad = pad();
        let stream = Stream::new().unwrap();

        let mut rng = thread_rng();
        let payload: Vec<f32> = (0..257).map(|_| rng.gen()).collect();

        let device = pad.to_gpu(&stream, &payload).unwrap();
        assert_eq!(stream.pending_ops(), 1);

        stream.synchronize().unwrap();
        assert_eq!(stream.pending_ops(), 0);
        let on_device = unsafe { std::slice::from_raw_parts(device.as_ptr(), payload.len()) };
        assert_eq!(on_device, payload.as_slice());
    }

    #[test]
    fn to_gpu_with_empty_collection_submits_nothing() {
        let mut pad = pad();
        let stream = Stream::new().unwrap();
        let empty: Vec<u8> = Vec::new();
        pad.to_gpu(&stream, &empty).unwrap();
        assert_eq!(stream.pending_ops(), 0);
    }
}
