// Layout conformance tests for the shared cursor block. The two cursors
// and the stop flag are the contended atomics; they must each sit on
// their own cache line or producer traffic false-shares with consumers.
// Observed values are printed to aid debugging on an unusual platform.

use memoffset::offset_of;
use rowring::mpmc::buffer::Cursors;
use std::mem::{align_of, size_of};

#[test]
fn test_cursor_block_layout() {
    let size = size_of::<Cursors>();
    let align = align_of::<Cursors>();
    let off_prod = offset_of!(Cursors, prod_next);
    let off_cons = offset_of!(Cursors, cons_next);
    let off_stop = offset_of!(Cursors, stop);

    println!(
        "Cursors => size: {size}, align: {align}, offsets: [prod_next:{off_prod}, cons_next:{off_cons}, stop:{off_stop}]"
    );

    assert_eq!(off_prod, 0);
    // Each padded field must clear a cache line before the next begins.
    assert!(off_cons - off_prod >= 64);
    assert!(off_stop - off_cons >= 64);
    assert!(size - off_stop >= 64);
    assert!(align >= 64);
}
