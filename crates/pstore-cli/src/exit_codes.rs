//! Process exit statuses. Part of the boot contract: init scripts key off them.

use pstore_core::{DrainError, FailureClass};

pub const SUCCESS: i32 = 0;
pub const GATE_UNAVAILABLE: i32 = 2; // Mount failed or pstore not mounted
pub const SOURCE_UNREADABLE: i32 = 3; // Probe/enumeration of the pstore root failed
pub const DELETE_FAILED: i32 = 4; // An entry could not be removed after copying
pub const UNMOUNT_FAILED: i32 = 5; // Checked unmount at the end of a pass failed

pub fn for_error(err: &DrainError) -> i32 {
    match err.class() {
        FailureClass::Gate => GATE_UNAVAILABLE,
        FailureClass::Source => SOURCE_UNREADABLE,
        FailureClass::Delete => DELETE_FAILED,
        FailureClass::Unmount => UNMOUNT_FAILED,
    }
}
