// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Frame-indexed state shared between the producer and the render side.
//!
//! The engine keeps up to [`MAX_FRAMES_IN_FLIGHT`] frames alive at once. A
//! [`PerFrameValue`] holds one independent slot per in-flight frame so that the
//! frame being recorded never observes writes made for the frame being submitted.
//!
//! ```text
//! Frame N:     [Slot 0: submitted, released at end of frame]
//! Frame N+1:   [Slot 1: recorded]
//! Frame N+2:   [Slot 0: reset to its default, recorded again]
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};

/// Number of frames that may be in flight at once.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// The monotonically increasing number of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// The slot this frame occupies in every [`PerFrameValue`].
    pub const fn slot(&self) -> usize {
        (self.0 % MAX_FRAMES_IN_FLIGHT as u64) as usize
    }

    /// The frame that follows this one.
    pub const fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A value that can live in a lock-free per-frame slot.
pub trait FrameSlotValue: Copy + Send + Sync + Debug + 'static {
    /// The atomic storage cell.
    type Cell: Send + Sync + Debug;

    /// Creates a cell holding `value`.
    fn new_cell(value: Self) -> Self::Cell;
    /// Reads the cell.
    fn load(cell: &Self::Cell) -> Self;
    /// Overwrites the cell.
    fn store(cell: &Self::Cell, value: Self);
}

macro_rules! impl_frame_slot_value {
    ($ty:ty, $atomic:ty) => {
        impl FrameSlotValue for $ty {
            type Cell = $atomic;

            fn new_cell(value: Self) -> Self::Cell {
                <$atomic>::new(value)
            }

            fn load(cell: &Self::Cell) -> Self {
                cell.load(Ordering::Acquire)
            }

            fn store(cell: &Self::Cell, value: Self) {
                cell.store(value, Ordering::Release)
            }
        }
    };
}

impl_frame_slot_value!(bool, AtomicBool);
impl_frame_slot_value!(u32, AtomicU32);
impl_frame_slot_value!(u64, AtomicU64);
impl_frame_slot_value!(i32, AtomicI32);

impl FrameSlotValue for f32 {
    type Cell = AtomicU32;

    fn new_cell(value: Self) -> Self::Cell {
        AtomicU32::new(value.to_bits())
    }

    fn load(cell: &Self::Cell) -> Self {
        f32::from_bits(cell.load(Ordering::Acquire))
    }

    fn store(cell: &Self::Cell, value: Self) {
        cell.store(value.to_bits(), Ordering::Release)
    }
}

/// One value per in-flight frame, readable and writable through `&self`.
#[derive(Debug)]
pub struct PerFrameValue<T: FrameSlotValue> {
    slots: [T::Cell; MAX_FRAMES_IN_FLIGHT],
    default: T,
}

impl<T: FrameSlotValue> PerFrameValue<T> {
    /// Creates a value whose every slot starts at `default`.
    pub fn new(default: T) -> Self {
        Self {
            slots: std::array::from_fn(|_| T::new_cell(default)),
            default,
        }
    }

    /// Reads the slot of `frame`.
    pub fn get(&self, frame: FrameIndex) -> T {
        T::load(&self.slots[frame.slot()])
    }

    /// Writes the slot of `frame`. Other slots are untouched.
    pub fn set(&self, frame: FrameIndex, value: T) {
        T::store(&self.slots[frame.slot()], value);
    }

    /// Resets the slot of `frame` to the default once the frame has been submitted.
    pub fn release(&self, frame: FrameIndex) {
        T::store(&self.slots[frame.slot()], self.default);
    }

    /// Resets every slot to the default.
    pub fn reset_all(&self) {
        for slot in &self.slots {
            T::store(slot, self.default);
        }
    }
}

impl<T: FrameSlotValue + Default> Default for PerFrameValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
