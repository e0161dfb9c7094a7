//! Type-erased columnar component storage.
//!
//! A [`ComponentColumn`] is the SoA storage for one component type within
//! one archetype: a raw byte buffer plus a live element count, managed
//! through the vtable captured at registration time.
//!
//! ## Invariants
//! - Element `i` lives at byte offset `i * size` from the base pointer.
//! - The buffer is aligned to the component's alignment.
//! - Exactly the first `len` elements are live; everything past them is
//!   uninitialized storage.
//! - The column exclusively owns its buffer and every live element in it.
//!
//! ## Growth
//! Capacity grows geometrically: `new_capacity = max(required, 2 * current)`
//! elements. Relocation is a byte copy of the live prefix; in Rust every
//! value can be relocated this way, so growth never runs user code.
//! Allocation failure is fatal.
//!
//! ## Unsafe code
//! This module is one of the few places in the crate that manipulates raw
//! memory. All unsafe blocks are local to this file and rely only on the
//! invariants above plus the type checks performed against the column's
//! [`ComponentTypeInfo`].

use std::{
    alloc::{alloc, dealloc, handle_alloc_error, Layout},
    any::type_name,
    ptr::{self, NonNull},
};

use crate::engine::component::ComponentTypeInfo;
use crate::engine::error::ColumnError;

/// Type-erased growable vector for one component type.
///
/// ## Purpose
/// Stores all values of a single component type for the entities of one
/// archetype, contiguously, so queries sweep the column linearly.
///
/// ## Design
/// The column does not know its element type at compile time; it consults
/// the registered [`ComponentTypeInfo`] for layout and drop behavior, and
/// verifies `TypeId`s before handing out typed views.
pub struct ComponentColumn {
    info: ComponentTypeInfo,
    data: NonNull<u8>,
    /// Capacity in elements. Unbounded (`usize::MAX`) for zero-sized types.
    capacity: usize,
    len: usize,
}

// SAFETY: registration bounds component types to `Send + Sync`, and the
// column exclusively owns its buffer and elements.
unsafe impl Send for ComponentColumn {}
// SAFETY: as above; shared access hands out only shared views.
unsafe impl Sync for ComponentColumn {}

impl ComponentColumn {
    /// Creates an empty column for the component type described by `info`.
    ///
    /// No allocation happens until the first element is pushed. Zero-sized
    /// component types never allocate.
    pub fn new(info: ComponentTypeInfo) -> Self {
        let capacity = if info.size() == 0 { usize::MAX } else { 0 };
        // SAFETY: alignments are non-zero, so this produces a valid dangling
        // base pointer with the component's alignment.
        let data = unsafe { NonNull::new_unchecked(info.align() as *mut u8) };
        Self {
            info,
            data,
            capacity,
            len: 0,
        }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the column holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current capacity in elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The vtable this column was created from.
    #[inline]
    pub fn type_info(&self) -> &ComponentTypeInfo {
        &self.info
    }

    #[inline]
    fn element_size(&self) -> usize {
        self.info.size()
    }

    /// Pointer to element `index` without a bounds check.
    ///
    /// ## Safety
    /// `index` must be within the column's capacity.
    #[inline]
    unsafe fn ptr_unchecked(&self, index: usize) -> *mut u8 {
        // SAFETY: the caller keeps `index` within capacity, so the offset
        // stays inside (or one past) the allocation.
        unsafe { self.data.as_ptr().add(index * self.element_size()) }
    }

    /// Base pointer of the element storage.
    #[inline]
    pub fn base_ptr(&self) -> *mut u8 {
        self.data.as_ptr()
    }

    /// Raw pointer to live element `index`, or `None` out of bounds.
    #[inline]
    pub fn ptr(&self, index: usize) -> Option<*mut u8> {
        if index >= self.len {
            return None;
        }
        // SAFETY: `index < len <= capacity`.
        Some(unsafe { self.ptr_unchecked(index) })
    }

    /// Typed base pointer, or `None` if `T` is not this column's type.
    #[inline]
    pub fn typed_base<T: 'static>(&self) -> Option<*mut T> {
        if !self.info.matches_type::<T>() {
            return None;
        }
        Some(self.data.as_ptr().cast::<T>())
    }

    /// Shared typed view of the live elements.
    ///
    /// Returns `None` if `T` is not the column's registered element type.
    pub fn as_slice<T: 'static>(&self) -> Option<&[T]> {
        if !self.info.matches_type::<T>() {
            return None;
        }
        // SAFETY: the type check guarantees layout agreement, and exactly
        // `len` elements are live starting at the (aligned) base pointer.
        Some(unsafe { std::slice::from_raw_parts(self.data.as_ptr().cast::<T>(), self.len) })
    }

    /// Mutable typed view of the live elements.
    ///
    /// Returns `None` if `T` is not the column's registered element type.
    pub fn as_mut_slice<T: 'static>(&mut self) -> Option<&mut [T]> {
        if !self.info.matches_type::<T>() {
            return None;
        }
        // SAFETY: as `as_slice`, and `&mut self` guarantees exclusivity.
        Some(unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr().cast::<T>(), self.len) })
    }

    /// Ensures capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.grow_to(self.len + additional);
    }

    fn grow_to(&mut self, required: usize) {
        if required <= self.capacity {
            return;
        }
        let size = self.element_size();
        let align = self.info.align();
        let new_capacity = required.max(self.capacity.saturating_mul(2));
        let Some(new_bytes) = new_capacity.checked_mul(size) else {
            panic!("component column capacity overflow for {}", self.info.name);
        };
        let Ok(new_layout) = Layout::from_size_align(new_bytes, align) else {
            panic!("component column layout overflow for {}", self.info.name);
        };

        // SAFETY: `new_layout` has non-zero size: zero-sized types report
        // unbounded capacity and never reach this point.
        let raw = unsafe { alloc(new_layout) };
        let Some(new_data) = NonNull::new(raw) else {
            handle_alloc_error(new_layout);
        };

        if self.capacity > 0 {
            // SAFETY: both buffers are live, disjoint, and large enough for
            // the `len * size` bytes of live elements; the old layout is the
            // one the old buffer was allocated with.
            unsafe {
                ptr::copy_nonoverlapping(self.data.as_ptr(), new_data.as_ptr(), self.len * size);
                let old_layout =
                    Layout::from_size_align_unchecked(self.capacity * size, align);
                dealloc(self.data.as_ptr(), old_layout);
            }
        }

        self.data = new_data;
        self.capacity = new_capacity;
    }

    /// Appends an owned value of the column's element type.
    ///
    /// ## Errors
    /// `TypeMismatch` if `T` is not the registered element type. On error
    /// the value is dropped and the column is unchanged.
    pub fn push<T: Send + Sync + 'static>(&mut self, value: T) -> Result<(), ColumnError> {
        if !self.info.matches_type::<T>() {
            return Err(ColumnError::TypeMismatch {
                expected: self.info.name,
                actual: type_name::<T>(),
            });
        }
        self.grow_to(self.len + 1);
        // SAFETY: slot `len` is within capacity after `grow_to`, and the
        // type check above guarantees layout agreement.
        unsafe { ptr::write(self.ptr_unchecked(self.len).cast::<T>(), value) };
        self.len += 1;
        Ok(())
    }

    /// Appends one element by byte-moving it from `src`.
    ///
    /// This is the carry-over primitive of archetype transitions: the value
    /// is relocated without running any user code.
    ///
    /// ## Safety
    /// `src` must point to a live, properly aligned value of this column's
    /// element type, and the caller relinquishes ownership of it: the source
    /// bytes must not be dropped or read as a value afterwards.
    pub unsafe fn push_from(&mut self, src: *const u8) {
        self.grow_to(self.len + 1);
        // SAFETY: destination slot is within capacity; `src` is valid for
        // `size` bytes per the caller's contract, and the regions are
        // disjoint (the source lives in a different column).
        unsafe {
            ptr::copy_nonoverlapping(src, self.ptr_unchecked(self.len), self.element_size());
        }
        self.len += 1;
    }

    #[inline]
    fn compact_into(&mut self, index: usize) {
        let last = self.len - 1;
        if index != last {
            // SAFETY: both indices are live rows; the slots are distinct, so
            // the regions cannot overlap.
            unsafe {
                ptr::copy_nonoverlapping(
                    self.ptr_unchecked(last),
                    self.ptr_unchecked(index),
                    self.element_size(),
                );
            }
        }
        self.len = last;
    }

    /// Swap-removes row `index`, dropping the removed value.
    ///
    /// The last element is byte-moved into the vacated slot; removing the
    /// last element only drops it.
    ///
    /// ## Errors
    /// `PositionOutOfBounds` if `index` is not a live row.
    pub fn swap_remove(&mut self, index: usize) -> Result<(), ColumnError> {
        if index >= self.len {
            return Err(ColumnError::PositionOutOfBounds {
                index,
                len: self.len,
            });
        }
        if let Some(drop_fn) = self.info.drop_fn {
            // SAFETY: `index` is a live row, and the slot is either
            // overwritten or abandoned below, so the value is dropped once.
            unsafe { drop_fn(self.ptr_unchecked(index)) };
        }
        self.compact_into(index);
        Ok(())
    }

    /// Swap-removes row `index` without dropping it.
    ///
    /// Used when the slot's value was already moved out (an archetype
    /// transition carried it to another column), leaving bytes that must
    /// not be dropped.
    ///
    /// ## Errors
    /// `PositionOutOfBounds` if `index` is not a live row.
    pub fn swap_remove_forget(&mut self, index: usize) -> Result<(), ColumnError> {
        if index >= self.len {
            return Err(ColumnError::PositionOutOfBounds {
                index,
                len: self.len,
            });
        }
        self.compact_into(index);
        Ok(())
    }

    /// Drops all live elements and resets the count to zero.
    ///
    /// Capacity is retained.
    pub fn clear(&mut self) {
        if let Some(drop_fn) = self.info.drop_fn {
            for index in 0..self.len {
                // SAFETY: rows `0..len` are live and dropped exactly once;
                // `len` is reset below.
                unsafe { drop_fn(self.ptr_unchecked(index)) };
            }
        }
        self.len = 0;
    }
}

impl Drop for ComponentColumn {
    fn drop(&mut self) {
        self.clear();
        let size = self.element_size();
        if size > 0 && self.capacity > 0 {
            // SAFETY: the buffer was allocated with exactly this layout.
            unsafe {
                let layout = Layout::from_size_align_unchecked(self.capacity * size, self.info.align());
                dealloc(self.data.as_ptr(), layout);
            }
        }
    }
}
