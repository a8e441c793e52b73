/*!
 * Payload Handle
 *
 * The queues move opaque pointers and nothing else. They never dereference,
 * allocate, or free what a handle points at.
 *
 * # Ownership contract
 *
 * Producer and consumer agree out of band on who frees a payload. The usual
 * discipline is "producer allocates, consumer frees":
 *
 * ```
 * use ai_os_sync::queue::Handle;
 *
 * let handle = Handle::from_box(Box::new(42u64)); // producer gives up the Box
 * // ... handle travels through a queue ...
 * let value = unsafe { handle.into_box::<u64>() }; // consumer takes it back
 * assert_eq!(*value, 42);
 * ```
 *
 * Boxed payloads only suit the [`Channel`](super::Channel), which hands each
 * accepted handle to exactly one reader. A [`RingBuffer`](super::RingBuffer)
 * in either delivery mode may hand one handle out twice and drop another
 * once its writers lap a reader: broadcast readers share every slot, and a
 * lapped read-once cursor reads overwritten slots again. Ring payloads need
 * a discipline that survives duplicates and losses, such as tokens or
 * payloads that outlive the ring. Nothing here prevents a double free or a
 * leak if the discipline is broken.
 */

use std::fmt;
use std::ptr;

/// Opaque payload pointer carried by a queue slot
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Handle(*mut ());

// SAFETY: a Handle is an address; the queues never dereference it. Whether the
// pointee may cross threads is part of the producer/consumer contract.
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

impl Handle {
    /// The null handle, conventionally used as an end-of-stream sentinel
    #[inline(always)]
    pub const fn null() -> Self {
        Self(ptr::null_mut())
    }

    #[inline(always)]
    pub const fn from_ptr<T>(ptr: *mut T) -> Self {
        Self(ptr as *mut ())
    }

    /// Encode a plain integer token (no pointee)
    #[inline(always)]
    pub fn from_token(token: usize) -> Self {
        Self(token as *mut ())
    }

    #[inline(always)]
    pub fn as_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }

    /// Integer value of the handle
    #[inline(always)]
    pub fn token(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }

    /// Give up ownership of a boxed payload
    pub fn from_box<T>(payload: Box<T>) -> Self {
        Self(Box::into_raw(payload) as *mut ())
    }

    /// Reclaim a payload created by [`Handle::from_box`]
    ///
    /// # Safety
    ///
    /// The handle must come from `Handle::from_box::<T>` and must not have been
    /// reclaimed already.
    pub unsafe fn into_box<T>(self) -> Box<T> {
        Box::from_raw(self.0 as *mut T)
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", self.0)
    }
}
