/// A fixed-capacity ring buffer for Copy types with a runtime depth `<= N`.
///
/// All `depth` slots are always readable; slots not yet written hold the fill
/// value, which the smoothing filter relies on during warm-up.
#[derive(Debug, Clone)]
pub struct RingBuffer<T: Copy, const N: usize> {
    buffer: [T; N],
    fill: T,
    depth: usize,
    cursor: usize,
    size: usize,
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    /// Create an empty buffer using `depth` slots, clamped to `1..=N`.
    pub fn with_depth(depth: usize) -> Self {
        Self::new_filled(T::default(), depth)
    }
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    pub fn new_filled(fill: T, depth: usize) -> Self {
        Self {
            buffer: [fill; N],
            fill,
            depth: depth.clamp(1, N),
            cursor: 0,
            size: 0,
        }
    }

    pub fn reset(&mut self) {
        self.buffer = [self.fill; N];
        self.cursor = 0;
        self.size = 0;
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_full(&self) -> bool {
        self.size == self.depth
    }

    /// Push with overwrite, returning the value previously held by the slot.
    pub fn push_cyclic(&mut self, val: T) -> T {
        let evicted = core::mem::replace(&mut self.buffer[self.cursor], val);
        self.cursor = (self.cursor + 1) % self.depth;
        if self.size < self.depth {
            self.size += 1;
        }
        evicted
    }

    /// Every active slot in storage order, written or not.
    pub fn slots(&self) -> &[T] {
        &self.buffer[..self.depth]
    }
}
