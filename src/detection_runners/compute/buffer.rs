use std::sync::atomic::{AtomicU32, Ordering};

/// Device memory: a fixed run of 32-bit words.
///
/// Kernel invocations run in parallel, so every word is accessed atomically; each
/// invocation only writes the words of its own cell or its own result slot.
pub struct DeviceBuffer {
    words: Box<[AtomicU32]>,
}

impl DeviceBuffer {
    pub fn zeroed(len: usize) -> Self {
        Self {
            words: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Uploads host floats into a new buffer.
    pub fn from_f32(data: &[f32]) -> Self {
        Self {
            words: data.iter().map(|x| AtomicU32::new(x.to_bits())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    pub fn load_u32(&self, index: usize) -> u32 {
        self.words[index].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn store_u32(&self, index: usize, value: u32) {
        self.words[index].store(value, Ordering::Relaxed)
    }

    #[inline]
    pub fn load_f32(&self, index: usize) -> f32 {
        f32::from_bits(self.load_u32(index))
    }

    #[inline]
    pub fn store_f32(&self, index: usize, value: f32) {
        self.store_u32(index, value.to_bits())
    }

    /// Reads the whole buffer back to host memory.
    pub fn read_f32(&self) -> Vec<f32> {
        (0..self.len()).map(|i| self.load_f32(i)).collect()
    }
}

impl std::fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer").field("len", &self.len()).finish()
    }
}

/// One surviving `(cell, class)` pair written by the full decode kernel.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DetectionRecord {
    /// Linear cell index, `(box * rows + row) * cols + col`.
    pub cell: u32,
    pub class_id: u32,
    pub objectness: f32,
    pub score: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

const RECORD_WORDS: usize = 8;

impl DetectionRecord {
    fn write(&self, buffer: &DeviceBuffer, slot: usize) {
        let at = slot * RECORD_WORDS;
        buffer.store_u32(at, self.cell);
        buffer.store_u32(at + 1, self.class_id);
        buffer.store_f32(at + 2, self.objectness);
        buffer.store_f32(at + 3, self.score);
        buffer.store_f32(at + 4, self.x);
        buffer.store_f32(at + 5, self.y);
        buffer.store_f32(at + 6, self.width);
        buffer.store_f32(at + 7, self.height);
    }

    fn read(buffer: &DeviceBuffer, slot: usize) -> Self {
        let at = slot * RECORD_WORDS;
        Self {
            cell: buffer.load_u32(at),
            class_id: buffer.load_u32(at + 1),
            objectness: buffer.load_f32(at + 2),
            score: buffer.load_f32(at + 3),
            x: buffer.load_f32(at + 4),
            y: buffer.load_f32(at + 5),
            width: buffer.load_f32(at + 6),
            height: buffer.load_f32(at + 7),
        }
    }
}

/// Append-only record buffer plus its atomic result counter.
#[derive(Debug)]
pub struct ResultBuffer {
    records: DeviceBuffer,
    count: AtomicU32,
    capacity: usize,
}

impl ResultBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DeviceBuffer::zeroed(capacity * RECORD_WORDS),
            count: AtomicU32::new(0),
            capacity,
        }
    }

    /// Claims the next slot and writes the record. Returns `false` once full.
    pub fn append(&self, record: &DetectionRecord) -> bool {
        let slot = self.count.fetch_add(1, Ordering::Relaxed) as usize;
        if slot >= self.capacity {
            return false;
        }
        record.write(&self.records, slot);
        true
    }

    /// Number of records written, capped at the capacity.
    pub fn count(&self) -> usize {
        (self.count.load(Ordering::Relaxed) as usize).min(self.capacity)
    }

    /// Reads the written records back in slot order.
    pub fn read_records(&self) -> Vec<DetectionRecord> {
        (0..self.count()).map(|slot| DetectionRecord::read(&self.records, slot)).collect()
    }
}
