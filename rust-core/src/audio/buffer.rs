//! Lock-free ring buffer for audio data
//!
//! Carries samples between the transport threads and the cpal callbacks.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Single-producer single-consumer sample queue
pub struct AudioRingBuffer<T> {
    producer: HeapProducer<T>,
    consumer: HeapConsumer<T>,
    capacity: usize,
}

impl<T: Copy> AudioRingBuffer<T> {
    /// Create new ring buffer with given capacity
    ///
    /// # Arguments
    /// * `capacity` - Buffer capacity in samples
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<T>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            capacity,
        }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (AudioProducer<T>, AudioConsumer<T>) {
        (
            AudioProducer {
                producer: self.producer,
                capacity: self.capacity,
            },
            AudioConsumer {
                consumer: self.consumer,
                capacity: self.capacity,
            },
        )
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Producer end of audio ring buffer (for writing)
pub struct AudioProducer<T> {
    producer: HeapProducer<T>,
    capacity: usize,
}

impl<T: Copy> AudioProducer<T> {
    /// Write samples to buffer
    ///
    /// # Returns
    /// Number of samples actually written (may be less if buffer is full)
    pub fn write(&mut self, samples: &[T]) -> usize {
        self.producer.push_slice(samples)
    }

    /// Get number of free slots
    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }

    /// True once the consumer has taken everything written so far
    pub fn is_drained(&self) -> bool {
        self.producer.is_empty()
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consumer end of audio ring buffer (for reading)
pub struct AudioConsumer<T> {
    consumer: HeapConsumer<T>,
    capacity: usize,
}

impl<T: Copy> AudioConsumer<T> {
    /// Read samples from buffer
    ///
    /// # Returns
    /// Number of samples actually read (may be less if buffer doesn't have enough)
    pub fn read(&mut self, buffer: &mut [T]) -> usize {
        self.consumer.pop_slice(buffer)
    }

    /// Get number of available samples
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_write_read() {
        let rb = AudioRingBuffer::<i16>::new(1024);
        let (mut producer, mut consumer) = rb.split();

        let data = vec![1, 2, 3, 4, 5];
        assert_eq!(producer.write(&data), 5);
        assert!(!producer.is_drained());

        let mut output = vec![0; 5];
        assert_eq!(consumer.read(&mut output), 5);
        assert_eq!(output, data);
        assert!(producer.is_drained());
    }

    #[test]
    fn test_ring_buffer_overflow_drops() {
        let rb = AudioRingBuffer::<f32>::new(10);
        let (mut producer, mut consumer) = rb.split();

        // Only capacity is accepted, the rest is dropped
        let written = producer.write(&[1.0; 20]);
        assert!(written <= 10);
        assert_eq!(producer.free_len(), 0);

        let mut output = vec![0.0; 20];
        assert_eq!(consumer.read(&mut output), written);
    }

    #[test]
    fn test_ring_buffer_underflow() {
        let rb = AudioRingBuffer::<i16>::new(1024);
        let (_producer, mut consumer) = rb.split();

        let mut output = vec![0; 10];
        assert_eq!(consumer.read(&mut output), 0);
        assert!(consumer.is_empty());
    }
}
