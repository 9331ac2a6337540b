//! Fan-in of worker lanes into one stream
//!
//! Each worker owns a bounded lane. The merger hands out items from whichever
//! lane is ready and retires a lane once its sender is gone. When the last lane
//! is retired the stream ends, and stays ended.

use crossbeam_channel::{Receiver, Select, TryRecvError};
use std::iter::FusedIterator;

/// Merges N lanes into a single unordered stream.
///
/// Items from one lane keep their relative order; nothing is promised across
/// lanes. Dropping the merger disconnects every lane, which releases any
/// producer blocked on a full lane.
pub struct FanIn<T> {
    lanes: Vec<Receiver<T>>,
    cursor: usize,
    delivered: usize,
}

impl<T> FanIn<T> {
    pub fn new(lanes: Vec<Receiver<T>>) -> Self {
        Self {
            lanes,
            cursor: 0,
            delivered: 0,
        }
    }

    /// True once every lane has closed and drained
    pub fn is_finished(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Items handed out so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    fn retire(&mut self, index: usize) {
        self.lanes.swap_remove(index);
        if self.cursor >= self.lanes.len() {
            self.cursor = 0;
        }
    }

    /// Non-blocking pass over the lanes starting at the cursor
    fn poll_ready(&mut self) -> Option<T> {
        let mut scanned = 0;
        while scanned < self.lanes.len() {
            let index = (self.cursor + scanned) % self.lanes.len();
            let polled = self.lanes[index].try_recv();
            match polled {
                Ok(item) => {
                    self.cursor = (index + 1) % self.lanes.len();
                    return Some(item);
                }
                Err(TryRecvError::Empty) => scanned += 1,
                Err(TryRecvError::Disconnected) => {
                    // the swapped-in lane now sits at `index` and has not been polled
                    self.retire(index);
                }
            }
        }
        None
    }

    /// Block until some lane has an item or disconnects
    fn wait_ready(&mut self) -> Option<T> {
        while !self.lanes.is_empty() {
            let (index, received) = {
                let mut select = Select::new();
                for lane in &self.lanes {
                    select.recv(lane);
                }
                let operation = select.select();
                let index = operation.index();
                (index, operation.recv(&self.lanes[index]))
            };
            match received {
                Ok(item) => return Some(item),
                Err(_) => self.retire(index),
            }
        }
        None
    }
}

impl<T> Iterator for FanIn<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.poll_ready().or_else(|| self.wait_ready());
        if item.is_some() {
            self.delivered += 1;
        }
        item
    }
}

impl<T> FusedIterator for FanIn<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::collections::HashMap;
    use std::thread;

    #[test]
    fn test_no_lanes_ends_immediately() {
        let mut merged: FanIn<u32> = FanIn::new(Vec::new());
        assert!(merged.is_finished());
        assert_eq!(merged.next(), None);
        assert_eq!(merged.next(), None);
    }

    #[test]
    fn test_merges_all_items_from_all_lanes() {
        let lane_sizes = [0usize, 1, 17, 500, 3];
        let mut lanes = Vec::new();

        thread::scope(|scope| {
            for (lane_id, &size) in lane_sizes.iter().enumerate() {
                // tiny capacity forces producers to block on the consumer
                let (tx, rx) = bounded(2);
                lanes.push(rx);
                scope.spawn(move || {
                    for seq in 0..size {
                        tx.send((lane_id, seq)).expect("consumer alive");
                    }
                });
            }

            let mut merged = FanIn::new(std::mem::take(&mut lanes));
            let mut next_seq: HashMap<usize, usize> = HashMap::new();
            let mut total = 0;
            for (lane_id, seq) in merged.by_ref() {
                let expected = next_seq.entry(lane_id).or_insert(0);
                assert_eq!(seq, *expected, "lane {lane_id} reordered");
                *expected += 1;
                total += 1;
            }

            assert_eq!(total, lane_sizes.iter().sum::<usize>());
            assert_eq!(merged.delivered(), total);
            for (lane_id, &size) in lane_sizes.iter().enumerate() {
                assert_eq!(next_seq.get(&lane_id).copied().unwrap_or(0), size);
            }
            assert!(merged.is_finished());
            assert_eq!(merged.next(), None);
        });
    }

    #[test]
    fn test_waits_for_slow_lane() {
        let (fast_tx, fast_rx) = bounded(4);
        let (slow_tx, slow_rx) = bounded(4);

        let producer = thread::spawn(move || {
            fast_tx.send(1).expect("consumer alive");
            drop(fast_tx);
            thread::sleep(std::time::Duration::from_millis(20));
            slow_tx.send(2).expect("consumer alive");
        });

        let mut items: Vec<i32> = FanIn::new(vec![fast_rx, slow_rx]).collect();
        items.sort_unstable();
        assert_eq!(items, vec![1, 2]);
        producer.join().expect("producer panicked");
    }

    #[test]
    fn test_drop_releases_blocked_producer() {
        let (tx, rx) = bounded(1);
        let producer = thread::spawn(move || {
            let mut sent = 0;
            while tx.send(sent).is_ok() {
                sent += 1;
            }
            sent
        });

        let mut merged = FanIn::new(vec![rx]);
        assert_eq!(merged.next(), Some(0));
        drop(merged);

        let sent = producer.join().expect("producer panicked");
        assert!(sent >= 1);
    }
}
