/// Tracks the `k` largest values seen in a single left-to-right scan.
///
/// Entries are kept sorted by descending value. A new value displaces a
/// kept one only if it is strictly larger, so ties favour whichever index
/// was scanned first.
#[derive(Clone, Debug)]
pub struct TopK {
    capacity: usize,
    entries: Vec<(usize, f64)>,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity + 1),
        }
    }

    pub fn push(&mut self, index: usize, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            match self.entries.last() {
                Some(&(_, smallest)) if value > smallest => {}
                _ => return,
            }
        }
        // Insert after every entry that is >= value.
        let pos = self.entries.partition_point(|&(_, v)| v >= value);
        self.entries.insert(pos, (index, value));
        self.entries.truncate(self.capacity);
    }

    /// `(index, value)` pairs, largest first.
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|&(i, _)| i)
    }
}

/// Top `k` of `values` by a full scan.
pub fn top_k(values: &[f64], k: usize) -> TopK {
    let mut top = TopK::new(k);
    for (i, &v) in values.iter().enumerate() {
        top.push(i, v);
    }
    top
}
