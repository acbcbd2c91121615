use crate::types::{WORD_BITS, words_for};

/// Fixed-width field bitmap.
///
/// Records with at most 64 fields keep their bits in a single inline word;
/// wider records use a boxed slice. The two layouts answer every query
/// identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldBitmap {
    Word(u64),
    Words(Box<[u64]>),
}

impl FieldBitmap {
    pub fn new(field_count: usize) -> Self {
        let words = words_for(field_count);
        if words <= 1 {
            FieldBitmap::Word(0)
        } else {
            FieldBitmap::Words(vec![0u64; words].into_boxed_slice())
        }
    }

    #[inline]
    fn words(&self) -> &[u64] {
        match self {
            FieldBitmap::Word(w) => std::slice::from_ref(w),
            FieldBitmap::Words(ws) => ws,
        }
    }

    #[inline]
    fn words_mut(&mut self) -> &mut [u64] {
        match self {
            FieldBitmap::Word(w) => std::slice::from_mut(w),
            FieldBitmap::Words(ws) => ws,
        }
    }

    /// Callers bound `index` by the field count; out-of-word indexes read as unset.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.words()
            .get(index / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (index % WORD_BITS)) != 0)
    }

    /// Set the bit. Returns `true` if it was previously clear.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        match self.words_mut().get_mut(index / WORD_BITS) {
            Some(w) => {
                let mask = 1u64 << (index % WORD_BITS);
                let was_clear = *w & mask == 0;
                *w |= mask;
                was_clear
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.words_mut().fill(0);
    }

    pub fn count_ones(&self) -> usize {
        self.words().iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words().iter().all(|w| *w == 0)
    }

    pub fn iter(&self) -> DirtyIndexes<'_> {
        let words = self.words();
        DirtyIndexes {
            words,
            word_pos: 0,
            current: words.first().copied().unwrap_or(0),
            remaining: self.count_ones(),
        }
    }
}

// ─── Iterator ───────────────────────────────────────────────────────────────

/// Ascending iterator over set field indexes. Clone it to restart.
#[derive(Debug, Clone)]
pub struct DirtyIndexes<'a> {
    words: &'a [u64],
    word_pos: usize,
    current: u64,
    remaining: usize,
}

impl Iterator for DirtyIndexes<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.word_pos += 1;
            self.current = *self.words.get(self.word_pos)?;
        }
        let bit = self.current.trailing_zeros() as usize;
        // clear lowest set bit
        self.current &= self.current - 1;
        self.remaining -= 1;
        Some(self.word_pos * WORD_BITS + bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for DirtyIndexes<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word_layout_up_to_64() {
        assert!(matches!(FieldBitmap::new(0), FieldBitmap::Word(0)));
        assert!(matches!(FieldBitmap::new(64), FieldBitmap::Word(0)));
        match FieldBitmap::new(65) {
            FieldBitmap::Words(ws) => assert_eq!(ws.len(), 2),
            other => panic!("expected multi-word bitmap, got {other:?}"),
        }
    }

    #[test]
    fn test_insert_reports_first_set_only() {
        let mut bm = FieldBitmap::new(10);
        assert!(bm.insert(3));
        assert!(!bm.insert(3));
        assert!(bm.contains(3));
        assert!(!bm.contains(4));
        assert_eq!(bm.count_ones(), 1);
    }

    #[test]
    fn test_iter_crosses_word_boundary() {
        let mut bm = FieldBitmap::new(130);
        for i in [129, 0, 63, 64, 65] {
            bm.insert(i);
        }
        let got: Vec<_> = bm.iter().collect();
        assert_eq!(got, vec![0, 63, 64, 65, 129]);
        assert_eq!(bm.iter().len(), 5);
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut bm = FieldBitmap::new(8);
        bm.insert(1);
        bm.insert(7);
        let it = bm.iter();
        let first: Vec<_> = it.clone().collect();
        let second: Vec<_> = it.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_iter_skips_empty_leading_words() {
        let mut bm = FieldBitmap::new(200);
        bm.insert(150);
        assert_eq!(bm.iter().collect::<Vec<_>>(), vec![150]);
    }

    #[test]
    fn test_clear_keeps_layout() {
        let mut bm = FieldBitmap::new(100);
        bm.insert(99);
        bm.clear();
        assert!(bm.is_empty());
        assert!(matches!(bm, FieldBitmap::Words(_)));
        assert_eq!(bm.iter().next(), None);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut bm = FieldBitmap::new(4);
        // inside the inline word, caller is expected to bound-check
        assert!(!bm.contains(200));
        assert!(!bm.insert(200));
        assert!(bm.is_empty());
    }
}
