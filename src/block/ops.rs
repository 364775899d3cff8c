macro_rules! block_op {
    ($name: ident, $($op:tt)*) => {
        /// Perform the operation between `a` and `b`, write the result into `a` and return its cardinality
        pub fn $name(a: &mut [u64], b: &[u64]) -> usize {
            debug_assert_eq!(a.len(), b.len());

            let mut count = 0;
            for (wa, wb) in a.iter_mut().zip(b.iter()) {
                *wa = *wa $($op)* *wb;
                count += wa.count_ones() as usize;
            }

            count
        }
    };
}

block_op!(or, |);

block_op!(and, &);

block_op!(and_not, &!);

/// Compute the cardinality of a run of words
#[cfg(test)]
pub fn cardinality(words: &[u64]) -> usize {
    let mut count = 0;
    for word in words.iter() {
        count += word.count_ones() as usize;
    }

    count
}

/// Flip every bit in `words`
pub fn invert(words: &mut [u64]) {
    for word in words.iter_mut() {
        *word = !*word;
    }
}

/// Set the first `len` bits of `words` and clear the rest
pub fn fill(words: &mut [u64], len: usize) {
    debug_assert!(len <= words.len() * 64);

    let full_words = len >> 6;
    for word in words[..full_words].iter_mut() {
        *word = std::u64::MAX;
    }

    for word in words[full_words..].iter_mut() {
        *word = 0;
    }

    let rem = len & 0x3F;
    if rem != 0 {
        words[full_words] = !0_u64 >> (64 - rem);
    }
}

/// Clear every bit of `words` at or past `len`
pub fn clear_from(words: &mut [u64], len: usize) {
    debug_assert!(len <= words.len() * 64);

    let first = len >> 6;
    let rem = len & 0x3F;

    if first == words.len() {
        return;
    }

    if rem == 0 {
        words[first] = 0;
    }
    else {
        words[first] &= !0_u64 >> (64 - rem);
    }

    for word in words[(first + 1)..].iter_mut() {
        *word = 0;
    }
}
