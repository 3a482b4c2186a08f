//! Concatenated-batch bookkeeping.

use hmm_common::{Error, Result};

/// Split a concatenated observation vector into per-sequence slices.
///
/// `lengths = None` treats `x` as one sequence. Every length must be positive
/// and together they must cover `x` exactly.
pub fn split_sequences<'a, T>(x: &'a [T], lengths: Option<&[usize]>) -> Result<Vec<&'a [T]>> {
    let Some(lengths) = lengths else {
        if x.is_empty() {
            return Err(Error::EmptySequence);
        }
        return Ok(vec![x]);
    };

    if lengths.is_empty() {
        return Err(Error::InvalidLengths("no lengths given".to_string()));
    }
    if let Some(i) = lengths.iter().position(|&len| len == 0) {
        return Err(Error::InvalidLengths(format!("length {} is zero", i)));
    }
    let total: usize = lengths.iter().sum();
    if total != x.len() {
        return Err(Error::InvalidLengths(format!(
            "lengths sum to {} but {} observations were given",
            total,
            x.len()
        )));
    }

    let mut out = Vec::with_capacity(lengths.len());
    let mut rest = x;
    for &len in lengths {
        let (head, tail) = rest.split_at(len);
        out.push(head);
        rest = tail;
    }
    Ok(out)
}

/// Lengths of a batch of sequences, in order.
pub fn lengths_of<T>(sequences: &[&[T]]) -> Vec<usize> {
    sequences.iter().map(|s| s.len()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_by_lengths() {
        let x = [0, 0, 2, 1, 3, 1, 1, 0, 1];
        let parts = split_sequences(&x, Some(&[7, 2][..])).unwrap();
        assert_eq!(parts, vec![&x[..7], &x[7..]]);
        assert_eq!(lengths_of(&parts), vec![7, 2]);
    }

    #[test]
    fn no_lengths_means_one_sequence() {
        let x = [1, 2, 3];
        assert_eq!(split_sequences(&x, None).unwrap(), vec![&x[..]]);
        assert!(matches!(
            split_sequences::<usize>(&[], None),
            Err(Error::EmptySequence)
        ));
    }

    #[test]
    fn rejects_bad_lengths() {
        let x = [0, 1, 2];
        assert!(matches!(
            split_sequences(&x, Some(&[2, 2][..])),
            Err(Error::InvalidLengths(_))
        ));
        assert!(matches!(
            split_sequences(&x, Some(&[3, 0][..])),
            Err(Error::InvalidLengths(_))
        ));
        assert!(matches!(
            split_sequences(&x, Some(&[][..])),
            Err(Error::InvalidLengths(_))
        ));
    }
}
