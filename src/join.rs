use itertools::{EitherOrBoth, Itertools};

#[derive(Debug, Clone, PartialEq)]
pub struct KeyVal<K, V> {
    pub key: K,
    pub val: V,
}

/// Full outer join of two sequences of `KeyVal`, both ordered by
/// `KeyVal.key` (and without duplicate keys). Every key of either
/// side appears exactly once in the output, which is ordered by key,
/// too; `EitherOrBoth` tells which sides had it.
pub fn keyval_outer_join_2<K: Ord, V1, V2>(
    a: impl IntoIterator<Item = KeyVal<K, V1>>,
    b: impl IntoIterator<Item = KeyVal<K, V2>>,
) -> impl Iterator<Item = KeyVal<K, EitherOrBoth<V1, V2>>> {
    a.into_iter()
        .merge_join_by(b, |a, b| a.key.cmp(&b.key))
        .map(|eob| match eob {
            EitherOrBoth::Both(a, b) => KeyVal {
                key: a.key,
                val: EitherOrBoth::Both(a.val, b.val),
            },
            EitherOrBoth::Left(a) => KeyVal {
                key: a.key,
                val: EitherOrBoth::Left(a.val),
            },
            EitherOrBoth::Right(b) => KeyVal {
                key: b.key,
                val: EitherOrBoth::Right(b.val),
            },
        })
}

/// Returns the first key that appears more than once in `sorted`
/// (which must be ordered by key).
pub fn first_duplicate_key<K: Ord, V>(sorted: &[KeyVal<K, V>]) -> Option<&K> {
    sorted
        .iter()
        .tuple_windows()
        .find(|(a, b)| a.key == b.key)
        .map(|(a, _)| &a.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k<K, V>(k: K, v: V) -> KeyVal<K, V> {
        KeyVal { key: k, val: v }
    }

    #[test]
    fn t_outer_2() {
        let a = vec![k("a", 1), k("a2", 2), k("t", 4)];
        let b = vec![k("a03", 10), k("a2", 20), k("u", 50)];
        let res: Vec<_> = keyval_outer_join_2(a, b).collect();
        assert_eq!(
            res,
            vec![
                k("a", EitherOrBoth::Left(1)),
                k("a03", EitherOrBoth::Right(10)),
                k("a2", EitherOrBoth::Both(2, 20)),
                k("t", EitherOrBoth::Left(4)),
                k("u", EitherOrBoth::Right(50)),
            ]
        );
    }

    #[test]
    fn t_outer_2_empty_side() {
        let a: Vec<KeyVal<&str, i32>> = vec![];
        let b = vec![k("x", 1), k("y", 2)];
        let res: Vec<_> = keyval_outer_join_2(a, b).map(|kv| kv.key).collect();
        assert_eq!(res, ["x", "y"]);
    }

    #[test]
    fn t_first_duplicate_key() {
        assert_eq!(first_duplicate_key(&[k(1, ()), k(2, ()), k(3, ())]), None);
        assert_eq!(
            first_duplicate_key(&[k(1, ()), k(2, ()), k(2, ()), k(3, ())]),
            Some(&2)
        );
        assert_eq!(first_duplicate_key::<i32, ()>(&[]), None);
    }
}
