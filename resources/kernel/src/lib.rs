//! Naive recursive Fibonacci, the unit under benchmark.
//!
//! The recursion is deliberately exponential: the cost being measured is
//! call/return overhead. Stack depth equals `n`, and every width rejects `n`
//! above its [`Word::MAX_INDEX`] before recursing, so the deepest possible
//! recursion is 186 frames (`u128`).

use thiserror::Error;

/// Input of the canonical cross-runtime benchmark.
pub const CANONICAL_N: i64 = 35;
/// `fib(CANONICAL_N)`.
pub const CANONICAL_RESULT: u64 = 9_227_465;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument: n must be non-negative, got {n}")]
    InvalidArgument { n: i64 },

    #[error("arithmetic overflow: fibonacci({n}) does not fit in {width}")]
    ArithmeticOverflow { n: i64, width: &'static str },
}

/// Integer width the kernel can compute in.
pub trait Word: Copy {
    const ZERO: Self;
    const ONE: Self;
    /// Largest `n` with `fib(n) <= Self::MAX`.
    const MAX_INDEX: u32;
    const NAME: &'static str;

    fn checked_add(self, rhs: Self) -> Option<Self>;
}

macro_rules! word {
    ($($ty:ty => $max_index:expr),* $(,)?) => {
        $(
            impl Word for $ty {
                const ZERO: Self = 0;
                const ONE: Self = 1;
                const MAX_INDEX: u32 = $max_index;
                const NAME: &'static str = stringify!($ty);

                #[inline(always)]
                fn checked_add(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_add(self, rhs)
                }
            }
        )*
    };
}

word! {
    u8 => 13,
    u16 => 24,
    u32 => 47,
    u64 => 93,
    u128 => 186,
    i32 => 46,
    i64 => 92,
}

/// Computes the `n`-th Fibonacci number as a `u64`.
pub fn fib(n: i64) -> Result<u64, Error> {
    fib_as::<u64>(n)
}

/// Computes the `n`-th Fibonacci number in the width `T`.
///
/// Fails with [`Error::InvalidArgument`] for negative `n` and with
/// [`Error::ArithmeticOverflow`] when the result does not fit `T`. Neither
/// case recurses.
pub fn fib_as<T: Word>(n: i64) -> Result<T, Error> {
    let index = u32::try_from(n).map_err(|_| {
        if n < 0 {
            Error::InvalidArgument { n }
        } else {
            overflow::<T>(n)
        }
    })?;
    if index > T::MAX_INDEX {
        return Err(overflow::<T>(n));
    }
    naive(index).ok_or_else(|| overflow::<T>(n))
}

fn overflow<T: Word>(n: i64) -> Error {
    Error::ArithmeticOverflow { n, width: T::NAME }
}

fn naive<T: Word>(n: u32) -> Option<T> {
    match n {
        0 => Some(T::ZERO),
        1 => Some(T::ONE),
        _ => naive::<T>(n - 1)?.checked_add(naive::<T>(n - 2)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(fib(0), Ok(0));
        assert_eq!(fib(1), Ok(1));
        assert_eq!(fib(2), Ok(1));
        assert_eq!(fib(10), Ok(55));
        assert_eq!(fib(CANONICAL_N), Ok(CANONICAL_RESULT));
    }

    #[test]
    fn canonical_fits_i32() {
        assert_eq!(fib_as::<i32>(CANONICAL_N), Ok(9_227_465));
    }

    #[test]
    fn recurrence() {
        for n in 2..=25 {
            assert_eq!(fib(n).unwrap(), fib(n - 1).unwrap() + fib(n - 2).unwrap());
        }
    }

    #[test]
    fn negative_is_invalid() {
        for n in [-1, -2, -35, i64::MIN] {
            assert_eq!(fib(n), Err(Error::InvalidArgument { n }));
            assert_eq!(fib_as::<u8>(n), Err(Error::InvalidArgument { n }));
        }
    }

    #[test]
    fn pure() {
        let first = fib(27);
        for _ in 0..5 {
            assert_eq!(fib(27), first);
        }
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(fib_as::<u8>(13), Ok(233));
        assert_eq!(
            fib_as::<u8>(14),
            Err(Error::ArithmeticOverflow { n: 14, width: "u8" })
        );
        assert_eq!(fib_as::<u16>(24), Ok(46_368));
        assert_eq!(
            fib(94),
            Err(Error::ArithmeticOverflow { n: 94, width: "u64" })
        );
        assert_eq!(
            fib(i64::MAX),
            Err(Error::ArithmeticOverflow { n: i64::MAX, width: "u64" })
        );
    }

    #[test]
    fn checked_recursion_catches_what_the_bound_misses() {
        assert_eq!(naive::<u8>(14), None);
        assert_eq!(naive::<u8>(13), Some(233));
    }

    fn first_overflow<T: Word>() -> u32 {
        let (mut a, mut b) = (T::ZERO, T::ONE);
        let mut n = 1;
        while let Some(next) = a.checked_add(b) {
            a = b;
            b = next;
            n += 1;
        }
        n + 1
    }

    #[test]
    fn max_index_is_exact() {
        assert_eq!(first_overflow::<u8>(), u8::MAX_INDEX + 1);
        assert_eq!(first_overflow::<u16>(), u16::MAX_INDEX + 1);
        assert_eq!(first_overflow::<u32>(), u32::MAX_INDEX + 1);
        assert_eq!(first_overflow::<u64>(), u64::MAX_INDEX + 1);
        assert_eq!(first_overflow::<u128>(), u128::MAX_INDEX + 1);
        assert_eq!(first_overflow::<i32>(), i32::MAX_INDEX + 1);
        assert_eq!(first_overflow::<i64>(), i64::MAX_INDEX + 1);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            Error::InvalidArgument { n: -3 }.to_string(),
            "invalid argument: n must be non-negative, got -3"
        );
        assert_eq!(
            Error::ArithmeticOverflow { n: 94, width: "u64" }.to_string(),
            "arithmetic overflow: fibonacci(94) does not fit in u64"
        );
    }
}
