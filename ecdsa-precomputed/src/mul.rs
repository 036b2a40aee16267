//! Variable-time double-base scalar multiplication over precomputed tables.
//!
//! Scalars are recoded into width-`w` non-adjacent form (wNAF), in which
//! nonzero digits are odd, span `(-2^(w-1), 2^(w-1))` and are separated by at
//! least `w - 1` zeros. Each nonzero digit selects an entry from a table of
//! odd point multiples, so a double-base product costs one shared doubling
//! per scalar bit plus one table addition per nonzero digit.
//!
//! Everything here is variable-time in its inputs. ECDSA verification only
//! ever multiplies public values, which is the sole use of this module.

use core::{
    cmp::Ordering,
    ops::{Add, Mul},
};
use elliptic_curve::{
    generic_array::{
        typenum::{Prod, Sum, U1, U8},
        ArrayLength, GenericArray,
    },
    group::Group,
    CurveArithmetic, FieldBytes, FieldBytesSize, Scalar,
};

/// Number of entries in the transient generator table built per call to
/// [`double_base_mul_vartime`]: odd multiples of `G` through `15×G`.
const BASEPOINT_TABLE_ENTRIES: usize = 8;

/// Scalar sizes which support wNAF recoding.
///
/// Sizes the digit buffer produced by recoding: one signed digit per scalar
/// bit, plus one extra position for a carry out of the top bit. Blanket
/// impl'd for all field sizes, in the same way
/// [`elliptic_curve::sec1::ModulusSize`] sizes SEC1 point encodings.
pub trait NafSize: ArrayLength<u8> {
    /// Length of the wNAF digit sequence for scalars of this size.
    type DigitLength: ArrayLength<i8>;
}

impl<T> NafSize for T
where
    T: ArrayLength<u8> + Mul<U8>,
    Prod<T, U8>: Add<U1>,
    Sum<Prod<T, U8>, U1>: ArrayLength<i8>,
{
    type DigitLength = Sum<Prod<T, U8>, U1>;
}

/// wNAF digit sequence of a scalar, least significant digit first.
pub(crate) type NafDigits<C> = GenericArray<i8, <FieldBytesSize<C> as NafSize>::DigitLength>;

/// Recode a scalar into width-`w` non-adjacent form.
///
/// Walks the scalar from the least significant bit, reading `w`-bit windows:
/// an even window emits a zero digit and advances one bit, an odd window
/// emits the window (made negative by borrowing from the next window when it
/// would exceed `2^(w-1)`) and advances `w` bits.
pub(crate) fn non_adjacent_form<C>(scalar: &Scalar<C>, w: usize) -> NafDigits<C>
where
    C: CurveArithmetic,
    FieldBytesSize<C>: NafSize,
{
    // required so that the NAF digits fit in i8
    debug_assert!(w >= 2);
    debug_assert!(w <= 8);

    let mut repr: FieldBytes<C> = (*scalar).into();
    repr.as_mut_slice().reverse();
    let bytes = repr.as_slice();

    let mut naf = NafDigits::<C>::default();
    let digits = naf.as_slice().len();

    let width = 1u16 << w;
    let window_mask = width - 1;

    let mut pos = 0;
    let mut carry = 0u16;
    while pos < digits {
        // w-bit window of the scalar starting at bit `pos`; reads past the
        // top byte see zero, which is where a final carry lands
        let byte_idx = pos / 8;
        let bit_idx = pos % 8;
        let lo = *bytes.get(byte_idx).unwrap_or(&0) as u16;
        let hi = *bytes.get(byte_idx + 1).unwrap_or(&0) as u16;
        let bit_buf = (lo | (hi << 8)) >> bit_idx;

        let window = carry + (bit_buf & window_mask);

        if window & 1 == 0 {
            // Even window: emit zero, advance one bit. An odd carry stays
            // pending because the window's low bit must then be one.
            pos += 1;
            continue;
        }

        if window < width / 2 {
            carry = 0;
            naf[pos] = window as i8;
        } else {
            carry = 1;
            naf[pos] = window.wrapping_sub(width) as i8;
        }

        pos += w;
    }

    naf
}

/// Lookup table of odd multiples of a point: `[P, 3×P, 5×P, ..., (2N-1)×P]`.
///
/// `N` must be a power of two in `2..=64`, so that the odd positive digits
/// of a width-`NAF_WIDTH` recoding index exactly the `N` entries.
#[derive(Clone, Copy)]
pub(crate) struct OddMultiplesTable<C: CurveArithmetic, const N: usize>([C::ProjectivePoint; N]);

impl<C: CurveArithmetic, const N: usize> OddMultiplesTable<C, N> {
    /// Recoding width matching this table's size.
    pub(crate) const NAF_WIDTH: usize = {
        assert!(N >= 2 && N.is_power_of_two() && N <= 64);
        N.trailing_zeros() as usize + 2
    };

    /// Compute the table of odd multiples of `point`, using one doubling and
    /// `N - 1` additions.
    pub(crate) fn new(point: &C::ProjectivePoint) -> Self {
        let mut multiples = [*point; N];
        let double = point.double();
        for i in 0..(N - 1) {
            multiples[i + 1] = double + multiples[i];
        }
        Self(multiples)
    }

    /// Given odd `x` with `0 < x < 2N`, return `x×P`.
    pub(crate) fn select(&self, x: usize) -> C::ProjectivePoint {
        debug_assert_eq!(x & 1, 1);
        debug_assert!(x < 2 * N);

        self.0[x / 2]
    }
}

/// Compute `a×A + b×G` in variable time, where `A` is the point `table` was
/// computed from and `G` is the curve generator.
///
/// Both scalar multiplications share one doubling pass: the accumulator is
/// doubled once per bit, scanning from the most significant nonzero digit of
/// either recoding, and table entries are added or subtracted wherever a
/// digit is nonzero. The generator table is built transiently per call.
pub(crate) fn double_base_mul_vartime<C, const N: usize>(
    a: &Scalar<C>,
    table: &OddMultiplesTable<C, N>,
    b: &Scalar<C>,
) -> C::ProjectivePoint
where
    C: CurveArithmetic,
    FieldBytesSize<C>: NafSize,
{
    let a_naf = non_adjacent_form::<C>(a, OddMultiplesTable::<C, N>::NAF_WIDTH);
    let b_naf = non_adjacent_form::<C>(
        b,
        OddMultiplesTable::<C, BASEPOINT_TABLE_ENTRIES>::NAF_WIDTH,
    );

    let basepoint_table =
        OddMultiplesTable::<C, BASEPOINT_TABLE_ENTRIES>::new(&C::ProjectivePoint::generator());

    let digits = a_naf.as_slice().len();

    // Find the most significant nonzero digit
    let mut i = digits - 1;
    for j in (0..digits).rev() {
        i = j;
        if a_naf[i] != 0 || b_naf[i] != 0 {
            break;
        }
    }

    let mut r = C::ProjectivePoint::identity();

    loop {
        r = r.double();

        match a_naf[i].cmp(&0) {
            Ordering::Greater => r += table.select(a_naf[i] as usize),
            Ordering::Less => r -= table.select(-a_naf[i] as usize),
            Ordering::Equal => {}
        }

        match b_naf[i].cmp(&0) {
            Ordering::Greater => r += basepoint_table.select(b_naf[i] as usize),
            Ordering::Less => r -= basepoint_table.select(-b_naf[i] as usize),
            Ordering::Equal => {}
        }

        if i == 0 {
            break;
        }
        i -= 1;
    }

    r
}
