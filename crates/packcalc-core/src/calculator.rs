//! # Packing Engine
//!
//! Finds the distribution with the fewest packs whose sizes sum exactly to
//! the requested item count.
//!
//! ## Algorithm
//!
//! Unbounded coin change with reconstruction:
//!
//! 1. Normalize the pack sizes through [`PackSizeSet::new`].
//! 2. `cost[i]` is the fewest packs reaching exactly `i` items, `cost[0] = 0`,
//!    every other entry starts at the unreachable sentinel `N + 1`.
//! 3. For each size `s` in ascending order and each amount `i` in `s..=N`,
//!    relax `cost[i]` from `cost[i - s] + 1`. Only a strict improvement
//!    overwrites `choice[i]`, so the smallest size that reaches the optimum
//!    first wins ties.
//! 4. Walk `choice` back from `N` to `0`, counting packs per size.
//!
//! Time is O(N×k) for k sizes. Memory is two tables of N + 1 entries, which
//! dominates for large N; callers that accept untrusted item counts should
//! bound N before calling in.

use crate::distribution::PackDistribution;
use crate::error::PackingError;
use crate::pack_sizes::PackSizeSet;

/// Marker for "no pack size recorded" in the choice table.
const NO_CHOICE: u8 = u8::MAX;

/// A strategy for computing pack distributions.
///
/// Implementations must be pure: the same inputs always produce the same
/// output, and calls may run concurrently.
pub trait PackCalculator: Send + Sync {
    /// Compute the minimal exact distribution of `items` over `pack_sizes`.
    fn calculate_packs(
        &self,
        items: i64,
        pack_sizes: &[i64],
    ) -> Result<PackDistribution, PackingError>;
}

/// The dynamic-programming calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DpCalculator;

impl DpCalculator {
    /// Create a calculator.
    pub fn new() -> Self {
        Self
    }
}

impl PackCalculator for DpCalculator {
    fn calculate_packs(
        &self,
        items: i64,
        pack_sizes: &[i64],
    ) -> Result<PackDistribution, PackingError> {
        calculate_packs(items, pack_sizes)
    }
}

/// Compute the minimal exact distribution of `items` over `pack_sizes`.
///
/// `pack_sizes` may be in any order and contain duplicates; it is
/// validated with the same rules as the pack-size store.
pub fn calculate_packs(items: i64, pack_sizes: &[i64]) -> Result<PackDistribution, PackingError> {
    if items < 0 {
        return Err(PackingError::InvalidItemCount(items));
    }
    let sizes = PackSizeSet::new(pack_sizes)?;
    calculate_with_set(items, &sizes)
}

/// Compute the minimal exact distribution over an already-validated set.
pub fn calculate_with_set(items: i64, sizes: &PackSizeSet) -> Result<PackDistribution, PackingError> {
    if items < 0 {
        return Err(PackingError::InvalidItemCount(items));
    }
    if items == 0 {
        return Ok(PackDistribution::new());
    }
    if items < sizes.smallest() {
        return Err(PackingError::CannotFulfillExactly { items });
    }

    let n = usize::try_from(items).map_err(|_| PackingError::CapacityExceeded { items })?;
    let table_len = n
        .checked_add(1)
        .ok_or(PackingError::CapacityExceeded { items })?;
    let unreachable = table_len;

    let mut cost: Vec<usize> = Vec::new();
    let mut choice: Vec<u8> = Vec::new();
    cost.try_reserve_exact(table_len)
        .map_err(|_| PackingError::CapacityExceeded { items })?;
    choice
        .try_reserve_exact(table_len)
        .map_err(|_| PackingError::CapacityExceeded { items })?;
    cost.resize(table_len, unreachable);
    choice.resize(table_len, NO_CHOICE);
    cost[0] = 0;

    for (index, &size) in sizes.as_slice().iter().enumerate() {
        // Sizes above N can never be used.
        let Ok(size) = usize::try_from(size) else {
            continue;
        };
        if size > n {
            continue;
        }
        for amount in size..=n {
            let candidate = cost[amount - size].saturating_add(1);
            if candidate < cost[amount] {
                cost[amount] = candidate;
                // At most MAX_PACK_SIZES entries, so the index fits in a u8.
                choice[amount] = index as u8;
            }
        }
    }

    if choice[n] == NO_CHOICE {
        return Err(PackingError::CannotFulfillExactly { items });
    }

    let mut distribution = PackDistribution::new();
    let mut remaining = n;
    while remaining > 0 {
        let index = choice[remaining];
        if index == NO_CHOICE {
            return Err(PackingError::Reconstruction { remaining });
        }
        let size = sizes.as_slice()[usize::from(index)];
        distribution.add_pack(size);
        // `size` was converted to usize above without loss.
        remaining -= size as usize;
    }

    debug_assert_eq!(distribution.total_packs() as usize, cost[n]);
    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::error::PackSizeViolation;

    fn dist(pairs: &[(i64, u64)]) -> PackDistribution {
        PackDistribution::from(pairs.iter().copied().collect::<BTreeMap<_, _>>())
    }

    struct Case {
        name: &'static str,
        items: i64,
        pack_sizes: &'static [i64],
        want: Result<&'static [(i64, u64)], PackingError>,
    }

    #[test]
    fn scenario_table() {
        let cases = [
            Case {
                name: "simple combination",
                items: 750,
                pack_sizes: &[250, 500, 1000],
                want: Ok(&[(250, 1), (500, 1)]),
            },
            Case {
                name: "exact match single pack",
                items: 1000,
                pack_sizes: &[250, 500, 1000],
                want: Ok(&[(1000, 1)]),
            },
            Case {
                name: "single pack size",
                items: 1000,
                pack_sizes: &[100],
                want: Ok(&[(100, 10)]),
            },
            Case {
                name: "large item count",
                items: 500_000,
                pack_sizes: &[23, 31, 53],
                want: Ok(&[(23, 2), (31, 7), (53, 9429)]),
            },
            Case {
                name: "coprime sizes",
                items: 100,
                pack_sizes: &[7, 13],
                want: Ok(&[(7, 5), (13, 5)]),
            },
            Case {
                name: "zero items",
                items: 0,
                pack_sizes: &[250, 500],
                want: Ok(&[]),
            },
            Case {
                name: "below smallest pack",
                items: 100,
                pack_sizes: &[250, 500],
                want: Err(PackingError::CannotFulfillExactly { items: 100 }),
            },
            Case {
                name: "263 items with default-like sizes",
                items: 263,
                pack_sizes: &[250, 500, 1000],
                want: Err(PackingError::CannotFulfillExactly { items: 263 }),
            },
            Case {
                name: "no combination of 3 and 5 makes 7",
                items: 7,
                pack_sizes: &[3, 5],
                want: Err(PackingError::CannotFulfillExactly { items: 7 }),
            },
        ];

        for case in cases {
            let got = calculate_packs(case.items, case.pack_sizes);
            let want = case.want.map(dist);
            assert_eq!(got, want, "case: {}", case.name);
        }
    }

    #[test]
    fn large_item_count_totals() {
        let d = calculate_packs(500_000, &[23, 31, 53]).unwrap();
        assert_eq!(d.total_packs(), 9438);
        assert_eq!(d.total_items(), 500_000);
        assert_eq!(d.remainder(500_000), 0);
    }

    #[test]
    fn negative_items_rejected() {
        assert_eq!(
            calculate_packs(-1, &[250]),
            Err(PackingError::InvalidItemCount(-1))
        );
    }

    #[test]
    fn invalid_pack_sizes_rejected() {
        assert_eq!(
            calculate_packs(10, &[]),
            Err(PackingError::InvalidPackSizes(PackSizeViolation::Empty))
        );
        assert_eq!(
            calculate_packs(10, &[5, -5]),
            Err(PackingError::InvalidPackSizes(PackSizeViolation::NonPositive(-5)))
        );
        let eleven: Vec<i64> = (1..=11).collect();
        assert!(matches!(
            calculate_packs(10, &eleven),
            Err(PackingError::InvalidPackSizes(PackSizeViolation::TooMany { .. }))
        ));
    }

    #[test]
    fn invalid_pack_sizes_reported_even_for_zero_items() {
        assert!(matches!(
            calculate_packs(0, &[0]),
            Err(PackingError::InvalidPackSizes(_))
        ));
    }

    #[test]
    fn unsorted_duplicate_input_is_normalized() {
        let a = calculate_packs(750, &[1000, 250, 500, 250]).unwrap();
        let b = calculate_packs(750, &[250, 500, 1000]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sizes_larger_than_items_are_ignored() {
        let d = calculate_packs(12, &[4, 6, 1_000_000]).unwrap();
        assert_eq!(d, dist(&[(6, 2)]));
    }

    #[test]
    fn ties_resolve_towards_first_improvement_in_ascending_order() {
        // 6 = 3+3 = 2+4; both use two packs. Size 2 reaches 6 first with
        // three packs, size 3 improves it to two, and size 4's 2+4 only
        // ties, so the 3+3 answer stands.
        let d = calculate_packs(6, &[2, 3, 4]).unwrap();
        assert_eq!(d, dist(&[(3, 2)]));
    }

    #[test]
    fn deterministic_across_calls() {
        let first = calculate_packs(12_345, &[23, 31, 53]).unwrap();
        for _ in 0..5 {
            assert_eq!(calculate_packs(12_345, &[23, 31, 53]).unwrap(), first);
        }
    }

    #[test]
    fn calculator_trait_delegates() {
        let calc: &dyn PackCalculator = &DpCalculator::new();
        let d = calc.calculate_packs(1000, &[250, 500, 1000]).unwrap();
        assert_eq!(d, dist(&[(1000, 1)]));
    }

    #[test]
    fn calculate_with_set_skips_revalidation() {
        let set = PackSizeSet::new(&[3, 5]).unwrap();
        let d = calculate_with_set(8, &set).unwrap();
        assert_eq!(d, dist(&[(3, 1), (5, 1)]));
    }
}
