//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

// Link and path metric.
pub type Metric = u32;

// Sentinel used for unreachable destinations and for the transit cost of
// overloaded nodes. Path metrics never exceed this value.
pub const INFINITE_METRIC: Metric = Metric::MAX;

/// Defines a conversion from one type to another, where the result is capped
/// at the infinite metric if the input value exceeds this bound.
pub trait SaturatingFrom<T>: Sized {
    /// Converts a value of type `T` to the implementing type with saturation.
    fn saturating_from(value: T) -> Self;
}

/// Defines a conversion into another type using the `SaturatingFrom` trait.
pub trait SaturatingInto<T>: Sized {
    /// Converts the implementing type into a value of type `T` with saturation.
    fn saturating_into(self) -> T;
}

// ===== impl SaturatingFrom =====

impl SaturatingFrom<u64> for Metric {
    fn saturating_from(value: u64) -> Self {
        Metric::try_from(value).unwrap_or(INFINITE_METRIC)
    }
}

// ===== impl SaturatingInto =====

impl<T, U> SaturatingInto<U> for T
where
    U: SaturatingFrom<T>,
{
    fn saturating_into(self) -> U {
        U::saturating_from(self)
    }
}

// ===== global functions =====

// Adds two metrics, computing the sum in a widened type. An infinite operand
// yields an infinite result.
pub fn metric_add(a: Metric, b: Metric) -> Metric {
    if a == INFINITE_METRIC || b == INFINITE_METRIC {
        return INFINITE_METRIC;
    }
    (u64::from(a) + u64::from(b)).saturating_into()
}

// ===== unit tests =====
