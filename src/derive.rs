use std::collections::HashMap;

use tracing::{debug, trace};

use crate::data::{Data, Plot};
use crate::ir::Derivation;

/// Unit tag of every derived field
pub const PERCENTAGE_SYMBOL: &str = "percentage";

/// Outcome of a ratio: a value, or no signal because an operand was absent or zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    NoSignal,
}

impl Ratio {
    /// `part / whole * 100`, with absent or exactly-zero operands yielding `NoSignal`.
    ///
    /// A zero numerator is mapped to `NoSignal` too, so `0 / 10` and `10 / 0`
    /// both end up as 0.0 once collapsed with [`Ratio::value_or_zero`].
    pub fn percentage(part: Option<f64>, whole: Option<f64>) -> Self {
        match (part, whole) {
            (Some(part), Some(whole)) if part != 0.0 && whole != 0.0 => {
                Ratio::Value(part / whole * 100.0)
            }
            _ => Ratio::NoSignal,
        }
    }

    pub fn value_or_zero(self) -> f64 {
        match self {
            Ratio::Value(v) => v,
            Ratio::NoSignal => 0.0,
        }
    }

    pub fn is_signal(self) -> bool {
        matches!(self, Ratio::Value(_))
    }
}

/// Percentage of the first element over the second.
/// Ex: `[50.0, 200.0]` -> 25.0. Fewer than two elements -> 0.0.
pub fn percentage_value(values: &[f64]) -> f64 {
    match values {
        [part, whole, ..] => Ratio::percentage(Some(*part), Some(*whole)).value_or_zero(),
        _ => 0.0,
    }
}

/// Percentage of `part_field` over `whole_field` in a keyed collection.
/// Fewer than two entries or a missing key -> 0.0.
pub fn percentage_of(values: &HashMap<String, f64>, part_field: &str, whole_field: &str) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    Ratio::percentage(
        values.get(part_field).copied(),
        values.get(whole_field).copied(),
    )
    .value_or_zero()
}

/// Append `new_field = part_field / whole_field * 100` to a series.
///
/// Never fails: a missing or zero operand produces a 0.0 plot. Deriving a name the
/// series already has overwrites that plot, so names stay unique.
pub fn add_computed_field(
    data: &mut Data,
    new_field: &str,
    part_field: &str,
    whole_field: &str,
) -> Ratio {
    let ratio = Ratio::percentage(data.plot_value(part_field), data.plot_value(whole_field));
    if !ratio.is_signal() {
        trace!(
            "No signal for '{}' = '{}' / '{}' on series '{}'",
            new_field,
            part_field,
            whole_field,
            data.label
        );
    }
    data.upsert_plot(Plot::new(new_field, ratio.value_or_zero(), PERCENTAGE_SYMBOL));
    ratio
}

/// Run every derivation, in order, on one series
pub fn derive_series(data: &mut Data, derivations: &[Derivation]) {
    for derivation in derivations {
        add_computed_field(
            data,
            &derivation.new_field,
            &derivation.part,
            &derivation.whole,
        );
    }
}

/// Apply derivations to every series. Series are independent, so with the
/// `parallel-derive` feature this fans out over rayon; order is preserved either way.
pub fn apply_derivations(data: &mut [Data], derivations: &[Derivation]) {
    if derivations.is_empty() {
        return;
    }

    #[cfg(feature = "parallel-derive")]
    {
        use rayon::prelude::*;
        data.par_iter_mut()
            .for_each(|series| derive_series(series, derivations));
    }

    #[cfg(not(feature = "parallel-derive"))]
    {
        for series in data.iter_mut() {
            derive_series(series, derivations);
        }
    }

    debug!(
        "Applied {} derivations to {} series",
        derivations.len(),
        data.len()
    );
}
