use itertools::Itertools;

use crate::{error::SurrogateResult, schedule::parameters::ParameterTable};

/// Expands `fixed` with every combination of the `varying` candidates.
///
/// Combinations are ordered like nested loops over `varying`, the first key
/// outermost. A varying key overrides the same key in `fixed`. Without varying
/// keys the result is `[fixed]`.
///
/// # Errors
/// [`crate::error::ScheduleError::NonFiniteParameter`] if a candidate is NaN or infinite.
pub fn cartesian_product(
    fixed: &ParameterTable,
    varying: &[(&str, Vec<f64>)],
) -> SurrogateResult<Vec<ParameterTable>> {
    if varying.is_empty() {
        return Ok(vec![fixed.clone()]);
    }

    varying
        .iter()
        .map(|(key, values)| values.iter().map(move |v| (*key, *v)))
        .multi_cartesian_product()
        .map(|combination| {
            combination
                .into_iter()
                .try_fold(fixed.clone(), |table, (key, value)| table.with(key, value))
        })
        .collect()
}
