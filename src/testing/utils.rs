use nalgebra_sparse::{CooMatrix, CsrMatrix};
use single_utilities::traits::FloatOpsTS;

use crate::testing::Condition;

/// Split a condition vector into (disease, control) row indices.
pub fn condition_indices(conditions: &[Condition]) -> (Vec<usize>, Vec<usize>) {
    let disease = conditions
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| if c == Condition::Disease { Some(i) } else { None })
        .collect();

    let control = conditions
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| if c == Condition::Control { Some(i) } else { None })
        .collect();

    (disease, control)
}

/// Stack a disease and a control dataset into one matrix with per-cell condition labels.
///
/// Both matrices must share the same gene axis (column count). Disease cells come first,
/// control cells after, matching the returned label vector.
pub fn combine_conditions<T>(
    disease: &CsrMatrix<T>,
    control: &CsrMatrix<T>,
) -> anyhow::Result<(CsrMatrix<T>, Vec<Condition>)>
where
    T: FloatOpsTS + 'static,
{
    if disease.ncols() != control.ncols() {
        return Err(anyhow::anyhow!(
            "Disease and control matrices have different gene counts ({} vs {})",
            disease.ncols(),
            control.ncols()
        ));
    }

    let n_disease = disease.nrows();
    let n_cells = n_disease + control.nrows();

    let mut coo = CooMatrix::new(n_cells, disease.ncols());
    for (row, col, value) in disease.triplet_iter() {
        coo.push(row, col, *value);
    }
    for (row, col, value) in control.triplet_iter() {
        coo.push(n_disease + row, col, *value);
    }

    let mut conditions = vec![Condition::Disease; n_disease];
    conditions.extend(std::iter::repeat_n(Condition::Control, control.nrows()));

    Ok((CsrMatrix::from(&coo), conditions))
}
