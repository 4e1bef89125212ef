//! Columns derived from the raw observations.

use std::collections::BTreeMap;

use super::Record;

/// Fill missing `life_expectancy_5yr_avg` cells with a trailing rolling mean.
///
/// The window covers the current row and the `window - 1` preceding rows of
/// the same country in year order. Null life expectancy values are skipped
/// inside the window; a window with no values leaves the cell null. Cells
/// that already hold a value are kept.
pub fn fill_rolling_average(records: &mut [Record], window: usize) {
    let window = window.max(1);

    let mut by_country: BTreeMap<&str, Vec<(i32, usize)>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate() {
        by_country
            .entry(record.country_code.as_str())
            .or_default()
            .push((record.year, idx));
    }

    let mut fills = Vec::new();
    for rows in by_country.values_mut() {
        rows.sort_unstable();
        for end in 0..rows.len() {
            let start = (end + 1).saturating_sub(window);
            let values: Vec<f64> = rows[start..=end]
                .iter()
                .filter_map(|(_, idx)| records[*idx].life_expectancy)
                .collect();
            if !values.is_empty() {
                fills.push((rows[end].1, values.iter().sum::<f64>() / values.len() as f64));
            }
        }
    }

    for (idx, avg) in fills {
        let cell = &mut records[idx].life_expectancy_5yr_avg;
        if cell.is_none() {
            *cell = Some(avg);
        }
    }
}
