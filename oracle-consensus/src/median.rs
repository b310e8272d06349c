/// Median using the lower-middle rule: sort ascending and take the element at
/// index `(n - 1) / 2`. Odd counts give the true middle; even counts give the
/// lower of the two middle elements, never their average, so the result is
/// always a value some peer actually reported.
pub fn lower_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(sorted[(sorted.len() - 1) / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_count() {
        assert_eq!(lower_median(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(lower_median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(lower_median(&[9.0, 1.0, 5.0, 7.0, 3.0]), Some(5.0));
    }

    #[test]
    fn test_even_count_picks_lower_middle() {
        assert_eq!(lower_median(&[1.0, 2.0, 3.0, 4.0]), Some(2.0));
        assert_eq!(lower_median(&[4.0, 3.0, 2.0, 1.0]), Some(2.0));
        assert_eq!(lower_median(&[4.0, 1.0]), Some(1.0));
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(lower_median(&[7.5]), Some(7.5));
        assert_eq!(lower_median(&[]), None);
    }

    #[test]
    fn test_input_is_not_reordered() {
        let values = [5.0, 1.0, 3.0];
        lower_median(&values);
        assert_eq!(values, [5.0, 1.0, 3.0]);
    }
}
