use super::*;

/// Hash key of a category value. `-0.0` and `0.0` name the same category.
#[inline]
pub(crate) fn category_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Ordering of the categories of one feature by their rate of label `1`.
///
/// A ranking is built from the samples that reach a single tree node and lets the
/// split finder treat a categorical feature as an ordered one: each category is
/// replaced by its position in ascending label-1 rate. Categories with equal rates
/// keep the order in which they first appear among the samples.
///
/// # Fields
///
/// - `categories` - Observed category values, sorted by ascending label-1 rate.
/// - `rates` - Label-1 rate of each entry in `categories`.
/// - `ranks` - Lookup from category key to its index in `categories`.
#[derive(Debug, Clone)]
pub struct CategoryRanking {
    categories: Vec<f64>,
    rates: Vec<f64>,
    ranks: AHashMap<u64, usize>,
}

impl CategoryRanking {
    /// Builds the ranking of the categories present in `column`.
    ///
    /// # Parameters
    ///
    /// - `column` - Category values of the samples reaching the node
    /// - `target` - Binary labels aligned with `column`
    ///
    /// # Returns
    ///
    /// - `Ok(CategoryRanking)` - The ranking over every observed category
    /// - `Err(ModelError::InputValidationError)` - If the two vectors differ in length
    pub fn fit(column: ArrayView1<f64>, target: ArrayView1<f64>) -> Result<Self, ModelError> {
        if column.len() != target.len() {
            return Err(ModelError::InputValidationError(format!(
                "category column and target have different lengths, column: {}, target: {}",
                column.len(),
                target.len()
            )));
        }

        Ok(Self::fit_unchecked(column, target))
    }

    /// Builds the ranking from a column and targets already known to be aligned.
    pub(crate) fn fit_unchecked(column: ArrayView1<f64>, target: ArrayView1<f64>) -> Self {
        let mut slots: AHashMap<u64, usize> = AHashMap::new();
        let mut seen = Vec::new();
        let mut counts: Vec<f64> = Vec::new();
        let mut positives: Vec<f64> = Vec::new();

        for (&value, &label) in column.iter().zip(target.iter()) {
            let slot = *slots.entry(category_key(value)).or_insert_with(|| {
                seen.push(value);
                counts.push(0.0);
                positives.push(0.0);
                seen.len() - 1
            });
            counts[slot] += 1.0;
            positives[slot] += label;
        }

        let first_seen_rates: Vec<f64> = positives
            .iter()
            .zip(&counts)
            .map(|(positive, count)| positive / count)
            .collect();

        // stable, so equal rates stay in order of first appearance
        let mut order: Vec<usize> = (0..seen.len()).collect();
        order.sort_by(|&a, &b| first_seen_rates[a].total_cmp(&first_seen_rates[b]));

        let categories: Vec<f64> = order.iter().map(|&slot| seen[slot]).collect();
        let rates: Vec<f64> = order.iter().map(|&slot| first_seen_rates[slot]).collect();
        let ranks = categories
            .iter()
            .enumerate()
            .map(|(rank, &category)| (category_key(category), rank))
            .collect();

        Self {
            categories,
            rates,
            ranks,
        }
    }

    // Getters
    get_field_as_ref!(get_categories, categories, &[f64]);
    get_field_as_ref!(get_rates, rates, &[f64]);

    /// Returns the rank of `category`, or `None` if it was not observed.
    pub fn rank_of(&self, category: f64) -> Option<usize> {
        self.ranks.get(&category_key(category)).copied()
    }

    /// Replaces every category in `column` with its rank.
    ///
    /// # Returns
    ///
    /// - `Ok(Array1<f64>)` - The integer-valued rank vector
    /// - `Err(ModelError::InputValidationError)` - If `column` holds a category the ranking has not seen
    pub fn encode(&self, column: ArrayView1<f64>) -> Result<Array1<f64>, ModelError> {
        column
            .iter()
            .map(|&category| {
                self.rank_of(category).map(|rank| rank as f64).ok_or_else(|| {
                    ModelError::InputValidationError(format!(
                        "category {} was not observed when ranking",
                        category
                    ))
                })
            })
            .collect()
    }

    /// Returns the original categories whose rank lies below `threshold`, in rank order.
    pub fn categories_below(&self, threshold: f64) -> Vec<f64> {
        self.categories
            .iter()
            .enumerate()
            .take_while(|&(rank, _)| (rank as f64) < threshold)
            .map(|(_, &category)| category)
            .collect()
    }
}
