use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use super::source::{DataSource, DataUnavailable, ElementRow, IMPORTANCE_SCALE, LEVEL_SCALE};

/// Scale used by interest tables for per-occupation RIASEC weights.
const OCCUPATIONAL_INTERESTS_SCALE: &str = "Occupational Interests";

/// Level values are rescaled to 0-100 when the table's maximum is at most this.
const SMALL_SCALE_MAX: f64 = 10.0;

/// Aligned Level / Importance pivots of one element table.
///
/// Rows are occupations and columns elements, both sorted. Level cells are
/// `NaN` where the table has no Level row; Importance cells default to `0.0`.
#[derive(Debug, Clone)]
pub struct OccupationMatrix {
    dataset: String,
    occupations: Vec<String>,
    elements: Vec<String>,
    element_index: HashMap<String, usize>,
    level: Vec<f64>,
    importance: Vec<f64>,
}

impl OccupationMatrix {
    pub fn from_rows(dataset: &str, rows: &[ElementRow]) -> Self {
        let level_pivot = pivot_mean(rows, LEVEL_SCALE);
        let importance_pivot = pivot_mean(rows, IMPORTANCE_SCALE);

        let occupations: Vec<String> = level_pivot
            .titles
            .intersection(&importance_pivot.titles)
            .cloned()
            .collect();
        let elements: Vec<String> = level_pivot
            .elements
            .intersection(&importance_pivot.elements)
            .cloned()
            .collect();

        let width = elements.len();
        let mut level = vec![f64::NAN; occupations.len() * width];
        let mut importance = vec![0.0; occupations.len() * width];

        for (row, title) in occupations.iter().enumerate() {
            for (col, element) in elements.iter().enumerate() {
                let key = (title.clone(), element.clone());
                if let Some(value) = level_pivot.values.get(&key) {
                    level[row * width + col] = *value;
                }
                if let Some(value) = importance_pivot.values.get(&key) {
                    importance[row * width + col] = *value;
                }
            }
        }

        rescale_levels(&mut level);

        let element_index = elements
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        Self {
            dataset: dataset.to_string(),
            occupations,
            elements,
            element_index,
            level,
            importance,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn occupations(&self) -> &[String] {
        &self.occupations
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.occupations.is_empty() || self.elements.is_empty()
    }

    pub fn element_index(&self, element: &str) -> Option<usize> {
        self.element_index.get(element).copied()
    }

    pub fn occupation_index(&self, title: &str) -> Option<usize> {
        self.occupations
            .binary_search_by(|candidate| candidate.as_str().cmp(title))
            .ok()
    }

    pub fn level(&self, occupation: usize, element: usize) -> f64 {
        self.level[occupation * self.elements.len() + element]
    }

    pub fn importance(&self, occupation: usize, element: usize) -> f64 {
        self.importance[occupation * self.elements.len() + element]
    }

    /// Level values of one element across all occupations (`NaN` included).
    pub fn level_column(&self, element: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.occupations.len()).map(move |row| self.level(row, element))
    }

    /// Every defined Level cell, in row-major order.
    pub fn level_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.level.iter().copied().filter(|value| !value.is_nan())
    }
}

struct Pivot {
    titles: BTreeSet<String>,
    elements: BTreeSet<String>,
    values: HashMap<(String, String), f64>,
}

fn pivot_mean(rows: &[ElementRow], scale: &str) -> Pivot {
    let mut sums: BTreeMap<(String, String), (f64, u32)> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.scale_name == scale) {
        let entry = sums
            .entry((row.title.clone(), row.element_name.clone()))
            .or_insert((0.0, 0));
        entry.0 += row.data_value;
        entry.1 += 1;
    }

    let mut titles = BTreeSet::new();
    let mut elements = BTreeSet::new();
    let mut values = HashMap::with_capacity(sums.len());
    for ((title, element), (sum, count)) in sums {
        titles.insert(title.clone());
        elements.insert(element.clone());
        values.insert((title, element), sum / f64::from(count));
    }

    Pivot {
        titles,
        elements,
        values,
    }
}

fn rescale_levels(level: &mut [f64]) {
    let max = level
        .iter()
        .copied()
        .filter(|value| !value.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);

    if !max.is_finite() || max <= 0.0 || max > SMALL_SCALE_MAX {
        return;
    }

    let factor = 100.0 / max;
    for value in level.iter_mut().filter(|value| !value.is_nan()) {
        *value *= factor;
    }
}

/// RIASEC weights per occupation, read from an interest table.
#[derive(Debug, Clone, Default)]
pub struct InterestProfiles {
    profiles: BTreeMap<String, BTreeMap<String, f64>>,
}

impl InterestProfiles {
    pub fn from_rows(rows: &[ElementRow]) -> Self {
        let has_interest_scale = rows
            .iter()
            .any(|row| row.scale_name == OCCUPATIONAL_INTERESTS_SCALE);

        let mut sums: BTreeMap<String, BTreeMap<String, (f64, u32)>> = BTreeMap::new();
        for row in rows
            .iter()
            .filter(|row| !has_interest_scale || row.scale_name == OCCUPATIONAL_INTERESTS_SCALE)
        {
            let entry = sums
                .entry(row.title.clone())
                .or_default()
                .entry(row.element_name.clone())
                .or_insert((0.0, 0));
            entry.0 += row.data_value;
            entry.1 += 1;
        }

        let profiles = sums
            .into_iter()
            .map(|(title, elements)| {
                let averaged = elements
                    .into_iter()
                    .map(|(element, (sum, count))| (element, sum / f64::from(count)))
                    .collect();
                (title, averaged)
            })
            .collect();

        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, f64>)> {
        self.profiles.iter()
    }
}

/// Process-lifetime memo of loaded element tables, keyed by dataset name.
pub struct MatrixStore {
    source: Arc<dyn DataSource>,
    matrices: RwLock<HashMap<String, Arc<OccupationMatrix>>>,
    interests: RwLock<HashMap<String, Arc<InterestProfiles>>>,
}

impl MatrixStore {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            matrices: RwLock::new(HashMap::new()),
            interests: RwLock::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    /// Loads (once) the aligned Level / Importance matrices of `dataset`.
    pub fn matrix(&self, dataset: &str) -> Result<Arc<OccupationMatrix>, DataUnavailable> {
        if let Some(matrix) = self
            .matrices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dataset)
        {
            return Ok(Arc::clone(matrix));
        }

        let rows = self.source.element_rows(dataset)?;
        let matrix = OccupationMatrix::from_rows(dataset, &rows);
        if matrix.is_empty() {
            return Err(DataUnavailable::new(
                dataset,
                "no occupation has both Level and Importance rows",
            ));
        }

        info!(
            dataset,
            occupations = matrix.occupations().len(),
            elements = matrix.elements().len(),
            "element matrix loaded"
        );

        let matrix = Arc::new(matrix);
        self.matrices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(dataset.to_string())
            .or_insert_with(|| Arc::clone(&matrix));
        Ok(matrix)
    }

    /// Loads (once) the per-occupation RIASEC weights of `dataset`.
    pub fn interest_profiles(
        &self,
        dataset: &str,
    ) -> Result<Arc<InterestProfiles>, DataUnavailable> {
        if let Some(profiles) = self
            .interests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dataset)
        {
            return Ok(Arc::clone(profiles));
        }

        let rows = self.source.element_rows(dataset)?;
        let profiles = InterestProfiles::from_rows(&rows);
        if profiles.is_empty() {
            return Err(DataUnavailable::new(dataset, "interest table has no rows"));
        }

        info!(dataset, occupations = profiles.len(), "interest profiles loaded");

        let profiles = Arc::new(profiles);
        self.interests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(dataset.to_string())
            .or_insert_with(|| Arc::clone(&profiles));
        Ok(profiles)
    }
}
