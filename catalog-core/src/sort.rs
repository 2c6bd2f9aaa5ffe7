//! Column-driven, single-key table sorting.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// The sortable value of one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, |v| Self::Text(v.to_string()))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Empty => f.write_str("-"),
        }
    }
}

pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;
type CellFn<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

/// How a column participates in sorting.
pub enum Sortable<T> {
    /// Header has no sort affordance; never reorders.
    Disabled,
    /// Compare cell values: strings case-folded, numbers numerically, mixed
    /// kinds as equal.
    Default,
    Custom(Comparator<T>),
}

impl<T> Clone for Sortable<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Disabled => Self::Disabled,
            Self::Default => Self::Default,
            Self::Custom(cmp) => Self::Custom(Arc::clone(cmp)),
        }
    }
}

impl<T> fmt::Debug for Sortable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Default => f.write_str("Default"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A table column definition.
pub struct SortableColumn<T> {
    pub label: String,
    pub field: String,
    pub sortable: Sortable<T>,
    pub default_direction: SortDirection,
    cell: CellFn<T>,
}

impl<T> SortableColumn<T> {
    /// A non-sortable column.
    pub fn new(
        label: impl Into<String>,
        field: impl Into<String>,
        cell: impl Fn(&T) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
            sortable: Sortable::Disabled,
            default_direction: SortDirection::Asc,
            cell: Arc::new(cell),
        }
    }

    /// Enable default ordering on the cell value.
    pub fn sortable(mut self) -> Self {
        self.sortable = Sortable::Default;
        self
    }

    pub fn sort_with(mut self, cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        self.sortable = Sortable::Custom(Arc::new(cmp));
        self
    }

    pub fn default_direction(mut self, direction: SortDirection) -> Self {
        self.default_direction = direction;
        self
    }

    pub fn is_sortable(&self) -> bool {
        !matches!(self.sortable, Sortable::Disabled)
    }

    pub fn cell(&self, row: &T) -> CellValue {
        (self.cell)(row)
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        match &self.sortable {
            Sortable::Disabled => Ordering::Equal,
            Sortable::Default => compare_cells(&self.cell(a), &self.cell(b)),
            Sortable::Custom(cmp) => cmp(a, b),
        }
    }
}

impl<T> Clone for SortableColumn<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            field: self.field.clone(),
            sortable: self.sortable.clone(),
            default_direction: self.default_direction,
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> fmt::Debug for SortableColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableColumn")
            .field("label", &self.label)
            .field("field", &self.field)
            .field("sortable", &self.sortable)
            .field("default_direction", &self.default_direction)
            .finish()
    }
}

/// Collation key for text cells: NFD decomposition, combining marks
/// stripped, lowercased. `Élan` folds to `elan`.
fn fold_text(text: &str) -> String {
    text.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Default cell ordering. Strings compare accent- and case-insensitively,
/// falling back to a byte comparison so distinct strings never tie.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Text(a), CellValue::Text(b)) => fold_text(a)
            .cmp(&fold_text(b))
            .then_with(|| a.cmp(b)),
        (CellValue::Number(a), CellValue::Number(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        _ => Ordering::Equal,
    }
}

/// The currently active sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSort {
    pub index: usize,
    pub direction: SortDirection,
}

/// Header sort descriptor for one sortable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSort {
    pub column_index: usize,
    pub sort_by: Option<ActiveSort>,
    pub default_direction: SortDirection,
}

impl ColumnSort {
    pub fn is_active(&self) -> bool {
        self.sort_by.is_some_and(|s| s.index == self.column_index)
    }
}

/// Sort state plus column definitions for one table.
#[derive(Debug, Clone)]
pub struct TableSortEngine<T> {
    columns: Vec<SortableColumn<T>>,
    active: Option<ActiveSort>,
}

impl<T> TableSortEngine<T> {
    pub fn new(columns: Vec<SortableColumn<T>>) -> Self {
        Self {
            columns,
            active: None,
        }
    }

    pub fn with_sort(mut self, index: usize, direction: SortDirection) -> Self {
        self.active = Some(ActiveSort { index, direction });
        self
    }

    pub fn columns(&self) -> &[SortableColumn<T>] {
        &self.columns
    }

    pub fn active(&self) -> Option<ActiveSort> {
        self.active
    }

    pub fn column_index(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field == field)
    }

    /// Sort descriptor for a header, `None` when the column is not sortable.
    pub fn column_sort(&self, column_index: usize) -> Option<ColumnSort> {
        let column = self.columns.get(column_index)?;
        if !column.is_sortable() {
            return None;
        }
        Some(ColumnSort {
            column_index,
            sort_by: self.active,
            default_direction: column.default_direction,
        })
    }

    /// Make `index` the single active sort column.
    pub fn on_sort(&mut self, index: usize, direction: SortDirection) {
        tracing::debug!(index, direction = direction.as_str(), "Sort changed");
        self.active = Some(ActiveSort { index, direction });
    }

    /// Header click: flip the active column, or start a new one at its
    /// default direction.
    pub fn toggle(&mut self, index: usize) {
        let direction = match self.active {
            Some(active) if active.index == index => active.direction.reversed(),
            _ => self
                .columns
                .get(index)
                .map_or(SortDirection::Asc, |c| c.default_direction),
        };
        self.on_sort(index, direction);
    }

    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Sorted copy of `data`; `data` itself is never reordered.
    ///
    /// Rows keep their relative order when there is no active sort, when the
    /// active column is not sortable, or when the comparator ties.
    pub fn transform_data(&self, data: &[T]) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = data.to_vec();
        let Some(active) = self.active else {
            return out;
        };
        let Some(column) = self.columns.get(active.index) else {
            return out;
        };
        if !column.is_sortable() {
            return out;
        }
        out.sort_by(|a, b| {
            let ord = column.compare(a, b);
            match active.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        out
    }
}
