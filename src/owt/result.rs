use crate::error::Result;
use crate::owt::centroids::UNCLASSIFIABLE_COLOR;
use ndarray::{Array2, Array3, ArrayView1, Axis, concatenate, s};
use std::fmt::Display;

pub const UNCLASSIFIABLE_LABEL: &str = "NaN";

/// Outcome of the arg-max over the memberships of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeLabel {
    Type(usize),
    #[default]
    Unclassifiable,
}

impl TypeLabel {
    pub fn index(&self) -> Option<usize> {
        match self {
            TypeLabel::Type(i) => Some(*i),
            TypeLabel::Unclassifiable => None,
        }
    }

    /// Integer code used in tabular outputs, -1 when not classifiable.
    pub fn as_i32(&self) -> i32 {
        match self {
            TypeLabel::Type(i) => *i as i32,
            TypeLabel::Unclassifiable => -1,
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, TypeLabel::Type(_))
    }
}

/// Per-pixel memberships, totals and labels of one classification call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    memberships: Array3<f64>,
    total: Array2<f64>,
    labels: Array2<TypeLabel>,
    area_bc: Array2<f64>,
    names: Vec<String>,
    colors: Vec<String>,
}

impl ClassificationResult {
    pub(crate) fn new(
        memberships: Array3<f64>,
        total: Array2<f64>,
        labels: Array2<TypeLabel>,
        area_bc: Array2<f64>,
        names: Vec<String>,
        colors: Vec<String>,
    ) -> Self {
        Self {
            memberships,
            total,
            labels,
            area_bc,
            names,
            colors,
        }
    }

    /// Memberships laid out as `[row, col, type]`, rounded to 6 decimals.
    pub fn memberships(&self) -> &Array3<f64> {
        &self.memberships
    }

    pub fn pixel_memberships(&self, row: usize, col: usize) -> ArrayView1<'_, f64> {
        self.memberships.slice(s![row, col, ..])
    }

    pub fn total(&self) -> &Array2<f64> {
        &self.total
    }

    pub fn labels(&self) -> &Array2<TypeLabel> {
        &self.labels
    }

    /// Box-Cox transformed Area that entered the distances.
    pub fn area_bc(&self) -> &Array2<f64> {
        &self.area_bc
    }

    pub fn type_names_table(&self) -> &[String] {
        &self.names
    }

    pub fn shape(&self) -> (usize, usize) {
        self.total.dim()
    }

    pub fn type_index(&self) -> Array2<i32> {
        self.labels.mapv(|l| l.as_i32())
    }

    pub fn type_names(&self) -> Array2<String> {
        self.labels.map(|l| self.name_of(*l).to_string())
    }

    pub fn classifiability(&self) -> Array2<u8> {
        self.labels.mapv(|l| u8::from(l.is_classified()))
    }

    pub fn name_of(&self, label: TypeLabel) -> &str {
        label
            .index()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
            .unwrap_or(UNCLASSIFIABLE_LABEL)
    }

    pub fn color_of(&self, label: TypeLabel) -> &str {
        label
            .index()
            .and_then(|i| self.colors.get(i))
            .map(String::as_str)
            .unwrap_or(UNCLASSIFIABLE_COLOR)
    }

    pub fn colors(&self) -> Array2<String> {
        self.labels.map(|l| self.color_of(*l).to_string())
    }

    pub fn unclassifiable_count(&self) -> usize {
        self.labels.iter().filter(|l| !l.is_classified()).count()
    }

    /// Pixel count per type, in model order.
    pub fn type_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.names.len()];
        for i in self.labels.iter().filter_map(TypeLabel::index) {
            counts[i] += 1;
        }
        counts
    }

    /// Join row tiles produced over the same model back into one result. An
    /// empty list is a shape error.
    pub fn stack_rows(parts: Vec<ClassificationResult>) -> Result<Self> {
        let (names, colors) = parts
            .first()
            .map(|p| (p.names.clone(), p.colors.clone()))
            .unwrap_or_default();

        let memberships: Vec<_> = parts.iter().map(|p| p.memberships.view()).collect();
        let total: Vec<_> = parts.iter().map(|p| p.total.view()).collect();
        let labels: Vec<_> = parts.iter().map(|p| p.labels.view()).collect();
        let area_bc: Vec<_> = parts.iter().map(|p| p.area_bc.view()).collect();

        Ok(Self {
            memberships: concatenate(Axis(0), &memberships)?,
            total: concatenate(Axis(0), &total)?,
            labels: concatenate(Axis(0), &labels)?,
            area_bc: concatenate(Axis(0), &area_bc)?,
            names,
            colors,
        })
    }
}

impl Display for ClassificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (rows, cols) = self.shape();
        writeln!(f, "Pixels: {} ({} x {})", rows * cols, rows, cols)?;
        for (name, count) in self.names.iter().zip(self.type_counts()) {
            if count > 0 {
                writeln!(f, "  OWT {}: {}", name, count)?;
            }
        }
        write!(f, "  Unclassifiable: {}", self.unclassifiable_count())
    }
}
