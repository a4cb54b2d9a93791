//! Per-point solver output.

/// Named vector output, flattened to `<prefix>_<label>` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedVector {
    pub prefix: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl NamedVector {
    pub fn new(prefix: impl Into<String>, labels: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            prefix: prefix.into(),
            labels,
            values,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = String> + '_ {
        self.labels
            .iter()
            .map(move |label| format!("{}_{label}", self.prefix))
    }
}

/// Spatial profile columns of a 1-D solution, all of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    pub columns: Vec<(String, Vec<f64>)>,
}

impl Profile {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |(_, v)| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outputs of one steady solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub converged: bool,
    pub scalars: Vec<(String, f64)>,
    pub vectors: Vec<NamedVector>,
    pub profile: Option<Profile>,
}

impl SolveResult {
    pub fn converged() -> Self {
        Self {
            converged: true,
            scalars: Vec::new(),
            vectors: Vec::new(),
            profile: None,
        }
    }

    pub fn with_scalar(mut self, name: impl Into<String>, value: f64) -> Self {
        self.scalars.push((name.into(), value));
        self
    }

    pub fn with_vector(mut self, vector: NamedVector) -> Self {
        self.vectors.push(vector);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.scalars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Scalars followed by flattened vector entries, in output order.
    pub fn fields(&self) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = self.scalars.clone();
        for vector in &self.vectors {
            out.extend(vector.field_names().zip(vector.values.iter().copied()));
        }
        out
    }

    /// Field names without values, in the order of [`SolveResult::fields`].
    pub fn field_names(&self) -> Vec<String> {
        self.fields().into_iter().map(|(name, _)| name).collect()
    }
}
