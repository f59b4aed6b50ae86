//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// A continuous variable of a linear program
///
/// # Examples
/// ```rust
/// use phiflux_core::optimize::variable::VariableBuilder;
/// let x = VariableBuilder::default()
///     .id("x")
///     .lower_bound(0.0)
///     .upper_bound(20.)
///     .build()
///     .unwrap();
/// assert_eq!(x.to_string(), "x[0, 20]");
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Variable {
    /// Unique id of the variable
    #[builder(setter(into))]
    pub id: String,
    /// Optional human-readable name
    #[builder(setter(into, strip_option), default = "None")]
    pub name: Option<String>,
    /// Lowest value the variable can take, may be -inf
    #[builder(default = "0.")]
    pub lower_bound: f64,
    /// Highest value the variable can take, may be inf
    #[builder(default = "f64::INFINITY")]
    pub upper_bound: f64,
    /// Position of the variable in the problem, set when added
    #[builder(default = "0")]
    pub(crate) index: usize,
}

impl Variable {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = self.name.as_deref().unwrap_or(&self.id);
        write!(f, "{}[{}, {}]", label, self.lower_bound, self.upper_bound)
    }
}
