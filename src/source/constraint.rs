//! Constraint expressions for batched remote reads.

use std::fmt;

/// One contiguous slice of a named array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceSpec {
    pub var: String,
    pub start: usize,
    pub count: usize,
}

/// A set of array slices requested together in one round trip.
///
/// Renders as a DAP projection, `?var[start:1:end],...` with inclusive `end`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraint {
    specs: Vec<SliceSpec>,
}

impl Constraint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slice. Empty slices cannot be expressed and are skipped.
    pub fn slice(mut self, var: &str, start: usize, count: usize) -> Self {
        if count > 0 {
            self.specs.push(SliceSpec {
                var: var.to_string(),
                start,
                count,
            });
        }
        self
    }

    pub fn specs(&self) -> &[SliceSpec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?")?;
        for (i, spec) in self.specs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(
                f,
                "{}[{}:1:{}]",
                spec.var,
                spec.start,
                spec.start + spec.count - 1
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_projection() {
        let constraint = Constraint::new()
            .slice("N_points_for_a_segment", 10, 3)
            .slice("Relative_longitude_from_SW_corner_of_bin", 0, 1);

        assert_eq!(
            constraint.to_string(),
            "?N_points_for_a_segment[10:1:12],Relative_longitude_from_SW_corner_of_bin[0:1:0]"
        );
    }

    #[test]
    fn test_empty_slices_are_dropped() {
        let constraint = Constraint::new().slice("a", 5, 0);
        assert!(constraint.is_empty());
        assert_eq!(constraint.to_string(), "?");
    }
}
