//! Shape of a simulated system before it is loaded into a coordinator

use dlsim_errors::ConfigError;
use rand::Rng;
use std::ops::RangeInclusive;

/// Resource capacities plus one optional maximum-demand row per process
///
/// Rows left as `None` are filled with a random ceiling in
/// `1..=capacity` per resource when the topology is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub capacities: Vec<u32>,
    pub maxima: Vec<Option<Vec<u32>>>,
}

impl Topology {
    #[must_use]
    pub fn new(capacities: Vec<u32>) -> Self {
        Self {
            capacities,
            maxima: Vec::new(),
        }
    }

    /// Add a process with an explicit maximum-demand row
    #[must_use]
    pub fn with_process(mut self, maximum: Vec<u32>) -> Self {
        self.maxima.push(Some(maximum));
        self
    }

    /// Add `count` processes whose maxima are drawn at load time
    #[must_use]
    pub fn with_random_processes(mut self, count: usize) -> Self {
        self.maxima.extend(std::iter::repeat_n(None, count));
        self
    }

    /// Random capacities in `capacity` for `resources` pools
    pub fn random<R: Rng>(
        processes: usize,
        resources: usize,
        capacity: &RangeInclusive<u32>,
        rng: &mut R,
    ) -> Self {
        let capacities = (0..resources)
            .map(|_| rng.gen_range(capacity.clone()))
            .collect();
        Self::new(capacities).with_random_processes(processes)
    }

    /// Check shape before anything is built
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty system, a zero
    /// capacity, a maximum row of the wrong length, or a maximum above the
    /// capacity of its resource.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacities.is_empty() || self.maxima.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "topology".to_string(),
                value: format!(
                    "{} processes, {} resources",
                    self.maxima.len(),
                    self.capacities.len()
                ),
            });
        }
        if let Some(idx) = self.capacities.iter().position(|c| *c == 0) {
            return Err(ConfigError::InvalidValue {
                field: format!("capacities[{idx}]"),
                value: "0".to_string(),
            });
        }
        for (idx, row) in self.maxima.iter().enumerate() {
            if let Some(row) = row {
                if row.len() != self.capacities.len() {
                    return Err(ConfigError::InvalidValue {
                        field: format!("maxima[{idx}]"),
                        value: format!(
                            "{} entries for {} resources",
                            row.len(),
                            self.capacities.len()
                        ),
                    });
                }
                // Such a row can never finish, so no state would be safe
                for (r, (max, total)) in row.iter().zip(&self.capacities).enumerate() {
                    if max > total {
                        return Err(ConfigError::InvalidValue {
                            field: format!("maxima[{idx}][{r}]"),
                            value: format!("{max} exceeds capacity {total}"),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Materialize every maximum row, drawing missing ones from `rng`
    pub(crate) fn resolve_maxima<R: Rng>(&self, rng: &mut R) -> Vec<Vec<u32>> {
        self.maxima
            .iter()
            .map(|row| match row {
                Some(row) => row.clone(),
                None => self
                    .capacities
                    .iter()
                    .map(|total| rng.gen_range(1..=*total))
                    .collect(),
            })
            .collect()
    }
}
