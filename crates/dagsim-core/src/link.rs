//! Inverse link functions mapping a linear predictor to a natural parameter.

/// Inverse link attached to a distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Natural parameter equals the linear predictor.
    Identity,
    /// Logistic sigmoid, maps the real line onto (0, 1).
    Logit,
    /// Exponential, maps the real line onto (0, inf).
    Log,
    /// The family does not consume a linear predictor.
    None,
}

impl Link {
    /// Apply the inverse link to a single linear predictor value.
    ///
    /// `Link::None` passes the value through untouched; families using it
    /// ignore the result anyway.
    pub fn inverse(self, x: f64) -> f64 {
        match self {
            Link::Identity | Link::None => x,
            Link::Logit => expit(x),
            Link::Log => x.exp(),
        }
    }

    /// Apply the inverse link entry-wise.
    pub fn inverse_all(self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|x| self.inverse(*x)).collect()
    }
}

/// Logistic sigmoid `1 / (1 + e^-x)`.
///
/// Branches on sign so that `exp` is only evaluated on non-positive
/// arguments and never overflows.
pub fn expit(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}
