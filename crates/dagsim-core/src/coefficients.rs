use std::collections::HashMap;

/// Weight applied to an edge when no coefficient was given for it.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Separator used by the `"child~parent"` key spelling.
pub const KEY_SEPARATOR: char = '~';

/// Edge weights keyed by child, then parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coefficients {
    weights: HashMap<String, HashMap<String, f64>>,
}

impl Coefficients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, child: &str, parent: &str, weight: f64) -> Self {
        self.set(child, parent, weight);
        self
    }

    /// Set the weight of `parent -> child`, returning the previous override.
    pub fn set(&mut self, child: &str, parent: &str, weight: f64) -> Option<f64> {
        self.weights
            .entry(child.to_string())
            .or_default()
            .insert(parent.to_string(), weight)
    }

    /// Effective weight of `parent -> child`.
    pub fn get(&self, child: &str, parent: &str) -> f64 {
        self.explicit(child, parent).unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn explicit(&self, child: &str, parent: &str) -> Option<f64> {
        self.weights
            .get(child)
            .and_then(|parents| parents.get(parent))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.weights.iter().flat_map(|(child, parents)| {
            parents
                .iter()
                .map(move |(parent, weight)| (child.as_str(), parent.as_str(), *weight))
        })
    }

    pub fn len(&self) -> usize {
        self.weights.values().map(|parents| parents.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Split a `"child~parent"` key; surrounding whitespace is trimmed.
pub fn parse_key(key: &str) -> Option<(&str, &str)> {
    let (child, parent) = key.split_once(KEY_SEPARATOR)?;
    let (child, parent) = (child.trim(), parent.trim());
    if child.is_empty() || parent.is_empty() || parent.contains(KEY_SEPARATOR) {
        return None;
    }
    Some((child, parent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pairs_default_to_one() {
        let coefficients = Coefficients::new().with("y", "x", 2.5);
        assert_eq!(coefficients.get("y", "x"), 2.5);
        assert_eq!(coefficients.get("y", "z"), DEFAULT_WEIGHT);
        assert_eq!(coefficients.get("x", "y"), DEFAULT_WEIGHT);
    }

    #[test]
    fn set_overwrites_previous_weight() {
        let mut coefficients = Coefficients::new();
        assert_eq!(coefficients.set("y", "x", 0.5), None);
        assert_eq!(coefficients.set("y", "x", -1.0), Some(0.5));
        assert_eq!(coefficients.len(), 1);
        assert_eq!(coefficients.explicit("y", "x"), Some(-1.0));
    }

    #[test]
    fn parses_tilde_keys() {
        assert_eq!(parse_key("y~x"), Some(("y", "x")));
        assert_eq!(parse_key(" y ~ x "), Some(("y", "x")));
        assert_eq!(parse_key("y"), None);
        assert_eq!(parse_key("~x"), None);
        assert_eq!(parse_key("y~x~z"), None);
    }
}
