use serde::{Deserialize, Serialize};

/// A named column of simulated values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Simulation output: `rows` rows and one column per node, in node order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTable {
    pub rows: usize,
    pub columns: Vec<TableColumn>,
}

/// Descriptive statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator); zero below two rows.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SimulationTable {
    pub fn new(rows: usize, columns: Vec<TableColumn>) -> Self {
        Self { rows, columns }
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|col| col.name == name)
            .map(|col| col.values.as_slice())
    }

    /// Values of row `index` across all columns, or `None` past the end.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.rows {
            return None;
        }
        Some(self.columns.iter().map(|col| col.values[index]).collect())
    }

    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .map(|col| summarize(&col.name, &col.values))
            .collect()
    }
}

fn summarize(name: &str, values: &[f64]) -> ColumnSummary {
    let n = values.len();
    if n == 0 {
        return ColumnSummary {
            name: name.to_string(),
            mean: f64::NAN,
            std_dev: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        };
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let std_dev = if n > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    ColumnSummary {
        name: name.to_string(),
        mean,
        std_dev,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SimulationTable {
        SimulationTable::new(
            3,
            vec![
                TableColumn {
                    name: "a".to_string(),
                    values: vec![1.0, 2.0, 3.0],
                },
                TableColumn {
                    name: "b".to_string(),
                    values: vec![0.0, 0.0, 1.0],
                },
            ],
        )
    }

    #[test]
    fn rows_and_columns_are_addressable() {
        let table = table();
        assert_eq!(table.names(), vec!["a", "b"]);
        assert_eq!(table.column("b"), Some(&[0.0, 0.0, 1.0][..]));
        assert_eq!(table.row(1), Some(vec![2.0, 0.0]));
        assert_eq!(table.row(3), None);
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn summary_reports_moments_and_range() {
        let summary = table().summary();
        assert_eq!(summary[0].mean, 2.0);
        assert_eq!(summary[0].std_dev, 1.0);
        assert_eq!(summary[0].min, 1.0);
        assert_eq!(summary[0].max, 3.0);
        assert_eq!(summary[1].max, 1.0);
    }

    #[test]
    fn serializes_columns_in_order() {
        let json = serde_json::to_value(table()).unwrap();
        assert_eq!(json["rows"], 3);
        assert_eq!(json["columns"][0]["name"], "a");
        assert_eq!(json["columns"][1]["values"][2], 1.0);
    }
}
