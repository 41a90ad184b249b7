use super::OptimumOptions::OutputOptions;
use nalgebra::DVector;
use prettytable::{Cell, Row, Table};

/// Collects one row per iteration of the solver and prints the whole trace
/// as a table when the calculation finishes. Purely observational: nothing
/// here feeds back into the solver.
pub struct Outputter {
    options: OutputOptions,
    table: Table,
}

impl Outputter {
    pub fn new(options: &OutputOptions) -> Self {
        Self {
            options: options.clone(),
            table: Table::new(),
        }
    }

    fn column_name(prefix: &str, names: &[String], i: usize) -> String {
        match names.get(i) {
            Some(name) => name.clone(),
            None => format!("{}{}", prefix, i),
        }
    }

    fn fmt(&self, v: f64) -> String {
        format!("{:.*e}", self.options.precision, v)
    }

    /// Adds the header row: iter, the named x/y/z columns, then the
    /// objective, residual norm, error and step size columns.
    pub fn header(&mut self, n: usize, m: usize) {
        if !self.options.active {
            return;
        }
        let mut cells = vec![Cell::new("iter")];
        for i in 0..n {
            cells.push(Cell::new(&Self::column_name(
                &self.options.xprefix,
                &self.options.xnames,
                i,
            )));
        }
        for i in 0..m {
            cells.push(Cell::new(&Self::column_name(
                &self.options.yprefix,
                &self.options.ynames,
                i,
            )));
        }
        for i in 0..n {
            cells.push(Cell::new(&Self::column_name(
                &self.options.zprefix,
                &self.options.znames,
                i,
            )));
        }
        for label in ["f(x)", "h(x)", "errorf", "errorh", "error", "alpha"] {
            cells.push(Cell::new(label));
        }
        self.table.add_row(Row::new(cells));
    }

    /// Adds one iteration row. The error and step columns are dashed out for
    /// the initial state, where they are not defined yet.
    pub fn state(
        &mut self,
        iteration: usize,
        x: &DVector<f64>,
        y: &DVector<f64>,
        z: &DVector<f64>,
        f: f64,
        hnorm: f64,
        errors: Option<(f64, f64, f64, f64)>,
    ) {
        if !self.options.active {
            return;
        }
        let mut cells = vec![Cell::new(&iteration.to_string())];
        for v in x.iter().chain(y.iter()).chain(z.iter()) {
            cells.push(Cell::new(&self.fmt(*v)));
        }
        cells.push(Cell::new(&self.fmt(f)));
        cells.push(Cell::new(&self.fmt(hnorm)));
        match errors {
            Some((errorf, errorh, error, alpha)) => {
                for v in [errorf, errorh, error, alpha] {
                    cells.push(Cell::new(&self.fmt(v)));
                }
            }
            None => {
                for _ in 0..4 {
                    cells.push(Cell::new("---"));
                }
            }
        }
        self.table.add_row(Row::new(cells));
    }

    pub fn print(&self) {
        if !self.options.active {
            return;
        }
        println!("___________________ITERATION TRACE________________________");
        self.table.printstd();
        println!("_____________________________________________________________");
    }

    pub fn num_rows(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_outputter_collects_nothing() {
        let options = OutputOptions::default();
        let mut outputter = Outputter::new(&options);
        outputter.header(2, 1);
        outputter.state(
            0,
            &DVector::zeros(2),
            &DVector::zeros(1),
            &DVector::zeros(2),
            0.0,
            0.0,
            None,
        );
        assert_eq!(outputter.num_rows(), 0);
        outputter.print();
    }

    #[test]
    fn test_active_outputter_collects_rows() {
        let mut options = OutputOptions::default();
        options.active = true;
        options.xnames = vec!["CO".to_string()];
        let mut outputter = Outputter::new(&options);
        outputter.header(2, 1);
        outputter.state(
            0,
            &DVector::from_vec(vec![0.5, 0.5]),
            &DVector::from_vec(vec![1.0]),
            &DVector::zeros(2),
            0.5,
            0.0,
            None,
        );
        outputter.state(
            1,
            &DVector::from_vec(vec![0.5, 0.5]),
            &DVector::from_vec(vec![1.0]),
            &DVector::zeros(2),
            0.5,
            0.0,
            Some((1e-9, 0.0, 1e-9, 1.0)),
        );
        assert_eq!(outputter.num_rows(), 3);
    }
}
