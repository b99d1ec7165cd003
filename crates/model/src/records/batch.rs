use crate::core::value::Value;

/// An INSERT statement under construction.
///
/// `fragments` concatenated with no separator form the statement text;
/// `params` holds the bound values in placeholder order and stays empty
/// for literal statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertBatch {
    pub fragments: Vec<String>,
    pub params: Vec<Value>,
    pub rows: usize,
}

impl InsertBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, fragment: String, params: Vec<Value>) {
        self.fragments.push(fragment);
        self.params.extend(params);
        self.rows += 1;
    }

    /// Appends the statement terminator.
    pub fn terminate(&mut self) {
        self.fragments.push(";".to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
        self.params.clear();
        self.rows = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_clear() {
        let mut batch = InsertBatch::new();
        assert!(batch.is_empty());

        batch.push_row("INSERT INTO t (`a`) VALUES (?)".into(), vec![Value::Int(1)]);
        batch.push_row(", (?)".into(), vec![Value::Int(2)]);
        batch.terminate();

        assert_eq!(batch.rows, 2);
        assert_eq!(batch.fragments.concat(), "INSERT INTO t (`a`) VALUES (?), (?);");
        assert_eq!(batch.params, vec![Value::Int(1), Value::Int(2)]);

        batch.clear();
        assert!(batch.is_empty());
        assert!(batch.fragments.is_empty());
        assert!(batch.params.is_empty());
    }
}
