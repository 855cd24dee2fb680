use tokio_postgres::types::ToSql;

/// Owned bind parameters for one statement.
#[derive(Default)]
pub struct PgParamStore {
    params: Vec<Box<dyn ToSql + Sync + Send>>,
}

impl PgParamStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            params: Vec::with_capacity(capacity),
        }
    }

    pub fn push<T: ToSql + Sync + Send + 'static>(&mut self, value: T) {
        self.params.push(Box::new(value));
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| &**param as &(dyn ToSql + Sync))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_parameters_in_push_order() {
        let mut params = PgParamStore::with_capacity(3);
        params.push("u1".to_string());
        params.push(42_i32);
        params.push(vec!["a".to_string()]);

        assert_eq!(params.as_refs().len(), 3);
    }
}
