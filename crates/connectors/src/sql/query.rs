/// Postgres accepts at most this many bind parameters per statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Rows per INSERT statement so that `rows * columns` stays within the bind
/// parameter limit. Never less than one.
pub fn rows_per_statement(columns: usize, rows: usize) -> usize {
    let by_params = MAX_BIND_PARAMS / columns.max(1);
    rows.min(by_params).max(1)
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Keyset page over a table ordered newest first.
///
/// The id column is compared and sorted under the `C` collation so the
/// database orders ids byte-wise, the same way cursors compare.
#[derive(Debug, Clone, Copy)]
pub struct PageQuery<'a> {
    pub table: &'a str,
    /// Select-list expressions, already quoted.
    pub columns: &'a [&'a str],
    pub created_column: &'a str,
    pub id_column: &'a str,
}

impl PageQuery<'_> {
    /// First page. Binds `$1 = limit`.
    pub fn first(&self) -> String {
        self.render(None)
    }

    /// Page strictly below a cursor. Binds `$1 = limit`, `$2 = timestamp`,
    /// `$3 = id`.
    pub fn after(&self) -> String {
        let created = quote_ident(self.created_column);
        let id = quote_ident(self.id_column);
        self.render(Some(format!(
            "({created}, {id} COLLATE \"C\") < ($2, $3 COLLATE \"C\")"
        )))
    }

    fn render(&self, predicate: Option<String>) -> String {
        let created = quote_ident(self.created_column);
        let id = quote_ident(self.id_column);

        let mut sql = format!(
            "SELECT {} FROM {}",
            self.columns.join(", "),
            quote_ident(self.table)
        );
        if let Some(predicate) = predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }
        sql.push_str(&format!(
            " ORDER BY {created} DESC, {id} COLLATE \"C\" DESC LIMIT $1"
        ));
        sql
    }
}

/// Multi-row INSERT with numbered placeholders, row-major.
pub fn insert_rows(table: &str, columns: &[&str], rows: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    let values = (0..rows)
        .map(|row| {
            let placeholders = (1..=columns.len())
                .map(|col| format!("${}", row * columns.len() + col))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({placeholders})")
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({column_list}) VALUES {values}",
        quote_ident(table)
    )
}
