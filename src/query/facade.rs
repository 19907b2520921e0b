// Execution facade
// fetch / insert / update over an injected query builder. fetch is the only operation that
// touches the compiler: it turns the filter expression into WHERE text before delegating.

use super::builder::{QueryBuilder, Record};
use super::order::parse_order_by;
use super::result::ResultSet;
use crate::compiler::Compiler;
use crate::error::FacadeError;
use crate::value::{Value, VariableMap};
use tracing::debug;

/// Everything a fetch needs
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub table: String,
    /// Columns to select; empty means `*`
    pub columns: Vec<String>,
    /// Filter expression in the expression language (or SQL when `raw` is set)
    pub filter: Option<String>,
    pub order_by: Option<String>,
    pub variables: VariableMap,
    /// Pass `filter` through as WHERE text without compiling it
    pub raw: bool,
    /// Return an empty result instead of failing when the table is missing
    pub tolerate_missing_table: bool,
}

impl FetchRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn variables(mut self, variables: VariableMap) -> Self {
        self.variables = variables;
        self
    }

    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn tolerate_missing_table(mut self, tolerate: bool) -> Self {
        self.tolerate_missing_table = tolerate;
        self
    }

    fn selected_columns(&self) -> Vec<String> {
        if self.columns.is_empty() {
            vec!["*".to_string()]
        } else {
            self.columns.clone()
        }
    }
}

/// The facade callers use to read and write through a [`QueryBuilder`]
pub struct QueryFacade<B: QueryBuilder> {
    backend: B,
    compiler: Compiler,
}

impl<B: QueryBuilder> QueryFacade<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            compiler: Compiler::new(),
        }
    }

    pub fn with_compiler(backend: B, compiler: Compiler) -> Self {
        Self { backend, compiler }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Build the WHERE text a request would send, without running it
    pub fn where_text(&self, request: &FetchRequest) -> Result<Option<String>, FacadeError> {
        let Some(filter) = request.filter.as_deref() else {
            return Ok(None);
        };
        if filter.trim().is_empty() {
            return Ok(None);
        }
        if request.raw {
            return Ok(Some(filter.to_string()));
        }
        Ok(Some(self.compiler.compile(filter, &request.variables)?))
    }

    /// Run a filtered, ordered select
    pub fn fetch(&mut self, request: &FetchRequest) -> Result<ResultSet, FacadeError> {
        if !self.backend.table_exists(&request.table)? {
            if request.tolerate_missing_table {
                debug!(table = %request.table, "missing table tolerated, returning no rows");
                return Ok(ResultSet::empty(request.columns.clone()));
            }
            return Err(FacadeError::MissingTable(request.table.clone()));
        }

        let where_text = self.where_text(request)?;
        let order_by = match request.order_by.as_deref() {
            Some(text) => parse_order_by(text)?,
            None => Vec::new(),
        };

        debug!(
            table = %request.table,
            raw = request.raw,
            where_text = where_text.as_deref().unwrap_or(""),
            "fetch"
        );

        self.backend.select(&request.selected_columns());
        self.backend.from(&request.table);
        if let Some(text) = &where_text {
            self.backend.where_clause(text);
        }
        for directive in &order_by {
            self.backend
                .add_order_by(&directive.column, directive.direction);
        }
        Ok(self.backend.execute_query()?)
    }

    pub fn insert(&mut self, table: &str, data: &Record) -> Result<u64, FacadeError> {
        debug!(table, columns = data.len(), "insert");
        Ok(self.backend.insert(table, data)?)
    }

    pub fn update(
        &mut self,
        table: &str,
        data: &Record,
        identifier: &Value,
    ) -> Result<u64, FacadeError> {
        debug!(table, %identifier, "update");
        Ok(self.backend.update(table, data, identifier)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::builder::SortDirection;
    use anyhow::Result;

    /// Records every builder call instead of running anything
    #[derive(Default)]
    struct Recorder {
        tables: Vec<String>,
        calls: Vec<String>,
    }

    impl QueryBuilder for Recorder {
        fn select(&mut self, columns: &[String]) {
            self.calls.push(format!("select {}", columns.join(",")));
        }

        fn from(&mut self, table: &str) {
            self.calls.push(format!("from {}", table));
        }

        fn where_clause(&mut self, text: &str) {
            self.calls.push(format!("where {}", text));
        }

        fn add_order_by(&mut self, column: &str, direction: SortDirection) {
            self.calls.push(format!("order {} {}", column, direction));
        }

        fn execute_query(&mut self) -> Result<ResultSet> {
            self.calls.push("execute".to_string());
            Ok(ResultSet::default())
        }

        fn insert(&mut self, table: &str, _data: &Record) -> Result<u64> {
            self.calls.push(format!("insert {}", table));
            Ok(1)
        }

        fn update(&mut self, table: &str, _data: &Record, identifier: &Value) -> Result<u64> {
            self.calls.push(format!("update {} {}", table, identifier));
            Ok(1)
        }

        fn table_exists(&self, table: &str) -> Result<bool> {
            Ok(self.tables.iter().any(|t| t == table))
        }
    }

    fn facade() -> QueryFacade<Recorder> {
        QueryFacade::new(Recorder {
            tables: vec!["users".to_string()],
            calls: Vec::new(),
        })
    }

    #[test]
    fn fetch_sends_compiled_where_and_order() {
        let mut facade = facade();
        let request = FetchRequest::new("users")
            .columns(["id", "name"])
            .filter("age > $minAge")
            .variable("minAge", 18)
            .order_by("name DESC");
        facade.fetch(&request).unwrap();
        assert_eq!(
            facade.backend().calls,
            vec![
                "select id,name",
                "from users",
                "where age > 18 ",
                "order name DESC",
                "execute",
            ]
        );
    }

    #[test]
    fn raw_filter_is_not_compiled() {
        let mut facade = facade();
        let request = FetchRequest::new("users").filter("age BETWEEN 1 AND 2").raw(true);
        facade.fetch(&request).unwrap();
        assert!(facade
            .backend()
            .calls
            .contains(&"where age BETWEEN 1 AND 2".to_string()));
    }

    #[test]
    fn no_filter_selects_everything() {
        let mut facade = facade();
        facade.fetch(&FetchRequest::new("users")).unwrap();
        assert_eq!(facade.backend().calls, vec!["select *", "from users", "execute"]);
    }

    #[test]
    fn missing_table_is_an_error_unless_tolerated() {
        let mut facade = facade();
        let err = facade.fetch(&FetchRequest::new("ghosts")).unwrap_err();
        assert!(matches!(err, FacadeError::MissingTable(t) if t == "ghosts"));

        let rows = facade
            .fetch(&FetchRequest::new("ghosts").columns(["id"]).tolerate_missing_table(true))
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(rows.column_names, vec!["id"]);
        assert!(facade.backend().calls.is_empty());
    }

    #[test]
    fn compile_errors_stop_before_the_backend() {
        let mut facade = facade();
        let err = facade
            .fetch(&FetchRequest::new("users").filter("a == 1 && (b == 2"))
            .unwrap_err();
        assert!(matches!(err, FacadeError::Compile(_)));
        assert!(facade.backend().calls.is_empty());
    }

    #[test]
    fn insert_and_update_delegate() {
        let mut facade = facade();
        let mut data = Record::new();
        data.insert("name".into(), Value::from("Ann"));
        assert_eq!(facade.insert("users", &data).unwrap(), 1);
        assert_eq!(facade.update("users", &data, &Value::from(7)).unwrap(), 1);
        assert_eq!(facade.backend().calls, vec!["insert users", "update users 7"]);
    }
}
