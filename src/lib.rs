// whereql - compiles a compact C-style filter language into SQL WHERE text
// This is the library root that exposes the public API

pub mod compiler;
pub mod error;
pub mod query;
pub mod storage;
pub mod value;

// Re-export commonly used types for convenience
pub use compiler::{compile_where, CompileOptions, Compiler, Normalization};
pub use error::{CompileError, FacadeError};
pub use query::{FetchRequest, QueryBuilder, QueryFacade, Record, ResultSet, SortDirection};
pub use storage::{Column, DataType, MemoryBackend, Schema};
pub use value::{Value, VariableMap};
