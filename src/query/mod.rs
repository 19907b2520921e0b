// Query module - the execution facade and the interface it drives
pub mod builder;
pub mod facade;
pub mod order;
pub mod result;

pub use builder::{OrderBy, QueryBuilder, Record, SortDirection};
pub use facade::{FetchRequest, QueryFacade};
pub use order::parse_order_by;
pub use result::{ResultSet, Row};
