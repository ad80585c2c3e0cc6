//! models module
pub mod model_definition;

pub use model_definition::{
  ActionTarget, BulkAction, BulkRequestLine, BulkResponse, BulkResponseItem, Record,
  json_type_name,
};
