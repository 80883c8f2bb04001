pub mod orderedheaders;
pub mod requestbody;
pub mod response;
pub mod responsebody;
pub mod streamfactory;
pub mod transaction;

// Re-exports for convenience
pub use orderedheaders::OrderedHeaderMap;
pub use requestbody::{RequestBody, RequestContent};
pub use response::HttpResponse;
pub use responsebody::ResponseBody;
pub use transaction::{method_supports_body, HttpNetworkTransaction};
