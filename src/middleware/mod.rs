pub mod no_cache;
pub mod request_id;

pub use no_cache::no_cache_headers;
pub use request_id::{make_span_with_request_id, request_id_middleware, RequestId};
