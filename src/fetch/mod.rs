pub mod fanout;
pub mod pager;

pub use fanout::{fan_out, MAX_CONCURRENT_TASK};
pub use pager::{fetch_all, fetch_unpaged, PageQuery, PageStyle};
