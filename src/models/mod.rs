pub mod bundle;
pub mod filter;
pub mod item;
pub mod list;
pub mod stats;

pub use bundle::*;
pub use filter::*;
pub use item::*;
pub use list::*;
pub use stats::*;
