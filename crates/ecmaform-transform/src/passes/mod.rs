//! The individual passes, in pipeline order.

mod block_scoping;
mod commonjs;
mod compress;
mod es2015;
mod es2016;
mod es2020;
mod es2021;
mod strip_types;

pub use commonjs::CommonJs;
pub use compress::Compress;
pub use es2015::Es2015;
pub use es2016::Es2016;
pub use es2020::Es2020;
pub use es2021::Es2021;
pub use strip_types::StripTypes;
