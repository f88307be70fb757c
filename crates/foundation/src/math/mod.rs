pub mod spherical;
pub mod vec;
pub mod view;

pub use spherical::*;
pub use vec::*;
pub use view::*;
