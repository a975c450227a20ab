//! Reusable widget components.

pub mod breadcrumb;
pub mod detail;
pub mod pager;

pub use breadcrumb::BreadcrumbBar;
pub use detail::DetailPanel;
pub use pager::Pager;
