//! Domain models for design reviews.
//!
//! - `ReviewCategory` / `CategoryKind`: what is reviewed and how it is weighted
//! - `Issue`: a single finding with a severity
//! - `CategoryResult` / `DesignReviewResult`: scored outcomes
//! - `PageConfig`: the static description of a page under review

pub mod category;
pub mod issue;
pub mod page;
pub mod result;

pub use category::{default_categories, CategoryKind, ReviewCategory};
pub use issue::{Issue, Severity};
pub use page::{CustomCheck, PageConfig, PagePriority, ReviewFrequency, Viewport};
pub use result::{CategoryResult, DesignReviewResult};
