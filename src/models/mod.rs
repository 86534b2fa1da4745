pub mod course;
pub mod progress;
pub mod quiz;
pub mod review;
pub mod section;
pub mod session;
pub mod subsection;
pub mod user;
