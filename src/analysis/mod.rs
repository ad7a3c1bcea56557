pub mod age;
pub mod history;
pub mod interpolation;
pub mod plausibility;
pub mod status;
pub mod zscore;
